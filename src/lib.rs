//! Tuition Ledger Library
//!
//! Records tuition payments against a school year's fee plan, allocates them
//! across tranches and derives balances from the append-only ledger.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use app::AppServices;
pub use modules::fee_plans;
pub use modules::ledger;
pub use modules::payments;
pub use modules::reconciliation;

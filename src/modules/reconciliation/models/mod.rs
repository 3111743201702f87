pub mod balance_summary;
pub mod tranche_status;

pub use balance_summary::{BalanceSummary, TrancheBalance};
pub use tranche_status::TrancheStatus;

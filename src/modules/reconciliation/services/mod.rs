pub mod balance_calculator;
pub mod reconciliation_service;
pub mod status_reconciler;

pub use balance_calculator::BalanceCalculator;
pub use reconciliation_service::ReconciliationService;
pub use status_reconciler::{StatusReconciler, TrancheApplied};

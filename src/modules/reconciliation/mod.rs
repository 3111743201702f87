pub mod controllers;
pub mod models;
pub mod services;

pub use models::{BalanceSummary, TrancheBalance, TrancheStatus};
pub use services::{BalanceCalculator, ReconciliationService, StatusReconciler};

pub mod fee_plans;
pub mod health;
pub mod ledger;
pub mod payments;
pub mod reconciliation;

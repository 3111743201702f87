pub mod summary_controller;

pub use summary_controller::{configure, get_summary, get_tranche_statuses};

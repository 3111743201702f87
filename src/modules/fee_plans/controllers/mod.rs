pub mod fee_plan_controller;

pub use fee_plan_controller::{configure, get_fee_plan};

pub mod fee_plan_resolver;

pub use fee_plan_resolver::FeePlanResolver;

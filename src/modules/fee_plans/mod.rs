pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Enrollment, EnrollmentStatus, FeePlan, ResolvedFeePlan, Tranche};
pub use repositories::{EnrollmentCatalog, InMemoryCatalog, MySqlCatalog};
pub use services::FeePlanResolver;

pub mod enrollment;
pub mod fee_plan;
pub mod tranche;

pub use enrollment::{Enrollment, EnrollmentStatus};
pub use fee_plan::{FeePlan, ResolvedFeePlan};
pub use tranche::Tranche;

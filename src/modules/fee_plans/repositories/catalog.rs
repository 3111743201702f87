use async_trait::async_trait;

use crate::core::Result;
use crate::modules::fee_plans::models::{Enrollment, FeePlan};

/// Read-only view of the academic registration service.
///
/// Enrollments and published fee plans are owned elsewhere; this crate never
/// writes them.
#[async_trait]
pub trait EnrollmentCatalog: Send + Sync {
    /// Look up an enrollment by its id
    async fn find_enrollment(&self, enrollment_id: &str) -> Result<Option<Enrollment>>;

    /// All enrollments a student holds for a school year, in any status
    async fn find_student_enrollments(
        &self,
        student_id: &str,
        school_year_id: &str,
    ) -> Result<Vec<Enrollment>>;

    /// Published fee plan for a school year
    async fn find_fee_plan(&self, school_year_id: &str) -> Result<Option<FeePlan>>;
}

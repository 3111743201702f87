use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{AppError, Result};
use crate::modules::fee_plans::{
    models::{Enrollment, ResolvedFeePlan},
    repositories::EnrollmentCatalog,
};

/// Resolves the fee plan an enrollment pays against.
///
/// Every call goes back to the catalog: enrollment can be withdrawn between a
/// screen load and a payment tap, so nothing is cached here.
#[derive(Clone)]
pub struct FeePlanResolver {
    catalog: Arc<dyn EnrollmentCatalog>,
}

impl FeePlanResolver {
    pub fn new(catalog: Arc<dyn EnrollmentCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve the plan for a student's active enrollment in a school year
    ///
    /// # Errors
    /// * `EnrollmentRequired` - no active enrollment for the student and year
    /// * `NotFound` - the school year has no published fee plan
    pub async fn resolve(&self, student_id: &str, school_year_id: &str) -> Result<ResolvedFeePlan> {
        let enrollments = self
            .catalog
            .find_student_enrollments(student_id, school_year_id)
            .await?;

        let Some(enrollment) = enrollments.into_iter().find(Enrollment::is_active) else {
            warn!(
                student_id = student_id,
                school_year_id = school_year_id,
                "No active enrollment; payment affordances must be withheld"
            );
            return Err(AppError::enrollment_required(format!(
                "Student '{}' has no active enrollment for school year '{}'; please contact the school administration",
                student_id, school_year_id
            )));
        };

        self.attach_plan(enrollment).await
    }

    /// Same gate as [`resolve`](Self::resolve), keyed by enrollment id
    pub async fn resolve_for_enrollment(&self, enrollment_id: &str) -> Result<ResolvedFeePlan> {
        let enrollment = self.find_enrollment(enrollment_id).await?;

        if !enrollment.is_active() {
            warn!(
                enrollment_id = enrollment_id,
                status = %enrollment.status,
                "Enrollment is not active"
            );
            return Err(AppError::enrollment_required(format!(
                "Enrollment '{}' is {}; please contact the school administration",
                enrollment_id, enrollment.status
            )));
        }

        self.attach_plan(enrollment).await
    }

    /// Plan lookup without the active-enrollment gate.
    ///
    /// Used for receipts and callbacks on payments that were accepted while
    /// the enrollment was active.
    pub async fn lookup_for_enrollment(&self, enrollment_id: &str) -> Result<ResolvedFeePlan> {
        let enrollment = self.find_enrollment(enrollment_id).await?;
        self.attach_plan(enrollment).await
    }

    async fn find_enrollment(&self, enrollment_id: &str) -> Result<Enrollment> {
        self.catalog
            .find_enrollment(enrollment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Enrollment '{}' not found", enrollment_id)))
    }

    async fn attach_plan(&self, enrollment: Enrollment) -> Result<ResolvedFeePlan> {
        let plan = self
            .catalog
            .find_fee_plan(&enrollment.school_year_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No fee plan published for school year '{}'",
                    enrollment.school_year_id
                ))
            })?;

        debug!(
            enrollment_id = enrollment.id.as_str(),
            school_year_id = plan.school_year_id(),
            tranches = plan.len(),
            total_due = plan.total_due(),
            "Fee plan resolved"
        );

        Ok(ResolvedFeePlan { enrollment, plan })
    }
}

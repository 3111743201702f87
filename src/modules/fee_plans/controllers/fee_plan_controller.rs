// HTTP handler for fee plan resolution
//
// Endpoints:
// - GET /students/{student_id}/school-years/{school_year_id}/fee-plan

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::core::Result;
use crate::modules::fee_plans::{
    models::{ResolvedFeePlan, Tranche},
    services::FeePlanResolver,
};

/// Response for a single tranche of the plan
#[derive(Debug, Serialize)]
pub struct TrancheResponse {
    pub index: usize,
    pub name: String,
    pub amount: i64,
    pub display_amount: String,
    pub due_date: String,
    pub is_mandatory: bool,
    pub allows_partial: bool,
}

impl From<&Tranche> for TrancheResponse {
    fn from(tranche: &Tranche) -> Self {
        Self {
            index: tranche.index,
            name: tranche.name.clone(),
            amount: tranche.amount,
            display_amount: tranche.currency.format_amount(tranche.amount),
            due_date: tranche.due_date.to_string(),
            is_mandatory: tranche.is_mandatory,
            allows_partial: tranche.allows_partial,
        }
    }
}

/// Response for GET .../fee-plan
#[derive(Debug, Serialize)]
pub struct FeePlanResponse {
    pub enrollment_id: String,
    pub student_id: String,
    pub school_year_id: String,
    pub currency: String,
    pub total_due: i64,
    pub tranches: Vec<TrancheResponse>,
}

impl From<ResolvedFeePlan> for FeePlanResponse {
    fn from(resolved: ResolvedFeePlan) -> Self {
        Self {
            enrollment_id: resolved.enrollment.id,
            student_id: resolved.enrollment.student_id,
            school_year_id: resolved.plan.school_year_id().to_string(),
            currency: resolved.plan.currency().to_string(),
            total_due: resolved.plan.total_due(),
            tranches: resolved
                .plan
                .tranches()
                .iter()
                .map(TrancheResponse::from)
                .collect(),
        }
    }
}

/// GET /students/{student_id}/school-years/{school_year_id}/fee-plan
///
/// # Returns
/// - 200: Fee plan of the student's active enrollment
/// - 403: No active enrollment (`enrollment_required`)
/// - 404: No plan published for the school year
pub async fn get_fee_plan(
    path: web::Path<(String, String)>,
    resolver: web::Data<FeePlanResolver>,
) -> Result<HttpResponse> {
    let (student_id, school_year_id) = path.into_inner();

    let resolved = resolver.resolve(&student_id, &school_year_id).await?;

    Ok(HttpResponse::Ok().json(FeePlanResponse::from(resolved)))
}

/// Configure fee plan routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/students/{student_id}/school-years/{school_year_id}/fee-plan",
        web::get().to(get_fee_plan),
    );
}

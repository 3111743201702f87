// HTTP handlers for balance views
//
// Endpoints:
// - GET /enrollments/{enrollment_id}/summary
// - GET /enrollments/{enrollment_id}/tranches

use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::core::Result;
use crate::modules::reconciliation::{models::TrancheStatus, services::ReconciliationService};

/// Response for GET /enrollments/{id}/tranches
#[derive(Debug, Serialize)]
pub struct TrancheStatusResponse {
    pub enrollment_id: String,
    pub tranches: BTreeMap<usize, TrancheStatus>,
}

/// GET /enrollments/{enrollment_id}/summary
///
/// # Returns
/// - 200: Balance summary
/// - 403: Enrollment not active
/// - 404: Unknown enrollment
pub async fn get_summary(
    path: web::Path<String>,
    service: web::Data<ReconciliationService>,
) -> Result<HttpResponse> {
    let enrollment_id = path.into_inner();

    let summary = service.summary(&enrollment_id).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// GET /enrollments/{enrollment_id}/tranches
pub async fn get_tranche_statuses(
    path: web::Path<String>,
    service: web::Data<ReconciliationService>,
) -> Result<HttpResponse> {
    let enrollment_id = path.into_inner();

    let tranches = service.tranches_status(&enrollment_id).await?;

    Ok(HttpResponse::Ok().json(TrancheStatusResponse {
        enrollment_id,
        tranches,
    }))
}

/// Configure balance routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/enrollments/{enrollment_id}/summary",
        web::get().to(get_summary),
    )
    .route(
        "/enrollments/{enrollment_id}/tranches",
        web::get().to(get_tranche_statuses),
    );
}

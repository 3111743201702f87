// HTTP handlers for payment submission, history and receipts
//
// Endpoints:
// - POST /enrollments/{enrollment_id}/payments
// - GET  /enrollments/{enrollment_id}/payments
// - GET  /payments/{payment_id}/receipt

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::modules::payments::{
    models::{AllocationResult, SubmissionOutcome, SubmitPaymentRequest},
    services::PaymentService,
};

/// Response for POST /enrollments/{id}/payments
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitPaymentResponse {
    Accepted(AllocationResult),
    AlreadySettled,
}

impl From<SubmissionOutcome> for SubmitPaymentResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        match outcome {
            SubmissionOutcome::Accepted(result) => Self::Accepted(result),
            SubmissionOutcome::AlreadySettled => Self::AlreadySettled,
        }
    }
}

/// Response for GET /enrollments/{id}/payments
#[derive(Debug, Serialize)]
pub struct PaymentHistoryResponse {
    pub enrollment_id: String,
    pub payments: Vec<AllocationResult>,
}

/// Receipt rendering
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    /// `text` for the printable rendering, JSON otherwise
    pub format: Option<String>,
}

/// POST /enrollments/{enrollment_id}/payments
///
/// # Returns
/// - 200: `{"outcome":"accepted", ...}` or `{"outcome":"already_settled"}`
/// - 400: Malformed request, invalid amount or tranche
/// - 403: Enrollment not active
/// - 409: Reference reused with different details
/// - 422: Amount exceeds the outstanding balance
pub async fn submit_payment(
    path: web::Path<String>,
    body: web::Json<SubmitPaymentRequest>,
    service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let enrollment_id = path.into_inner();

    let outcome = service
        .submit_payment(&enrollment_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(SubmitPaymentResponse::from(outcome)))
}

/// GET /enrollments/{enrollment_id}/payments
pub async fn list_payments(
    path: web::Path<String>,
    service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let enrollment_id = path.into_inner();

    let payments = service.history(&enrollment_id).await?;

    Ok(HttpResponse::Ok().json(PaymentHistoryResponse {
        enrollment_id,
        payments: payments.iter().map(AllocationResult::from).collect(),
    }))
}

/// GET /payments/{payment_id}/receipt
///
/// # Returns
/// - 200: Receipt (JSON, or plain text with `?format=text`)
/// - 404: Unknown payment, or payment not settled
pub async fn get_receipt(
    path: web::Path<String>,
    query: web::Query<ReceiptQuery>,
    service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let payment_id = path.into_inner();

    let receipt = service.receipt(&payment_id).await?;

    if query.format.as_deref() == Some("text") {
        return Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(receipt.render_text()));
    }

    Ok(HttpResponse::Ok().json(receipt))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/enrollments/{enrollment_id}/payments")
            .route(web::post().to(submit_payment))
            .route(web::get().to(list_payments)),
    )
    .route("/payments/{payment_id}/receipt", web::get().to(get_receipt));
}

// HTTP handler for provider confirmations
//
// Endpoints:
// - POST /payments/callback
//
// The body is read raw so the signature covers exactly the bytes received.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::middleware::RequestIdValue;
use crate::modules::payments::{
    models::{AllocationResult, CallbackOutcome, ProviderCallback},
    services::{CallbackVerifier, PaymentService},
};

pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Response for POST /payments/callback
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallbackResponse {
    Applied(AllocationResult),
    Duplicate(AllocationResult),
}

impl From<CallbackOutcome> for CallbackResponse {
    fn from(outcome: CallbackOutcome) -> Self {
        match outcome {
            CallbackOutcome::Applied(result) => Self::Applied(result),
            CallbackOutcome::Duplicate(result) => Self::Duplicate(result),
        }
    }
}

/// POST /payments/callback
///
/// # Headers
/// * `X-Signature` - hex HMAC-SHA256 of the raw body
///
/// # Returns
/// - 200: Callback applied or already applied
/// - 400: Body is not a valid callback
/// - 401: Missing or invalid signature
/// - 404: Unknown payment reference
/// - 409: Payment already carries a different verdict
pub async fn provider_callback(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<CallbackVerifier>,
    service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing X-Signature header"))?;

    let request_id = RequestIdValue::of(&req).unwrap_or_default();

    if let Err(e) = verifier.verify(signature, &body) {
        warn!(request_id = request_id.as_str(), error = %e, "Rejected provider callback");
        return Err(e);
    }

    let callback: ProviderCallback = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid callback payload: {}", e)))?;

    info!(
        request_id = request_id.as_str(),
        enrollment_id = callback.enrollment_id.as_str(),
        reference = callback.reference.as_str(),
        status = ?callback.status,
        "Received provider callback"
    );

    let outcome = service.handle_provider_callback(callback).await?;

    Ok(HttpResponse::Ok().json(CallbackResponse::from(outcome)))
}

/// Configure callback route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/payments/callback", web::post().to(provider_callback));
}

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use super::currency::MinorUnits;

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Reasons the allocator refuses to place a payment on the fee plan.
///
/// Every variant is produced before anything is written to the ledger.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Tranche {index} does not exist in the fee plan")]
    InvalidTarget { index: usize },

    #[error("Amount {requested} exceeds the outstanding balance {outstanding} of tranche {index}")]
    ExceedsTrancheBalance {
        index: usize,
        requested: MinorUnits,
        outstanding: MinorUnits,
    },

    #[error("Amount {requested} exceeds the total outstanding balance {outstanding}")]
    ExceedsTotalOutstanding {
        requested: MinorUnits,
        outstanding: MinorUnits,
    },

    /// Nothing left to pay on the target. Callers treat this as a no-op.
    #[error("Nothing left to pay on this target")]
    AlreadySettled,
}

impl AllocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationError::InvalidAmount(_) => "invalid_amount",
            AllocationError::InvalidTarget { .. } => "invalid_target",
            AllocationError::ExceedsTrancheBalance { .. } => "exceeds_tranche_balance",
            AllocationError::ExceedsTotalOutstanding { .. } => "exceeds_total_outstanding",
            AllocationError::AlreadySettled => "already_settled",
        }
    }
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed input that is not an allocation decision
    #[error("Validation error: {0}")]
    Validation(String),

    /// No active enrollment; the family must contact the school administration
    #[error("Enrollment required: {0}")]
    EnrollmentRequired(String),

    /// Allocation refused by the allocator
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Idempotency key reuse or a concurrent ledger change
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment provider could not be reached or answered unexpectedly
    #[error("Payment provider failure: {0}")]
    PaymentProvider(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Callback signature rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn enrollment_required(msg: impl Into<String>) -> Self {
        AppError::EnrollmentRequired(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Stable machine-readable error kind for API clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::EnrollmentRequired(_) => "enrollment_required",
            AppError::Allocation(e) => e.kind(),
            AppError::Conflict(_) => "conflict",
            AppError::PaymentProvider(_) => "payment_provider_failure",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) | AppError::Migration(_) => "database",
            AppError::Configuration(_) => "configuration",
            AppError::Json(_) => "invalid_json",
            AppError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Storage details stay in the logs
        let message = match self {
            AppError::Database(_) | AppError::Migration(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed with server error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "code": status_code.as_u16(),
                "kind": self.kind(),
                "message": message,
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::EnrollmentRequired(_) => StatusCode::FORBIDDEN,
            AppError::Allocation(e) => match e {
                AllocationError::InvalidAmount(_) | AllocationError::InvalidTarget { .. } => {
                    StatusCode::BAD_REQUEST
                }
                AllocationError::ExceedsTrancheBalance { .. }
                | AllocationError::ExceedsTotalOutstanding { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AllocationError::AlreadySettled => StatusCode::CONFLICT,
            },
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

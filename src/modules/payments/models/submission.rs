use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, MinorUnits, Result};
use crate::modules::ledger::models::{
    AllocationTarget, Payment, PaymentMethod, PaymentStatus, TrancheAllocation,
};

/// Body of `POST /enrollments/{id}/payments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPaymentRequest {
    /// Client idempotency key
    pub reference: String,
    pub amount: MinorUnits,
    /// Defaults to the plan currency; a mismatch is rejected
    #[serde(default)]
    pub currency: Option<Currency>,
    pub target: AllocationTarget,
    pub method: PaymentMethod,
}

impl SubmitPaymentRequest {
    pub fn validate(&self) -> Result<()> {
        let reference = self.reference.trim();
        if reference.is_empty() {
            return Err(AppError::validation("reference is required"));
        }
        if reference.len() > 128 {
            return Err(AppError::validation("reference must be at most 128 characters"));
        }
        Ok(())
    }

    /// Whether a recorded entry was created from the same arguments
    pub fn matches(&self, payment: &Payment) -> bool {
        payment.amount == self.amount
            && payment.target == self.target
            && payment.method == self.method
            && self.currency.map_or(true, |c| c == payment.currency)
    }
}

/// Outcome of a submission as returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    pub payment_id: String,
    pub reference: String,
    pub enrollment_id: String,
    pub status: PaymentStatus,
    pub requested_amount: MinorUnits,
    pub applied_amount: MinorUnits,
    /// Part of the request not placed on any tranche (never charged)
    pub unapplied_amount: MinorUnits,
    pub currency: Currency,
    pub is_global: bool,
    pub allocation: Vec<TrancheAllocation>,
    pub failure_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<&Payment> for AllocationResult {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id.clone(),
            reference: payment.reference.clone(),
            enrollment_id: payment.enrollment_id.clone(),
            status: payment.status,
            requested_amount: payment.amount,
            applied_amount: payment.applied_amount(),
            unapplied_amount: payment.unapplied_amount(),
            currency: payment.currency,
            is_global: payment.is_global(),
            allocation: payment.allocation.clone(),
            failure_reason: payment.failure_reason.clone(),
            submitted_at: payment.submitted_at,
        }
    }
}

/// Result of `submit_payment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A ledger entry exists for the reference (new or replayed)
    Accepted(AllocationResult),
    /// Nothing outstanding where the payment was aimed; nothing was written
    AlreadySettled,
}

/// Terminal status reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Complete,
    Failed,
}

/// Body of `POST /payments/callback`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCallback {
    pub enrollment_id: String,
    pub reference: String,
    pub status: CallbackStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Result of applying a provider callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The pending entry was resolved
    Applied(AllocationResult),
    /// The entry already carried this verdict; nothing changed
    Duplicate(AllocationResult),
}

impl CallbackOutcome {
    pub fn result(&self) -> &AllocationResult {
        match self {
            Self::Applied(result) | Self::Duplicate(result) => result,
        }
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Currency, MinorUnits, Result};
use crate::modules::ledger::models::PaymentMethod;

/// Payment provider boundary (mobile money, card, bank).
///
/// Called after the pending entry is in the ledger. The provider sees only
/// the applied amount, so a clamped partial payment never charges the excess.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Request the charge for a recorded pending payment
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Charge data sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub payment_id: String,
    pub enrollment_id: String,
    pub reference: String,
    pub amount: MinorUnits,
    pub currency: Currency,
    pub method: PaymentMethod,
}

/// Provider answer to a charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Funds captured; the entry settles now
    Authorized,
    /// Provider refused; the entry becomes `failed`
    Declined { reason: String },
    /// Confirmation will arrive on `POST /payments/callback`
    Deferred,
}

/// Provider that authorizes every charge on the spot.
///
/// Fits counter payments (cash, bank slips) already verified by the bursar.
#[derive(Debug, Default, Clone)]
pub struct PreAuthorizedProvider;

#[async_trait]
impl PaymentProvider for PreAuthorizedProvider {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        tracing::debug!(
            payment_id = request.payment_id.as_str(),
            amount = request.amount,
            "Charge authorized at submission"
        );
        Ok(ChargeOutcome::Authorized)
    }

    fn name(&self) -> &str {
        "pre_authorized"
    }
}

/// Provider whose verdict always arrives later through the signed callback
#[derive(Debug, Default, Clone)]
pub struct CallbackProvider;

#[async_trait]
impl PaymentProvider for CallbackProvider {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        tracing::debug!(
            payment_id = request.payment_id.as_str(),
            reference = request.reference.as_str(),
            "Charge handed to provider; awaiting callback"
        );
        Ok(ChargeOutcome::Deferred)
    }

    fn name(&self) -> &str {
        "callback"
    }
}

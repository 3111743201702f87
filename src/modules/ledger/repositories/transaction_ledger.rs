use async_trait::async_trait;

use crate::core::Result;
use crate::modules::ledger::models::{Payment, PaymentResolution, Receipt};

/// Result of an append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The entry was written
    Appended(Payment),
    /// An entry with the same (enrollment_id, reference) already exists;
    /// nothing was written
    Existing(Payment),
}

impl AppendOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            Self::Appended(payment) | Self::Existing(payment) => payment,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            Self::Appended(payment) | Self::Existing(payment) => payment,
        }
    }
}

/// Append-only record of payment attempts.
///
/// Entries are never deleted and never re-allocated. The only mutation is the
/// one-time resolution of a `pending` entry.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Append a payment if the enrollment still holds `expected_entries` entries.
    ///
    /// The count is the optimistic-concurrency token: if another writer slipped
    /// an entry in since the caller read the history, the append fails with
    /// `Conflict` and the caller must re-read and re-allocate.
    /// A reference already recorded for the enrollment returns
    /// `AppendOutcome::Existing` without writing.
    async fn append(&self, payment: &Payment, expected_entries: usize) -> Result<AppendOutcome>;

    /// Look up an entry by its server-issued id
    async fn find_by_id(&self, payment_id: &str) -> Result<Option<Payment>>;

    /// Look up an entry by its client reference
    async fn find_by_reference(
        &self,
        enrollment_id: &str,
        reference: &str,
    ) -> Result<Option<Payment>>;

    /// Every entry for an enrollment, in submission order
    async fn history(&self, enrollment_id: &str) -> Result<Vec<Payment>>;

    /// Apply the provider verdict to a pending entry
    ///
    /// # Errors
    /// * `NotFound` - no such payment
    /// * `Conflict` - the payment is no longer pending
    async fn resolve(&self, payment_id: &str, resolution: PaymentResolution) -> Result<Payment>;

    /// Store a receipt; storing twice for the same payment returns the first one
    async fn save_receipt(&self, receipt: &Receipt) -> Result<Receipt>;

    /// Receipt previously issued for a payment
    async fn receipt_for(&self, payment_id: &str) -> Result<Option<Receipt>>;
}

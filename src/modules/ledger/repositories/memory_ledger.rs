use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::{AppendOutcome, TransactionLedger};
use crate::core::{AppError, Result};
use crate::modules::ledger::models::{Payment, PaymentResolution, Receipt};

#[derive(Default)]
struct LedgerState {
    payments: Vec<Payment>,
    by_id: HashMap<String, usize>,
    by_reference: HashMap<(String, String), usize>,
    entry_counts: HashMap<String, usize>,
    receipts: HashMap<String, Receipt>,
}

/// Process-local ledger (`LEDGER_BACKEND=memory`)
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all enrollments
    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn append(&self, payment: &Payment, expected_entries: usize) -> Result<AppendOutcome> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let key = (payment.enrollment_id.clone(), payment.reference.clone());
        if let Some(&position) = state.by_reference.get(&key) {
            return Ok(AppendOutcome::Existing(state.payments[position].clone()));
        }

        let current = state
            .entry_counts
            .get(&payment.enrollment_id)
            .copied()
            .unwrap_or(0);
        if current != expected_entries {
            return Err(AppError::conflict(format!(
                "Ledger for enrollment '{}' changed: expected {} entries, found {}",
                payment.enrollment_id, expected_entries, current
            )));
        }

        if state.by_id.contains_key(&payment.id) {
            return Err(AppError::internal(format!(
                "Payment id '{}' already recorded",
                payment.id
            )));
        }

        let position = state.payments.len();
        state.payments.push(payment.clone());
        state.by_id.insert(payment.id.clone(), position);
        state.by_reference.insert(key, position);
        state
            .entry_counts
            .insert(payment.enrollment_id.clone(), current + 1);

        Ok(AppendOutcome::Appended(payment.clone()))
    }

    async fn find_by_id(&self, payment_id: &str) -> Result<Option<Payment>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .by_id
            .get(payment_id)
            .map(|&position| state.payments[position].clone()))
    }

    async fn find_by_reference(
        &self,
        enrollment_id: &str,
        reference: &str,
    ) -> Result<Option<Payment>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let key = (enrollment_id.to_string(), reference.to_string());
        Ok(state
            .by_reference
            .get(&key)
            .map(|&position| state.payments[position].clone()))
    }

    async fn history(&self, enrollment_id: &str) -> Result<Vec<Payment>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .payments
            .iter()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    async fn resolve(&self, payment_id: &str, resolution: PaymentResolution) -> Result<Payment> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let position = *state
            .by_id
            .get(payment_id)
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        let payment = &mut state.payments[position];
        payment.resolve(resolution, Utc::now())?;

        Ok(payment.clone())
    }

    async fn save_receipt(&self, receipt: &Receipt) -> Result<Receipt> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let stored = state
            .receipts
            .entry(receipt.payment_id.clone())
            .or_insert_with(|| receipt.clone());
        Ok(stored.clone())
    }

    async fn receipt_for(&self, payment_id: &str) -> Result<Option<Receipt>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.receipts.get(payment_id).cloned())
    }
}

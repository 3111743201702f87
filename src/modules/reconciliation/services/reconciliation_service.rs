use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{BalanceCalculator, StatusReconciler};
use crate::core::{Result, SchoolClock};
use crate::modules::fee_plans::services::FeePlanResolver;
use crate::modules::ledger::repositories::TransactionLedger;
use crate::modules::reconciliation::models::{BalanceSummary, TrancheStatus};

/// Read side of the ledger: tranche statuses and balance summaries
#[derive(Clone)]
pub struct ReconciliationService {
    resolver: FeePlanResolver,
    ledger: Arc<dyn TransactionLedger>,
    clock: SchoolClock,
}

impl ReconciliationService {
    pub fn new(
        resolver: FeePlanResolver,
        ledger: Arc<dyn TransactionLedger>,
        clock: SchoolClock,
    ) -> Self {
        Self {
            resolver,
            ledger,
            clock,
        }
    }

    /// Status of every tranche for an active enrollment
    pub async fn tranches_status(&self, enrollment_id: &str) -> Result<BTreeMap<usize, TrancheStatus>> {
        let resolved = self.resolver.resolve_for_enrollment(enrollment_id).await?;
        let history = self.ledger.history(enrollment_id).await?;

        Ok(StatusReconciler::statuses(&resolved.plan, &history))
    }

    /// Balance summary for an active enrollment, evaluated at the school's today
    ///
    /// # Errors
    /// * `EnrollmentRequired` - enrollment is not active
    /// * `NotFound` - unknown enrollment or no published plan
    pub async fn summary(&self, enrollment_id: &str) -> Result<BalanceSummary> {
        let resolved = self.resolver.resolve_for_enrollment(enrollment_id).await?;
        let history = self.ledger.history(enrollment_id).await?;
        let today = self.clock.today();

        let summary = BalanceCalculator::summarize(enrollment_id, &resolved.plan, &history, today);

        debug!(
            enrollment_id = enrollment_id,
            total = summary.total,
            paid = summary.paid,
            remaining = summary.remaining,
            pending = summary.pending_payments,
            "Balance summary computed"
        );

        Ok(summary)
    }
}

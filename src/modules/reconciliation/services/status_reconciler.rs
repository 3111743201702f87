use std::collections::BTreeMap;

use tracing::warn;

use crate::core::MinorUnits;
use crate::modules::fee_plans::models::FeePlan;
use crate::modules::ledger::models::Payment;
use crate::modules::reconciliation::models::TrancheStatus;

/// Settled amount applied to one tranche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrancheApplied {
    pub index: usize,
    pub amount: MinorUnits,
    pub applied: MinorUnits,
}

impl TrancheApplied {
    pub fn status(&self) -> TrancheStatus {
        TrancheStatus::from_applied(self.applied, self.amount)
    }

    pub fn is_over_applied(&self) -> bool {
        self.applied > self.amount
    }
}

/// Derives tranche statuses from ledger history
pub struct StatusReconciler;

impl StatusReconciler {
    /// Settled amount per tranche, in index order.
    ///
    /// Only `complete` and `partial` entries count. Over-application is
    /// reported, not clamped.
    pub fn applied(plan: &FeePlan, history: &[Payment]) -> Vec<TrancheApplied> {
        plan.tranches()
            .iter()
            .map(|tranche| {
                let applied: MinorUnits = history
                    .iter()
                    .filter(|p| p.status.counts_as_paid())
                    .map(|p| p.applied_to(tranche.index))
                    .sum();

                let row = TrancheApplied {
                    index: tranche.index,
                    amount: tranche.amount,
                    applied,
                };

                if row.is_over_applied() {
                    warn!(
                        school_year_id = plan.school_year_id(),
                        tranche_index = tranche.index,
                        amount = tranche.amount,
                        applied = applied,
                        "Ledger applies more than the tranche amount"
                    );
                }

                row
            })
            .collect()
    }

    /// Status of every tranche keyed by index
    pub fn statuses(plan: &FeePlan, history: &[Payment]) -> BTreeMap<usize, TrancheStatus> {
        Self::applied(plan, history)
            .into_iter()
            .map(|row| (row.index, row.status()))
            .collect()
    }
}

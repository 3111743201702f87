use chrono::NaiveDate;
use tracing::warn;

use super::StatusReconciler;
use crate::core::MinorUnits;
use crate::modules::fee_plans::models::FeePlan;
use crate::modules::ledger::models::Payment;
use crate::modules::reconciliation::models::{BalanceSummary, TrancheBalance};

/// Computes balance summaries as a projection over the ledger
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Summarize an enrollment's balance as of `today` (school-local date)
    ///
    /// `total` comes from the plan alone. Pending entries count towards
    /// `reserved`, never `paid`, and `payable` applies the same rule as the
    /// allocator's outstanding balance. `paid` sums settled applications
    /// without capping; if it exceeds `total`, `remaining` is clamped to zero,
    /// the clamp is logged and `consistency_warning` is set.
    pub fn summarize(
        enrollment_id: &str,
        plan: &FeePlan,
        history: &[Payment],
        today: NaiveDate,
    ) -> BalanceSummary {
        let applied = StatusReconciler::applied(plan, history);
        let currency = plan.currency();

        let per_tranche: Vec<TrancheBalance> = plan
            .tranches()
            .iter()
            .zip(applied.iter())
            .map(|(tranche, row)| {
                let status = row.status();
                let outstanding = (tranche.amount - row.applied).max(0);
                let reserved: MinorUnits = history
                    .iter()
                    .filter(|p| p.status.is_pending())
                    .map(|p| p.applied_to(tranche.index))
                    .sum();
                TrancheBalance {
                    index: tranche.index,
                    name: tranche.name.clone(),
                    amount: tranche.amount,
                    paid: row.applied,
                    outstanding,
                    reserved,
                    payable: (outstanding - reserved).max(0),
                    status,
                    due_date: tranche.due_date,
                    is_mandatory: tranche.is_mandatory,
                    allows_partial: tranche.allows_partial,
                    overdue: tranche.is_past_due(today) && !status.is_complete(),
                }
            })
            .collect();

        let total = plan.total_due();
        let paid: MinorUnits = applied.iter().map(|row| row.applied).sum();
        let over_applied = applied.iter().any(|row| row.is_over_applied());

        let remaining = if paid > total {
            warn!(
                enrollment_id = enrollment_id,
                total = total,
                paid = paid,
                "Paid exceeds total due; remaining clamped to zero"
            );
            0
        } else {
            total - paid
        };

        let next_due_index = per_tranche
            .iter()
            .find(|row| !row.status.is_complete())
            .map(|row| row.index);

        let reserved = per_tranche.iter().map(|row| row.reserved).sum();
        let payable = per_tranche.iter().map(|row| row.payable).sum();

        let pending_payments = history.iter().filter(|p| p.status.is_pending()).count();

        BalanceSummary {
            enrollment_id: enrollment_id.to_string(),
            school_year_id: plan.school_year_id().to_string(),
            currency,
            total,
            paid,
            remaining,
            reserved,
            payable,
            display_total: currency.format_amount(total),
            display_paid: currency.format_amount(paid),
            display_remaining: currency.format_amount(remaining),
            per_tranche,
            next_due_index,
            pending_payments,
            consistency_warning: paid > total || over_applied,
            as_of: today,
        }
    }
}

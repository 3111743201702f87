use chrono::NaiveDate;
use serde::Serialize;

use super::TrancheStatus;
use crate::core::{Currency, MinorUnits};

/// One row of the balance summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrancheBalance {
    pub index: usize,
    pub name: String,
    pub amount: MinorUnits,
    /// Settled amount applied to this tranche
    pub paid: MinorUnits,
    pub outstanding: MinorUnits,
    /// Held by pending payments awaiting a provider verdict
    pub reserved: MinorUnits,
    /// What a new payment can still be allocated: outstanding less reserved
    pub payable: MinorUnits,
    pub status: TrancheStatus,
    pub due_date: NaiveDate,
    pub is_mandatory: bool,
    pub allows_partial: bool,
    /// Due date has passed and the tranche is not complete
    pub overdue: bool,
}

/// Balance of an enrollment at a point in time.
///
/// Computed on every request from the fee plan and the ledger; nothing here
/// is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    pub enrollment_id: String,
    pub school_year_id: String,
    pub currency: Currency,
    /// Sum of tranche amounts; independent of payments
    pub total: MinorUnits,
    /// Sum of settled amounts applied
    pub paid: MinorUnits,
    /// `max(total - paid, 0)`
    pub remaining: MinorUnits,
    /// Sum of per-tranche reservations held by pending payments
    pub reserved: MinorUnits,
    /// Largest global payment the allocator accepts right now
    pub payable: MinorUnits,
    pub display_total: String,
    pub display_paid: String,
    pub display_remaining: String,
    pub per_tranche: Vec<TrancheBalance>,
    /// First tranche that is not complete
    pub next_due_index: Option<usize>,
    /// Entries still waiting for a provider verdict
    pub pending_payments: usize,
    /// Set when the ledger applies more to a tranche than its amount, or more
    /// in total than the plan is worth
    pub consistency_warning: bool,
    pub as_of: NaiveDate,
}

impl BalanceSummary {
    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }
}

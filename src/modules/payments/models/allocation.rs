use serde::Serialize;

use crate::core::MinorUnits;
use crate::modules::ledger::models::{AllocationTarget, PaymentStatus, TrancheAllocation};

/// What is still open on one tranche before a new payment is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrancheOutstanding {
    pub index: usize,
    pub outstanding: MinorUnits,
    pub allows_partial: bool,
}

/// Placement computed for a new payment, before anything is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub target: AllocationTarget,
    pub requested: MinorUnits,
    pub lines: Vec<TrancheAllocation>,
    /// Status the entry settles to: `partial` when part of the request was
    /// clamped away, `complete` otherwise
    pub settles_as: PaymentStatus,
}

impl Allocation {
    pub fn applied(&self) -> MinorUnits {
        self.lines.iter().map(|l| l.amount_applied).sum()
    }

    pub fn unapplied(&self) -> MinorUnits {
        self.requested - self.applied()
    }
}

use tracing::debug;

use crate::core::{AllocationError, MinorUnits};
use crate::modules::fee_plans::models::FeePlan;
use crate::modules::ledger::models::{AllocationTarget, Payment, PaymentStatus, TrancheAllocation};
use crate::modules::payments::models::{Allocation, TrancheOutstanding};

/// Places a payment on the fee plan's tranches.
///
/// Pure: no I/O, no clock. The caller holds the enrollment lock between
/// reading the ledger and appending the result.
pub struct PaymentAllocator;

impl PaymentAllocator {
    /// Outstanding balance of every tranche, in index order.
    ///
    /// Entries that reserve balance (`pending`, `partial`, `complete`) are
    /// subtracted; `failed` entries are ignored. Entries for other
    /// enrollments must already be filtered out by the caller.
    pub fn outstanding(plan: &FeePlan, history: &[Payment]) -> Vec<TrancheOutstanding> {
        plan.tranches()
            .iter()
            .map(|tranche| {
                let reserved: MinorUnits = history
                    .iter()
                    .filter(|p| p.status.reserves_balance())
                    .map(|p| p.applied_to(tranche.index))
                    .sum();

                TrancheOutstanding {
                    index: tranche.index,
                    outstanding: (tranche.amount - reserved).max(0),
                    allows_partial: tranche.allows_partial,
                }
            })
            .collect()
    }

    /// Compute the allocation of `requested` against `outstanding`
    ///
    /// # Errors
    /// * `InvalidAmount` - requested amount is zero or negative
    /// * `InvalidTarget` - targeted tranche does not exist
    /// * `AlreadySettled` - nothing outstanding where the payment is aimed
    /// * `ExceedsTrancheBalance` - targeted overpayment on a tranche without partial payments
    /// * `ExceedsTotalOutstanding` - global payment larger than everything still due
    pub fn allocate(
        outstanding: &[TrancheOutstanding],
        requested: MinorUnits,
        target: AllocationTarget,
    ) -> Result<Allocation, AllocationError> {
        if requested <= 0 {
            return Err(AllocationError::InvalidAmount(format!(
                "amount must be positive, got {}",
                requested
            )));
        }

        let allocation = match target {
            AllocationTarget::Global => Self::allocate_global(outstanding, requested)?,
            AllocationTarget::Tranche { index } => {
                Self::allocate_targeted(outstanding, requested, index)?
            }
        };

        debug!(
            requested = requested,
            applied = allocation.applied(),
            lines = allocation.lines.len(),
            is_global = target.is_global(),
            "Payment allocated"
        );

        Ok(allocation)
    }

    fn allocate_global(
        outstanding: &[TrancheOutstanding],
        requested: MinorUnits,
    ) -> Result<Allocation, AllocationError> {
        let total_outstanding: MinorUnits = outstanding.iter().map(|t| t.outstanding).sum();

        if total_outstanding == 0 {
            return Err(AllocationError::AlreadySettled);
        }

        if requested > total_outstanding {
            return Err(AllocationError::ExceedsTotalOutstanding {
                requested,
                outstanding: total_outstanding,
            });
        }

        let mut remaining = requested;
        let mut lines = Vec::new();
        for tranche in outstanding {
            if remaining == 0 {
                break;
            }
            let applied = remaining.min(tranche.outstanding);
            if applied > 0 {
                lines.push(TrancheAllocation {
                    tranche_index: tranche.index,
                    amount_applied: applied,
                });
                remaining -= applied;
            }
        }

        Ok(Allocation {
            target: AllocationTarget::Global,
            requested,
            lines,
            settles_as: PaymentStatus::Complete,
        })
    }

    fn allocate_targeted(
        outstanding: &[TrancheOutstanding],
        requested: MinorUnits,
        index: usize,
    ) -> Result<Allocation, AllocationError> {
        let tranche = outstanding
            .iter()
            .find(|t| t.index == index)
            .ok_or(AllocationError::InvalidTarget { index })?;

        if tranche.outstanding == 0 {
            return Err(AllocationError::AlreadySettled);
        }

        let (applied, settles_as) = if requested <= tranche.outstanding {
            (requested, PaymentStatus::Complete)
        } else if tranche.allows_partial {
            (tranche.outstanding, PaymentStatus::Partial)
        } else {
            return Err(AllocationError::ExceedsTrancheBalance {
                index,
                requested,
                outstanding: tranche.outstanding,
            });
        };

        Ok(Allocation {
            target: AllocationTarget::Tranche { index },
            requested,
            lines: vec![TrancheAllocation {
                tranche_index: index,
                amount_applied: applied,
            }],
            settles_as,
        })
    }
}

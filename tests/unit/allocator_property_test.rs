// Property-based and scenario tests for the payment allocator

use proptest::prelude::*;
use tuition_ledger::core::{AllocationError, MinorUnits};
use tuition_ledger::ledger::{AllocationTarget, PaymentStatus};
use tuition_ledger::payments::{PaymentAllocator, TrancheOutstanding};

fn open(amounts: &[MinorUnits]) -> Vec<TrancheOutstanding> {
    amounts
        .iter()
        .enumerate()
        .map(|(index, &outstanding)| TrancheOutstanding {
            index,
            outstanding,
            allows_partial: false,
        })
        .collect()
}

fn with_partial(mut tranches: Vec<TrancheOutstanding>, index: usize) -> Vec<TrancheOutstanding> {
    tranches[index].allows_partial = true;
    tranches
}

/// Global 120 on [100, 150] fills T0 and leaves T1 partially paid
#[test]
fn test_global_payment_fills_earliest_tranche_first() {
    let allocation =
        PaymentAllocator::allocate(&open(&[100, 150]), 120, AllocationTarget::Global).unwrap();

    let lines: Vec<(usize, MinorUnits)> = allocation
        .lines
        .iter()
        .map(|l| (l.tranche_index, l.amount_applied))
        .collect();
    assert_eq!(lines, vec![(0, 100), (1, 20)]);
    assert_eq!(allocation.settles_as, PaymentStatus::Complete);
    assert_eq!(allocation.unapplied(), 0);
}

/// T0=100 with 50 applied: targeted 80 is rejected without partial payments
#[test]
fn test_targeted_overflow_rejected() {
    let err = PaymentAllocator::allocate(
        &open(&[50, 150]),
        80,
        AllocationTarget::Tranche { index: 0 },
    )
    .unwrap_err();

    assert_eq!(
        err,
        AllocationError::ExceedsTrancheBalance {
            index: 0,
            requested: 80,
            outstanding: 50,
        }
    );
}

/// Same situation with partial payments allowed: 50 applied, entry settles as partial
#[test]
fn test_targeted_overflow_clamped_when_partial_allowed() {
    let allocation = PaymentAllocator::allocate(
        &with_partial(open(&[50, 150]), 0),
        80,
        AllocationTarget::Tranche { index: 0 },
    )
    .unwrap();

    assert_eq!(allocation.applied(), 50);
    assert_eq!(allocation.unapplied(), 30);
    assert_eq!(allocation.settles_as, PaymentStatus::Partial);
}

#[test]
fn test_full_settlement_then_already_settled() {
    let allocation =
        PaymentAllocator::allocate(&open(&[100, 150]), 250, AllocationTarget::Global).unwrap();
    assert_eq!(allocation.applied(), 250);

    for target in [
        AllocationTarget::Global,
        AllocationTarget::Tranche { index: 0 },
        AllocationTarget::Tranche { index: 1 },
    ] {
        let err = PaymentAllocator::allocate(&open(&[0, 0]), 1, target).unwrap_err();
        assert_eq!(err, AllocationError::AlreadySettled);
    }
}

#[test]
fn test_global_excess_rejected_not_credited() {
    let err =
        PaymentAllocator::allocate(&open(&[100, 150]), 251, AllocationTarget::Global).unwrap_err();
    assert_eq!(
        err,
        AllocationError::ExceedsTotalOutstanding {
            requested: 251,
            outstanding: 250,
        }
    );
}

#[test]
fn test_invalid_amount_checked_before_anything_else() {
    for amount in [0, -1, MinorUnits::MIN] {
        // Even on a settled plan or a missing tranche
        let settled = PaymentAllocator::allocate(&open(&[0]), amount, AllocationTarget::Global);
        assert!(matches!(settled, Err(AllocationError::InvalidAmount(_))));

        let missing = PaymentAllocator::allocate(
            &open(&[100]),
            amount,
            AllocationTarget::Tranche { index: 9 },
        );
        assert!(matches!(missing, Err(AllocationError::InvalidAmount(_))));
    }
}

#[test]
fn test_unknown_tranche_is_invalid_target() {
    let err = PaymentAllocator::allocate(
        &open(&[100, 150]),
        10,
        AllocationTarget::Tranche { index: 2 },
    )
    .unwrap_err();
    assert_eq!(err, AllocationError::InvalidTarget { index: 2 });
}

#[test]
fn test_global_skips_settled_tranches() {
    let allocation =
        PaymentAllocator::allocate(&open(&[0, 40, 60]), 50, AllocationTarget::Global).unwrap();

    let indices: Vec<usize> = allocation.lines.iter().map(|l| l.tranche_index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(allocation.lines[0].amount_applied, 40);
    assert_eq!(allocation.lines[1].amount_applied, 10);
}

fn outstanding_strategy() -> impl Strategy<Value = Vec<TrancheOutstanding>> {
    prop::collection::vec((0i64..10_000, any::<bool>()), 1..8).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (outstanding, allows_partial))| TrancheOutstanding {
                index,
                outstanding,
                allows_partial,
            })
            .collect()
    })
}

proptest! {
    /// Property: no tranche ever receives more than it has outstanding
    #[test]
    fn prop_no_over_allocation(
        outstanding in outstanding_strategy(),
        requested in 1i64..100_000,
        target_index in 0usize..10,
        global in any::<bool>(),
    ) {
        let target = if global {
            AllocationTarget::Global
        } else {
            AllocationTarget::Tranche { index: target_index }
        };

        if let Ok(allocation) = PaymentAllocator::allocate(&outstanding, requested, target) {
            for line in &allocation.lines {
                let tranche = &outstanding[line.tranche_index];
                prop_assert!(line.amount_applied > 0);
                prop_assert!(line.amount_applied <= tranche.outstanding);
            }
            prop_assert!(allocation.applied() <= requested);
            prop_assert!(allocation.unapplied() >= 0);
        }
    }

    /// Property: an accepted global payment is applied in full, in index order
    #[test]
    fn prop_global_applies_everything_in_order(
        outstanding in outstanding_strategy(),
        requested in 1i64..100_000,
    ) {
        let total: MinorUnits = outstanding.iter().map(|t| t.outstanding).sum();

        match PaymentAllocator::allocate(&outstanding, requested, AllocationTarget::Global) {
            Ok(allocation) => {
                prop_assert!(requested <= total);
                prop_assert_eq!(allocation.applied(), requested);
                prop_assert_eq!(allocation.settles_as, PaymentStatus::Complete);

                let indices: Vec<usize> =
                    allocation.lines.iter().map(|l| l.tranche_index).collect();
                let mut sorted = indices.clone();
                sorted.sort_unstable();
                sorted.dedup();
                prop_assert_eq!(&indices, &sorted);

                // Every tranche before the last touched one is fully covered
                if let Some(last) = allocation.lines.last() {
                    for tranche in outstanding.iter().take(last.tranche_index) {
                        let applied = allocation
                            .lines
                            .iter()
                            .find(|l| l.tranche_index == tranche.index)
                            .map_or(0, |l| l.amount_applied);
                        prop_assert_eq!(applied, tranche.outstanding);
                    }
                }
            }
            Err(AllocationError::AlreadySettled) => prop_assert_eq!(total, 0),
            Err(AllocationError::ExceedsTotalOutstanding { outstanding: reported, .. }) => {
                prop_assert!(requested > total);
                prop_assert_eq!(reported, total);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Property: applying accepted payments one after another never drives
    /// any tranche below zero, and the amount still due only shrinks by what
    /// was applied
    #[test]
    fn prop_remaining_never_negative(
        amounts in prop::collection::vec(1i64..5_000, 1..6),
        payments in prop::collection::vec((1i64..8_000, prop::option::of(0usize..6)), 1..20),
    ) {
        let total: MinorUnits = amounts.iter().sum();
        let mut outstanding = open(&amounts);
        let mut paid: MinorUnits = 0;

        for (requested, index) in payments {
            let target = match index {
                Some(index) => AllocationTarget::Tranche { index },
                None => AllocationTarget::Global,
            };
            if let Ok(allocation) = PaymentAllocator::allocate(&outstanding, requested, target) {
                for line in &allocation.lines {
                    outstanding[line.tranche_index].outstanding -= line.amount_applied;
                }
                paid += allocation.applied();
            }

            prop_assert!(outstanding.iter().all(|t| t.outstanding >= 0));
            let remaining: MinorUnits = outstanding.iter().map(|t| t.outstanding).sum();
            prop_assert_eq!(remaining, total - paid);
            prop_assert!(paid <= total);
        }
    }

    /// Property: a targeted payment touches only its tranche
    #[test]
    fn prop_targeted_touches_single_tranche(
        outstanding in outstanding_strategy(),
        requested in 1i64..20_000,
        index in 0usize..8,
    ) {
        let result = PaymentAllocator::allocate(
            &outstanding,
            requested,
            AllocationTarget::Tranche { index },
        );

        match result {
            Ok(allocation) => {
                prop_assert_eq!(allocation.lines.len(), 1);
                prop_assert_eq!(allocation.lines[0].tranche_index, index);
                let expected = if allocation.settles_as == PaymentStatus::Partial {
                    outstanding[index].outstanding
                } else {
                    requested
                };
                prop_assert_eq!(allocation.applied(), expected);
            }
            Err(AllocationError::InvalidTarget { .. }) => prop_assert!(index >= outstanding.len()),
            Err(AllocationError::AlreadySettled) => {
                prop_assert_eq!(outstanding[index].outstanding, 0)
            }
            Err(AllocationError::ExceedsTrancheBalance { .. }) => {
                prop_assert!(!outstanding[index].allows_partial);
                prop_assert!(requested > outstanding[index].outstanding);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}

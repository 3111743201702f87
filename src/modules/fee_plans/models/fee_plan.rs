use serde::Serialize;

use super::{Enrollment, Tranche};
use crate::core::{AppError, Currency, MinorUnits, Result};

/// Ordered set of tranches for one school year.
///
/// Construction is the only way in, so a `FeePlan` value always satisfies:
/// at least one tranche, indices contiguous from 0, positive amounts, a single
/// currency and a total that fits in `MinorUnits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeePlan {
    school_year_id: String,
    currency: Currency,
    total_due: MinorUnits,
    tranches: Vec<Tranche>,
}

impl FeePlan {
    pub fn new(school_year_id: impl Into<String>, mut tranches: Vec<Tranche>) -> Result<Self> {
        let school_year_id = school_year_id.into();

        let Some(first) = tranches.first() else {
            return Err(AppError::validation(format!(
                "Fee plan for school year '{}' has no tranches",
                school_year_id
            )));
        };
        let currency = first.currency;

        tranches.sort_by_key(|t| t.index);

        let mut total_due: MinorUnits = 0;
        for (position, tranche) in tranches.iter().enumerate() {
            if tranche.index != position {
                return Err(AppError::validation(format!(
                    "Fee plan for '{}' has non-contiguous tranche indices: expected {}, found {}",
                    school_year_id, position, tranche.index
                )));
            }

            tranche.validate()?;

            if tranche.currency != currency {
                return Err(AppError::validation(format!(
                    "Fee plan for '{}' mixes currencies ({} and {})",
                    school_year_id, currency, tranche.currency
                )));
            }

            total_due = total_due.checked_add(tranche.amount).ok_or_else(|| {
                AppError::validation(format!("Fee plan total for '{}' overflows", school_year_id))
            })?;
        }

        Ok(Self {
            school_year_id,
            currency,
            total_due,
            tranches,
        })
    }

    pub fn school_year_id(&self) -> &str {
        &self.school_year_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Fixed total for the year; never depends on payment history
    pub fn total_due(&self) -> MinorUnits {
        self.total_due
    }

    /// Tranches in payment order
    pub fn tranches(&self) -> &[Tranche] {
        &self.tranches
    }

    pub fn tranche(&self, index: usize) -> Option<&Tranche> {
        self.tranches.get(index)
    }

    pub fn len(&self) -> usize {
        self.tranches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tranches.is_empty()
    }
}

/// Active enrollment together with the plan it pays against
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFeePlan {
    pub enrollment: Enrollment,
    pub plan: FeePlan,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, MinorUnits, Result};

/// One installment of a school year's tuition.
///
/// Identity is `(school_year_id, index)`; `index` also fixes payment order,
/// earliest obligation first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tranche {
    /// 0-based position in the fee plan
    pub index: usize,
    pub name: String,
    /// Amount due in minor units (always positive)
    pub amount: MinorUnits,
    pub currency: Currency,
    pub due_date: NaiveDate,
    pub is_mandatory: bool,
    /// A targeted payment larger than the outstanding balance is clamped
    /// instead of rejected
    pub allows_partial: bool,
}

impl Tranche {
    pub fn new(
        index: usize,
        name: impl Into<String>,
        amount: MinorUnits,
        currency: Currency,
        due_date: NaiveDate,
    ) -> Result<Self> {
        let tranche = Self {
            index,
            name: name.into(),
            amount,
            currency,
            due_date,
            is_mandatory: true,
            allows_partial: false,
        };
        tranche.validate()?;
        Ok(tranche)
    }

    pub fn with_partial_payments(mut self, allows_partial: bool) -> Self {
        self.allows_partial = allows_partial;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_mandatory = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0 {
            return Err(AppError::validation(format!(
                "Tranche {} amount must be positive, got {}",
                self.index, self.amount
            )));
        }

        if self.name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Tranche {} must have a name",
                self.index
            )));
        }

        Ok(())
    }

    /// Check if the due date is strictly before `today`
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.due_date < today
    }
}

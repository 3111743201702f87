use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, MinorUnits, Result};

/// Ledger status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded and allocated, waiting for the provider's verdict
    Pending,
    /// Settled, but only part of the requested amount could be applied
    Partial,
    /// Settled with the full requested amount applied
    Complete,
    /// Refused by the provider; kept for audit, applies nothing
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Settled statuses count toward "paid"
    pub fn counts_as_paid(&self) -> bool {
        matches!(self, Self::Partial | Self::Complete)
    }

    /// Statuses whose allocation is unavailable to later payments.
    ///
    /// A pending entry holds its allocation until the provider answers, so a
    /// sibling payment can never claim the same balance.
    pub fn reserves_balance(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// How the family paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    Card,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MobileMoney => "mobile_money",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Cash => "cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mobile_money" => Ok(Self::MobileMoney),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cash" => Ok(Self::Cash),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// Where a payment should go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationTarget {
    /// Spread over outstanding tranches, earliest first
    Global,
    /// Apply to one tranche only
    Tranche { index: usize },
}

impl AllocationTarget {
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    pub fn tranche_index(&self) -> Option<usize> {
        match self {
            Self::Global => None,
            Self::Tranche { index } => Some(*index),
        }
    }
}

/// Amount a payment applied to one tranche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheAllocation {
    pub tranche_index: usize,
    pub amount_applied: MinorUnits,
}

/// Provider verdict applied to a pending entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResolution {
    /// Charge authorized; status becomes `complete` or `partial`
    Settled,
    /// Charge refused; status becomes `failed`
    Failed { reason: String },
}

/// Immutable ledger entry for one payment attempt.
///
/// The allocation is computed once, before the entry is written, and is never
/// recomputed. The only permitted change is the single `pending` resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Server-issued id (UUID)
    pub id: String,
    /// Client idempotency key, unique per enrollment
    pub reference: String,
    pub enrollment_id: String,
    /// Amount the family asked to pay
    pub amount: MinorUnits,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub target: AllocationTarget,
    pub allocation: Vec<TrancheAllocation>,
    pub status: PaymentStatus,
    pub failure_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Create a pending entry with a precomputed allocation
    pub fn pending(
        reference: String,
        enrollment_id: String,
        amount: MinorUnits,
        currency: Currency,
        method: PaymentMethod,
        target: AllocationTarget,
        allocation: Vec<TrancheAllocation>,
    ) -> Result<Self> {
        if reference.trim().is_empty() {
            return Err(AppError::validation("Payment reference cannot be empty"));
        }

        if enrollment_id.trim().is_empty() {
            return Err(AppError::validation("Enrollment ID cannot be empty"));
        }

        currency.validate_amount(amount).map_err(AppError::Validation)?;

        if allocation.is_empty() || allocation.iter().any(|a| a.amount_applied <= 0) {
            return Err(AppError::internal(
                "Payment allocation must apply a positive amount to at least one tranche",
            ));
        }

        let applied: MinorUnits = allocation.iter().map(|a| a.amount_applied).sum();
        if applied > amount {
            return Err(AppError::internal(format!(
                "Allocation applies {} but only {} was paid",
                applied, amount
            )));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            reference,
            enrollment_id,
            amount,
            currency,
            method,
            target,
            allocation,
            status: PaymentStatus::Pending,
            failure_reason: None,
            submitted_at: Utc::now(),
            resolved_at: None,
        })
    }

    pub fn is_global(&self) -> bool {
        self.target.is_global()
    }

    /// Total placed on tranches
    pub fn applied_amount(&self) -> MinorUnits {
        self.allocation.iter().map(|a| a.amount_applied).sum()
    }

    /// Part of the requested amount the allocator refused to place
    pub fn unapplied_amount(&self) -> MinorUnits {
        self.amount - self.applied_amount()
    }

    /// Amount this entry applies to a tranche
    pub fn applied_to(&self, tranche_index: usize) -> MinorUnits {
        self.allocation
            .iter()
            .filter(|a| a.tranche_index == tranche_index)
            .map(|a| a.amount_applied)
            .sum()
    }

    /// Status a successful settlement lands on
    pub fn settled_status(&self) -> PaymentStatus {
        if self.applied_amount() < self.amount {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Complete
        }
    }

    /// Apply the provider verdict; only a pending entry may change, and only once
    pub fn resolve(&mut self, resolution: PaymentResolution, at: DateTime<Utc>) -> Result<()> {
        if !self.status.is_pending() {
            return Err(AppError::conflict(format!(
                "Payment '{}' is already {} and cannot change",
                self.reference, self.status
            )));
        }

        match resolution {
            PaymentResolution::Settled => {
                self.status = self.settled_status();
            }
            PaymentResolution::Failed { reason } => {
                self.status = PaymentStatus::Failed;
                self.failure_reason = Some(reason);
            }
        }
        self.resolved_at = Some(at);

        Ok(())
    }
}

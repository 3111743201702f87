use serde::{Deserialize, Serialize};

use crate::core::MinorUnits;

/// Settlement state of a tranche, always derived from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrancheStatus {
    Unpaid,
    Partial,
    Complete,
}

impl TrancheStatus {
    /// Status from the settled amount applied to a tranche of `amount`
    pub fn from_applied(applied: MinorUnits, amount: MinorUnits) -> Self {
        if applied <= 0 {
            Self::Unpaid
        } else if applied >= amount {
            Self::Complete
        } else {
            Self::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Complete => "complete",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for TrancheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

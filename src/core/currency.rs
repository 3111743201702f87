use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount expressed in the currency's smallest unit (centimes, cents).
///
/// Every stored and transmitted amount uses this type; floating point never
/// touches money.
pub type MinorUnits = i64;

/// Supported tuition currencies with their minor-unit precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// West African CFA franc (no minor unit in practice)
    XOF,
    /// Central African CFA franc (no minor unit in practice)
    XAF,
    /// Euro (2 decimal places)
    EUR,
    /// US Dollar (2 decimal places)
    USD,
}

impl Currency {
    /// Number of decimal places between the major and minor unit
    /// - XOF/XAF: 0
    /// - EUR/USD: 2
    pub fn scale(&self) -> u32 {
        match self {
            Currency::XOF | Currency::XAF => 0,
            Currency::EUR | Currency::USD => 2,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::XOF => "XOF",
            Currency::XAF => "XAF",
            Currency::EUR => "EUR",
            Currency::USD => "USD",
        }
    }

    /// Converts a minor-unit amount to an exact major-unit decimal for display
    pub fn to_major(&self, amount: MinorUnits) -> Decimal {
        Decimal::new(amount, self.scale())
    }

    /// Validates that an amount can be charged in this currency
    pub fn validate_amount(&self, amount: MinorUnits) -> Result<(), String> {
        if amount <= 0 {
            return Err(format!(
                "{} amount must be a positive number of minor units, got {}",
                self, amount
            ));
        }

        Ok(())
    }

    /// Formats a minor-unit amount with the correct number of decimal places
    pub fn format_amount(&self, amount: MinorUnits) -> String {
        let scale = self.scale();
        let major = self.to_major(amount);
        if scale == 0 {
            format!("{} {}", self, major)
        } else {
            format!("{} {:.width$}", self, major, width = scale as usize)
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "XOF" => Ok(Currency::XOF),
            "XAF" => Ok(Currency::XAF),
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for Currency {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A monetary amount carried as an exact decimal.
///
/// Provider APIs exchange amounts as decimal strings; floating point is never
/// used anywhere in the conversion path. Serializes as a string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

// Deserialization funnels through the same non-negativity check as parsing.
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

impl Amount {
    /// Parse an amount from a decimal string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| CoreError::InvalidAmount(format!("{s:?}: {e}")))?;
        if value.is_sign_negative() {
            return Err(CoreError::InvalidAmount(format!(
                "amount must not be negative: {s}"
            )));
        }
        Ok(Self(value))
    }

    /// Wrap an already-validated decimal.
    pub fn from_decimal(value: Decimal) -> Result<Self, CoreError> {
        if value.is_sign_negative() {
            return Err(CoreError::InvalidAmount(format!(
                "amount must not be negative: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// The underlying exact decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by an exchange rate, producing the converted amount.
    pub fn convert(&self, rate: Decimal) -> Result<Self, CoreError> {
        let converted = self
            .0
            .checked_mul(rate)
            .ok_or_else(|| CoreError::InvalidAmount("conversion overflow".into()))?;
        Self::from_decimal(converted)
    }

    /// Apply a fee in basis points, returning the fee portion.
    pub fn fee_bps(&self, bps: u32) -> Result<Self, CoreError> {
        let fee = self
            .0
            .checked_mul(Decimal::from(bps))
            .and_then(|v| v.checked_div(Decimal::from(10_000u32)))
            .ok_or_else(|| CoreError::InvalidAmount("fee computation overflow".into()))?;
        Self::from_decimal(fee)
    }

    /// Subtract another amount, failing rather than going negative.
    pub fn checked_sub(&self, other: Amount) -> Result<Self, CoreError> {
        let value = self
            .0
            .checked_sub(other.0)
            .filter(|v| !v.is_sign_negative())
            .ok_or_else(|| {
                CoreError::InvalidAmount(format!("{} - {} would be negative", self.0, other.0))
            })?;
        Ok(Self(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A currency or ledger-asset code (e.g. "MXN", "USDC", "CETES").
///
/// Anchors trade both ISO 4217 fiat codes and arbitrary ledger asset codes,
/// so this is a validated string rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Normalize and validate a currency code: 2..=12 ASCII alphanumerics.
    pub fn new(code: &str) -> Result<Self, CoreError> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() < 2 || normalized.len() > 12 {
            return Err(CoreError::InvalidCurrency(code.to_string()));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(normalized))
    }

    /// The normalized code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

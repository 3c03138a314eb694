use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{Amount, Currency};
use crate::error::CoreError;

/// Which side of the conversion the caller is fixing.
///
/// A quote request carries exactly one of the two amounts; the provider
/// computes the other from its rate and fee model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteAmount {
    /// Fix the amount being sent (fiat for on-ramp, asset for off-ramp).
    Source(Amount),
    /// Fix the amount to be received.
    Destination(Amount),
}

/// A request for a price lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Customer identifier, possibly composite (see capability flags).
    pub customer_id: String,
    /// Currency being converted from.
    pub from_currency: Currency,
    /// Currency being converted to.
    pub to_currency: Currency,
    /// Exactly one of source or destination amount.
    pub amount: QuoteAmount,
}

/// An ephemeral price lock issued by an anchor.
///
/// Immutable once created; invalid after `expires_at`; consumed exactly once
/// by a transaction-creation call. Expiry is detected by client-side clock
/// comparison, never a server push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Provider-assigned quote identifier.
    pub id: String,
    /// Currency being converted from.
    pub from_currency: Currency,
    /// Currency being converted to.
    pub to_currency: Currency,
    /// Amount on the source side.
    pub from_amount: Amount,
    /// Amount on the destination side, net of fees.
    pub to_amount: Amount,
    /// Rate used for the conversion.
    pub exchange_rate: Decimal,
    /// Fee charged by the provider, already reflected in `to_amount`.
    pub fee: Amount,
    /// When the price lock lapses.
    pub expires_at: DateTime<Utc>,
    /// When the quote was issued.
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Whether the quote has lapsed at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Fail if the quote has lapsed at the given instant.
    pub fn ensure_valid(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.is_expired(now) {
            Err(CoreError::QuoteExpired(self.id.clone()))
        } else {
            Ok(())
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::{Amount, Currency};
use crate::error::CoreError;

/// Lifecycle status of an on-ramp or off-ramp transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created at the provider, nothing has happened yet.
    Created,
    /// Waiting for the customer's fiat payment to arrive.
    AwaitingPayment,
    /// Waiting for the signable ledger transaction to materialize
    /// (deferred-signing off-ramps only).
    AwaitingSignable,
    /// The provider is processing the conversion.
    Processing,
    /// Terminal: funds delivered.
    Completed,
    /// Terminal: the transaction failed.
    Failed,
    /// Terminal: the transaction lapsed before completion.
    Expired,
    /// Terminal: cancelled by the customer or the provider.
    Cancelled,
    /// Terminal: funds were returned to the sender.
    Refunded,
}

impl TransactionStatus {
    /// Whether this status is terminal. Terminal statuses admit no further
    /// transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Expired | Self::Cancelled | Self::Refunded
        )
    }

    /// Validate a status transition.
    ///
    /// The only invariant enforced here is monotone terminality: once a
    /// transaction reaches a terminal status, every further transition is
    /// rejected. Re-observing the same status while polling is a no-op.
    pub fn transition(self, to: TransactionStatus) -> Result<TransactionStatus, CoreError> {
        if self == to {
            return Ok(self);
        }
        if self.is_terminal() {
            return Err(CoreError::InvalidStatusTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        tracing::debug!(from = %self, to = %to, "transaction status transition");
        Ok(to)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::AwaitingPayment => write!(f, "awaiting_payment"),
            Self::AwaitingSignable => write!(f, "awaiting_signable"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

/// How the customer pays for an on-ramp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentInstructions {
    /// Mexican SPEI transfer.
    Spei {
        /// 18-digit interbank account number to pay into.
        clabe: String,
        /// Payment reference the customer must attach.
        reference: String,
        /// Display name of the receiving party.
        beneficiary: Option<String>,
    },
    /// Generic bank transfer.
    BankTransfer {
        account_number: String,
        reference: String,
        bank_name: Option<String>,
    },
    /// Provider-hosted payment page.
    HostedPage { url: String },
}

/// A fiat-to-asset (deposit) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnRampTransaction {
    /// Provider-assigned identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Fiat currency being deposited.
    pub from_currency: Currency,
    /// Ledger asset being delivered.
    pub to_currency: Currency,
    /// Fiat amount the customer pays.
    pub from_amount: Amount,
    /// Asset amount to be delivered.
    pub to_amount: Amount,
    /// How to pay, when the provider surfaces instructions directly.
    pub payment_instructions: Option<PaymentInstructions>,
    /// Provider-hosted status page, where offered.
    pub status_page: Option<String>,
    /// Fee in basis points, where the provider reports one.
    pub fee_bps: Option<u32>,
    /// Absolute fee, where the provider reports one.
    pub fee_amount: Option<Amount>,
    /// Creation time at the provider.
    pub created_at: DateTime<Utc>,
}

/// An asset-to-fiat (withdrawal) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffRampTransaction {
    /// Provider-assigned identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Ledger asset being withdrawn.
    pub from_currency: Currency,
    /// Fiat currency being paid out.
    pub to_currency: Currency,
    /// Asset amount the customer sends.
    pub from_amount: Amount,
    /// Fiat amount to be paid out.
    pub to_amount: Amount,
    /// Destination bank account.
    pub fiat_account_id: String,
    /// Ledger transaction envelope the customer must sign, once available.
    ///
    /// Under deferred signing this is absent at creation time and appears
    /// only through polling.
    pub signable_transaction: Option<String>,
    /// Ledger address to pay into, for providers where the customer builds
    /// and signs a direct payment themselves.
    pub deposit_address: Option<String>,
    /// Memo to attach to the direct payment, where required.
    pub deposit_memo: Option<String>,
    /// Provider-hosted status page, where offered.
    pub status_page: Option<String>,
    /// Fee in basis points, where the provider reports one.
    pub fee_bps: Option<u32>,
    /// Absolute fee, where the provider reports one.
    pub fee_amount: Option<Amount>,
    /// Creation time at the provider.
    pub created_at: DateTime<Utc>,
}

/// A registered bank destination, scoped to a customer.
///
/// Created via registration, retrieved by listing, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatAccount {
    /// Provider-assigned identifier.
    pub id: String,
    /// Owning customer.
    pub customer_id: String,
    /// Bank display name.
    pub bank_name: String,
    /// Account number, possibly masked by the provider.
    pub account_number: String,
    /// Currency the account is denominated in.
    pub currency: Currency,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Input for bank account registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFiatAccount {
    /// Owning customer.
    pub customer_id: String,
    /// Bank display name.
    pub bank_name: String,
    /// Full account number.
    pub account_number: String,
    /// Currency the account is denominated in.
    pub currency: Currency,
}

use async_trait::async_trait;
use ramp_core::{
    Customer, FiatAccount, KycStatus, NewCustomer, NewFiatAccount, OffRampTransaction,
    OnRampTransaction, Quote, QuoteRequest,
};
use serde::{Deserialize, Serialize};

use crate::capabilities::{AnchorCapabilities, KycFlow};
use crate::error::AnchorError;

/// Input for on-ramp creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnRampRequest {
    /// Provider customer id.
    pub customer_id: String,
    /// Quote to consume. Each quote is consumed exactly once.
    pub quote_id: String,
    /// Ledger address that receives the asset.
    pub destination_address: String,
}

/// Input for off-ramp creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffRampRequest {
    /// Provider customer id.
    pub customer_id: String,
    /// Quote to consume. Each quote is consumed exactly once.
    pub quote_id: String,
    /// Registered bank destination for the payout.
    pub fiat_account_id: String,
    /// Ledger address funds are returned to on failure, where supported.
    pub refund_address: Option<String>,
}

/// A KYC hand-off produced by [`Anchor::get_kyc_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycSession {
    /// Where to send the user.
    pub url: String,
    /// How the provider expects the URL to be presented.
    pub flow: KycFlow,
}

/// Anchor provider interface.
///
/// Each implementation bridges the common ramp surface to one concrete fiat
/// provider API. Contracts shared by every operation:
///
/// - Monetary amounts are exact decimals, never floating point.
/// - Non-success responses surface as [`AnchorError::Api`] with the
///   provider's code and HTTP status, propagated unchanged.
/// - Lookups by id resolve to `Ok(None)` when the resource does not exist,
///   so "absent" is distinguishable from a transient failure.
/// - Capability-gated operations have default implementations returning
///   [`AnchorError::Unsupported`]; callers consult [`AnchorCapabilities`]
///   before invoking them.
#[async_trait]
pub trait Anchor: Send + Sync {
    /// Unique identifier of this anchor (e.g. "nopal").
    fn anchor_id(&self) -> &str;

    /// The static capability descriptor for this provider.
    fn capabilities(&self) -> &AnchorCapabilities;

    /// Create (or locally synthesize — see provider docs) a customer.
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, AnchorError>;

    /// Look up a customer by provider id.
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, AnchorError>;

    /// Look up a customer by email. Only where `supports_email_lookup`.
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AnchorError> {
        let _ = email;
        Err(AnchorError::Unsupported {
            anchor: self.anchor_id().to_string(),
            operation: "get_customer_by_email",
        })
    }

    /// Request a price lock for a currency pair and one fixed amount.
    async fn get_quote(&self, request: QuoteRequest) -> Result<Quote, AnchorError>;

    /// Create a deposit transaction consuming a quote.
    async fn create_on_ramp(
        &self,
        request: OnRampRequest,
    ) -> Result<OnRampTransaction, AnchorError>;

    /// Poll a deposit transaction.
    async fn get_on_ramp(&self, id: &str) -> Result<Option<OnRampTransaction>, AnchorError>;

    /// Register a bank destination for a customer.
    async fn register_fiat_account(
        &self,
        new: NewFiatAccount,
    ) -> Result<FiatAccount, AnchorError>;

    /// List a customer's registered bank destinations.
    async fn get_fiat_accounts(&self, customer_id: &str)
        -> Result<Vec<FiatAccount>, AnchorError>;

    /// Create a withdrawal transaction consuming a quote.
    async fn create_off_ramp(
        &self,
        request: OffRampRequest,
    ) -> Result<OffRampTransaction, AnchorError>;

    /// Poll a withdrawal transaction. Under deferred signing this is also
    /// how the signable artifact is obtained.
    async fn get_off_ramp(&self, id: &str) -> Result<Option<OffRampTransaction>, AnchorError>;

    /// Obtain the KYC hand-off for a customer.
    async fn get_kyc_url(
        &self,
        customer_id: &str,
        callback_url: Option<&str>,
    ) -> Result<KycSession, AnchorError>;

    /// Current KYC state of a customer.
    async fn get_kyc_status(&self, customer_id: &str) -> Result<KycStatus, AnchorError>;

    /// Register the customer's ledger address with the provider. Only where
    /// `requires_wallet_registration`.
    async fn register_wallet(
        &self,
        customer_id: &str,
        ledger_address: &str,
    ) -> Result<(), AnchorError> {
        let _ = (customer_id, ledger_address);
        Err(AnchorError::Unsupported {
            anchor: self.anchor_id().to_string(),
            operation: "register_wallet",
        })
    }

    /// Trigger the provider-hosted payout for an off-ramp. Only where
    /// `requires_anchor_payout_submission`.
    async fn submit_payout(&self, off_ramp_id: &str) -> Result<OffRampTransaction, AnchorError> {
        let _ = off_ramp_id;
        Err(AnchorError::Unsupported {
            anchor: self.anchor_id().to_string(),
            operation: "submit_payout",
        })
    }
}

use serde::{Deserialize, Serialize};

/// How a provider presents its KYC step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycFlow {
    /// Provider-hosted page embedded in an iframe.
    EmbeddedFrame,
    /// Fields collected inline and submitted through the API.
    InlineForm,
    /// Full redirect to the provider, including Terms-of-Service acceptance.
    ExternalRedirect,
}

/// Static per-provider descriptor of optional behavior.
///
/// Defined once at provider-registration time and read-only thereafter.
/// Calling code consults these flags before each conditional step instead of
/// branching on provider identity. An absent capability is "not present",
/// never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorCapabilities {
    /// KYC presentation style.
    pub kyc_flow: KycFlow,
    /// Off-ramp signable transaction is absent at creation and appears only
    /// through polling.
    pub deferred_offramp_signing: bool,
    /// A bank account must be registered/selected before requesting a quote.
    pub requires_bank_before_quote: bool,
    /// The customer's ledger address must be registered with the provider
    /// before an on-ramp can be created.
    pub requires_wallet_registration: bool,
    /// Off-ramp completion goes through a provider-hosted payout submission
    /// instead of a user-signed ledger transaction.
    pub requires_anchor_payout_submission: bool,
    /// Quote requests carry a composite `customer:resource` identifier.
    pub composite_quote_customer_id: bool,
    /// The provider can look customers up by email.
    pub supports_email_lookup: bool,
}

/// Delimiter for composite quote customer identifiers.
const COMPOSITE_DELIMITER: char = ':';

impl AnchorCapabilities {
    /// Nopal: iframe KYC, deferred off-ramp signing, plain quote ids.
    pub const fn nopal() -> Self {
        Self {
            kyc_flow: KycFlow::EmbeddedFrame,
            deferred_offramp_signing: true,
            requires_bank_before_quote: false,
            requires_wallet_registration: false,
            requires_anchor_payout_submission: false,
            composite_quote_customer_id: false,
            supports_email_lookup: false,
        }
    }

    /// Meridian: inline KYC form, user signs a direct payment themselves.
    pub const fn meridian() -> Self {
        Self {
            kyc_flow: KycFlow::InlineForm,
            deferred_offramp_signing: false,
            requires_bank_before_quote: false,
            requires_wallet_registration: false,
            requires_anchor_payout_submission: false,
            composite_quote_customer_id: false,
            supports_email_lookup: true,
        }
    }

    /// Brava: external redirect with ToS, bank-before-quote ordering,
    /// wallet registration, composite quote ids, anchor-hosted payouts.
    pub const fn brava() -> Self {
        Self {
            kyc_flow: KycFlow::ExternalRedirect,
            deferred_offramp_signing: false,
            requires_bank_before_quote: true,
            requires_wallet_registration: true,
            requires_anchor_payout_submission: true,
            composite_quote_customer_id: true,
            supports_email_lookup: false,
        }
    }

    /// Assemble the customer identifier a quote request must carry.
    ///
    /// Providers with `composite_quote_customer_id` expect the customer id
    /// joined to a resource id (wallet or bank account); everyone else takes
    /// the plain customer id. The convention is provider-internal, so it is
    /// built here from the flag rather than hardcoded at call sites.
    pub fn build_quote_customer_id(&self, customer_id: &str, resource_id: &str) -> String {
        if self.composite_quote_customer_id {
            format!("{customer_id}{COMPOSITE_DELIMITER}{resource_id}")
        } else {
            customer_id.to_string()
        }
    }
}

//! Brava client (provider C).
//!
//! Brava scopes everything under an instance, identifies customers by a
//! KYC-linked "receiver" resource, and requires Terms-of-Service acceptance
//! before that resource exists. Consequences for the common surface:
//!
//! - [`Anchor::create_customer`] performs no remote call. It returns a
//!   locally synthesized placeholder identity (`pending:<uuid>`); the real
//!   identity is established by [`BravaClient::onboard_receiver`]. Every
//!   downstream operation rejects placeholder ids with
//!   [`AnchorError::PlaceholderCustomer`] so the looseness cannot propagate.
//! - Quote requests carry a composite `receiver:bank_account` id, assembled
//!   by the caller via the capability flag.
//! - Off-ramps never involve user-side ledger signing; completion goes
//!   through [`Anchor::submit_payout`].

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ramp_core::{
    Amount, Currency, Customer, FiatAccount, KycStatus, NewCustomer, NewFiatAccount,
    OffRampTransaction, OnRampTransaction, PaymentInstructions, Quote, QuoteAmount, QuoteRequest,
    TransactionStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capabilities::AnchorCapabilities;
use crate::config::BravaConfig;
use crate::error::AnchorError;
use crate::http;
use crate::traits::{Anchor, KycSession, OffRampRequest, OnRampRequest};

const ANCHOR_ID: &str = "brava";
const PLACEHOLDER_PREFIX: &str = "pending:";

static CAPABILITIES: AnchorCapabilities = AnchorCapabilities::brava();

/// Whether a customer id is a locally synthesized placeholder that Brava
/// has never seen.
pub fn is_placeholder(customer_id: &str) -> bool {
    customer_id.starts_with(PLACEHOLDER_PREFIX)
}

fn reject_placeholder(customer_id: &str) -> Result<(), AnchorError> {
    // Composite ids embed the receiver id before the delimiter.
    let receiver = customer_id.split(':').next().unwrap_or(customer_id);
    if receiver == "pending" || is_placeholder(customer_id) {
        return Err(AnchorError::PlaceholderCustomer(customer_id.to_string()));
    }
    Ok(())
}

/// A provider-established receiver, the real Brava identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BravaReceiver {
    /// Receiver id; use this as the customer id for all follow-on calls.
    pub receiver_id: String,
    /// External-redirect URL for KYC, including ToS acceptance.
    pub kyc_url: String,
}

/// Async client for the Brava REST API.
pub struct BravaClient {
    http: reqwest::Client,
    config: BravaConfig,
}

impl BravaClient {
    /// Build a client from an injected HTTP client and configuration.
    pub fn new(http: reqwest::Client, config: BravaConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        let scoped = format!("/instances/{}{}", self.config.instance_id, path);
        http::endpoint(&self.config.base_url, &scoped)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(&self.config.api_key)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(&self.config.api_key)
    }

    /// Establish the real Brava identity: accept the Terms of Service and
    /// create the KYC-linked receiver resource.
    ///
    /// This is the provider-specific onboarding call that replaces the
    /// placeholder returned by `create_customer`.
    pub async fn onboard_receiver(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<BravaReceiver, AnchorError> {
        let body = OnboardReceiverBody {
            email,
            tos_accepted: true,
            redirect_url,
        };
        let response = self.post("/receivers").json(&body).send().await?;
        let dto: ReceiverDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, receiver_id = %dto.id, "receiver onboarded");
        Ok(BravaReceiver {
            receiver_id: dto.id,
            kyc_url: dto.kyc_url.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types (snake_case, instance-scoped paths)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OnboardReceiverBody<'a> {
    email: &'a str,
    tos_accepted: bool,
    redirect_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReceiverDto {
    id: String,
    email: String,
    kyc_status: String,
    kyc_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct QuoteBody<'a> {
    /// Composite `receiver:bank_account` reference.
    receiver_ref: &'a str,
    from_currency: &'a str,
    to_currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteDto {
    id: String,
    from_currency: String,
    to_currency: String,
    from_amount: String,
    to_amount: String,
    rate: String,
    fee: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CreateDepositBody<'a> {
    receiver_id: &'a str,
    quote_id: &'a str,
    wallet_address: &'a str,
}

#[derive(Debug, Deserialize)]
struct DepositDto {
    id: String,
    status: String,
    from_currency: String,
    to_currency: String,
    from_amount: String,
    to_amount: String,
    checkout_url: Option<String>,
    status_page: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CreatePayoutBody<'a> {
    receiver_id: &'a str,
    quote_id: &'a str,
    bank_account_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PayoutDto {
    id: String,
    status: String,
    from_currency: String,
    to_currency: String,
    from_amount: String,
    to_amount: String,
    bank_account_id: String,
    status_page: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RegisterBankAccountBody<'a> {
    bank_name: &'a str,
    account_number: &'a str,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct BankAccountDto {
    id: String,
    receiver_id: String,
    bank_name: String,
    account_number: String,
    currency: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RegisterWalletBody<'a> {
    receiver_id: &'a str,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
struct KycUrlDto {
    url: String,
}

// ---------------------------------------------------------------------------
// Wire → domain
// ---------------------------------------------------------------------------

fn map_status(raw: &str) -> Result<TransactionStatus, AnchorError> {
    match raw {
        "created" => Ok(TransactionStatus::Created),
        "waiting_payment" => Ok(TransactionStatus::AwaitingPayment),
        "processing" => Ok(TransactionStatus::Processing),
        "done" => Ok(TransactionStatus::Completed),
        "error" => Ok(TransactionStatus::Failed),
        "expired" => Ok(TransactionStatus::Expired),
        "canceled" => Ok(TransactionStatus::Cancelled),
        "refunded" => Ok(TransactionStatus::Refunded),
        other => Err(AnchorError::Schema(format!(
            "unknown brava transaction status: {other}"
        ))),
    }
}

fn map_kyc_status(raw: &str) -> Result<KycStatus, AnchorError> {
    match raw {
        "tos_pending" | "not_started" => Ok(KycStatus::NotStarted),
        "verifying" => Ok(KycStatus::Pending),
        "verified" => Ok(KycStatus::Approved),
        "denied" => Ok(KycStatus::Rejected),
        "needs_update" => Ok(KycStatus::UpdateRequired),
        other => Err(AnchorError::Schema(format!(
            "unknown brava kyc status: {other}"
        ))),
    }
}

impl TryFrom<ReceiverDto> for Customer {
    type Error = AnchorError;

    fn try_from(dto: ReceiverDto) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: dto.id,
            email: dto.email,
            kyc_status: map_kyc_status(&dto.kyc_status)?,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

impl TryFrom<QuoteDto> for Quote {
    type Error = AnchorError;

    fn try_from(dto: QuoteDto) -> Result<Self, Self::Error> {
        Ok(Quote {
            id: dto.id,
            from_currency: Currency::new(&dto.from_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.to_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.from_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.to_amount).map_err(AnchorError::Core)?,
            exchange_rate: Decimal::from_str(&dto.rate)
                .map_err(|e| AnchorError::Schema(format!("bad rate: {e}")))?,
            fee: Amount::parse(&dto.fee).map_err(AnchorError::Core)?,
            expires_at: dto.expires_at,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<DepositDto> for OnRampTransaction {
    type Error = AnchorError;

    fn try_from(dto: DepositDto) -> Result<Self, Self::Error> {
        Ok(OnRampTransaction {
            id: dto.id,
            status: map_status(&dto.status)?,
            from_currency: Currency::new(&dto.from_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.to_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.from_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.to_amount).map_err(AnchorError::Core)?,
            payment_instructions: dto
                .checkout_url
                .map(|url| PaymentInstructions::HostedPage { url }),
            status_page: dto.status_page,
            fee_bps: None,
            fee_amount: None,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<PayoutDto> for OffRampTransaction {
    type Error = AnchorError;

    fn try_from(dto: PayoutDto) -> Result<Self, Self::Error> {
        Ok(OffRampTransaction {
            id: dto.id,
            status: map_status(&dto.status)?,
            from_currency: Currency::new(&dto.from_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.to_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.from_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.to_amount).map_err(AnchorError::Core)?,
            fiat_account_id: dto.bank_account_id,
            signable_transaction: None,
            deposit_address: None,
            deposit_memo: None,
            status_page: dto.status_page,
            fee_bps: None,
            fee_amount: None,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<BankAccountDto> for FiatAccount {
    type Error = AnchorError;

    fn try_from(dto: BankAccountDto) -> Result<Self, Self::Error> {
        Ok(FiatAccount {
            id: dto.id,
            customer_id: dto.receiver_id,
            bank_name: dto.bank_name,
            account_number: dto.account_number,
            currency: Currency::new(&dto.currency).map_err(AnchorError::Core)?,
            created_at: dto.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Anchor impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Anchor for BravaClient {
    fn anchor_id(&self) -> &str {
        ANCHOR_ID
    }

    fn capabilities(&self) -> &AnchorCapabilities {
        &CAPABILITIES
    }

    /// No remote call. Returns a format-tagged placeholder; establish the
    /// real identity with [`BravaClient::onboard_receiver`].
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, AnchorError> {
        let now = Utc::now();
        let id = format!("{PLACEHOLDER_PREFIX}{}", Uuid::now_v7());
        tracing::warn!(
            anchor = ANCHOR_ID,
            customer_id = %id,
            "synthesized placeholder customer; onboard_receiver establishes the real identity"
        );
        Ok(Customer {
            id,
            email: new.email,
            kyc_status: KycStatus::NotStarted,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, AnchorError> {
        // Placeholders have never been seen by the provider.
        if is_placeholder(customer_id) {
            return Ok(None);
        }
        let response = self.get(&format!("/receivers/{customer_id}")).send().await?;
        let dto: Option<ReceiverDto> = http::decode_optional(ANCHOR_ID, response).await?;
        dto.map(Customer::try_from).transpose()
    }

    async fn get_quote(&self, request: QuoteRequest) -> Result<Quote, AnchorError> {
        reject_placeholder(&request.customer_id)?;
        let (from_amount, to_amount) = match &request.amount {
            QuoteAmount::Source(a) => (Some(a.to_string()), None),
            QuoteAmount::Destination(a) => (None, Some(a.to_string())),
        };
        let body = QuoteBody {
            receiver_ref: &request.customer_id,
            from_currency: request.from_currency.code(),
            to_currency: request.to_currency.code(),
            from_amount,
            to_amount,
        };
        let response = self.post("/quotes").json(&body).send().await?;
        let dto: QuoteDto = http::decode(ANCHOR_ID, response).await?;
        tracing::debug!(anchor = ANCHOR_ID, quote_id = %dto.id, "quote issued");
        dto.try_into()
    }

    async fn create_on_ramp(
        &self,
        request: OnRampRequest,
    ) -> Result<OnRampTransaction, AnchorError> {
        reject_placeholder(&request.customer_id)?;
        let body = CreateDepositBody {
            receiver_id: &request.customer_id,
            quote_id: &request.quote_id,
            wallet_address: &request.destination_address,
        };
        let response = self.post("/deposits").json(&body).send().await?;
        let dto: DepositDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %dto.id, "deposit created");
        dto.try_into()
    }

    async fn get_on_ramp(&self, id: &str) -> Result<Option<OnRampTransaction>, AnchorError> {
        let response = self.get(&format!("/deposits/{id}")).send().await?;
        let dto: Option<DepositDto> = http::decode_optional(ANCHOR_ID, response).await?;
        dto.map(OnRampTransaction::try_from).transpose()
    }

    async fn register_fiat_account(
        &self,
        new: NewFiatAccount,
    ) -> Result<FiatAccount, AnchorError> {
        reject_placeholder(&new.customer_id)?;
        let body = RegisterBankAccountBody {
            bank_name: &new.bank_name,
            account_number: &new.account_number,
            currency: new.currency.code(),
        };
        let response = self
            .post(&format!("/receivers/{}/bank_accounts", new.customer_id))
            .json(&body)
            .send()
            .await?;
        let dto: BankAccountDto = http::decode(ANCHOR_ID, response).await?;
        dto.try_into()
    }

    async fn get_fiat_accounts(
        &self,
        customer_id: &str,
    ) -> Result<Vec<FiatAccount>, AnchorError> {
        reject_placeholder(customer_id)?;
        let response = self
            .get(&format!("/receivers/{customer_id}/bank_accounts"))
            .send()
            .await?;
        let dtos: Vec<BankAccountDto> = http::decode(ANCHOR_ID, response).await?;
        dtos.into_iter().map(FiatAccount::try_from).collect()
    }

    async fn create_off_ramp(
        &self,
        request: OffRampRequest,
    ) -> Result<OffRampTransaction, AnchorError> {
        reject_placeholder(&request.customer_id)?;
        let body = CreatePayoutBody {
            receiver_id: &request.customer_id,
            quote_id: &request.quote_id,
            bank_account_id: &request.fiat_account_id,
        };
        let response = self.post("/payouts").json(&body).send().await?;
        let dto: PayoutDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %dto.id, "payout created");
        dto.try_into()
    }

    async fn get_off_ramp(&self, id: &str) -> Result<Option<OffRampTransaction>, AnchorError> {
        let response = self.get(&format!("/payouts/{id}")).send().await?;
        let dto: Option<PayoutDto> = http::decode_optional(ANCHOR_ID, response).await?;
        dto.map(OffRampTransaction::try_from).transpose()
    }

    async fn get_kyc_url(
        &self,
        customer_id: &str,
        callback_url: Option<&str>,
    ) -> Result<KycSession, AnchorError> {
        reject_placeholder(customer_id)?;
        let mut request = self.get(&format!("/receivers/{customer_id}/kyc_url"));
        if let Some(callback) = callback_url {
            request = request.query(&[("redirect_url", callback)]);
        }
        let response = request.send().await?;
        let dto: KycUrlDto = http::decode(ANCHOR_ID, response).await?;
        Ok(KycSession {
            url: dto.url,
            flow: CAPABILITIES.kyc_flow,
        })
    }

    async fn get_kyc_status(&self, customer_id: &str) -> Result<KycStatus, AnchorError> {
        reject_placeholder(customer_id)?;
        let response = self.get(&format!("/receivers/{customer_id}")).send().await?;
        let dto: ReceiverDto = http::decode(ANCHOR_ID, response).await?;
        map_kyc_status(&dto.kyc_status)
    }

    async fn register_wallet(
        &self,
        customer_id: &str,
        ledger_address: &str,
    ) -> Result<(), AnchorError> {
        reject_placeholder(customer_id)?;
        let body = RegisterWalletBody {
            receiver_id: customer_id,
            address: ledger_address,
        };
        let response = self.post("/wallets").json(&body).send().await?;
        let _: serde_json::Value = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, customer_id, "wallet registered");
        Ok(())
    }

    async fn submit_payout(&self, off_ramp_id: &str) -> Result<OffRampTransaction, AnchorError> {
        let response = self
            .post(&format!("/payouts/{off_ramp_id}/submit"))
            .send()
            .await?;
        let dto: PayoutDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %dto.id, "payout submitted");
        dto.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_customer_synthesizes_placeholder() {
        let client = BravaClient::new(
            reqwest::Client::new(),
            BravaConfig {
                api_key: "k".into(),
                base_url: "https://api.brava.invalid/v1".into(),
                instance_id: "inst_1".into(),
            },
        );
        // No network: the operation is local by design.
        let customer = client
            .create_customer(NewCustomer::with_email("c@d.io"))
            .await
            .unwrap();
        assert!(is_placeholder(&customer.id));
        assert_eq!(customer.kyc_status, KycStatus::NotStarted);
    }

    #[test]
    fn test_reject_placeholder_plain_and_composite() {
        assert!(reject_placeholder("pending:0192-abc").is_err());
        assert!(reject_placeholder("pending:0192-abc:ba_1").is_err());
        assert!(reject_placeholder("rcv_1").is_ok());
        assert!(reject_placeholder("rcv_1:ba_1").is_ok());
    }

    #[test]
    fn test_map_status_full_set() {
        assert_eq!(map_status("done").unwrap(), TransactionStatus::Completed);
        assert_eq!(map_status("canceled").unwrap(), TransactionStatus::Cancelled);
        assert_eq!(map_status("error").unwrap(), TransactionStatus::Failed);
        assert!(map_status("cancelled").is_err());
    }

    #[test]
    fn test_payout_dto_never_carries_signable() {
        let json = r#"{
            "id": "pay_1",
            "status": "created",
            "from_currency": "USDC",
            "to_currency": "BRL",
            "from_amount": "100",
            "to_amount": "510.25",
            "bank_account_id": "ba_7",
            "status_page": "https://brava.io/p/pay_1",
            "created_at": "2026-01-05T12:00:00Z"
        }"#;
        let dto: PayoutDto = serde_json::from_str(json).unwrap();
        let tx = OffRampTransaction::try_from(dto).unwrap();
        assert!(tx.signable_transaction.is_none());
        assert!(tx.deposit_address.is_none());
        assert_eq!(tx.status, TransactionStatus::Created);
    }

    #[test]
    fn test_receiver_kyc_mapping() {
        assert_eq!(map_kyc_status("tos_pending").unwrap(), KycStatus::NotStarted);
        assert_eq!(map_kyc_status("verifying").unwrap(), KycStatus::Pending);
        assert_eq!(map_kyc_status("verified").unwrap(), KycStatus::Approved);
        assert_eq!(map_kyc_status("needs_update").unwrap(), KycStatus::UpdateRequired);
    }
}

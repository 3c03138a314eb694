//! Nopal client (provider A).
//!
//! Mexican-rail anchor: SPEI deposits into tokenized instruments, iframe
//! KYC, and a deferred-signing off-ramp — the burn transaction envelope is
//! absent at creation time and materializes only through polling
//! `GET /offramps/{id}`.

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

use crate::capabilities::AnchorCapabilities;
use crate::config::NopalConfig;
use crate::error::AnchorError;
use crate::http;
use crate::traits::{Anchor, KycSession, OffRampRequest, OnRampRequest};

const ANCHOR_ID: &str = "nopal";
const API_KEY_HEADER: &str = "x-api-key";

static CAPABILITIES: AnchorCapabilities = AnchorCapabilities::nopal();

/// Async client for the Nopal REST API.
pub struct NopalClient {
    http: reqwest::Client,
    config: NopalConfig,
}

impl NopalClient {
    /// Build a client from an injected HTTP client and configuration.
    pub fn new(http: reqwest::Client, config: NopalConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        http::endpoint(&self.config.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
    }
}

// ---------------------------------------------------------------------------
// Wire types (snake_case JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateCustomerBody<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CustomerDto {
    id: String,
    email: String,
    kyc_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct QuoteBody<'a> {
    customer_id: &'a str,
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
    exchange_rate: String,
    fee: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CreateOnRampBody<'a> {
    customer_id: &'a str,
    quote_id: &'a str,
    destination_address: &'a str,
}

#[derive(Debug, Deserialize)]
struct SpeiDto {
    clabe: String,
    reference: String,
    beneficiary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OnRampDto {
    id: String,
    status: String,
    from_currency: String,
    to_currency: String,
    from_amount: String,
    to_amount: String,
    spei: Option<SpeiDto>,
    fee_bps: Option<u32>,
    fee_amount: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CreateOffRampBody<'a> {
    customer_id: &'a str,
    quote_id: &'a str,
    fiat_account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refund_address: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OffRampDto {
    id: String,
    status: String,
    from_currency: String,
    to_currency: String,
    from_amount: String,
    to_amount: String,
    fiat_account_id: String,
    /// Burn transaction envelope; absent until the provider prepares it.
    burn_transaction: Option<String>,
    fee_bps: Option<u32>,
    fee_amount: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RegisterFiatAccountBody<'a> {
    customer_id: &'a str,
    bank_name: &'a str,
    account_number: &'a str,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct FiatAccountDto {
    id: String,
    customer_id: String,
    bank_name: String,
    account_number: String,
    currency: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct KycSessionBody<'a> {
    customer_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct KycSessionDto {
    url: String,
}

#[derive(Debug, Deserialize)]
struct KycStatusDto {
    status: String,
}

// ---------------------------------------------------------------------------
// Wire → domain
// ---------------------------------------------------------------------------

fn map_status(raw: &str) -> Result<TransactionStatus, AnchorError> {
    match raw {
        "created" => Ok(TransactionStatus::Created),
        "payment_pending" => Ok(TransactionStatus::AwaitingPayment),
        "awaiting_burn_signature" => Ok(TransactionStatus::AwaitingSignable),
        "processing" => Ok(TransactionStatus::Processing),
        "completed" => Ok(TransactionStatus::Completed),
        "failed" => Ok(TransactionStatus::Failed),
        "expired" => Ok(TransactionStatus::Expired),
        "cancelled" => Ok(TransactionStatus::Cancelled),
        "refunded" => Ok(TransactionStatus::Refunded),
        other => Err(AnchorError::Schema(format!(
            "unknown nopal transaction status: {other}"
        ))),
    }
}

fn map_kyc_status(raw: &str) -> Result<KycStatus, AnchorError> {
    match raw {
        "none" => Ok(KycStatus::NotStarted),
        "in_review" => Ok(KycStatus::Pending),
        "approved" => Ok(KycStatus::Approved),
        "rejected" => Ok(KycStatus::Rejected),
        "resubmit" => Ok(KycStatus::UpdateRequired),
        other => Err(AnchorError::Schema(format!(
            "unknown nopal kyc status: {other}"
        ))),
    }
}

impl TryFrom<CustomerDto> for Customer {
    type Error = AnchorError;

    fn try_from(dto: CustomerDto) -> Result<Self, Self::Error> {
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
            exchange_rate: Decimal::from_str(&dto.exchange_rate)
                .map_err(|e| AnchorError::Schema(format!("bad exchange_rate: {e}")))?,
            fee: Amount::parse(&dto.fee).map_err(AnchorError::Core)?,
            expires_at: dto.expires_at,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<OnRampDto> for OnRampTransaction {
    type Error = AnchorError;

    fn try_from(dto: OnRampDto) -> Result<Self, Self::Error> {
        let fee_amount = dto
            .fee_amount
            .as_deref()
            .map(Amount::parse)
            .transpose()
            .map_err(AnchorError::Core)?;
        Ok(OnRampTransaction {
            id: dto.id,
            status: map_status(&dto.status)?,
            from_currency: Currency::new(&dto.from_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.to_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.from_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.to_amount).map_err(AnchorError::Core)?,
            payment_instructions: dto.spei.map(|s| PaymentInstructions::Spei {
                clabe: s.clabe,
                reference: s.reference,
                beneficiary: s.beneficiary,
            }),
            status_page: None,
            fee_bps: dto.fee_bps,
            fee_amount,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<OffRampDto> for OffRampTransaction {
    type Error = AnchorError;

    fn try_from(dto: OffRampDto) -> Result<Self, Self::Error> {
        let fee_amount = dto
            .fee_amount
            .as_deref()
            .map(Amount::parse)
            .transpose()
            .map_err(AnchorError::Core)?;
        Ok(OffRampTransaction {
            id: dto.id,
            status: map_status(&dto.status)?,
            from_currency: Currency::new(&dto.from_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.to_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.from_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.to_amount).map_err(AnchorError::Core)?,
            fiat_account_id: dto.fiat_account_id,
            signable_transaction: dto.burn_transaction,
            deposit_address: None,
            deposit_memo: None,
            status_page: None,
            fee_bps: dto.fee_bps,
            fee_amount,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<FiatAccountDto> for FiatAccount {
    type Error = AnchorError;

    fn try_from(dto: FiatAccountDto) -> Result<Self, Self::Error> {
        Ok(FiatAccount {
            id: dto.id,
            customer_id: dto.customer_id,
            bank_name: dto.bank_name,
            account_number: dto.account_number,
            currency: Currency::new(&dto.currency).map_err(AnchorError::Core)?,
            created_at: dto.created_at,
        })
    }
}

fn quote_body<'a>(request: &'a QuoteRequest) -> QuoteBody<'a> {
    let (from_amount, to_amount) = match &request.amount {
        QuoteAmount::Source(a) => (Some(a.to_string()), None),
        QuoteAmount::Destination(a) => (None, Some(a.to_string())),
    };
    QuoteBody {
        customer_id: &request.customer_id,
        from_currency: request.from_currency.code(),
        to_currency: request.to_currency.code(),
        from_amount,
        to_amount,
    }
}

// ---------------------------------------------------------------------------
// Anchor impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Anchor for NopalClient {
    fn anchor_id(&self) -> &str {
        ANCHOR_ID
    }

    fn capabilities(&self) -> &AnchorCapabilities {
        &CAPABILITIES
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, AnchorError> {
        let body = CreateCustomerBody {
            email: &new.email,
            first_name: new.first_name.as_deref(),
            last_name: new.last_name.as_deref(),
        };
        let response = self.post("/customers").json(&body).send().await?;
        let dto: CustomerDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, customer_id = %dto.id, "customer created");
        dto.try_into()
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, AnchorError> {
        let response = self
            .get(&format!("/customers/{customer_id}"))
            .send()
            .await?;
        let dto: Option<CustomerDto> = http::decode_optional(ANCHOR_ID, response).await?;
        dto.map(Customer::try_from).transpose()
    }

    async fn get_quote(&self, request: QuoteRequest) -> Result<Quote, AnchorError> {
        let body = quote_body(&request);
        let response = self.post("/quotes").json(&body).send().await?;
        let dto: QuoteDto = http::decode(ANCHOR_ID, response).await?;
        tracing::debug!(anchor = ANCHOR_ID, quote_id = %dto.id, "quote issued");
        dto.try_into()
    }

    async fn create_on_ramp(
        &self,
        request: OnRampRequest,
    ) -> Result<OnRampTransaction, AnchorError> {
        let body = CreateOnRampBody {
            customer_id: &request.customer_id,
            quote_id: &request.quote_id,
            destination_address: &request.destination_address,
        };
        let response = self.post("/onramps").json(&body).send().await?;
        let dto: OnRampDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %dto.id, "on-ramp created");
        dto.try_into()
    }

    async fn get_on_ramp(&self, id: &str) -> Result<Option<OnRampTransaction>, AnchorError> {
        let response = self.get(&format!("/onramps/{id}")).send().await?;
        let dto: Option<OnRampDto> = http::decode_optional(ANCHOR_ID, response).await?;
        dto.map(OnRampTransaction::try_from).transpose()
    }

    async fn register_fiat_account(
        &self,
        new: NewFiatAccount,
    ) -> Result<FiatAccount, AnchorError> {
        let body = RegisterFiatAccountBody {
            customer_id: &new.customer_id,
            bank_name: &new.bank_name,
            account_number: &new.account_number,
            currency: new.currency.code(),
        };
        let response = self.post("/fiat_accounts").json(&body).send().await?;
        let dto: FiatAccountDto = http::decode(ANCHOR_ID, response).await?;
        dto.try_into()
    }

    async fn get_fiat_accounts(
        &self,
        customer_id: &str,
    ) -> Result<Vec<FiatAccount>, AnchorError> {
        let response = self
            .get(&format!("/customers/{customer_id}/fiat_accounts"))
            .send()
            .await?;
        let dtos: Vec<FiatAccountDto> = http::decode(ANCHOR_ID, response).await?;
        dtos.into_iter().map(FiatAccount::try_from).collect()
    }

    async fn create_off_ramp(
        &self,
        request: OffRampRequest,
    ) -> Result<OffRampTransaction, AnchorError> {
        let body = CreateOffRampBody {
            customer_id: &request.customer_id,
            quote_id: &request.quote_id,
            fiat_account_id: &request.fiat_account_id,
            refund_address: request.refund_address.as_deref(),
        };
        let response = self.post("/offramps").json(&body).send().await?;
        let dto: OffRampDto = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %dto.id, "off-ramp created");
        dto.try_into()
    }

    async fn get_off_ramp(&self, id: &str) -> Result<Option<OffRampTransaction>, AnchorError> {
        let response = self.get(&format!("/offramps/{id}")).send().await?;
        let dto: Option<OffRampDto> = http::decode_optional(ANCHOR_ID, response).await?;
        dto.map(OffRampTransaction::try_from).transpose()
    }

    async fn get_kyc_url(
        &self,
        customer_id: &str,
        callback_url: Option<&str>,
    ) -> Result<KycSession, AnchorError> {
        let body = KycSessionBody {
            customer_id,
            callback_url,
        };
        let response = self.post("/kyc/sessions").json(&body).send().await?;
        let dto: KycSessionDto = http::decode(ANCHOR_ID, response).await?;
        Ok(KycSession {
            url: dto.url,
            flow: CAPABILITIES.kyc_flow,
        })
    }

    async fn get_kyc_status(&self, customer_id: &str) -> Result<KycStatus, AnchorError> {
        let response = self
            .get(&format!("/customers/{customer_id}/kyc"))
            .send()
            .await?;
        let dto: KycStatusDto = http::decode(ANCHOR_ID, response).await?;
        map_kyc_status(&dto.status)
    }
}

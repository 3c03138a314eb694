//! Meridian client (provider B).
//!
//! Inline-form KYC and direct-payment off-ramps: the provider never returns
//! a signable artifact — the customer builds and signs a ledger payment to
//! the deposit address returned at creation time. Every Meridian response is
//! wrapped in a `{"data": ...}` envelope and all fields are camelCase.

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
use crate::config::MeridianConfig;
use crate::error::AnchorError;
use crate::http;
use crate::traits::{Anchor, KycSession, OffRampRequest, OnRampRequest};

const ANCHOR_ID: &str = "meridian";

static CAPABILITIES: AnchorCapabilities = AnchorCapabilities::meridian();

/// Async client for the Meridian REST API.
pub struct MeridianClient {
    http: reqwest::Client,
    config: MeridianConfig,
}

impl MeridianClient {
    /// Build a client from an injected HTTP client and configuration.
    pub fn new(http: reqwest::Client, config: MeridianConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        http::endpoint(&self.config.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(&self.config.api_key)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(&self.config.api_key)
    }

    /// Submit the inline KYC form fields for a customer.
    ///
    /// Provider-specific operation outside the common [`Anchor`] surface;
    /// reach it through the concrete client.
    pub async fn submit_kyc_fields(
        &self,
        customer_id: &str,
        fields: KycFields,
    ) -> Result<KycStatus, AnchorError> {
        let response = self
            .post(&format!("/customers/{customer_id}/kyc"))
            .json(&fields)
            .send()
            .await?;
        let envelope: Envelope<KycStatusDto> = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, customer_id, "kyc fields submitted");
        map_kyc_status(&envelope.data.status)
    }
}

/// Inline KYC form fields Meridian collects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycFields {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub country: String,
    pub document_number: String,
}

// ---------------------------------------------------------------------------
// Wire types ({"data": ...} envelope, camelCase)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCustomerBody<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerDto {
    id: String,
    email: String,
    kyc_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteBody<'a> {
    customer_id: &'a str,
    sell_currency: &'a str,
    buy_currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sell_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buy_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteDto {
    id: String,
    sell_currency: String,
    buy_currency: String,
    sell_amount: String,
    buy_amount: String,
    rate: String,
    fee_amount: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOnRampBody<'a> {
    customer_id: &'a str,
    quote_id: &'a str,
    destination_address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnRampDto {
    id: String,
    status: String,
    sell_currency: String,
    buy_currency: String,
    sell_amount: String,
    buy_amount: String,
    payment_url: Option<String>,
    status_page_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOffRampBody<'a> {
    customer_id: &'a str,
    quote_id: &'a str,
    bank_account_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OffRampDto {
    id: String,
    status: String,
    sell_currency: String,
    buy_currency: String,
    sell_amount: String,
    buy_amount: String,
    bank_account_id: String,
    /// Where the customer sends the asset; they sign the payment themselves.
    deposit_address: Option<String>,
    deposit_memo: Option<String>,
    status_page_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBankAccountBody<'a> {
    customer_id: &'a str,
    bank_name: &'a str,
    account_number: &'a str,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankAccountDto {
    id: String,
    customer_id: String,
    bank_name: String,
    account_number: String,
    currency: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KycStatusDto {
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KycFormDto {
    form_url: String,
}

// ---------------------------------------------------------------------------
// Wire → domain
// ---------------------------------------------------------------------------

fn map_status(raw: &str) -> Result<TransactionStatus, AnchorError> {
    match raw {
        "PENDING" => Ok(TransactionStatus::Created),
        "AWAITING_FUNDS" => Ok(TransactionStatus::AwaitingPayment),
        "PROCESSING" => Ok(TransactionStatus::Processing),
        "COMPLETE" => Ok(TransactionStatus::Completed),
        "ERROR" => Ok(TransactionStatus::Failed),
        "EXPIRED" => Ok(TransactionStatus::Expired),
        "CANCELLED" => Ok(TransactionStatus::Cancelled),
        "REFUNDED" => Ok(TransactionStatus::Refunded),
        other => Err(AnchorError::Schema(format!(
            "unknown meridian transaction status: {other}"
        ))),
    }
}

fn map_kyc_status(raw: &str) -> Result<KycStatus, AnchorError> {
    match raw {
        "NOT_STARTED" => Ok(KycStatus::NotStarted),
        "PENDING" => Ok(KycStatus::Pending),
        "APPROVED" => Ok(KycStatus::Approved),
        "REJECTED" => Ok(KycStatus::Rejected),
        "UPDATE_REQUIRED" => Ok(KycStatus::UpdateRequired),
        other => Err(AnchorError::Schema(format!(
            "unknown meridian kyc status: {other}"
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
            from_currency: Currency::new(&dto.sell_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.buy_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.sell_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.buy_amount).map_err(AnchorError::Core)?,
            exchange_rate: Decimal::from_str(&dto.rate)
                .map_err(|e| AnchorError::Schema(format!("bad rate: {e}")))?,
            fee: Amount::parse(&dto.fee_amount).map_err(AnchorError::Core)?,
            expires_at: dto.expires_at,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<OnRampDto> for OnRampTransaction {
    type Error = AnchorError;

    fn try_from(dto: OnRampDto) -> Result<Self, Self::Error> {
        Ok(OnRampTransaction {
            id: dto.id,
            status: map_status(&dto.status)?,
            from_currency: Currency::new(&dto.sell_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.buy_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.sell_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.buy_amount).map_err(AnchorError::Core)?,
            payment_instructions: dto
                .payment_url
                .map(|url| PaymentInstructions::HostedPage { url }),
            status_page: dto.status_page_url,
            fee_bps: None,
            fee_amount: None,
            created_at: dto.created_at,
        })
    }
}

impl TryFrom<OffRampDto> for OffRampTransaction {
    type Error = AnchorError;

    fn try_from(dto: OffRampDto) -> Result<Self, Self::Error> {
        Ok(OffRampTransaction {
            id: dto.id,
            status: map_status(&dto.status)?,
            from_currency: Currency::new(&dto.sell_currency).map_err(AnchorError::Core)?,
            to_currency: Currency::new(&dto.buy_currency).map_err(AnchorError::Core)?,
            from_amount: Amount::parse(&dto.sell_amount).map_err(AnchorError::Core)?,
            to_amount: Amount::parse(&dto.buy_amount).map_err(AnchorError::Core)?,
            fiat_account_id: dto.bank_account_id,
            signable_transaction: None,
            deposit_address: dto.deposit_address,
            deposit_memo: dto.deposit_memo,
            status_page: dto.status_page_url,
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
            customer_id: dto.customer_id,
            bank_name: dto.bank_name,
            account_number: dto.account_number,
            currency: Currency::new(&dto.currency).map_err(AnchorError::Core)?,
            created_at: dto.created_at,
        })
    }
}

fn quote_body<'a>(request: &'a QuoteRequest) -> QuoteBody<'a> {
    let (sell_amount, buy_amount) = match &request.amount {
        QuoteAmount::Source(a) => (Some(a.to_string()), None),
        QuoteAmount::Destination(a) => (None, Some(a.to_string())),
    };
    QuoteBody {
        customer_id: &request.customer_id,
        sell_currency: request.from_currency.code(),
        buy_currency: request.to_currency.code(),
        sell_amount,
        buy_amount,
    }
}

// ---------------------------------------------------------------------------
// Anchor impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Anchor for MeridianClient {
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
        let envelope: Envelope<CustomerDto> = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, customer_id = %envelope.data.id, "customer created");
        envelope.data.try_into()
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, AnchorError> {
        let response = self.get(&format!("/customers/{customer_id}")).send().await?;
        let envelope: Option<Envelope<CustomerDto>> =
            http::decode_optional(ANCHOR_ID, response).await?;
        envelope.map(|e| e.data.try_into()).transpose()
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AnchorError> {
        let response = self
            .get("/customers")
            .query(&[("email", email)])
            .send()
            .await?;
        let envelope: Envelope<Vec<CustomerDto>> = http::decode(ANCHOR_ID, response).await?;
        envelope
            .data
            .into_iter()
            .next()
            .map(Customer::try_from)
            .transpose()
    }

    async fn get_quote(&self, request: QuoteRequest) -> Result<Quote, AnchorError> {
        let body = quote_body(&request);
        let response = self.post("/quotes").json(&body).send().await?;
        let envelope: Envelope<QuoteDto> = http::decode(ANCHOR_ID, response).await?;
        tracing::debug!(anchor = ANCHOR_ID, quote_id = %envelope.data.id, "quote issued");
        envelope.data.try_into()
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
        let envelope: Envelope<OnRampDto> = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %envelope.data.id, "on-ramp created");
        envelope.data.try_into()
    }

    async fn get_on_ramp(&self, id: &str) -> Result<Option<OnRampTransaction>, AnchorError> {
        let response = self.get(&format!("/onramps/{id}")).send().await?;
        let envelope: Option<Envelope<OnRampDto>> =
            http::decode_optional(ANCHOR_ID, response).await?;
        envelope.map(|e| e.data.try_into()).transpose()
    }

    async fn register_fiat_account(
        &self,
        new: NewFiatAccount,
    ) -> Result<FiatAccount, AnchorError> {
        let body = RegisterBankAccountBody {
            customer_id: &new.customer_id,
            bank_name: &new.bank_name,
            account_number: &new.account_number,
            currency: new.currency.code(),
        };
        let response = self.post("/bank-accounts").json(&body).send().await?;
        let envelope: Envelope<BankAccountDto> = http::decode(ANCHOR_ID, response).await?;
        envelope.data.try_into()
    }

    async fn get_fiat_accounts(
        &self,
        customer_id: &str,
    ) -> Result<Vec<FiatAccount>, AnchorError> {
        let response = self
            .get("/bank-accounts")
            .query(&[("customerId", customer_id)])
            .send()
            .await?;
        let envelope: Envelope<Vec<BankAccountDto>> = http::decode(ANCHOR_ID, response).await?;
        envelope
            .data
            .into_iter()
            .map(FiatAccount::try_from)
            .collect()
    }

    async fn create_off_ramp(
        &self,
        request: OffRampRequest,
    ) -> Result<OffRampTransaction, AnchorError> {
        let body = CreateOffRampBody {
            customer_id: &request.customer_id,
            quote_id: &request.quote_id,
            bank_account_id: &request.fiat_account_id,
        };
        let response = self.post("/offramps").json(&body).send().await?;
        let envelope: Envelope<OffRampDto> = http::decode(ANCHOR_ID, response).await?;
        tracing::info!(anchor = ANCHOR_ID, transaction_id = %envelope.data.id, "off-ramp created");
        envelope.data.try_into()
    }

    async fn get_off_ramp(&self, id: &str) -> Result<Option<OffRampTransaction>, AnchorError> {
        let response = self.get(&format!("/offramps/{id}")).send().await?;
        let envelope: Option<Envelope<OffRampDto>> =
            http::decode_optional(ANCHOR_ID, response).await?;
        envelope.map(|e| e.data.try_into()).transpose()
    }

    async fn get_kyc_url(
        &self,
        customer_id: &str,
        callback_url: Option<&str>,
    ) -> Result<KycSession, AnchorError> {
        // Meridian renders its KYC inline; the URL is a form descriptor the
        // UI embeds rather than a page to navigate to.
        let mut request = self.get(&format!("/customers/{customer_id}/kyc/form"));
        if let Some(callback) = callback_url {
            request = request.query(&[("callbackUrl", callback)]);
        }
        let response = request.send().await?;
        let envelope: Envelope<KycFormDto> = http::decode(ANCHOR_ID, response).await?;
        Ok(KycSession {
            url: envelope.data.form_url,
            flow: CAPABILITIES.kyc_flow,
        })
    }

    async fn get_kyc_status(&self, customer_id: &str) -> Result<KycStatus, AnchorError> {
        let response = self
            .get(&format!("/customers/{customer_id}/kyc"))
            .send()
            .await?;
        let envelope: Envelope<KycStatusDto> = http::decode(ANCHOR_ID, response).await?;
        map_kyc_status(&envelope.data.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_full_set() {
        assert_eq!(map_status("PENDING").unwrap(), TransactionStatus::Created);
        assert_eq!(
            map_status("AWAITING_FUNDS").unwrap(),
            TransactionStatus::AwaitingPayment
        );
        assert_eq!(map_status("COMPLETE").unwrap(), TransactionStatus::Completed);
        assert_eq!(map_status("ERROR").unwrap(), TransactionStatus::Failed);
        assert!(map_status("complete").is_err());
    }

    #[test]
    fn test_envelope_unwrapping() {
        let json = r#"{"data": {"id": "cus_9", "email": "x@y.z", "kycStatus": "APPROVED",
            "createdAt": "2026-01-05T12:00:00Z", "updatedAt": "2026-01-05T12:00:00Z"}}"#;
        let envelope: Envelope<CustomerDto> = serde_json::from_str(json).unwrap();
        let customer = Customer::try_from(envelope.data).unwrap();
        assert_eq!(customer.kyc_status, KycStatus::Approved);
    }

    #[test]
    fn test_offramp_has_deposit_not_signable() {
        let json = r#"{
            "id": "off_9",
            "status": "AWAITING_FUNDS",
            "sellCurrency": "USDC",
            "buyCurrency": "EUR",
            "sellAmount": "100",
            "buyAmount": "91.50",
            "bankAccountId": "ba_1",
            "depositAddress": "GDEPOSIT...",
            "depositMemo": "off_9",
            "createdAt": "2026-01-05T12:00:00Z"
        }"#;
        let dto: OffRampDto = serde_json::from_str(json).unwrap();
        let tx = OffRampTransaction::try_from(dto).unwrap();
        assert!(tx.signable_transaction.is_none());
        assert_eq!(tx.deposit_address.as_deref(), Some("GDEPOSIT..."));
        assert_eq!(tx.deposit_memo.as_deref(), Some("off_9"));
    }

    #[test]
    fn test_quote_body_uses_sell_buy_naming() {
        let request = QuoteRequest {
            customer_id: "cus_9".into(),
            from_currency: Currency::new("USDC").unwrap(),
            to_currency: Currency::new("EUR").unwrap(),
            amount: QuoteAmount::Destination(Amount::parse("91.5").unwrap()),
        };
        let body = quote_body(&request);
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"buyAmount\":\"91.5\""));
        assert!(!json.contains("sellAmount"));
    }
}

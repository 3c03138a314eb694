//! In-memory anchor used by tests and the CLI's offline mode.
//!
//! [`SandboxAnchor`] implements the full [`Anchor`] surface against
//! [`DashMap`] stores, with the same observable contracts as the real
//! clients: quotes expire and are consumed exactly once, lookups resolve to
//! `Ok(None)` for missing ids, terminal statuses never move, and every
//! capability flag is enforced (bank-before-quote, wallet registration,
//! composite quote ids, payout submission). Transaction progress is driven
//! by polling: each `get_*` call advances an internal poll counter, so a
//! deferred signable "materializes" after a configurable number of polls.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use ramp_core::{
    Amount, Customer, FiatAccount, KycStatus, NewCustomer, NewFiatAccount, OffRampTransaction,
    OnRampTransaction, PaymentInstructions, Quote, QuoteAmount, QuoteRequest, TransactionStatus,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::capabilities::{AnchorCapabilities, KycFlow};
use crate::error::AnchorError;
use crate::traits::{Anchor, KycSession, OffRampRequest, OnRampRequest};

/// Tuning knobs for a sandbox instance.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Id the sandbox reports; presets reuse the real provider ids so
    /// capability-driven code paths can be exercised one-to-one.
    pub anchor_id: String,
    pub capabilities: AnchorCapabilities,
    /// Source-to-destination conversion rate. Must be non-zero.
    pub exchange_rate: Decimal,
    /// Fee in basis points, charged on the destination side.
    pub fee_bps: u32,
    /// Quote validity window.
    pub quote_ttl_secs: i64,
    /// Polls of a deferred off-ramp before the signable appears.
    pub signable_after_polls: u32,
    /// Polls before a transaction completes (counted after the signable
    /// appears, for deferred off-ramps).
    pub complete_after_polls: u32,
}

impl SandboxConfig {
    /// Nopal-shaped sandbox: deferred off-ramp signing, SPEI deposits.
    pub fn nopal() -> Self {
        Self {
            anchor_id: "nopal".into(),
            capabilities: AnchorCapabilities::nopal(),
            exchange_rate: Decimal::new(582, 4), // 0.0582
            fee_bps: 50,
            quote_ttl_secs: 300,
            signable_after_polls: 2,
            complete_after_polls: 2,
        }
    }

    /// Meridian-shaped sandbox: user-signed direct payments, email lookup.
    pub fn meridian() -> Self {
        Self {
            anchor_id: "meridian".into(),
            capabilities: AnchorCapabilities::meridian(),
            exchange_rate: Decimal::ONE,
            fee_bps: 30,
            quote_ttl_secs: 300,
            signable_after_polls: 0,
            complete_after_polls: 2,
        }
    }

    /// Brava-shaped sandbox: bank-before-quote, wallet registration,
    /// composite quote ids, anchor-hosted payouts.
    pub fn brava() -> Self {
        Self {
            anchor_id: "brava".into(),
            capabilities: AnchorCapabilities::brava(),
            exchange_rate: Decimal::new(51025, 4), // 5.1025
            fee_bps: 75,
            quote_ttl_secs: 300,
            signable_after_polls: 0,
            complete_after_polls: 2,
        }
    }
}

struct QuoteRecord {
    quote: Quote,
    consumed: bool,
}

struct OnRampRecord {
    tx: OnRampTransaction,
    polls: u32,
}

struct OffRampRecord {
    tx: OffRampTransaction,
    polls: u32,
    submitted: bool,
    submissions: u32,
}

/// In-memory [`Anchor`] implementation.
pub struct SandboxAnchor {
    config: SandboxConfig,
    customers: DashMap<String, Customer>,
    quotes: DashMap<String, QuoteRecord>,
    on_ramps: DashMap<String, OnRampRecord>,
    off_ramps: DashMap<String, OffRampRecord>,
    fiat_accounts: DashMap<String, FiatAccount>,
    /// ledger address -> owning customer id
    wallets: DashMap<String, String>,
    /// operation name -> (code, http status) for one-shot failure injection
    failures: DashMap<String, (String, u16)>,
}

fn next_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::now_v7())
}

fn round6(amount: Amount) -> Result<Amount, AnchorError> {
    Amount::from_decimal(amount.as_decimal().round_dp(6)).map_err(AnchorError::Core)
}

impl SandboxAnchor {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            customers: DashMap::new(),
            quotes: DashMap::new(),
            on_ramps: DashMap::new(),
            off_ramps: DashMap::new(),
            fiat_accounts: DashMap::new(),
            wallets: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    /// Arrange for the next call to `operation` to fail with the given
    /// provider code and HTTP status. One-shot.
    pub fn fail_next(&self, operation: &str, code: &str, status: u16) {
        self.failures
            .insert(operation.to_string(), (code.to_string(), status));
    }

    /// Force a customer's KYC state, simulating off-band review progress.
    pub fn set_kyc_status(&self, customer_id: &str, status: KycStatus) {
        if let Some(mut customer) = self.customers.get_mut(customer_id) {
            customer.kyc_status = status;
            customer.updated_at = Utc::now();
        }
    }

    /// How many times [`Anchor::submit_payout`] has been called for an
    /// off-ramp. Test observability hook.
    pub fn payout_submissions(&self, off_ramp_id: &str) -> u32 {
        self.off_ramps
            .get(off_ramp_id)
            .map(|r| r.submissions)
            .unwrap_or(0)
    }

    fn take_failure(&self, operation: &str) -> Result<(), AnchorError> {
        if let Some((_, (code, status))) = self.failures.remove(operation) {
            return Err(AnchorError::api(&code, status, "injected sandbox failure"));
        }
        Ok(())
    }

    /// Base customer id of a possibly composite `customer:resource` ref.
    fn base_customer<'a>(&self, customer_ref: &'a str) -> &'a str {
        customer_ref.split(':').next().unwrap_or(customer_ref)
    }

    fn has_fiat_account(&self, customer_id: &str) -> bool {
        self.fiat_accounts
            .iter()
            .any(|e| e.value().customer_id == customer_id)
    }

    /// Consume a quote: exactly once, and only while it is still valid.
    fn consume_quote(&self, quote_id: &str) -> Result<Quote, AnchorError> {
        let mut record = self
            .quotes
            .get_mut(quote_id)
            .ok_or_else(|| AnchorError::api("quote_not_found", 404, quote_id.to_string()))?;
        if record.consumed {
            return Err(AnchorError::api(
                "quote_already_used",
                409,
                quote_id.to_string(),
            ));
        }
        if record.quote.is_expired(Utc::now()) {
            return Err(AnchorError::api("quote_expired", 410, quote_id.to_string()));
        }
        record.consumed = true;
        Ok(record.quote.clone())
    }

    fn fee_fraction(&self) -> Decimal {
        Decimal::from(self.config.fee_bps) / Decimal::from(10_000u32)
    }

    /// Price one side of the pair from the other, charging the fee on the
    /// destination side. Returns (from, to, fee).
    fn price(&self, amount: &QuoteAmount) -> Result<(Amount, Amount, Amount), AnchorError> {
        match amount {
            QuoteAmount::Source(from) => {
                let gross = from.convert(self.config.exchange_rate)?;
                let fee = gross.fee_bps(self.config.fee_bps)?;
                let to = gross.checked_sub(fee)?;
                Ok((*from, round6(to)?, round6(fee)?))
            }
            QuoteAmount::Destination(to) => {
                let one_minus_fee = Decimal::ONE - self.fee_fraction();
                let gross = to
                    .as_decimal()
                    .checked_div(one_minus_fee)
                    .ok_or_else(|| AnchorError::InvalidRequest("fee of 100%".into()))?;
                let from = gross
                    .checked_div(self.config.exchange_rate)
                    .ok_or_else(|| AnchorError::InvalidRequest("zero exchange rate".into()))?;
                let fee = gross - to.as_decimal();
                Ok((
                    round6(Amount::from_decimal(from)?)?,
                    *to,
                    round6(Amount::from_decimal(fee)?)?,
                ))
            }
        }
    }
}

#[async_trait]
impl Anchor for SandboxAnchor {
    fn anchor_id(&self) -> &str {
        &self.config.anchor_id
    }

    fn capabilities(&self) -> &AnchorCapabilities {
        &self.config.capabilities
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, AnchorError> {
        self.take_failure("create_customer")?;
        let now = Utc::now();
        let customer = Customer {
            id: next_id("sbx_cust"),
            email: new.email,
            kyc_status: KycStatus::NotStarted,
            created_at: now,
            updated_at: now,
        };
        self.customers.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, AnchorError> {
        self.take_failure("get_customer")?;
        Ok(self.customers.get(customer_id).map(|c| c.clone()))
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AnchorError> {
        if !self.config.capabilities.supports_email_lookup {
            return Err(AnchorError::Unsupported {
                anchor: self.anchor_id().to_string(),
                operation: "get_customer_by_email",
            });
        }
        self.take_failure("get_customer_by_email")?;
        Ok(self
            .customers
            .iter()
            .find(|e| e.value().email == email)
            .map(|e| e.value().clone()))
    }

    async fn get_quote(&self, request: QuoteRequest) -> Result<Quote, AnchorError> {
        self.take_failure("get_quote")?;
        let caps = &self.config.capabilities;
        if caps.composite_quote_customer_id && !request.customer_id.contains(':') {
            return Err(AnchorError::api(
                "invalid_receiver_ref",
                400,
                "expected composite customer:resource id",
            ));
        }
        let base = self.base_customer(&request.customer_id).to_string();
        if !self.customers.contains_key(&base) {
            return Err(AnchorError::api("customer_not_found", 404, base));
        }
        if caps.requires_bank_before_quote && !self.has_fiat_account(&base) {
            return Err(AnchorError::api(
                "bank_account_required",
                422,
                "register a bank account before quoting",
            ));
        }

        let (from_amount, to_amount, fee) = self.price(&request.amount)?;
        let now = Utc::now();
        let quote = Quote {
            id: next_id("sbx_quote"),
            from_currency: request.from_currency,
            to_currency: request.to_currency,
            from_amount,
            to_amount,
            exchange_rate: self.config.exchange_rate,
            fee,
            expires_at: now + Duration::seconds(self.config.quote_ttl_secs),
            created_at: now,
        };
        self.quotes.insert(
            quote.id.clone(),
            QuoteRecord {
                quote: quote.clone(),
                consumed: false,
            },
        );
        tracing::debug!(anchor = %self.config.anchor_id, quote_id = %quote.id, "sandbox quote issued");
        Ok(quote)
    }

    async fn create_on_ramp(
        &self,
        request: OnRampRequest,
    ) -> Result<OnRampTransaction, AnchorError> {
        self.take_failure("create_on_ramp")?;
        let caps = &self.config.capabilities;
        if caps.requires_wallet_registration {
            let registered = self
                .wallets
                .get(&request.destination_address)
                .map(|owner| *owner == self.base_customer(&request.customer_id))
                .unwrap_or(false);
            if !registered {
                return Err(AnchorError::api(
                    "wallet_not_registered",
                    422,
                    request.destination_address,
                ));
            }
        }
        let quote = self.consume_quote(&request.quote_id)?;

        let id = next_id("sbx_on");
        let payment_instructions = Some(match caps.kyc_flow {
            KycFlow::EmbeddedFrame => PaymentInstructions::Spei {
                clabe: "646180157000000004".into(),
                reference: id.chars().rev().take(8).collect(),
                beneficiary: Some("Sandbox Anchor".into()),
            },
            KycFlow::InlineForm => PaymentInstructions::BankTransfer {
                account_number: "00123456789".into(),
                reference: id.clone(),
                bank_name: Some("Sandbox Bank".into()),
            },
            KycFlow::ExternalRedirect => PaymentInstructions::HostedPage {
                url: format!("https://sandbox.anchors.invalid/pay/{id}"),
            },
        });
        let tx = OnRampTransaction {
            id: id.clone(),
            status: TransactionStatus::AwaitingPayment,
            from_currency: quote.from_currency,
            to_currency: quote.to_currency,
            from_amount: quote.from_amount,
            to_amount: quote.to_amount,
            payment_instructions,
            status_page: None,
            fee_bps: Some(self.config.fee_bps),
            fee_amount: Some(quote.fee),
            created_at: Utc::now(),
        };
        self.on_ramps
            .insert(id, OnRampRecord { tx: tx.clone(), polls: 0 });
        Ok(tx)
    }

    async fn get_on_ramp(&self, id: &str) -> Result<Option<OnRampTransaction>, AnchorError> {
        self.take_failure("get_on_ramp")?;
        let Some(mut record) = self.on_ramps.get_mut(id) else {
            return Ok(None);
        };
        record.polls += 1;
        if !record.tx.status.is_terminal() && record.polls >= self.config.complete_after_polls {
            record.tx.status = record
                .tx
                .status
                .transition(TransactionStatus::Completed)
                .map_err(AnchorError::Core)?;
        }
        Ok(Some(record.tx.clone()))
    }

    async fn register_fiat_account(
        &self,
        new: NewFiatAccount,
    ) -> Result<FiatAccount, AnchorError> {
        self.take_failure("register_fiat_account")?;
        if !self.customers.contains_key(&new.customer_id) {
            return Err(AnchorError::api("customer_not_found", 404, new.customer_id));
        }
        let account = FiatAccount {
            id: next_id("sbx_bank"),
            customer_id: new.customer_id,
            bank_name: new.bank_name,
            account_number: new.account_number,
            currency: new.currency,
            created_at: Utc::now(),
        };
        self.fiat_accounts
            .insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn get_fiat_accounts(
        &self,
        customer_id: &str,
    ) -> Result<Vec<FiatAccount>, AnchorError> {
        self.take_failure("get_fiat_accounts")?;
        Ok(self
            .fiat_accounts
            .iter()
            .filter(|e| e.value().customer_id == customer_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn create_off_ramp(
        &self,
        request: OffRampRequest,
    ) -> Result<OffRampTransaction, AnchorError> {
        self.take_failure("create_off_ramp")?;
        let caps = &self.config.capabilities;
        if !self.fiat_accounts.contains_key(&request.fiat_account_id) {
            return Err(AnchorError::api(
                "bank_account_not_found",
                404,
                request.fiat_account_id,
            ));
        }
        let quote = self.consume_quote(&request.quote_id)?;

        let id = next_id("sbx_off");
        let (status, deposit_address, deposit_memo) = if caps.deferred_offramp_signing {
            (TransactionStatus::AwaitingSignable, None, None)
        } else if caps.requires_anchor_payout_submission {
            (TransactionStatus::Created, None, None)
        } else {
            (
                TransactionStatus::AwaitingPayment,
                Some(format!("GSBX{}", &id[8..])),
                Some(id.clone()),
            )
        };
        let tx = OffRampTransaction {
            id: id.clone(),
            status,
            from_currency: quote.from_currency,
            to_currency: quote.to_currency,
            from_amount: quote.from_amount,
            to_amount: quote.to_amount,
            fiat_account_id: request.fiat_account_id,
            signable_transaction: None,
            deposit_address,
            deposit_memo,
            status_page: None,
            fee_bps: Some(self.config.fee_bps),
            fee_amount: Some(quote.fee),
            created_at: Utc::now(),
        };
        self.off_ramps.insert(
            id,
            OffRampRecord {
                tx: tx.clone(),
                polls: 0,
                submitted: false,
                submissions: 0,
            },
        );
        Ok(tx)
    }

    async fn get_off_ramp(&self, id: &str) -> Result<Option<OffRampTransaction>, AnchorError> {
        self.take_failure("get_off_ramp")?;
        let caps = &self.config.capabilities;
        let Some(mut record) = self.off_ramps.get_mut(id) else {
            return Ok(None);
        };
        record.polls += 1;

        if caps.deferred_offramp_signing
            && record.tx.signable_transaction.is_none()
            && record.polls >= self.config.signable_after_polls
        {
            record.tx.signable_transaction = Some(format!("XDR-MOCK-{id}"));
        }

        // Payout-submission providers sit still until submit_payout.
        let may_progress = !caps.requires_anchor_payout_submission || record.submitted;
        let threshold = if caps.deferred_offramp_signing {
            self.config.signable_after_polls + self.config.complete_after_polls
        } else {
            self.config.complete_after_polls
        };
        if may_progress && !record.tx.status.is_terminal() && record.polls >= threshold {
            record.tx.status = record
                .tx
                .status
                .transition(TransactionStatus::Completed)
                .map_err(AnchorError::Core)?;
        }
        Ok(Some(record.tx.clone()))
    }

    async fn get_kyc_url(
        &self,
        customer_id: &str,
        callback_url: Option<&str>,
    ) -> Result<KycSession, AnchorError> {
        self.take_failure("get_kyc_url")?;
        if !self.customers.contains_key(customer_id) {
            return Err(AnchorError::api(
                "customer_not_found",
                404,
                customer_id.to_string(),
            ));
        }
        let mut url = format!(
            "https://sandbox.anchors.invalid/{}/kyc/{customer_id}",
            self.config.anchor_id
        );
        if let Some(callback) = callback_url {
            url.push_str("?redirect=");
            url.push_str(callback);
        }
        Ok(KycSession {
            url,
            flow: self.config.capabilities.kyc_flow,
        })
    }

    async fn get_kyc_status(&self, customer_id: &str) -> Result<KycStatus, AnchorError> {
        self.take_failure("get_kyc_status")?;
        self.customers
            .get(customer_id)
            .map(|c| c.kyc_status)
            .ok_or_else(|| {
                AnchorError::api("customer_not_found", 404, customer_id.to_string())
            })
    }

    async fn register_wallet(
        &self,
        customer_id: &str,
        ledger_address: &str,
    ) -> Result<(), AnchorError> {
        if !self.config.capabilities.requires_wallet_registration {
            return Err(AnchorError::Unsupported {
                anchor: self.anchor_id().to_string(),
                operation: "register_wallet",
            });
        }
        self.take_failure("register_wallet")?;
        self.wallets
            .insert(ledger_address.to_string(), customer_id.to_string());
        Ok(())
    }

    async fn submit_payout(&self, off_ramp_id: &str) -> Result<OffRampTransaction, AnchorError> {
        if !self.config.capabilities.requires_anchor_payout_submission {
            return Err(AnchorError::Unsupported {
                anchor: self.anchor_id().to_string(),
                operation: "submit_payout",
            });
        }
        self.take_failure("submit_payout")?;
        let mut record = self.off_ramps.get_mut(off_ramp_id).ok_or_else(|| {
            AnchorError::api("payout_not_found", 404, off_ramp_id.to_string())
        })?;
        record.submitted = true;
        record.submissions += 1;
        record.tx.status = record
            .tx
            .status
            .transition(TransactionStatus::Processing)
            .map_err(AnchorError::Core)?;
        Ok(record.tx.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramp_core::Currency;

    fn request(customer_id: &str, amount: &str) -> QuoteRequest {
        QuoteRequest {
            customer_id: customer_id.to_string(),
            from_currency: Currency::new("MXN").unwrap(),
            to_currency: Currency::new("CETES").unwrap(),
            amount: QuoteAmount::Source(Amount::parse(amount).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_quote_is_consumed_exactly_once() {
        let sandbox = SandboxAnchor::new(SandboxConfig::nopal());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let quote = sandbox.get_quote(request(&customer.id, "1000")).await.unwrap();

        let on_ramp = OnRampRequest {
            customer_id: customer.id.clone(),
            quote_id: quote.id.clone(),
            destination_address: "GADDR".into(),
        };
        sandbox.create_on_ramp(on_ramp.clone()).await.unwrap();
        let err = sandbox.create_on_ramp(on_ramp).await.unwrap_err();
        assert!(matches!(err, AnchorError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_bank_before_quote_enforced() {
        let sandbox = SandboxAnchor::new(SandboxConfig::brava());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let composite = sandbox
            .capabilities()
            .build_quote_customer_id(&customer.id, "ba_missing");
        let err = sandbox.get_quote(request(&composite, "100")).await.unwrap_err();
        assert!(matches!(err, AnchorError::Api { status: 422, ref code, .. }
            if code == "bank_account_required"));
    }

    #[tokio::test]
    async fn test_composite_id_required_by_brava_shape() {
        let sandbox = SandboxAnchor::new(SandboxConfig::brava());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let err = sandbox.get_quote(request(&customer.id, "100")).await.unwrap_err();
        assert!(matches!(err, AnchorError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_deferred_signable_appears_through_polling() {
        let sandbox = SandboxAnchor::new(SandboxConfig::nopal());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let bank = sandbox
            .register_fiat_account(NewFiatAccount {
                customer_id: customer.id.clone(),
                bank_name: "Banco".into(),
                account_number: "002".into(),
                currency: Currency::new("MXN").unwrap(),
            })
            .await
            .unwrap();
        let quote = sandbox.get_quote(request(&customer.id, "1000")).await.unwrap();
        let tx = sandbox
            .create_off_ramp(OffRampRequest {
                customer_id: customer.id,
                quote_id: quote.id,
                fiat_account_id: bank.id,
                refund_address: None,
            })
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::AwaitingSignable);
        assert!(tx.signable_transaction.is_none());

        let first = sandbox.get_off_ramp(&tx.id).await.unwrap().unwrap();
        assert!(first.signable_transaction.is_none());
        let second = sandbox.get_off_ramp(&tx.id).await.unwrap().unwrap();
        assert!(second.signable_transaction.is_some());
    }

    #[tokio::test]
    async fn test_payout_holds_until_submission() {
        let sandbox = SandboxAnchor::new(SandboxConfig::brava());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let bank = sandbox
            .register_fiat_account(NewFiatAccount {
                customer_id: customer.id.clone(),
                bank_name: "Banco".into(),
                account_number: "002".into(),
                currency: Currency::new("BRL").unwrap(),
            })
            .await
            .unwrap();
        let composite = sandbox
            .capabilities()
            .build_quote_customer_id(&customer.id, &bank.id);
        let quote = sandbox.get_quote(request(&composite, "100")).await.unwrap();
        let tx = sandbox
            .create_off_ramp(OffRampRequest {
                customer_id: composite,
                quote_id: quote.id,
                fiat_account_id: bank.id,
                refund_address: None,
            })
            .await
            .unwrap();

        // No amount of polling moves it before submission.
        for _ in 0..5 {
            let polled = sandbox.get_off_ramp(&tx.id).await.unwrap().unwrap();
            assert!(!polled.status.is_terminal());
        }
        let submitted = sandbox.submit_payout(&tx.id).await.unwrap();
        assert_eq!(submitted.status, TransactionStatus::Processing);
        assert_eq!(sandbox.payout_submissions(&tx.id), 1);

        let mut last = submitted.status;
        for _ in 0..3 {
            last = sandbox.get_off_ramp(&tx.id).await.unwrap().unwrap().status;
        }
        assert_eq!(last, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_lookup_of_missing_ids_is_none_not_error() {
        let sandbox = SandboxAnchor::new(SandboxConfig::meridian());
        assert!(sandbox.get_customer("nope").await.unwrap().is_none());
        assert!(sandbox.get_on_ramp("nope").await.unwrap().is_none());
        assert!(sandbox.get_off_ramp("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fee_charged_on_destination_side() {
        let sandbox = SandboxAnchor::new(SandboxConfig::nopal());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let quote = sandbox.get_quote(request(&customer.id, "1000")).await.unwrap();

        // 1000 * 0.0582 = 58.2 gross; 50 bps fee = 0.291; net 57.909
        assert_eq!(quote.from_amount, Amount::parse("1000").unwrap());
        assert_eq!(quote.to_amount, Amount::parse("57.909000").unwrap());
        assert_eq!(quote.fee, Amount::parse("0.291000").unwrap());
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let sandbox = SandboxAnchor::new(SandboxConfig::nopal());
        sandbox.fail_next("create_customer", "rate_limited", 429);
        let err = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnchorError::Api { status: 429, .. }));
        assert!(sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_wallet_registration_gate() {
        let sandbox = SandboxAnchor::new(SandboxConfig::brava());
        let customer = sandbox
            .create_customer(NewCustomer::with_email("a@b.io"))
            .await
            .unwrap();
        let bank = sandbox
            .register_fiat_account(NewFiatAccount {
                customer_id: customer.id.clone(),
                bank_name: "Banco".into(),
                account_number: "002".into(),
                currency: Currency::new("BRL").unwrap(),
            })
            .await
            .unwrap();
        let composite = sandbox
            .capabilities()
            .build_quote_customer_id(&customer.id, &bank.id);
        let quote = sandbox.get_quote(request(&composite, "100")).await.unwrap();

        let on_ramp = OnRampRequest {
            customer_id: customer.id.clone(),
            quote_id: quote.id,
            destination_address: "GWALLET".into(),
        };
        let err = sandbox.create_on_ramp(on_ramp.clone()).await.unwrap_err();
        assert!(matches!(err, AnchorError::Api { ref code, .. }
            if code == "wallet_not_registered"));

        sandbox
            .register_wallet(&customer.id, "GWALLET")
            .await
            .unwrap();
        sandbox.create_on_ramp(on_ramp).await.unwrap();
    }
}

use std::sync::Arc;

use chrono::Utc;
use ramp_anchors::{Anchor, KycSession, OnRampRequest};
use ramp_core::{
    CoreError, Currency, Customer, NewCustomer, OnRampTransaction, Quote, QuoteAmount,
    QuoteRequest, TransactionStatus,
};
use tokio::sync::watch;

use crate::error::FlowError;
use crate::poll::{self, PollConfig};
use crate::steps::FlowTracker;
use crate::store::{CustomerRecord, CustomerStore};

/// Resolve the anchor customer for a wallet, creating one if the cache and
/// the provider both come up empty.
///
/// The cache is keyed by wallet address and is advisory: the provider
/// record wins, and a cache entry for a different anchor is ignored. Email
/// lookup is tried before creation where the provider supports it, so a
/// customer created on another device is found instead of duplicated.
pub async fn ensure_customer(
    anchor: &dyn Anchor,
    store: &dyn CustomerStore,
    wallet: &str,
    email: &str,
) -> Result<Customer, FlowError> {
    if let Some(record) = store.get(wallet) {
        if record.anchor_id == anchor.anchor_id() {
            if let Some(customer) = anchor.get_customer(&record.customer_id).await? {
                store.put(
                    wallet,
                    CustomerRecord {
                        anchor_id: anchor.anchor_id().to_string(),
                        customer_id: customer.id.clone(),
                        email: customer.email.clone(),
                        kyc_status: customer.kyc_status,
                    },
                );
                return Ok(customer);
            }
        }
    }

    let found = if anchor.capabilities().supports_email_lookup {
        anchor.get_customer_by_email(email).await?
    } else {
        None
    };
    let customer = match found {
        Some(customer) => customer,
        None => anchor.create_customer(NewCustomer::with_email(email)).await?,
    };

    store.put(
        wallet,
        CustomerRecord {
            anchor_id: anchor.anchor_id().to_string(),
            customer_id: customer.id.clone(),
            email: customer.email.clone(),
            kyc_status: customer.kyc_status,
        },
    );
    Ok(customer)
}

fn quote_amount_value(amount: &QuoteAmount) -> ramp_core::Amount {
    match amount {
        QuoteAmount::Source(a) | QuoteAmount::Destination(a) => *a,
    }
}

/// Inputs for one on-ramp run.
#[derive(Debug, Clone)]
pub struct OnRampArgs {
    /// Ledger address: cache key and asset destination.
    pub wallet: String,
    /// Customer contact email.
    pub email: String,
    /// Fiat currency being deposited.
    pub from_currency: Currency,
    /// Ledger asset being bought.
    pub to_currency: Currency,
    /// One fixed side of the conversion.
    pub amount: QuoteAmount,
    /// Selected bank account, for providers that demand one before quoting.
    pub fiat_account_id: Option<String>,
}

/// What a completed on-ramp run produced.
#[derive(Debug, Clone)]
pub struct OnRampOutcome {
    pub customer: Customer,
    pub kyc: KycSession,
    pub quote: Quote,
    pub transaction: OnRampTransaction,
}

/// Drives a deposit from amount entry to a terminal provider status.
pub struct OnRampFlow {
    anchor: Arc<dyn Anchor>,
    customers: Arc<dyn CustomerStore>,
    poll: PollConfig,
}

impl OnRampFlow {
    pub fn new(
        anchor: Arc<dyn Anchor>,
        customers: Arc<dyn CustomerStore>,
        poll: PollConfig,
    ) -> Self {
        Self {
            anchor,
            customers,
            poll,
        }
    }

    /// Run the whole flow. Conditional steps are taken exactly when the
    /// provider's capability flags call for them; the caller never branches
    /// on provider identity.
    pub async fn run(
        &self,
        args: OnRampArgs,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<OnRampOutcome, FlowError> {
        let mut tracker = FlowTracker::new(self.anchor.capabilities());
        self.run_with_tracker(args, cancel, &mut tracker).await
    }

    /// Like [`run`](Self::run), but drives a caller-owned [`FlowTracker`].
    /// After the run the tracker holds how far the flow got and, on failure,
    /// the reverted step and its error message.
    pub async fn run_with_tracker(
        &self,
        args: OnRampArgs,
        cancel: &mut watch::Receiver<bool>,
        tracker: &mut FlowTracker,
    ) -> Result<OnRampOutcome, FlowError> {
        let caps = *self.anchor.capabilities();

        if quote_amount_value(&args.amount).is_zero() {
            tracker.fail("amount must be positive");
            return Err(FlowError::Core(CoreError::InvalidAmount(
                "amount must be positive".into(),
            )));
        }
        let customer = ensure_customer(
            self.anchor.as_ref(),
            self.customers.as_ref(),
            &args.wallet,
            &args.email,
        )
        .await?;
        let kyc = self.anchor.get_kyc_url(&customer.id, None).await?;
        tracker.advance();

        if caps.requires_bank_before_quote {
            if args.fiat_account_id.is_none() {
                tracker.fail("no bank account selected");
                return Err(FlowError::BankAccountRequired);
            }
            tracker.advance();
        }

        let resource = args.fiat_account_id.as_deref().unwrap_or(&args.wallet);
        let customer_ref = caps.build_quote_customer_id(&customer.id, resource);
        let quote = match self
            .anchor
            .get_quote(QuoteRequest {
                customer_id: customer_ref,
                from_currency: args.from_currency.clone(),
                to_currency: args.to_currency.clone(),
                amount: args.amount,
            })
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
        };
        tracker.advance();

        if caps.requires_wallet_registration {
            if let Err(e) = self
                .anchor
                .register_wallet(&customer.id, &args.wallet)
                .await
            {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
            tracker.advance();
        }

        if let Err(e) = quote.ensure_valid(Utc::now()) {
            tracker.quote_expired(&quote.id);
            return Err(e.into());
        }
        let transaction = match self
            .anchor
            .create_on_ramp(OnRampRequest {
                customer_id: customer.id.clone(),
                quote_id: quote.id.clone(),
                destination_address: args.wallet.clone(),
            })
            .await
        {
            Ok(tx) => tx,
            Err(e) => {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
        };
        tracing::info!(
            transaction_id = %transaction.id,
            has_instructions = transaction.payment_instructions.is_some(),
            "on-ramp created, awaiting payment"
        );
        tracker.advance();

        tracker.advance(); // polling
        let transaction = poll::poll_on_ramp(
            self.anchor.as_ref(),
            &transaction.id,
            &self.poll,
            cancel,
            |tx| tx.status.is_terminal(),
        )
        .await?;

        if transaction.status != TransactionStatus::Completed {
            let err = FlowError::TerminalFailure {
                id: transaction.id.clone(),
                status: transaction.status.to_string(),
            };
            tracker.fail(err.to_string());
            return Err(err);
        }
        tracker.advance();
        tracing::info!(transaction_id = %transaction.id, "on-ramp completed");

        Ok(OnRampOutcome {
            customer,
            kyc,
            quote,
            transaction,
        })
    }
}

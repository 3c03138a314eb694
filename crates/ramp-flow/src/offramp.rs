use std::sync::Arc;

use chrono::Utc;
use ramp_anchors::{Anchor, OffRampRequest};
use ramp_core::{
    CoreError, Currency, Customer, OffRampEvent, OffRampPhase, OffRampStateMachine,
    OffRampTransaction, Quote, QuoteAmount, QuoteRequest, TransactionStatus,
};
use tokio::sync::watch;

use crate::error::FlowError;
use crate::onramp::ensure_customer;
use crate::poll::{self, PollConfig};
use crate::seams::{LedgerGateway, WalletSigner};
use crate::steps::FlowTracker;
use crate::store::CustomerStore;

/// Map an observed terminal provider status onto the phase machine event.
fn terminal_event(status: TransactionStatus) -> OffRampEvent {
    if status == TransactionStatus::Completed {
        OffRampEvent::CompletedObserved
    } else {
        OffRampEvent::FailureObserved
    }
}

/// Inputs for one off-ramp run.
#[derive(Debug, Clone)]
pub struct OffRampArgs {
    /// Ledger address: cache key and source of funds.
    pub wallet: String,
    /// Customer contact email.
    pub email: String,
    /// Ledger asset being sold.
    pub from_currency: Currency,
    /// Fiat currency being paid out.
    pub to_currency: Currency,
    /// One fixed side of the conversion.
    pub amount: QuoteAmount,
    /// Destination bank account. Required before the quote where the
    /// provider demands it, and always before the withdrawal is created.
    pub fiat_account_id: Option<String>,
    /// Where funds return on failure, for providers that support it.
    pub refund_address: Option<String>,
}

/// What a completed off-ramp run produced.
#[derive(Debug, Clone)]
pub struct OffRampOutcome {
    pub customer: Customer,
    pub quote: Quote,
    pub transaction: OffRampTransaction,
    /// Hash of the ledger transaction, when this flow broadcast one.
    pub ledger_hash: Option<String>,
    pub final_phase: OffRampPhase,
}

/// Drives a withdrawal to a terminal provider status.
///
/// Three signing protocols hide behind the capability flags:
/// - deferred signing: poll until the provider hands back a signable
///   envelope, sign it locally, broadcast, poll to terminal;
/// - direct payment: build and sign a payment to the provider's deposit
///   address, broadcast, poll to terminal;
/// - anchor-hosted payout: no ledger transaction at all, one payout
///   submission call, poll to terminal.
pub struct OffRampFlow {
    anchor: Arc<dyn Anchor>,
    customers: Arc<dyn CustomerStore>,
    signer: Arc<dyn WalletSigner>,
    ledger: Arc<dyn LedgerGateway>,
    poll: PollConfig,
}

impl OffRampFlow {
    pub fn new(
        anchor: Arc<dyn Anchor>,
        customers: Arc<dyn CustomerStore>,
        signer: Arc<dyn WalletSigner>,
        ledger: Arc<dyn LedgerGateway>,
        poll: PollConfig,
    ) -> Self {
        Self {
            anchor,
            customers,
            signer,
            ledger,
            poll,
        }
    }

    pub async fn run(
        &self,
        args: OffRampArgs,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<OffRampOutcome, FlowError> {
        let mut tracker = FlowTracker::new(self.anchor.capabilities());
        self.run_with_tracker(args, cancel, &mut tracker).await
    }

    /// Like [`run`](Self::run), but drives a caller-owned [`FlowTracker`].
    /// After the run the tracker holds how far the flow got and, on failure,
    /// the reverted step and its error message.
    pub async fn run_with_tracker(
        &self,
        args: OffRampArgs,
        cancel: &mut watch::Receiver<bool>,
        tracker: &mut FlowTracker,
    ) -> Result<OffRampOutcome, FlowError> {
        let caps = *self.anchor.capabilities();

        let amount = match &args.amount {
            QuoteAmount::Source(a) | QuoteAmount::Destination(a) => *a,
        };
        if amount.is_zero() {
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
                customer_id: customer_ref.clone(),
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

        // The payout destination is needed at creation even when the
        // provider allowed quoting without one.
        let Some(fiat_account_id) = args.fiat_account_id.clone() else {
            tracker.fail("no bank account selected");
            return Err(FlowError::BankAccountRequired);
        };
        if let Err(e) = quote.ensure_valid(Utc::now()) {
            tracker.quote_expired(&quote.id);
            return Err(e.into());
        }
        let transaction = match self
            .anchor
            .create_off_ramp(OffRampRequest {
                customer_id: customer_ref,
                quote_id: quote.id.clone(),
                fiat_account_id,
                refund_address: args.refund_address.clone(),
            })
            .await
        {
            Ok(tx) => tx,
            Err(e) => {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
        };

        let (transaction, ledger_hash, final_phase) = if caps.deferred_offramp_signing {
            self.run_deferred(transaction, cancel).await?
        } else if caps.requires_anchor_payout_submission {
            self.run_payout_submission(transaction, cancel).await?
        } else {
            self.run_direct_payment(transaction, cancel).await?
        };
        tracker.advance(); // payment or signing done
        tracker.advance(); // polling done

        if transaction.status != TransactionStatus::Completed {
            let err = FlowError::TerminalFailure {
                id: transaction.id.clone(),
                status: transaction.status.to_string(),
            };
            tracker.fail(err.to_string());
            return Err(err);
        }
        tracker.advance();
        tracing::info!(transaction_id = %transaction.id, "off-ramp completed");

        Ok(OffRampOutcome {
            customer,
            quote,
            transaction,
            ledger_hash,
            final_phase,
        })
    }

    /// Deferred signing: the signable envelope does not exist at creation
    /// and appears only through polling. The phase machine checkpoints every
    /// move so an invalid ordering is a bug, not a provider quirk.
    async fn run_deferred(
        &self,
        created: OffRampTransaction,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(OffRampTransaction, Option<String>, OffRampPhase), FlowError> {
        let id = created.id.clone();
        let mut phase = OffRampPhase::Created;
        phase = OffRampStateMachine::transition(phase, OffRampEvent::PollForSignable)?;

        let with_signable = poll::poll_off_ramp(
            self.anchor.as_ref(),
            &id,
            &self.poll,
            cancel,
            |tx| tx.signable_transaction.is_some() || tx.status.is_terminal(),
        )
        .await?;
        if with_signable.status.is_terminal() {
            // Some providers settle without ever exposing the envelope.
            let phase =
                OffRampStateMachine::transition(phase, terminal_event(with_signable.status))?;
            return Ok((with_signable, None, phase));
        }
        let signable = with_signable
            .signable_transaction
            .clone()
            .ok_or_else(|| FlowError::TransactionVanished(id.clone()))?;
        phase = OffRampStateMachine::transition(phase, OffRampEvent::SignableReceived)?;

        let signed = self.signer.sign(&signable).await?;
        phase = OffRampStateMachine::transition(phase, OffRampEvent::Signed)?;
        let hash = self.ledger.broadcast(&signed).await?;
        phase = OffRampStateMachine::transition(phase, OffRampEvent::Broadcast)?;
        tracing::info!(transaction_id = %id, ledger_hash = %hash, "signed envelope broadcast");

        phase = OffRampStateMachine::transition(phase, OffRampEvent::PollForSignable)?;
        let terminal = poll::poll_off_ramp(self.anchor.as_ref(), &id, &self.poll, cancel, |tx| {
            tx.status.is_terminal()
        })
        .await?;
        phase = OffRampStateMachine::transition(phase, terminal_event(terminal.status))?;
        Ok((terminal, Some(hash), phase))
    }

    /// Direct payment: the wallet builds and signs a payment to the
    /// provider's deposit address itself.
    async fn run_direct_payment(
        &self,
        created: OffRampTransaction,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(OffRampTransaction, Option<String>, OffRampPhase), FlowError> {
        let id = created.id.clone();
        let deposit_address = created
            .deposit_address
            .clone()
            .ok_or_else(|| FlowError::DepositAddressMissing(id.clone()))?;

        let signed = self
            .signer
            .build_payment(
                &deposit_address,
                created.deposit_memo.as_deref(),
                &created.from_amount,
                &created.from_currency,
            )
            .await?;
        let hash = self.ledger.broadcast(&signed).await?;
        tracing::info!(transaction_id = %id, ledger_hash = %hash, "direct payment broadcast");

        let terminal = poll::poll_off_ramp(self.anchor.as_ref(), &id, &self.poll, cancel, |tx| {
            tx.status.is_terminal()
        })
        .await?;
        let phase = if terminal.status == TransactionStatus::Completed {
            OffRampPhase::Completed
        } else {
            OffRampPhase::Failed
        };
        Ok((terminal, Some(hash), phase))
    }

    /// Anchor-hosted payout: exactly one submission call, never a ledger
    /// transaction or local signature.
    async fn run_payout_submission(
        &self,
        created: OffRampTransaction,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(OffRampTransaction, Option<String>, OffRampPhase), FlowError> {
        let id = created.id.clone();
        let submitted = self.anchor.submit_payout(&id).await?;
        tracing::info!(transaction_id = %id, status = %submitted.status, "payout submitted");

        let terminal = poll::poll_off_ramp(self.anchor.as_ref(), &id, &self.poll, cancel, |tx| {
            tx.status.is_terminal()
        })
        .await?;
        let phase = if terminal.status == TransactionStatus::Completed {
            OffRampPhase::Completed
        } else {
            OffRampPhase::Failed
        };
        Ok((terminal, None, phase))
    }
}

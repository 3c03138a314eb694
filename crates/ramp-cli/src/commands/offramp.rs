//! `ramp offramp` — run a full withdrawal flow against a sandbox anchor.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use ramp_anchors::Anchor;
use ramp_core::{Amount, Currency, NewFiatAccount, QuoteAmount};
use ramp_flow::{
    poll, FlowError, InMemoryCustomerStore, LedgerGateway, OffRampArgs, OffRampFlow, WalletSigner,
};

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct OffRampCmdArgs {
    /// Anchor to withdraw through.
    #[arg(short, long, default_value = "nopal")]
    pub anchor: String,

    /// Ledger asset to sell.
    #[arg(long, default_value = "CETES")]
    pub from: String,

    /// Fiat currency to receive.
    #[arg(long, default_value = "MXN")]
    pub to: String,

    /// Asset amount, as a decimal string.
    #[arg(long)]
    pub amount: String,
}

/// Sandbox signer: fabricates signed envelopes and prints what a real
/// wallet would have signed.
struct ConsoleSigner;

#[async_trait]
impl WalletSigner for ConsoleSigner {
    async fn sign(&self, signable: &str) -> Result<String, FlowError> {
        println!("Signing envelope: {signable}");
        Ok(format!("signed:{signable}"))
    }

    async fn build_payment(
        &self,
        destination: &str,
        memo: Option<&str>,
        amount: &Amount,
        asset: &Currency,
    ) -> Result<String, FlowError> {
        println!(
            "Building payment of {amount} {asset} to {destination} (memo: {})",
            memo.unwrap_or("-")
        );
        Ok(format!("payment:{destination}:{amount}"))
    }
}

/// Sandbox ledger: pretends to broadcast and returns a synthetic hash.
struct ConsoleLedger;

#[async_trait]
impl LedgerGateway for ConsoleLedger {
    async fn broadcast(&self, signed: &str) -> Result<String, FlowError> {
        println!("Broadcasting: {signed}");
        Ok(format!("hash:{:016x}", signed.len()))
    }
}

pub async fn run(args: &OffRampCmdArgs, config: &CliConfig) -> anyhow::Result<()> {
    let anchor = super::pick_anchor(&args.anchor)?;
    let store = Arc::new(InMemoryCustomerStore::new());

    // Every withdrawal needs a destination bank account; register one for
    // the sandbox customer up front.
    let customer = ramp_flow::ensure_customer(
        anchor.as_ref(),
        store.as_ref(),
        &config.wallet,
        &config.email,
    )
    .await?;
    let bank = anchor
        .register_fiat_account(NewFiatAccount {
            customer_id: customer.id,
            bank_name: "CLI Sandbox Bank".into(),
            account_number: "000000".into(),
            currency: Currency::new(&args.to)?,
        })
        .await?;

    let flow = OffRampFlow::new(
        anchor,
        store,
        Arc::new(ConsoleSigner),
        Arc::new(ConsoleLedger),
        config.poll.clone(),
    );
    let (_cancel_tx, mut cancel) = poll::cancellation();

    println!("Starting off-ramp via {}...", args.anchor);
    let outcome = flow
        .run(
            OffRampArgs {
                wallet: config.wallet.clone(),
                email: config.email.clone(),
                from_currency: Currency::new(&args.from)?,
                to_currency: Currency::new(&args.to)?,
                amount: QuoteAmount::Source(Amount::parse(&args.amount)?),
                fiat_account_id: Some(bank.id),
                refund_address: Some(config.wallet.clone()),
            },
            &mut cancel,
        )
        .await?;

    println!(
        "Quote: {} {} -> {} {}",
        outcome.quote.from_amount,
        outcome.quote.from_currency,
        outcome.quote.to_amount,
        outcome.quote.to_currency
    );
    if let Some(hash) = &outcome.ledger_hash {
        println!("Ledger transaction: {hash}");
    }
    println!(
        "Done: transaction {} is {} (phase {})",
        outcome.transaction.id, outcome.transaction.status, outcome.final_phase
    );
    Ok(())
}

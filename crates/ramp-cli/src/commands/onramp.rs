//! `ramp onramp` — run a full deposit flow against a sandbox anchor.

use std::sync::Arc;

use clap::Args;
use ramp_anchors::Anchor;
use ramp_core::{Amount, Currency, NewFiatAccount, PaymentInstructions, QuoteAmount};
use ramp_flow::{poll, InMemoryCustomerStore, OnRampArgs, OnRampFlow};

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct OnRampCmdArgs {
    /// Anchor to deposit through.
    #[arg(short, long, default_value = "nopal")]
    pub anchor: String,

    /// Fiat currency to deposit.
    #[arg(long, default_value = "MXN")]
    pub from: String,

    /// Ledger asset to receive.
    #[arg(long, default_value = "CETES")]
    pub to: String,

    /// Fiat amount, as a decimal string.
    #[arg(long)]
    pub amount: String,
}

pub async fn run(args: &OnRampCmdArgs, config: &CliConfig) -> anyhow::Result<()> {
    let anchor = super::pick_anchor(&args.anchor)?;
    let store = Arc::new(InMemoryCustomerStore::new());

    // Bank-first providers need an account before the flow can quote.
    let fiat_account_id = if anchor.capabilities().requires_bank_before_quote {
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
                currency: Currency::new(&args.from)?,
            })
            .await?;
        Some(bank.id)
    } else {
        None
    };

    let flow = OnRampFlow::new(anchor, store, config.poll.clone());
    let (_cancel_tx, mut cancel) = poll::cancellation();

    println!("Starting on-ramp via {}...", args.anchor);
    let outcome = flow
        .run(
            OnRampArgs {
                wallet: config.wallet.clone(),
                email: config.email.clone(),
                from_currency: Currency::new(&args.from)?,
                to_currency: Currency::new(&args.to)?,
                amount: QuoteAmount::Source(Amount::parse(&args.amount)?),
                fiat_account_id,
            },
            &mut cancel,
        )
        .await?;

    println!("KYC ({:?}): {}", outcome.kyc.flow, outcome.kyc.url);
    println!(
        "Quote: {} {} -> {} {}",
        outcome.quote.from_amount,
        outcome.quote.from_currency,
        outcome.quote.to_amount,
        outcome.quote.to_currency
    );
    match &outcome.transaction.payment_instructions {
        Some(PaymentInstructions::Spei {
            clabe, reference, ..
        }) => {
            println!("Pay by SPEI:");
            println!("  CLABE:     {clabe}");
            println!("  Reference: {reference}");
        }
        Some(PaymentInstructions::BankTransfer {
            account_number,
            reference,
            bank_name,
        }) => {
            println!("Pay by bank transfer:");
            println!("  Account:   {account_number}");
            println!("  Reference: {reference}");
            if let Some(bank) = bank_name {
                println!("  Bank:      {bank}");
            }
        }
        Some(PaymentInstructions::HostedPage { url }) => {
            println!("Pay at: {url}");
        }
        None => println!("No payment instructions returned."),
    }
    println!(
        "Done: transaction {} is {}",
        outcome.transaction.id, outcome.transaction.status
    );
    Ok(())
}

//! `ramp quote` — one-shot quote against a sandbox anchor.

use clap::Args;
use ramp_anchors::Anchor;
use ramp_core::{Amount, Currency, NewCustomer, NewFiatAccount, QuoteAmount, QuoteRequest};

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Anchor to quote against.
    #[arg(short, long, default_value = "nopal")]
    pub anchor: String,

    /// Currency to convert from.
    #[arg(long)]
    pub from: String,

    /// Currency to convert to.
    #[arg(long)]
    pub to: String,

    /// Amount, as a decimal string.
    #[arg(long)]
    pub amount: String,

    /// Fix the destination side instead of the source side.
    #[arg(long)]
    pub destination: bool,
}

pub async fn run(args: &QuoteArgs, config: &CliConfig) -> anyhow::Result<()> {
    let anchor = super::pick_anchor(&args.anchor)?;
    let caps = *anchor.capabilities();

    let customer = anchor
        .create_customer(NewCustomer::with_email(&config.email))
        .await?;

    // Sandbox providers enforce the same pre-quote ordering as the real
    // ones, so register a bank first where the flags demand it.
    let resource = if caps.requires_bank_before_quote {
        let bank = anchor
            .register_fiat_account(NewFiatAccount {
                customer_id: customer.id.clone(),
                bank_name: "CLI Sandbox Bank".into(),
                account_number: "000000".into(),
                currency: Currency::new(&args.to)?,
            })
            .await?;
        bank.id
    } else {
        config.wallet.clone()
    };

    let amount = Amount::parse(&args.amount)?;
    let quote = anchor
        .get_quote(QuoteRequest {
            customer_id: caps.build_quote_customer_id(&customer.id, &resource),
            from_currency: Currency::new(&args.from)?,
            to_currency: Currency::new(&args.to)?,
            amount: if args.destination {
                QuoteAmount::Destination(amount)
            } else {
                QuoteAmount::Source(amount)
            },
        })
        .await?;

    println!("Quote {} from {}", quote.id, args.anchor);
    println!("  Sell:     {} {}", quote.from_amount, quote.from_currency);
    println!("  Receive:  {} {}", quote.to_amount, quote.to_currency);
    println!("  Rate:     {}", quote.exchange_rate);
    println!("  Fee:      {}", quote.fee);
    println!("  Expires:  {}", quote.expires_at);
    Ok(())
}

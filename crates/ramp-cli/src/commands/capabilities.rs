//! `ramp capabilities` — print the provider capability matrix.

use ramp_anchors::AnchorCapabilities;

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "-"
    }
}

pub fn run() -> anyhow::Result<()> {
    let providers = [
        ("nopal", AnchorCapabilities::nopal()),
        ("meridian", AnchorCapabilities::meridian()),
        ("brava", AnchorCapabilities::brava()),
    ];

    println!(
        "{:<10} {:<18} {:<10} {:<12} {:<8} {:<8} {:<10} {:<6}",
        "anchor",
        "kyc",
        "deferred",
        "bank-first",
        "wallet",
        "payout",
        "composite",
        "email"
    );
    for (id, caps) in providers {
        println!(
            "{:<10} {:<18} {:<10} {:<12} {:<8} {:<8} {:<10} {:<6}",
            id,
            format!("{:?}", caps.kyc_flow),
            flag(caps.deferred_offramp_signing),
            flag(caps.requires_bank_before_quote),
            flag(caps.requires_wallet_registration),
            flag(caps.requires_anchor_payout_submission),
            flag(caps.composite_quote_customer_id),
            flag(caps.supports_email_lookup),
        );
    }
    Ok(())
}

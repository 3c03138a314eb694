//! Integration: full deposit flows across ramp-anchors and ramp-flow.

use std::sync::Arc;

use ramp_anchors::{Anchor, KycFlow, SandboxAnchor, SandboxConfig};
use ramp_core::{Amount, Currency, PaymentInstructions, QuoteAmount, QuoteRequest, TransactionStatus};
use ramp_flow::{poll, CustomerStore, InMemoryCustomerStore, OnRampArgs, OnRampFlow};
use ramp_integration_tests::fast_poll;
use rust_decimal::Decimal;

fn mxn() -> Currency {
    Currency::new("MXN").unwrap()
}

fn cetes() -> Currency {
    Currency::new("CETES").unwrap()
}

/// Deposit 1000 MXN through a nopal-shaped anchor: customer creation,
/// embedded-frame KYC hand-off, quote, SPEI payment instructions, and a
/// completed terminal status, all driven through capability flags.
#[tokio::test]
async fn test_nopal_deposit_end_to_end() {
    let anchor = Arc::new(SandboxAnchor::new(SandboxConfig::nopal()));
    let store = Arc::new(InMemoryCustomerStore::new());
    let flow = OnRampFlow::new(anchor.clone(), store.clone(), fast_poll());
    let (_cx, mut cancel) = poll::cancellation();

    let outcome = flow
        .run(
            OnRampArgs {
                wallet: "GCUSTOMERWALLET".into(),
                email: "maria@example.com".into(),
                from_currency: mxn(),
                to_currency: cetes(),
                amount: QuoteAmount::Source(Amount::parse("1000").unwrap()),
                fiat_account_id: None,
            },
            &mut cancel,
        )
        .await
        .unwrap();

    assert_eq!(outcome.kyc.flow, KycFlow::EmbeddedFrame);
    assert!(outcome.kyc.url.contains(&outcome.customer.id));

    assert_eq!(outcome.quote.from_amount, Amount::parse("1000").unwrap());
    assert_eq!(outcome.quote.from_currency, mxn());
    assert_eq!(outcome.quote.to_currency, cetes());

    match outcome.transaction.payment_instructions.as_ref().unwrap() {
        PaymentInstructions::Spei {
            clabe, reference, ..
        } => {
            assert!(!clabe.is_empty());
            assert!(!reference.is_empty());
        }
        other => panic!("expected SPEI instructions, got {other:?}"),
    }
    assert_eq!(outcome.transaction.status, TransactionStatus::Completed);

    // The customer is cached under the wallet for the next run.
    assert_eq!(
        store.get("GCUSTOMERWALLET").unwrap().customer_id,
        outcome.customer.id
    );
}

/// Quote arithmetic holds both ways: fixing the source and then fixing the
/// produced destination amount comes back to the source within rounding.
#[tokio::test]
async fn test_quote_round_trip_is_consistent() {
    let anchor = SandboxAnchor::new(SandboxConfig::nopal());
    let customer = anchor
        .create_customer(ramp_core::NewCustomer::with_email("q@example.com"))
        .await
        .unwrap();

    let one_unit = Amount::parse("1").unwrap();
    let forward = anchor
        .get_quote(QuoteRequest {
            customer_id: customer.id.clone(),
            from_currency: mxn(),
            to_currency: cetes(),
            amount: QuoteAmount::Source(one_unit),
        })
        .await
        .unwrap();
    assert_eq!(forward.from_amount, one_unit);
    assert!(forward.to_amount.as_decimal() > Decimal::ZERO);

    let backward = anchor
        .get_quote(QuoteRequest {
            customer_id: customer.id,
            from_currency: mxn(),
            to_currency: cetes(),
            amount: QuoteAmount::Destination(forward.to_amount),
        })
        .await
        .unwrap();

    let drift = (backward.from_amount.as_decimal() - one_unit.as_decimal()).abs();
    assert!(
        drift <= Decimal::new(1, 4),
        "round trip drifted by {drift}"
    );
}

/// A consumed quote cannot fund a second transaction.
#[tokio::test]
async fn test_quote_single_consumption_across_the_flow() {
    let anchor = Arc::new(SandboxAnchor::new(SandboxConfig::nopal()));
    let customer = anchor
        .create_customer(ramp_core::NewCustomer::with_email("c@example.com"))
        .await
        .unwrap();
    let quote = anchor
        .get_quote(QuoteRequest {
            customer_id: customer.id.clone(),
            from_currency: mxn(),
            to_currency: cetes(),
            amount: QuoteAmount::Source(Amount::parse("500").unwrap()),
        })
        .await
        .unwrap();

    let request = ramp_anchors::OnRampRequest {
        customer_id: customer.id,
        quote_id: quote.id,
        destination_address: "GWALLET".into(),
    };
    anchor.create_on_ramp(request.clone()).await.unwrap();
    assert!(anchor.create_on_ramp(request).await.is_err());
}

/// Missing transactions resolve to `Ok(None)`, never an error.
#[tokio::test]
async fn test_not_found_contract() {
    let anchor = SandboxAnchor::new(SandboxConfig::meridian());
    assert!(anchor.get_on_ramp("nonexistent").await.unwrap().is_none());
    assert!(anchor.get_off_ramp("nonexistent").await.unwrap().is_none());
    assert!(anchor.get_customer("nonexistent").await.unwrap().is_none());
}

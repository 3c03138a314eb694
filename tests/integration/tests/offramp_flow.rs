//! Integration: the three withdrawal protocols behind one flow controller.

use std::sync::Arc;

use ramp_anchors::{AnchorError, SandboxAnchor, SandboxConfig};
use ramp_core::{Amount, Currency, OffRampPhase, QuoteAmount, TransactionStatus};
use ramp_flow::{poll, FlowError, InMemoryCustomerStore, OffRampArgs, OffRampFlow};
use ramp_integration_tests::{fast_poll, seed_customer_with_bank, RecordingLedger, RecordingSigner};

fn args(amount: &str, from: &str, to: &str, bank: Option<String>) -> OffRampArgs {
    OffRampArgs {
        wallet: "GCUSTOMERWALLET".into(),
        email: "maria@example.com".into(),
        from_currency: Currency::new(from).unwrap(),
        to_currency: Currency::new(to).unwrap(),
        amount: QuoteAmount::Source(Amount::parse(amount).unwrap()),
        fiat_account_id: bank,
        refund_address: Some("GCUSTOMERWALLET".into()),
    }
}

fn build_flow(
    anchor: Arc<SandboxAnchor>,
    store: Arc<InMemoryCustomerStore>,
) -> (OffRampFlow, Arc<RecordingSigner>, Arc<RecordingLedger>) {
    let signer = Arc::new(RecordingSigner::default());
    let ledger = Arc::new(RecordingLedger::default());
    (
        OffRampFlow::new(anchor, store, signer.clone(), ledger.clone(), fast_poll()),
        signer,
        ledger,
    )
}

/// Deferred signing: the signable envelope is absent at creation, appears
/// through polling, is signed locally, broadcast, and polled to terminal.
#[tokio::test]
async fn test_deferred_signing_withdrawal() {
    let anchor = Arc::new(SandboxAnchor::new(SandboxConfig::nopal()));
    let store = Arc::new(InMemoryCustomerStore::new());
    let bank = seed_customer_with_bank(
        &anchor,
        &store,
        "GCUSTOMERWALLET",
        "maria@example.com",
        "MXN",
    )
    .await;
    let (flow, signer, ledger) = build_flow(anchor.clone(), store);
    let (_cx, mut cancel) = poll::cancellation();

    let outcome = flow
        .run(args("250", "CETES", "MXN", Some(bank)), &mut cancel)
        .await
        .unwrap();

    assert_eq!(outcome.final_phase, OffRampPhase::Completed);
    assert_eq!(outcome.transaction.status, TransactionStatus::Completed);
    assert!(outcome.transaction.signable_transaction.is_some());

    let signed = signer.signed.lock().unwrap();
    assert_eq!(signed.len(), 1, "exactly one local signature");
    assert!(signed[0].starts_with("XDR-MOCK-"));
    assert_eq!(ledger.broadcasts.lock().unwrap().len(), 1);
    assert_eq!(outcome.ledger_hash.as_deref(), Some("hash-1"));
}

/// Direct payment: the wallet pays the provider's deposit address itself;
/// no provider-built envelope is ever signed.
#[tokio::test]
async fn test_direct_payment_withdrawal() {
    let anchor = Arc::new(SandboxAnchor::new(SandboxConfig::meridian()));
    let store = Arc::new(InMemoryCustomerStore::new());
    let bank = seed_customer_with_bank(
        &anchor,
        &store,
        "GCUSTOMERWALLET",
        "maria@example.com",
        "USD",
    )
    .await;
    let (flow, signer, ledger) = build_flow(anchor, store);
    let (_cx, mut cancel) = poll::cancellation();

    let outcome = flow
        .run(args("100", "USDC", "USD", Some(bank)), &mut cancel)
        .await
        .unwrap();

    assert_eq!(outcome.final_phase, OffRampPhase::Completed);
    assert_eq!(signer.payments.lock().unwrap().len(), 1);
    assert!(signer.signed.lock().unwrap().is_empty());
    assert_eq!(ledger.broadcasts.lock().unwrap().len(), 1);
}

/// Anchor-hosted payout: a quote before bank registration is rejected by
/// the controller; after registration the payout is submitted exactly once
/// and no local signing or ledger broadcast ever happens.
#[tokio::test]
async fn test_brava_payout_withdrawal_end_to_end() {
    let anchor = Arc::new(SandboxAnchor::new(SandboxConfig::brava()));
    let store = Arc::new(InMemoryCustomerStore::new());

    // Pre-registration: the controller refuses to quote at all.
    let (flow, _signer, _ledger) = build_flow(anchor.clone(), store.clone());
    let (_cx, mut cancel) = poll::cancellation();
    let result = flow
        .run(args("100", "USDC", "BRL", None), &mut cancel)
        .await;
    assert!(matches!(result, Err(FlowError::BankAccountRequired)));

    // Post-registration: the full payout path.
    let bank = seed_customer_with_bank(
        &anchor,
        &store,
        "GCUSTOMERWALLET",
        "maria@example.com",
        "BRL",
    )
    .await;
    let (flow, signer, ledger) = build_flow(anchor.clone(), store);
    let outcome = flow
        .run(args("100", "USDC", "BRL", Some(bank)), &mut cancel)
        .await
        .unwrap();

    assert_eq!(outcome.final_phase, OffRampPhase::Completed);
    assert!(outcome.ledger_hash.is_none());
    assert!(signer.signed.lock().unwrap().is_empty());
    assert!(signer.payments.lock().unwrap().is_empty());
    assert!(ledger.broadcasts.lock().unwrap().is_empty());
    assert_eq!(anchor.payout_submissions(&outcome.transaction.id), 1);
}

/// A failure injected at quote time surfaces as the provider's own error,
/// with code and HTTP status intact.
#[tokio::test]
async fn test_provider_error_propagates_unchanged() {
    let anchor = Arc::new(SandboxAnchor::new(SandboxConfig::nopal()));
    let store = Arc::new(InMemoryCustomerStore::new());
    let bank = seed_customer_with_bank(
        &anchor,
        &store,
        "GCUSTOMERWALLET",
        "maria@example.com",
        "MXN",
    )
    .await;
    anchor.fail_next("get_quote", "rate_limited", 429);

    let (flow, _signer, _ledger) = build_flow(anchor, store);
    let (_cx, mut cancel) = poll::cancellation();
    let result = flow
        .run(args("250", "CETES", "MXN", Some(bank)), &mut cancel)
        .await;

    match result {
        Err(FlowError::Anchor(AnchorError::Api { code, status, .. })) => {
            assert_eq!(code, "rate_limited");
            assert_eq!(status, 429);
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

//! Integration: capability flags, registry dispatch, and the webhook log
//! staying out of the authoritative status path.

use std::sync::Arc;

use ramp_anchors::{
    Anchor, AnchorCapabilities, AnchorError, AnchorRegistry, KycFlow, SandboxAnchor, SandboxConfig,
};
use ramp_core::TransactionStatus;
use ramp_webhook::{WebhookLog, WebhookVerifier};

/// The published provider matrix, one row per anchor shape.
#[test]
fn test_capability_matrix_matches_providers() {
    let nopal = AnchorCapabilities::nopal();
    assert_eq!(nopal.kyc_flow, KycFlow::EmbeddedFrame);
    assert!(nopal.deferred_offramp_signing);
    assert!(!nopal.requires_bank_before_quote);
    assert!(!nopal.requires_wallet_registration);
    assert!(!nopal.requires_anchor_payout_submission);
    assert!(!nopal.composite_quote_customer_id);

    let meridian = AnchorCapabilities::meridian();
    assert_eq!(meridian.kyc_flow, KycFlow::InlineForm);
    assert!(!meridian.deferred_offramp_signing);
    assert!(meridian.supports_email_lookup);

    let brava = AnchorCapabilities::brava();
    assert_eq!(brava.kyc_flow, KycFlow::ExternalRedirect);
    assert!(brava.requires_bank_before_quote);
    assert!(brava.requires_wallet_registration);
    assert!(brava.requires_anchor_payout_submission);
    assert!(brava.composite_quote_customer_id);
}

#[test]
fn test_composite_quote_customer_id_assembly() {
    let brava = AnchorCapabilities::brava();
    assert_eq!(
        brava.build_quote_customer_id("cust_1", "res_2"),
        "cust_1:res_2"
    );
    let nopal = AnchorCapabilities::nopal();
    assert_eq!(nopal.build_quote_customer_id("cust_1", "res_2"), "cust_1");
}

/// One registry serves all three provider shapes behind the trait.
#[tokio::test]
async fn test_registry_dispatches_by_anchor_id() {
    let mut registry = AnchorRegistry::new();
    registry.register(Arc::new(SandboxAnchor::new(SandboxConfig::nopal())));
    registry.register(Arc::new(SandboxAnchor::new(SandboxConfig::meridian())));
    registry.register(Arc::new(SandboxAnchor::new(SandboxConfig::brava())));

    assert_eq!(registry.ids(), vec!["brava", "meridian", "nopal"]);

    let meridian = registry.get("meridian").unwrap();
    assert!(meridian.capabilities().supports_email_lookup);

    assert!(matches!(
        registry.get("unknown"),
        Err(AnchorError::UnknownAnchor(_))
    ));
}

/// Capability-gated operations stay unreachable on providers that lack the
/// flag, with a distinct error rather than a silent no-op.
#[tokio::test]
async fn test_ungated_operations_are_unsupported() {
    let nopal = SandboxAnchor::new(SandboxConfig::nopal());
    assert!(matches!(
        nopal.submit_payout("off_1").await,
        Err(AnchorError::Unsupported { .. })
    ));
    assert!(matches!(
        nopal.register_wallet("cust_1", "GADDR").await,
        Err(AnchorError::Unsupported { .. })
    ));
    assert!(matches!(
        nopal.get_customer_by_email("a@b.io").await,
        Err(AnchorError::Unsupported { .. })
    ));
}

/// Webhooks are logged but never feed back into transaction status: a
/// "completed" webhook about an awaiting transaction changes nothing.
#[tokio::test]
async fn test_webhook_log_is_not_authoritative() {
    let anchor = SandboxAnchor::new(SandboxConfig::nopal());
    let customer = anchor
        .create_customer(ramp_core::NewCustomer::with_email("w@example.com"))
        .await
        .unwrap();
    let quote = anchor
        .get_quote(ramp_core::QuoteRequest {
            customer_id: customer.id.clone(),
            from_currency: ramp_core::Currency::new("MXN").unwrap(),
            to_currency: ramp_core::Currency::new("CETES").unwrap(),
            amount: ramp_core::QuoteAmount::Source(ramp_core::Amount::parse("100").unwrap()),
        })
        .await
        .unwrap();
    let tx = anchor
        .create_on_ramp(ramp_anchors::OnRampRequest {
            customer_id: customer.id,
            quote_id: quote.id,
            destination_address: "GADDR".into(),
        })
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::AwaitingPayment);

    let secret = b"anchor-shared-secret";
    let log = WebhookLog::new(secret);
    let body = format!(
        r#"{{"type":"onramp.completed","transaction_id":"{}"}}"#,
        tx.id
    );
    let signature = WebhookVerifier::new(secret).sign(body.as_bytes()).unwrap();
    log.ingest("nopal", body.as_bytes(), &signature).unwrap();

    assert_eq!(log.events_for_transaction(&tx.id).len(), 1);
    // Status is still whatever polling says, not what the webhook claimed.
    let polled = anchor.get_on_ramp(&tx.id).await.unwrap().unwrap();
    assert_eq!(polled.status, TransactionStatus::AwaitingPayment);
}

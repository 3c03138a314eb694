use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::WebhookError;
use crate::signature::WebhookVerifier;

/// One received webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Monotonic local sequence number.
    pub seq: u64,
    /// Anchor the delivery came from.
    pub anchor_id: String,
    /// Provider event type, when the payload carries a `type` field.
    pub event_type: Option<String>,
    /// Referenced transaction, when the payload carries a
    /// `transaction_id` field.
    pub transaction_id: Option<String>,
    /// Raw payload, kept verbatim.
    pub payload: serde_json::Value,
    /// Local receipt time.
    pub received_at: DateTime<Utc>,
}

/// Append-only in-memory log of verified webhook deliveries.
///
/// Non-authoritative by construction: nothing here feeds back into
/// transaction status, which is always re-derived by polling. Unverified
/// deliveries are never logged.
pub struct WebhookLog {
    verifier: WebhookVerifier,
    events: DashMap<u64, WebhookEvent>,
    next_seq: AtomicU64,
}

impl WebhookLog {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            verifier: WebhookVerifier::new(secret),
            events: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Verify a delivery and append it to the log.
    pub fn ingest(
        &self,
        anchor_id: &str,
        body: &[u8],
        signature_hex: &str,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verifier.verify(body, signature_hex)?;
        let payload: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| WebhookError::Payload(e.to_string()))?;

        let event = WebhookEvent {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            anchor_id: anchor_id.to_string(),
            event_type: payload
                .get("type")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            transaction_id: payload
                .get("transaction_id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            payload,
            received_at: Utc::now(),
        };
        tracing::info!(
            anchor = anchor_id,
            seq = event.seq,
            event_type = event.event_type.as_deref().unwrap_or("unknown"),
            "webhook logged"
        );
        self.events.insert(event.seq, event.clone());
        Ok(event)
    }

    /// All logged events in receipt order.
    pub fn events(&self) -> Vec<WebhookEvent> {
        let mut events: Vec<WebhookEvent> =
            self.events.iter().map(|e| e.value().clone()).collect();
        events.sort_by_key(|e| e.seq);
        events
    }

    /// Logged events mentioning a transaction, in receipt order.
    pub fn events_for_transaction(&self, transaction_id: &str) -> Vec<WebhookEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.transaction_id.as_deref() == Some(transaction_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"shared-secret";

    fn signed(body: &[u8]) -> String {
        WebhookVerifier::new(SECRET).sign(body).unwrap()
    }

    #[test]
    fn test_verified_delivery_is_logged() {
        let log = WebhookLog::new(SECRET);
        let body = br#"{"type":"offramp.completed","transaction_id":"off_1"}"#;
        let event = log.ingest("nopal", body, &signed(body)).unwrap();

        assert_eq!(event.event_type.as_deref(), Some("offramp.completed"));
        assert_eq!(event.transaction_id.as_deref(), Some("off_1"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_unverified_delivery_is_not_logged() {
        let log = WebhookLog::new(SECRET);
        let body = br#"{"type":"offramp.completed"}"#;
        let result = log.ingest("nopal", body, "00".repeat(32).as_str());
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_receipt_order_preserved() {
        let log = WebhookLog::new(SECRET);
        for i in 0..3 {
            let body = format!(r#"{{"type":"e{i}"}}"#);
            log.ingest("nopal", body.as_bytes(), &signed(body.as_bytes()))
                .unwrap();
        }
        let types: Vec<_> = log
            .events()
            .into_iter()
            .filter_map(|e| e.event_type)
            .collect();
        assert_eq!(types, vec!["e0", "e1", "e2"]);
    }

    #[test]
    fn test_filter_by_transaction() {
        let log = WebhookLog::new(SECRET);
        let a = br#"{"type":"x","transaction_id":"t1"}"#;
        let b = br#"{"type":"y","transaction_id":"t2"}"#;
        log.ingest("nopal", a, &signed(a)).unwrap();
        log.ingest("nopal", b, &signed(b)).unwrap();

        let t1 = log.events_for_transaction("t1");
        assert_eq!(t1.len(), 1);
        assert_eq!(t1[0].event_type.as_deref(), Some("x"));
    }

    #[test]
    fn test_payload_without_known_fields_still_logged() {
        let log = WebhookLog::new(SECRET);
        let body = br#"{"anything":"goes"}"#;
        let event = log.ingest("brava", body, &signed(body)).unwrap();
        assert!(event.event_type.is_none());
        assert!(event.transaction_id.is_none());
    }
}

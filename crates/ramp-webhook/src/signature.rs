use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header anchors attach the hex HMAC-SHA256 of the raw body to.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Verifies webhook signatures for one shared secret.
///
/// The signature is HMAC-SHA256 over the raw request body, hex encoded.
/// Comparison is constant-time via the `hmac` crate's `verify_slice`.
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, WebhookError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| WebhookError::MalformedSignature(e.to_string()))
    }

    /// Compute the hex signature for a body. Used by tests and by the
    /// sandbox when emitting synthetic webhooks.
    pub fn sign(&self, body: &[u8]) -> Result<String, WebhookError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a hex signature against the raw body.
    pub fn verify(&self, body: &[u8], signature_hex: &str) -> Result<(), WebhookError> {
        let signature = hex::decode(signature_hex.trim())
            .map_err(|e| WebhookError::MalformedSignature(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&signature).map_err(|_| {
            tracing::warn!("webhook signature mismatch");
            WebhookError::InvalidSignature
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let verifier = WebhookVerifier::new(b"shared-secret");
        let body = br#"{"type":"onramp.completed","transaction_id":"on_1"}"#;
        let signature = verifier.sign(body).unwrap();
        verifier.verify(body, &signature).unwrap();
    }

    #[test]
    fn test_tampered_body_rejected() {
        let verifier = WebhookVerifier::new(b"shared-secret");
        let signature = verifier.sign(b"original").unwrap();
        assert!(matches!(
            verifier.verify(b"tampered", &signature),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = WebhookVerifier::new(b"secret-a");
        let verifier = WebhookVerifier::new(b"secret-b");
        let signature = signer.sign(b"body").unwrap();
        assert!(matches!(
            verifier.verify(b"body", &signature),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_hex_signature_is_malformed_not_invalid() {
        let verifier = WebhookVerifier::new(b"shared-secret");
        assert!(matches!(
            verifier.verify(b"body", "not-hex!"),
            Err(WebhookError::MalformedSignature(_))
        ));
    }

    #[test]
    fn test_signature_is_lowercase_hex_of_expected_length() {
        let verifier = WebhookVerifier::new(b"shared-secret");
        let signature = verifier.sign(b"body").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

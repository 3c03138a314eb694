/// Webhook-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The signature header is not valid hex of the right length.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The HMAC did not match the body.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The body is not valid JSON.
    #[error("unparseable webhook payload: {0}")]
    Payload(String),
}

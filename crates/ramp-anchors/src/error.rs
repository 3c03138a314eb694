use ramp_core::CoreError;

/// Anchor-layer errors.
///
/// Lookup-by-id operations never produce an error for a missing resource;
/// they resolve to `Ok(None)` so callers can tell "absent" from "failed".
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    /// Non-success response from a provider, with the provider's own
    /// machine-readable code and the HTTP status it arrived with.
    #[error("provider error {code} (HTTP {status}): {message}")]
    Api {
        code: String,
        status: u16,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Schema(String),

    #[error("anchor {anchor} does not support {operation}")]
    Unsupported {
        anchor: String,
        operation: &'static str,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller passed a locally synthesized placeholder customer id to an
    /// operation that needs a provider-established identity.
    #[error("customer id {0} is a local placeholder; complete provider onboarding first")]
    PlaceholderCustomer(String),

    #[error("no anchor registered with id: {0}")]
    UnknownAnchor(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AnchorError {
    /// Convenience constructor for provider API errors.
    pub fn api(code: &str, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.to_string(),
            status,
            message: message.into(),
        }
    }
}

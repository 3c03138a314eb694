//! Shared HTTP plumbing for provider clients.
//!
//! Providers disagree on error body shapes; this module normalizes any
//! non-success response into [`AnchorError::Api`] and maps 404 on lookups to
//! an explicit absent value.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AnchorError;

/// Join a base URL and a path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// The common shapes providers use for error bodies.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// Decode a response, mapping non-2xx to a structured provider error.
pub(crate) async fn decode<T: DeserializeOwned>(
    anchor: &str,
    response: reqwest::Response,
) -> Result<T, AnchorError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(anchor, response).await);
    }
    response.json::<T>().await.map_err(|e| {
        tracing::warn!(anchor, error = %e, "failed to decode provider response");
        AnchorError::Schema(e.to_string())
    })
}

/// Decode a lookup response, treating 404 as an explicit absent value.
pub(crate) async fn decode_optional<T: DeserializeOwned>(
    anchor: &str,
    response: reqwest::Response,
) -> Result<Option<T>, AnchorError> {
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    decode(anchor, response).await.map(Some)
}

async fn error_from_response(anchor: &str, response: reqwest::Response) -> AnchorError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();

    let (code, message) = match parsed {
        Some(b) => {
            let code = b
                .code
                .or_else(|| b.error.clone())
                .unwrap_or_else(|| format!("http_{status}"));
            let message = b.message.or(b.error).unwrap_or_else(|| summarize(&body));
            (code, message)
        }
        None => (format!("http_{status}"), summarize(&body)),
    };

    tracing::warn!(anchor, status, code = %code, "provider returned error");
    AnchorError::Api {
        code,
        status,
        message,
    }
}

/// Collapse an error body to a single bounded line for logs and messages.
fn summarize(body: &str) -> String {
    const MAX_LEN: usize = 256;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    let mut line = trimmed.replace(['\n', '\r'], " ");
    if line.len() > MAX_LEN {
        // Cut on a char boundary; byte MAX_LEN may fall mid-character.
        let mut cut = MAX_LEN;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
        line.push('…');
    }
    line
}

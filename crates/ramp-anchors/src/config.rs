//! Per-provider configuration.
//!
//! These structs are supplied by an external factory; the anchor layer never
//! reads process environment or files itself.

use serde::{Deserialize, Serialize};

/// Nopal API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NopalConfig {
    /// API key sent as `X-Api-Key`.
    pub api_key: String,
    /// Base URL, e.g. `https://api.nopal.mx/v1`.
    pub base_url: String,
}

/// Meridian API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeridianConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL, e.g. `https://api.meridian.finance/v2`.
    pub base_url: String,
}

/// Brava API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BravaConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL, e.g. `https://api.brava.io/v1`.
    pub base_url: String,
    /// Brava scopes all resources under an instance.
    pub instance_id: String,
}

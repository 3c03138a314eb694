use std::path::Path;

use ramp_flow::PollConfig;
use serde::Deserialize;

fn default_email() -> String {
    "sandbox@example.com".to_string()
}

fn default_wallet() -> String {
    "GSANDBOXWALLET".to_string()
}

/// CLI configuration, optionally loaded from a TOML file.
///
/// Every field has a default, so no file is required.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Email used when creating sandbox customers.
    #[serde(default = "default_email")]
    pub email: String,
    /// Ledger address used as the wallet in sandbox flows.
    #[serde(default = "default_wallet")]
    pub wallet: String,
    /// Polling cadence for flow runs.
    #[serde(default)]
    pub poll: PollConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            wallet: default_wallet(),
            poll: PollConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }
}

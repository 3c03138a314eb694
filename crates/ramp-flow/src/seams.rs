use async_trait::async_trait;
use ramp_core::{Amount, Currency};

use crate::error::FlowError;

/// Local signing of ledger transactions.
///
/// Two shapes exist because the providers differ: under deferred signing the
/// anchor hands back a pre-built envelope to countersign; under direct
/// payment the wallet builds the whole payment itself.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sign a provider-built signable envelope, returning the signed form.
    async fn sign(&self, signable: &str) -> Result<String, FlowError>;

    /// Build and sign a payment of `amount` of `asset` to `destination`.
    async fn build_payment(
        &self,
        destination: &str,
        memo: Option<&str>,
        amount: &Amount,
        asset: &Currency,
    ) -> Result<String, FlowError>;
}

/// Broadcast seam to the ledger network.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submit a signed transaction envelope; returns the ledger hash.
    async fn broadcast(&self, signed: &str) -> Result<String, FlowError>;
}

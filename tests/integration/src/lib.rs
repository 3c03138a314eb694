//! Shared helpers for the cross-crate integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use ramp_anchors::{Anchor, SandboxAnchor};
use ramp_core::{Amount, Currency, NewCustomer, NewFiatAccount};
use ramp_flow::{CustomerRecord, CustomerStore, FlowError, InMemoryCustomerStore, LedgerGateway, PollConfig, WalletSigner};

/// Polling config tight enough for tests.
pub fn fast_poll() -> PollConfig {
    PollConfig {
        interval_ms: 1,
        max_attempts: 30,
    }
}

/// Create a sandbox customer with a registered bank account and seed the
/// wallet-keyed cache so a flow run resolves to that customer.
pub async fn seed_customer_with_bank(
    anchor: &SandboxAnchor,
    store: &InMemoryCustomerStore,
    wallet: &str,
    email: &str,
    currency: &str,
) -> String {
    let customer = anchor
        .create_customer(NewCustomer::with_email(email))
        .await
        .expect("sandbox customer");
    let bank = anchor
        .register_fiat_account(NewFiatAccount {
            customer_id: customer.id.clone(),
            bank_name: "Banco de Prueba".into(),
            account_number: "012345678901234567".into(),
            currency: Currency::new(currency).expect("currency"),
        })
        .await
        .expect("sandbox bank account");
    store.put(
        wallet,
        CustomerRecord {
            anchor_id: anchor.anchor_id().to_string(),
            customer_id: customer.id,
            email: email.to_string(),
            kyc_status: customer.kyc_status,
        },
    );
    bank.id
}

/// Signer that records every envelope and payment it is asked to produce.
#[derive(Default)]
pub struct RecordingSigner {
    pub signed: Mutex<Vec<String>>,
    pub payments: Mutex<Vec<String>>,
}

#[async_trait]
impl WalletSigner for RecordingSigner {
    async fn sign(&self, signable: &str) -> Result<String, FlowError> {
        self.signed.lock().unwrap().push(signable.to_string());
        Ok(format!("signed:{signable}"))
    }

    async fn build_payment(
        &self,
        destination: &str,
        _memo: Option<&str>,
        _amount: &Amount,
        _asset: &Currency,
    ) -> Result<String, FlowError> {
        self.payments.lock().unwrap().push(destination.to_string());
        Ok(format!("payment:{destination}"))
    }
}

/// Ledger gateway that records broadcasts and returns synthetic hashes.
#[derive(Default)]
pub struct RecordingLedger {
    pub broadcasts: Mutex<Vec<String>>,
}

#[async_trait]
impl LedgerGateway for RecordingLedger {
    async fn broadcast(&self, signed: &str) -> Result<String, FlowError> {
        let mut broadcasts = self.broadcasts.lock().unwrap();
        broadcasts.push(signed.to_string());
        Ok(format!("hash-{}", broadcasts.len()))
    }
}

use dashmap::DashMap;
use ramp_core::KycStatus;
use serde::{Deserialize, Serialize};

/// An anchor customer as cached on the wallet side, keyed by the wallet's
/// ledger address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Which anchor the customer belongs to.
    pub anchor_id: String,
    /// Provider-assigned customer id.
    pub customer_id: String,
    /// Email the customer was registered with.
    pub email: String,
    /// Last observed KYC state.
    pub kyc_status: KycStatus,
}

/// Repository abstraction over the wallet-keyed customer cache.
///
/// Customer records are never deleted; `put` overwrites the entry for a
/// wallet. Implementations must tolerate concurrent access.
pub trait CustomerStore: Send + Sync {
    fn get(&self, wallet: &str) -> Option<CustomerRecord>;
    fn put(&self, wallet: &str, record: CustomerRecord);
}

/// `DashMap`-backed customer cache.
#[derive(Default)]
pub struct InMemoryCustomerStore {
    records: DashMap<String, CustomerRecord>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CustomerStore for InMemoryCustomerStore {
    fn get(&self, wallet: &str) -> Option<CustomerRecord> {
        self.records.get(wallet).map(|r| r.clone())
    }

    fn put(&self, wallet: &str, record: CustomerRecord) {
        self.records.insert(wallet.to_string(), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(customer_id: &str) -> CustomerRecord {
        CustomerRecord {
            anchor_id: "nopal".into(),
            customer_id: customer_id.into(),
            email: "a@b.io".into(),
            kyc_status: KycStatus::NotStarted,
        }
    }

    #[test]
    fn test_put_then_get() {
        let store = InMemoryCustomerStore::new();
        store.put("GWALLET", record("cust_1"));
        assert_eq!(store.get("GWALLET").unwrap().customer_id, "cust_1");
        assert!(store.get("GOTHER").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let store = InMemoryCustomerStore::new();
        store.put("GWALLET", record("cust_1"));
        store.put("GWALLET", record("cust_2"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("GWALLET").unwrap().customer_id, "cust_2");
    }
}

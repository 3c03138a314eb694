use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// KYC verification state reported by an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// The customer has not begun identity verification.
    NotStarted,
    /// Documents submitted; the anchor is reviewing.
    Pending,
    /// Verification passed; the customer may transact.
    Approved,
    /// Verification failed.
    Rejected,
    /// The anchor needs additional or corrected documents.
    UpdateRequired,
}

impl KycStatus {
    /// Whether the customer is cleared to transact.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::UpdateRequired => write!(f, "update_required"),
        }
    }
}

/// An identity record held by an anchor.
///
/// Customers are created once and never deleted; the only mutation is the
/// KYC status transitions reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Provider-assigned identifier.
    pub id: String,
    /// Contact email.
    pub email: String,
    /// Current KYC state.
    pub kyc_status: KycStatus,
    /// When the record was created at the provider.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated at the provider.
    pub updated_at: DateTime<Utc>,
}

/// Input for customer creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Contact email.
    pub email: String,
    /// Optional given name, where the provider collects it up front.
    pub first_name: Option<String>,
    /// Optional family name.
    pub last_name: Option<String>,
}

impl NewCustomer {
    /// Minimal record with only an email.
    pub fn with_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
            first_name: None,
            last_name: None,
        }
    }
}

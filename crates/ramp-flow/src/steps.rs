use std::fmt;

use ramp_anchors::AnchorCapabilities;
use serde::{Deserialize, Serialize};

/// UI-visible steps of a ramp flow.
///
/// `BankSelection` and `WalletRegistration` appear only when the provider's
/// capability flags call for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    AmountEntry,
    BankSelection,
    Quote,
    WalletRegistration,
    PaymentOrSigning,
    Polling,
    Complete,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmountEntry => write!(f, "amount_entry"),
            Self::BankSelection => write!(f, "bank_selection"),
            Self::Quote => write!(f, "quote"),
            Self::WalletRegistration => write!(f, "wallet_registration"),
            Self::PaymentOrSigning => write!(f, "payment_or_signing"),
            Self::Polling => write!(f, "polling"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Tracks progress through the step sequence of one flow run.
///
/// A failed step reverts to the previous step with the error message
/// attached; quote expiry jumps back to the quote step so a fresh quote can
/// be requested. `Complete` is terminal.
#[derive(Debug, Clone)]
pub struct FlowTracker {
    sequence: Vec<FlowStep>,
    index: usize,
    last_error: Option<String>,
}

impl FlowTracker {
    /// Build the step sequence this provider's capabilities require.
    pub fn new(caps: &AnchorCapabilities) -> Self {
        let mut sequence = vec![FlowStep::AmountEntry];
        if caps.requires_bank_before_quote {
            sequence.push(FlowStep::BankSelection);
        }
        sequence.push(FlowStep::Quote);
        if caps.requires_wallet_registration {
            sequence.push(FlowStep::WalletRegistration);
        }
        sequence.push(FlowStep::PaymentOrSigning);
        sequence.push(FlowStep::Polling);
        sequence.push(FlowStep::Complete);
        Self {
            sequence,
            index: 0,
            last_error: None,
        }
    }

    pub fn current(&self) -> FlowStep {
        self.sequence[self.index]
    }

    pub fn is_complete(&self) -> bool {
        self.current() == FlowStep::Complete
    }

    /// Error attached by the last failed step, cleared on the next advance.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Move to the next step.
    pub fn advance(&mut self) -> FlowStep {
        if self.index + 1 < self.sequence.len() {
            self.index += 1;
            self.last_error = None;
            tracing::debug!(step = %self.current(), "flow step");
        }
        self.current()
    }

    /// Record a step failure and revert to the previous step.
    pub fn fail(&mut self, message: impl Into<String>) -> FlowStep {
        let message = message.into();
        tracing::warn!(step = %self.current(), error = %message, "flow step failed");
        self.last_error = Some(message);
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// The active quote lapsed: discard it and return to the quote step.
    pub fn quote_expired(&mut self, quote_id: &str) -> FlowStep {
        if let Some(pos) = self.sequence.iter().position(|s| *s == FlowStep::Quote) {
            self.index = pos;
        }
        self.last_error = Some(format!("quote {quote_id} expired"));
        tracing::info!(quote_id, "quote expired, re-quoting");
        self.current()
    }
}

use std::fmt;

use crate::error::CoreError;

/// Client-side phases of an off-ramp under deferred signing.
///
/// The signable ledger transaction does not exist when the off-ramp is
/// created; it appears only through polling the provider. The phase machine
/// bounds what the controller may do at each point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffRampPhase {
    /// The off-ramp exists at the provider; nothing signable yet.
    Created,
    /// Polling until `signable_transaction` is present.
    AwaitingSignable,
    /// The signable artifact is in hand; the user signs locally.
    Signing,
    /// The signed transaction has been broadcast to the ledger.
    Submitted,
    /// Polling the provider until a terminal status is observed.
    Polling,
    /// Terminal: payout delivered.
    Completed,
    /// Terminal: the off-ramp failed.
    Failed,
}

impl OffRampPhase {
    /// Whether this is a final phase.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for OffRampPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::AwaitingSignable => write!(f, "awaiting_signable"),
            Self::Signing => write!(f, "signing"),
            Self::Submitted => write!(f, "submitted"),
            Self::Polling => write!(f, "polling"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Events that drive the off-ramp phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffRampEvent {
    /// The controller started polling for the signable artifact.
    PollForSignable,
    /// A poll returned a populated `signable_transaction`.
    SignableReceived,
    /// The user produced a signature locally.
    Signed,
    /// The signed transaction was broadcast to the ledger.
    Broadcast,
    /// A poll observed a terminal completed status.
    CompletedObserved,
    /// A poll observed a terminal failure status, or a step failed.
    FailureObserved,
}

/// Validates off-ramp phase transitions.
///
/// Valid transitions:
/// - Created → AwaitingSignable (PollForSignable)
/// - AwaitingSignable → Signing (SignableReceived)
/// - Signing → Submitted (Signed followed by Broadcast collapses here: the
///   controller signs and broadcasts back to back, so Signed is accepted
///   from Signing as a self-checkpoint and Broadcast moves forward)
/// - Submitted → Polling (implicit on first status poll)
/// - Polling → Completed (CompletedObserved)
/// - AwaitingSignable → Completed (CompletedObserved: the provider settled
///   without ever exposing a signable artifact)
/// - Polling → Failed (FailureObserved)
/// - any non-final phase → Failed (FailureObserved)
pub struct OffRampStateMachine;

impl OffRampStateMachine {
    /// Attempt a phase transition. Returns the new phase, or an error for
    /// invalid transitions.
    pub fn transition(
        current: OffRampPhase,
        event: OffRampEvent,
    ) -> Result<OffRampPhase, CoreError> {
        let next = match (current, event) {
            (OffRampPhase::Created, OffRampEvent::PollForSignable) => OffRampPhase::AwaitingSignable,
            (OffRampPhase::AwaitingSignable, OffRampEvent::SignableReceived) => OffRampPhase::Signing,
            (OffRampPhase::Signing, OffRampEvent::Signed) => OffRampPhase::Signing,
            (OffRampPhase::Signing, OffRampEvent::Broadcast) => OffRampPhase::Submitted,
            (OffRampPhase::Submitted, OffRampEvent::PollForSignable) => OffRampPhase::Polling,
            (OffRampPhase::Polling, OffRampEvent::CompletedObserved) => OffRampPhase::Completed,
            (OffRampPhase::AwaitingSignable, OffRampEvent::CompletedObserved) => {
                OffRampPhase::Completed
            }
            (current, OffRampEvent::FailureObserved) if !current.is_final() => OffRampPhase::Failed,
            _ => {
                return Err(CoreError::InvalidPhaseTransition {
                    from: current.to_string(),
                    to: format!("{event:?}"),
                });
            }
        };

        tracing::debug!(from = %current, to = %next, event = ?event, "off-ramp phase transition");
        Ok(next)
    }

    /// Check whether a transition is valid without performing it.
    pub fn can_transition(current: OffRampPhase, event: OffRampEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

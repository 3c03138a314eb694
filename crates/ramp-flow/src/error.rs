use ramp_anchors::AnchorError;
use ramp_core::CoreError;

/// Flow-controller errors.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The provider requires a bank account before quoting and none was
    /// selected.
    #[error("a bank account must be selected before requesting a quote")]
    BankAccountRequired,

    /// A poll observed a transaction that previously existed and now does
    /// not. Indicates provider-side data loss, not a transient failure.
    #[error("transaction {0} vanished at the provider")]
    TransactionVanished(String),

    /// Polling exhausted its attempt budget without reaching the awaited
    /// condition.
    #[error("gave up polling {id} after {attempts} attempts")]
    PollTimeout { id: String, attempts: u32 },

    /// The flow was cancelled through its cancellation channel.
    #[error("flow cancelled")]
    Cancelled,

    /// A provider advertising direct-payment off-ramps returned one with no
    /// deposit address.
    #[error("off-ramp {0} carries no deposit address")]
    DepositAddressMissing(String),

    /// The transaction reached a terminal status other than completed.
    #[error("transaction {id} ended {status}")]
    TerminalFailure { id: String, status: String },

    #[error("signer error: {0}")]
    Signer(String),

    #[error("ledger error: {0}")]
    Ledger(String),
}

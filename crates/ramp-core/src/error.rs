/// Core domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("invalid off-ramp phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("quote expired: {0}")]
    QuoteExpired(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

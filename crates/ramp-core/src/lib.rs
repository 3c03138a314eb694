//! Ramp Core
//!
//! Domain types shared by every layer of the ramp stack: decimal money
//! amounts, customers and KYC state, quotes, on/off-ramp transactions, and
//! the state machines that bound their lifecycles.

pub mod amount;
pub mod customer;
pub mod error;
pub mod quote;
pub mod state_machine;
pub mod transaction;

pub use amount::{Amount, Currency};
pub use customer::{Customer, KycStatus, NewCustomer};
pub use error::CoreError;
pub use quote::{Quote, QuoteAmount, QuoteRequest};
pub use state_machine::{OffRampEvent, OffRampPhase, OffRampStateMachine};
pub use transaction::{
    FiatAccount, NewFiatAccount, OffRampTransaction, OnRampTransaction, PaymentInstructions,
    TransactionStatus,
};

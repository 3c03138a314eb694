//! Ramp Webhook
//!
//! Verification of anchor webhook signatures and an in-memory event log.
//!
//! Webhooks are supplementary here: deliveries carry no guarantees, and
//! nothing in this crate ever mutates transaction state. Authoritative
//! status is always re-derived by polling the provider; the log exists so
//! a UI can show "the anchor said something happened" while the poller
//! catches up.

pub mod error;
pub mod log;
pub mod signature;

pub use error::WebhookError;
pub use log::{WebhookEvent, WebhookLog};
pub use signature::{WebhookVerifier, SIGNATURE_HEADER};

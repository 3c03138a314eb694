//! Ramp Flow
//!
//! Sequencing of the quote → pay → poll → sign → submit → complete
//! lifecycle over the [`ramp_anchors::Anchor`] abstraction. Controllers
//! branch on capability flags only; the three structurally different
//! off-ramp protocols (deferred signing, user-signed direct payment,
//! anchor-hosted payout) share one entry point.

pub mod error;
pub mod offramp;
pub mod onramp;
pub mod poll;
pub mod seams;
pub mod steps;
pub mod store;

pub use error::FlowError;
pub use offramp::{OffRampArgs, OffRampFlow, OffRampOutcome};
pub use onramp::{ensure_customer, OnRampArgs, OnRampFlow, OnRampOutcome};
pub use poll::PollConfig;
pub use seams::{LedgerGateway, WalletSigner};
pub use steps::{FlowStep, FlowTracker};
pub use store::{CustomerRecord, CustomerStore, InMemoryCustomerStore};

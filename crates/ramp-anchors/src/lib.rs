//! Ramp Anchors
//!
//! A single polymorphic surface over structurally different anchor provider
//! APIs. Each provider client implements the [`Anchor`] trait; calling code
//! branches only on [`AnchorCapabilities`] flags, never on provider identity.

pub mod capabilities;
pub mod config;
pub mod error;
mod http;
pub mod providers;
pub mod registry;
pub mod sandbox;
pub mod traits;

pub use capabilities::{AnchorCapabilities, KycFlow};
pub use config::{BravaConfig, MeridianConfig, NopalConfig};
pub use error::AnchorError;
pub use providers::{BravaClient, MeridianClient, NopalClient};
pub use registry::AnchorRegistry;
pub use sandbox::{SandboxAnchor, SandboxConfig};
pub use traits::{Anchor, KycSession, OffRampRequest, OnRampRequest};

//! Subcommand implementations. Everything runs against the in-memory
//! sandbox anchors; no network access.

pub mod capabilities;
pub mod offramp;
pub mod onramp;
pub mod quote;

use std::sync::Arc;

use ramp_anchors::{Anchor, AnchorRegistry, SandboxAnchor, SandboxConfig};

/// Registry with one sandbox per provider shape.
pub fn sandbox_registry() -> AnchorRegistry {
    let mut registry = AnchorRegistry::new();
    registry.register(Arc::new(SandboxAnchor::new(SandboxConfig::nopal())));
    registry.register(Arc::new(SandboxAnchor::new(SandboxConfig::meridian())));
    registry.register(Arc::new(SandboxAnchor::new(SandboxConfig::brava())));
    registry
}

pub fn pick_anchor(anchor_id: &str) -> anyhow::Result<Arc<dyn Anchor>> {
    let registry = sandbox_registry();
    Ok(registry.get(anchor_id)?)
}

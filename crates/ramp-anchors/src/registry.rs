use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AnchorError;
use crate::traits::Anchor;

/// Registry of available anchor providers, keyed by anchor id.
///
/// Providers are registered once at startup; lookups hand out shared
/// handles. Calling code picks an anchor by id and from then on works
/// exclusively through the [`Anchor`] trait and its capability flags.
#[derive(Default)]
pub struct AnchorRegistry {
    anchors: HashMap<String, Arc<dyn Anchor>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an anchor under its own id. Replaces any previous
    /// registration with the same id.
    pub fn register(&mut self, anchor: Arc<dyn Anchor>) {
        let id = anchor.anchor_id().to_string();
        tracing::info!(anchor = %id, "anchor registered");
        self.anchors.insert(id, anchor);
    }

    /// Look up an anchor by id.
    pub fn get(&self, anchor_id: &str) -> Result<Arc<dyn Anchor>, AnchorError> {
        self.anchors
            .get(anchor_id)
            .cloned()
            .ok_or_else(|| AnchorError::UnknownAnchor(anchor_id.to_string()))
    }

    /// Ids of all registered anchors, sorted for stable output.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.anchors.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.anchors.len()
    }
}

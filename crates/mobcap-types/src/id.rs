//! Entity identity

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable unique identifier for creatures and observers
///
/// Identity is stable across chunk boundaries, which is what lets the
/// protection registry key on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

impl EntityId {
    /// Allocate a new unique entity ID
    pub fn new() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Create an EntityId from a raw u64 (host-assigned or deserialized)
    pub fn from_raw(id: u64) -> Self {
        NEXT_ENTITY_ID.fetch_max(id.saturating_add(1), Ordering::Relaxed);
        EntityId(id)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

//! Host access traits
//!
//! These traits define the interface between the engine and the host that
//! owns the live entities, so the engine never needs to know how the host
//! stores its world.

use glam::DVec3;
use mobcap_types::{ChunkCoord, EntityId, KindId, chunk_of};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a live creature, as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub id: EntityId,
    pub kind: KindId,
    /// Variant data for extended-type caps (e.g. skeleton sub-breed)
    pub variant: Option<String>,
    pub pos: DVec3,
    /// Ticks since the creature was created
    pub ticks_lived: u64,
    pub tamed: bool,
    /// Drop chance of every equipped item
    pub equipment_drop_chances: Vec<f32>,
}

impl CreatureSnapshot {
    pub fn new(id: EntityId, kind: KindId, pos: DVec3) -> Self {
        Self {
            id,
            kind,
            variant: None,
            pos,
            ticks_lived: 0,
            tamed: false,
            equipment_drop_chances: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_string());
        self
    }

    pub fn with_ticks_lived(mut self, ticks: u64) -> Self {
        self.ticks_lived = ticks;
        self
    }

    pub fn with_tamed(mut self, tamed: bool) -> Self {
        self.tamed = tamed;
        self
    }

    pub fn with_equipment(mut self, drop_chance: f32) -> Self {
        self.equipment_drop_chances.push(drop_chance);
        self
    }

    /// Chunk cell the creature stands in
    pub fn cell(&self) -> ChunkCoord {
        chunk_of(self.pos)
    }

    /// Carries an item that always drops on death (placed there by an observer)
    pub fn has_guaranteed_drop(&self) -> bool {
        self.equipment_drop_chances.iter().any(|&chance| chance >= 1.0)
    }
}

/// Read-only access to the host's live creatures
pub trait WorldView {
    /// All live creatures in the loaded cells of `world`
    fn creatures(&self, world: &str) -> Vec<CreatureSnapshot>;

    /// Live creatures standing in one cell of `world`
    fn creatures_in_cell(&self, world: &str, cell: ChunkCoord) -> Vec<CreatureSnapshot>;
}

/// Host hook that can keep a creature alive during the despawn sweep
pub trait DespawnVeto: Send + Sync {
    /// Return true to keep the creature
    fn veto(&self, world: &str, creature: &CreatureSnapshot) -> bool;
}

impl<F> DespawnVeto for F
where
    F: Fn(&str, &CreatureSnapshot) -> bool + Send + Sync,
{
    fn veto(&self, world: &str, creature: &CreatureSnapshot) -> bool {
        self(world, creature)
    }
}

/// A view with no creatures, for hosts that only feed events
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyView;

impl WorldView for EmptyView {
    fn creatures(&self, _world: &str) -> Vec<CreatureSnapshot> {
        Vec::new()
    }

    fn creatures_in_cell(&self, _world: &str, _cell: ChunkCoord) -> Vec<CreatureSnapshot> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guaranteed_drop() {
        let base = CreatureSnapshot::new(EntityId::from_raw(1), KindId::ZOMBIE, DVec3::ZERO);
        assert!(!base.has_guaranteed_drop());
        assert!(!base.clone().with_equipment(0.085).has_guaranteed_drop());
        assert!(base.clone().with_equipment(0.085).with_equipment(1.0).has_guaranteed_drop());
        assert!(base.with_equipment(2.0).has_guaranteed_drop());
    }

    #[test]
    fn test_closure_veto() {
        let veto = |_: &str, c: &CreatureSnapshot| c.variant.is_some();
        let plain = CreatureSnapshot::new(EntityId::from_raw(2), KindId::COW, DVec3::ZERO);
        let named = plain.clone().with_variant("named");
        assert!(!veto.veto("world", &plain));
        assert!(veto.veto("world", &named));
    }
}

//! Registry of connected observers

use ahash::HashMap;
use glam::DVec3;
use mobcap_types::{ChunkCoord, EntityId, GameMode, chunk_of};

/// Last known state of a connected observer
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObserver {
    pub id: EntityId,
    pub world: String,
    pub pos: DVec3,
    pub mode: GameMode,
    /// Whether this observer counts for proximity (false for excluded modes)
    pub counted: bool,
}

impl TrackedObserver {
    pub fn cell(&self) -> ChunkCoord {
        chunk_of(self.pos)
    }
}

/// All observers the engine has been told about
#[derive(Debug, Default, Clone)]
pub struct ObserverRegistry {
    observers: HashMap<EntityId, TrackedObserver>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&TrackedObserver> {
        self.observers.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut TrackedObserver> {
        self.observers.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, observer: TrackedObserver) -> Option<TrackedObserver> {
        self.observers.insert(observer.id, observer)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<TrackedObserver> {
        self.observers.remove(&id)
    }

    /// Observers currently in `world`
    pub fn in_world<'a>(
        &'a self,
        world: &'a str,
    ) -> impl Iterator<Item = &'a TrackedObserver> + 'a {
        self.observers.values().filter(move |o| o.world == world)
    }

    /// Counted observers standing in one cell of `world`
    pub fn counted_in_cell<'a>(
        &'a self,
        world: &'a str,
        cell: ChunkCoord,
    ) -> impl Iterator<Item = &'a TrackedObserver> + 'a {
        self.in_world(world)
            .filter(move |o| o.counted && o.cell() == cell)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer(raw: u64, world: &str, pos: DVec3, counted: bool) -> TrackedObserver {
        TrackedObserver {
            id: EntityId::from_raw(raw),
            world: world.to_string(),
            pos,
            mode: GameMode::Survival,
            counted,
        }
    }

    #[test]
    fn test_in_world_filters() {
        let mut registry = ObserverRegistry::new();
        registry.insert(observer(1, "overworld", DVec3::ZERO, true));
        registry.insert(observer(2, "nether", DVec3::ZERO, true));
        registry.insert(observer(3, "overworld", DVec3::new(40.0, 0.0, 0.0), false));

        assert_eq!(registry.in_world("overworld").count(), 2);
        assert_eq!(registry.in_world("nether").count(), 1);
        assert_eq!(registry.in_world("end").count(), 0);
    }

    #[test]
    fn test_counted_in_cell() {
        let mut registry = ObserverRegistry::new();
        registry.insert(observer(1, "overworld", DVec3::new(1.0, 64.0, 1.0), true));
        registry.insert(observer(2, "overworld", DVec3::new(2.0, 64.0, 2.0), false));
        registry.insert(observer(3, "overworld", DVec3::new(20.0, 64.0, 2.0), true));

        let here: Vec<_> = registry
            .counted_in_cell("overworld", glam::IVec2::new(0, 0))
            .map(|o| o.id.raw())
            .collect();
        assert_eq!(here, vec![1]);
    }
}

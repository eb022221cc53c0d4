use super::{ProximityQuery, ProximityStrategy};
use crate::world::{ObserverRegistry, WorldState};

/// Checks every counted observer in the world against the query cylinder
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectScan;

impl ProximityStrategy for DirectScan {
    fn name(&self) -> &'static str {
        "direct_scan"
    }

    fn observer_nearby(
        &self,
        world: &WorldState,
        observers: &ObserverRegistry,
        query: &ProximityQuery,
    ) -> bool {
        observers
            .in_world(world.name())
            .any(|o| o.counted && query.contains(o.pos))
    }
}

//! Spawn admission and despawn decisions
//!
//! Both decisions are read-only passes over engine state. Counting happens
//! later, when the host confirms a creation or reports a removal.

mod admission;
mod despawn;

pub use admission::{Admission, DenyReason, SpawnAttempt, admit};
pub use despawn::{DespawnDecision, KeepReason, SweepContext, SweepReport, decide, sweep};

use glam::DVec3;

use crate::classify::{Classification, Classifier};
use crate::proximity::{ProximityQuery, ProximityStrategy};
use crate::world::{ObserverRegistry, WorldState};

/// Read-only view of engine state shared by both decisions
pub struct DecisionContext<'a> {
    pub classifier: &'a Classifier,
    pub observers: &'a ObserverRegistry,
    pub proximity: &'a dyn ProximityStrategy,
}

impl DecisionContext<'_> {
    /// Observer search around `pos`, widened below for flying creatures
    pub(crate) fn observer_nearby(
        &self,
        world: &WorldState,
        classification: &Classification,
        pos: DVec3,
    ) -> bool {
        let settings = world.settings();
        let mut query = ProximityQuery::new(pos, settings.search_at(pos.y));
        if classification.is_flying() {
            query = query.with_extra_depth(settings.flying_extra_depth);
        }
        self.proximity.observer_nearby(world, self.observers, &query)
    }
}

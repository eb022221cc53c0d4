//! "Is an observer near this point?" behind one interface
//!
//! Two strategies answer the question. [`DirectScan`] tests every counted
//! observer of the world against a cylinder. [`RingScan`] walks loaded
//! chunk cells outward in rings and consults their layer occupancy, which
//! is coarser but independent of the observer count.

mod direct;
mod ring;

pub use direct::DirectScan;
pub use ring::{RingScan, RingSpiral};

use glam::DVec3;

use crate::config::ProximityStrategyKind;
use crate::world::{ObserverRegistry, SearchWindow, WorldState};

/// A proximity question about one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityQuery {
    pub center: DVec3,
    /// Horizontal radius in blocks
    pub distance: f64,
    /// Vertical half-height in blocks
    pub height: f64,
    /// Extra room below the point for flying creatures
    pub extra_depth: f64,
}

impl ProximityQuery {
    pub fn new(center: DVec3, window: SearchWindow) -> Self {
        Self {
            center,
            distance: window.distance,
            height: window.height,
            extra_depth: 0.0,
        }
    }

    pub fn with_extra_depth(mut self, depth: f64) -> Self {
        self.extra_depth = depth.max(0.0);
        self
    }

    /// Inclusive vertical window `(lo, hi)` an observer must be inside
    pub fn vertical_bounds(&self) -> (f64, f64) {
        (
            self.center.y - self.height - self.extra_depth,
            self.center.y + self.height,
        )
    }

    /// Cylinder test for a single position
    pub fn contains(&self, pos: DVec3) -> bool {
        let (lo, hi) = self.vertical_bounds();
        if pos.y < lo || pos.y > hi {
            return false;
        }
        let dx = pos.x - self.center.x;
        let dz = pos.z - self.center.z;
        dx * dx + dz * dz <= self.distance * self.distance
    }
}

/// Pluggable observer search
pub trait ProximityStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn observer_nearby(
        &self,
        world: &WorldState,
        observers: &ObserverRegistry,
        query: &ProximityQuery,
    ) -> bool;
}

/// Build the strategy selected in configuration
pub fn strategy_for(kind: ProximityStrategyKind) -> Box<dyn ProximityStrategy> {
    match kind {
        ProximityStrategyKind::DirectScan => Box::new(DirectScan),
        ProximityStrategyKind::RingScan => Box::new(RingScan),
    }
}

use glam::IVec2;
use mobcap_types::{CHUNK_SIZE, ChunkCoord, chunk_of};

use super::{ProximityQuery, ProximityStrategy};
use crate::config::MAX_SEARCH_DISTANCE;
use crate::world::{ObserverRegistry, WorldState};

/// Chunk coordinates around a center in expanding square rings
///
/// Ring 0 is the center. Ring `k` walks the perimeter at Chebyshev
/// distance `k`: right column ascending, top row with descending x, left
/// column descending, bottom row ascending back to the start. Each ring
/// has `8k` cells and every coordinate within the radius is visited once.
#[derive(Debug, Clone)]
pub struct RingSpiral {
    center: ChunkCoord,
    radius: i32,
    ring: i32,
    index: i32,
}

impl RingSpiral {
    pub fn new(center: ChunkCoord, radius: i32) -> Self {
        Self {
            center,
            radius: radius.max(0),
            ring: 0,
            index: 0,
        }
    }

    fn offset(ring: i32, index: i32) -> IVec2 {
        let side = index / (2 * ring);
        let j = index % (2 * ring);
        match side {
            0 => IVec2::new(ring, -ring + 1 + j),
            1 => IVec2::new(ring - 1 - j, ring),
            2 => IVec2::new(-ring, ring - 1 - j),
            _ => IVec2::new(-ring + 1 + j, -ring),
        }
    }
}

impl Iterator for RingSpiral {
    type Item = ChunkCoord;

    fn next(&mut self) -> Option<ChunkCoord> {
        if self.ring > self.radius {
            return None;
        }
        if self.ring == 0 {
            self.ring = 1;
            return Some(self.center);
        }

        let offset = Self::offset(self.ring, self.index);
        self.index += 1;
        if self.index == 8 * self.ring {
            self.ring += 1;
            self.index = 0;
        }
        Some(self.center + offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.ring > self.radius {
            return (0, Some(0));
        }
        let side = 2 * self.radius as usize + 1;
        let done = if self.ring == 0 {
            0
        } else {
            let inner = 2 * (self.ring as usize - 1) + 1;
            inner * inner + self.index as usize
        };
        let left = side * side - done;
        (left, Some(left))
    }
}

/// Walks loaded cells in rings and trusts their layer occupancy counters
///
/// Answers "is a populated cell nearby" rather than measuring exact
/// distance, so it may accept observers up to one cell beyond the radius.
#[derive(Debug, Default, Clone, Copy)]
pub struct RingScan;

impl RingScan {
    /// Cell radius that covers a block distance, capped at the largest
    /// configurable search distance
    pub fn cell_radius(distance: f64) -> i32 {
        let distance = distance.clamp(0.0, MAX_SEARCH_DISTANCE);
        (distance / CHUNK_SIZE as f64).ceil() as i32
    }
}

impl ProximityStrategy for RingScan {
    fn name(&self) -> &'static str {
        "ring_scan"
    }

    fn observer_nearby(
        &self,
        world: &WorldState,
        _observers: &ObserverRegistry,
        query: &ProximityQuery,
    ) -> bool {
        let (lo, hi) = query.vertical_bounds();
        let center = chunk_of(query.center);
        RingSpiral::new(center, Self::cell_radius(query.distance)).any(|coord| {
            world
                .cell(coord)
                .is_some_and(|cell| cell.has_observer_between(lo, hi))
        })
    }
}

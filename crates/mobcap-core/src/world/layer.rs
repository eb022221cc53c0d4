//! Vertical layer of a chunk cell with observer occupancy

use crate::config::LayerRange;

/// A vertical band of a chunk cell
///
/// Layers of one cell may overlap, so a single vertical move can enter or
/// leave several layers at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    range: LayerRange,
    observers: u32,
}

impl Layer {
    pub fn new(range: LayerRange) -> Self {
        debug_assert!(range.min_y <= range.max_y);
        Self { range, observers: 0 }
    }

    pub fn min_y(&self) -> i32 {
        self.range.min_y
    }

    pub fn max_y(&self) -> i32 {
        self.range.max_y
    }

    pub fn observer_count(&self) -> u32 {
        self.observers
    }

    pub fn player_entered(&mut self) {
        self.observers += 1;
    }

    pub fn player_left(&mut self) {
        if self.observers == 0 {
            log::warn!(
                "Observer left layer {}..{} which has no observers",
                self.range.min_y,
                self.range.max_y
            );
            return;
        }
        self.observers -= 1;
    }

    /// Whether block height `y` lies inside this layer
    pub fn inside_range(&self, y: f64) -> bool {
        let block_y = y.floor();
        block_y >= self.range.min_y as f64 && block_y <= self.range.max_y as f64
    }

    /// Whether this layer shares any height with `lo..=hi`
    pub fn overlaps(&self, lo: f64, hi: f64) -> bool {
        (self.range.min_y as f64) <= hi.floor() && (self.range.max_y as f64) >= lo.floor()
    }
}

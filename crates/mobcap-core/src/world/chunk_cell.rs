//! Per-cell observer and animal bookkeeping

use mobcap_types::ChunkCoord;

use super::layer::Layer;
use crate::config::LayerRange;

/// Counters for one loaded chunk cell
///
/// Exists only while the cell is loaded; unloading discards it with no
/// carry-over.
#[derive(Debug, Clone)]
pub struct ChunkCell {
    coord: ChunkCoord,
    observers: u32,
    animals: u32,
    layers: Vec<Layer>,
}

impl ChunkCell {
    pub fn new(coord: ChunkCoord, ranges: &[LayerRange]) -> Self {
        Self {
            coord,
            observers: 0,
            animals: 0,
            layers: ranges.iter().copied().map(Layer::new).collect(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn observer_count(&self) -> u32 {
        self.observers
    }

    pub fn animal_count(&self) -> u32 {
        self.animals
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// An observer arrived at height `y`
    pub fn player_entered(&mut self, y: f64) {
        self.observers += 1;
        for layer in self.layers.iter_mut().filter(|l| l.inside_range(y)) {
            layer.player_entered();
        }
    }

    /// An observer at height `y` left the cell
    pub fn player_left(&mut self, y: f64) {
        if self.observers == 0 {
            log::warn!(
                "Observer left chunk ({}, {}) which has no observers",
                self.coord.x,
                self.coord.y
            );
            return;
        }
        self.observers -= 1;
        for layer in self.layers.iter_mut().filter(|l| l.inside_range(y)) {
            layer.player_left();
        }
    }

    /// An observer moved vertically without leaving the cell
    pub fn player_moved(&mut self, from_y: f64, to_y: f64) {
        for layer in &mut self.layers {
            match (layer.inside_range(from_y), layer.inside_range(to_y)) {
                (true, false) => layer.player_left(),
                (false, true) => layer.player_entered(),
                _ => {}
            }
        }
    }

    pub fn change_animal_count(&mut self, delta: i32) {
        if delta < 0 && self.animals < delta.unsigned_abs() {
            log::warn!(
                "Animal count of chunk ({}, {}) would drop below zero",
                self.coord.x,
                self.coord.y
            );
            self.animals = 0;
            return;
        }
        self.animals = self.animals.saturating_add_signed(delta);
    }

    pub(crate) fn set_animal_count(&mut self, animals: u32) {
        self.animals = animals;
    }

    pub fn within_breeding_limit(&self, limit: u32) -> bool {
        self.animals < limit
    }

    /// Any observer inside a layer touching `lo..=hi`
    ///
    /// A cell without layers only knows that someone is present.
    pub fn has_observer_between(&self, lo: f64, hi: f64) -> bool {
        if self.observers == 0 {
            return false;
        }
        if self.layers.is_empty() {
            return true;
        }
        self.layers
            .iter()
            .any(|layer| layer.observer_count() > 0 && layer.overlaps(lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    fn ranges() -> Vec<LayerRange> {
        vec![
            LayerRange::new(0, 63),
            LayerRange::new(48, 127),
            LayerRange::new(200, 255),
        ]
    }

    #[test]
    fn test_enter_updates_matching_layers() {
        let mut cell = ChunkCell::new(IVec2::new(0, 0), &ranges());
        cell.player_entered(50.0);

        assert_eq!(cell.observer_count(), 1);
        let counts: Vec<u32> = cell.layers().iter().map(|l| l.observer_count()).collect();
        assert_eq!(counts, vec![1, 1, 0]);
    }

    #[test]
    fn test_vertical_move_within_cell() {
        let mut cell = ChunkCell::new(IVec2::new(0, 0), &ranges());
        cell.player_entered(10.0);
        cell.player_moved(10.0, 100.0);

        assert_eq!(cell.observer_count(), 1);
        let counts: Vec<u32> = cell.layers().iter().map(|l| l.observer_count()).collect();
        assert_eq!(counts, vec![0, 1, 0]);

        cell.player_left(100.0);
        assert_eq!(cell.observer_count(), 0);
        assert!(cell.layers().iter().all(|l| l.observer_count() == 0));
    }

    #[test]
    fn test_observer_outside_all_layers() {
        let mut cell = ChunkCell::new(IVec2::new(0, 0), &ranges());
        cell.player_entered(150.0);
        assert_eq!(cell.observer_count(), 1);
        assert!(!cell.has_observer_between(0.0, 255.0));
    }

    #[test]
    fn test_has_observer_between() {
        let mut cell = ChunkCell::new(IVec2::new(0, 0), &ranges());
        assert!(!cell.has_observer_between(0.0, 300.0));

        cell.player_entered(220.0);
        assert!(cell.has_observer_between(180.0, 210.0));
        assert!(!cell.has_observer_between(0.0, 150.0));
    }

    #[test]
    fn test_no_layers_means_any_height() {
        let mut cell = ChunkCell::new(IVec2::new(3, -2), &[]);
        cell.player_entered(64.0);
        assert!(cell.has_observer_between(-1000.0, -900.0));
    }

    #[test]
    fn test_animal_counts_and_breeding_limit() {
        let mut cell = ChunkCell::new(IVec2::new(0, 0), &ranges());
        for _ in 0..3 {
            cell.change_animal_count(1);
        }
        assert!(cell.within_breeding_limit(4));
        cell.change_animal_count(1);
        assert!(!cell.within_breeding_limit(4));

        cell.change_animal_count(-10);
        assert_eq!(cell.animal_count(), 0);
    }

    #[test]
    fn test_leave_empty_cell_is_noop() {
        let mut cell = ChunkCell::new(IVec2::new(0, 0), &ranges());
        cell.player_left(10.0);
        assert_eq!(cell.observer_count(), 0);
    }
}

//! State owned by one enabled world

use ahash::HashMap;
use mobcap_types::{CapKey, ChunkCoord, MobType};
use std::sync::Arc;

use super::chunk_cell::ChunkCell;
use super::population::WorldPopulation;
use super::recount::{PopulationCounts, RecountSummary, counts_toward_population};
use super::settings::WorldSettings;
use crate::classify::Classifier;
use crate::view::CreatureSnapshot;

/// Population and loaded cells of one world
///
/// Created when the world is enabled and dropped when it is disabled.
#[derive(Debug)]
pub struct WorldState {
    name: String,
    generation: u64,
    settings: Arc<WorldSettings>,
    population: WorldPopulation,
    cells: HashMap<ChunkCoord, ChunkCell>,
}

impl WorldState {
    pub fn new(name: impl Into<String>, generation: u64, settings: WorldSettings) -> Self {
        let population = WorldPopulation::new(settings.caps.clone());
        Self {
            name: name.into(),
            generation,
            settings: Arc::new(settings),
            population,
            cells: HashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bumped every time a world with this name is re-enabled
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub(crate) fn shared_settings(&self) -> Arc<WorldSettings> {
        Arc::clone(&self.settings)
    }

    pub fn population(&self) -> &WorldPopulation {
        &self.population
    }

    pub(crate) fn population_mut(&mut self) -> &mut WorldPopulation {
        &mut self.population
    }

    pub fn cell(&self, coord: ChunkCoord) -> Option<&ChunkCell> {
        self.cells.get(&coord)
    }

    pub(crate) fn cell_mut(&mut self, coord: ChunkCoord) -> Option<&mut ChunkCell> {
        self.cells.get_mut(&coord)
    }

    pub fn cells(&self) -> impl Iterator<Item = &ChunkCell> {
        self.cells.values()
    }

    pub fn loaded_cells(&self) -> usize {
        self.cells.len()
    }

    /// Whether a classified animal adds to the cell's animal count
    pub(crate) fn counts_as_animal(
        &self,
        classifier: &Classifier,
        creature: &CreatureSnapshot,
    ) -> bool {
        match classifier.classify(creature) {
            Some(c) => {
                c.category == MobType::Animal
                    && counts_toward_population(&c, creature, &self.settings.animals)
            }
            None => false,
        }
    }

    /// Track a freshly loaded cell, seeding it from what is already there
    ///
    /// `observer_ys` are the heights of counted observers standing in the
    /// cell. Loading a cell twice re-seeds it without touching the active
    /// cell count.
    pub fn load_cell(
        &mut self,
        coord: ChunkCoord,
        observer_ys: &[f64],
        creatures: &[CreatureSnapshot],
        classifier: &Classifier,
    ) {
        let mut cell = ChunkCell::new(coord, &self.settings.layers);
        for &y in observer_ys {
            cell.player_entered(y);
        }
        let animals = creatures
            .iter()
            .filter(|c| self.counts_as_animal(classifier, c))
            .count();
        cell.set_animal_count(animals as u32);

        if self.cells.insert(coord, cell).is_some() {
            log::warn!(
                "Chunk ({}, {}) in {} was already loaded, re-seeding",
                coord.x,
                coord.y,
                self.name
            );
        } else {
            self.population.cell_loaded();
        }
    }

    /// Forget a cell; returns false if it was never tracked
    pub fn unload_cell(&mut self, coord: ChunkCoord) -> bool {
        if self.cells.remove(&coord).is_none() {
            log::warn!(
                "Unload of untracked chunk ({}, {}) in {}",
                coord.x,
                coord.y,
                self.name
            );
            return false;
        }
        self.population.cell_unloaded();
        true
    }

    /// Replace incremental counts with a full recount
    pub fn apply_recount(&mut self, counts: PopulationCounts) -> RecountSummary {
        let old = self.population.counts();
        let mut changed_keys = 0;
        let mut drift = 0u64;

        let keys: Vec<&CapKey> = old.keys().chain(counts.by_key.keys()).collect();
        let mut seen = ahash::HashSet::default();
        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            let before = old.get(key).copied().unwrap_or(0);
            let after = counts.by_key.get(key).copied().unwrap_or(0);
            if before != after {
                changed_keys += 1;
                drift += before.abs_diff(after) as u64;
            }
        }

        if drift > 0 {
            log::warn!(
                "Recount of {} corrected {} keys (drift {})",
                self.name,
                changed_keys,
                drift
            );
        }

        for cell in self.cells.values_mut() {
            let animals = counts
                .animals_by_cell
                .get(&cell.coord())
                .copied()
                .unwrap_or(0);
            cell.set_animal_count(animals);
        }
        let summary = RecountSummary {
            creatures: counts.creatures,
            changed_keys,
            drift,
        };
        self.population.replace_counts(counts.by_key);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneralConfig, WorldConfig};
    use crate::world::recount::count_population;
    use glam::{DVec3, IVec2};
    use mobcap_types::{EntityId, KindId, KindRegistry};

    fn state() -> WorldState {
        let settings = WorldSettings::resolve(
            &GeneralConfig::default(),
            &WorldConfig::default(),
            &KindRegistry::new(),
        );
        WorldState::new("overworld", 1, settings)
    }

    fn cow(raw: u64, x: f64, z: f64) -> CreatureSnapshot {
        CreatureSnapshot::new(EntityId::from_raw(raw), KindId::COW, DVec3::new(x, 64.0, z))
    }

    #[test]
    fn test_load_and_unload_track_active_cells() {
        let classifier = Classifier::default();
        let mut state = state();

        state.load_cell(IVec2::new(0, 0), &[], &[], &classifier);
        state.load_cell(IVec2::new(1, 0), &[], &[], &classifier);
        assert_eq!(state.population().active_cells(), 2);

        assert!(state.unload_cell(IVec2::new(0, 0)));
        assert!(!state.unload_cell(IVec2::new(0, 0)));
        assert_eq!(state.population().active_cells(), 1);
        assert_eq!(state.loaded_cells(), 1);
    }

    #[test]
    fn test_double_load_does_not_double_count() {
        let classifier = Classifier::default();
        let mut state = state();

        state.load_cell(IVec2::new(3, 3), &[], &[], &classifier);
        state.load_cell(IVec2::new(3, 3), &[], &[], &classifier);
        assert_eq!(state.population().active_cells(), 1);
    }

    #[test]
    fn test_load_seeds_observers_and_animals() {
        let classifier = Classifier::default();
        let mut state = state();
        let creatures = vec![
            cow(1, 1.0, 1.0),
            cow(2, 2.0, 2.0),
            CreatureSnapshot::new(EntityId::from_raw(3), KindId::ZOMBIE, DVec3::ZERO),
        ];

        state.load_cell(IVec2::new(0, 0), &[70.0], &creatures, &classifier);
        let cell = state.cell(IVec2::new(0, 0)).unwrap();
        assert_eq!(cell.observer_count(), 1);
        assert_eq!(cell.animal_count(), 2);
    }

    #[test]
    fn test_apply_recount_reports_drift() {
        let classifier = Classifier::default();
        let mut state = state();
        state.load_cell(IVec2::new(0, 0), &[], &[], &classifier);

        let keys = [CapKey::Category(MobType::Animal)];
        for _ in 0..5 {
            state.population_mut().increment(&keys);
        }

        let creatures = vec![cow(10, 1.0, 1.0), cow(11, 3.0, 3.0)];
        let counts = count_population(&classifier, state.settings(), &creatures);
        let summary = state.apply_recount(counts);

        assert_eq!(summary.creatures, 2);
        assert_eq!(state.population().count(&keys[0]), 2);
        assert_eq!(state.cell(IVec2::new(0, 0)).unwrap().animal_count(), 2);
        assert!(summary.drift >= 3);

        let again = count_population(&classifier, state.settings(), &creatures);
        let summary = state.apply_recount(again);
        assert_eq!(summary.drift, 0);
        assert_eq!(summary.changed_keys, 0);
    }
}

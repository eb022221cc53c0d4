//! Full population recount from live world state
//!
//! Incremental counting misses removals the host never reports, so counts
//! are periodically rebuilt from scratch. The recount is a pure function of
//! the creature list: running it twice over the same list gives the same
//! counts, and a creature listed twice is counted once.

use ahash::{HashMap, HashSet};
use mobcap_types::{CapKey, ChunkCoord, MobType};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use super::settings::{AnimalSettings, WorldSettings};
use crate::classify::{Classification, Classifier};
use crate::view::CreatureSnapshot;

/// Counts produced by a full rescan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationCounts {
    pub by_key: HashMap<CapKey, u32>,
    pub animals_by_cell: HashMap<ChunkCoord, u32>,
    /// Distinct classified creatures that were counted
    pub creatures: usize,
}

/// What applying a recount changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecountSummary {
    pub creatures: usize,
    /// Keys whose count differed from the incremental value
    pub changed_keys: usize,
    /// Sum of absolute differences over all keys
    pub drift: u64,
}

/// Result of a recount computed off the simulation thread
#[derive(Debug, Clone)]
pub struct RecountResult {
    pub world: String,
    pub generation: u64,
    pub counts: PopulationCounts,
}

/// Whether a classified creature counts towards caps in this world
pub fn counts_toward_population(
    classification: &Classification,
    creature: &CreatureSnapshot,
    animals: &AnimalSettings,
) -> bool {
    !(creature.tamed && classification.category == MobType::Animal && !animals.count_tamed)
}

/// Rebuild population counts from a list of live creatures
pub fn count_population(
    classifier: &Classifier,
    settings: &WorldSettings,
    creatures: &[CreatureSnapshot],
) -> PopulationCounts {
    let mut counts = PopulationCounts::default();
    let mut seen: HashSet<_> = HashSet::default();

    for creature in creatures {
        if !seen.insert(creature.id) {
            continue;
        }
        let Some(classification) = classifier.classify(creature) else {
            continue;
        };
        if !counts_toward_population(&classification, creature, &settings.animals) {
            continue;
        }

        for key in classification.cap_keys() {
            *counts.by_key.entry(key).or_insert(0) += 1;
        }
        if classification.category == MobType::Animal {
            *counts.animals_by_cell.entry(creature.cell()).or_insert(0) += 1;
        }
        counts.creatures += 1;
    }

    counts
}

/// Run `count_population` on a worker thread and send the result back
pub fn spawn_recount(
    world: String,
    generation: u64,
    classifier: Arc<Classifier>,
    settings: Arc<WorldSettings>,
    creatures: Vec<CreatureSnapshot>,
    results: Sender<RecountResult>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("mobcap-recount-{}", world))
        .spawn(move || {
            let counts = count_population(&classifier, &settings, &creatures);
            if results
                .send(RecountResult {
                    world,
                    generation,
                    counts,
                })
                .is_err()
            {
                log::debug!("Recount result dropped, engine is gone");
            }
        })
}

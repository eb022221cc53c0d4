//! Seeded synthetic world that plays the host's part
//!
//! Owns the live creatures and a handful of wandering observers, proposes
//! spawns every tick and carries out whatever the engine decides.

use glam::{DVec3, IVec2};
use mobcap_core::{Admission, CreatureSnapshot, Engine, RecountOutcome, SpawnAttempt, WorldView};
use mobcap_types::{CHUNK_SIZE, ChunkCoord, EntityId, GameMode, KindId, MobType, SpawnReason};
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;
use std::collections::BTreeMap;

/// Kinds the synthetic world tries to spawn, with relative weights
const SPAWN_TABLE: &[(KindId, u32)] = &[
    (KindId::ZOMBIE, 10),
    (KindId::SKELETON, 8),
    (KindId::CREEPER, 6),
    (KindId::SPIDER, 6),
    (KindId::PHANTOM, 2),
    (KindId::COW, 5),
    (KindId::PIG, 5),
    (KindId::SHEEP, 5),
    (KindId::CHICKEN, 5),
    (KindId::WOLF, 2),
    (KindId::SQUID, 3),
    (KindId::BAT, 3),
    (KindId::VILLAGER, 2),
    (KindId::IRON_GOLEM, 1),
];

const SHEEP_COLORS: &[&str] = &["white", "black", "brown"];

/// Knobs of the synthetic world
#[derive(Debug, Clone)]
pub struct SimSettings {
    pub world: String,
    /// Loaded square spans `-radius..radius` cells on both axes
    pub radius_cells: i32,
    pub observers: usize,
    pub spawn_attempts_per_tick: usize,
    /// Chance per creature per tick of a death the host does report
    pub death_chance: f64,
    /// Chance per creature per tick of vanishing without telling the engine
    pub silent_loss_chance: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            world: "overworld".to_string(),
            radius_cells: 12,
            observers: 4,
            spawn_attempts_per_tick: 4,
            death_chance: 0.0005,
            silent_loss_chance: 0.00005,
        }
    }
}

/// Running totals for the final summary
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub attempts: u64,
    pub allowed: u64,
    pub uncontrolled: u64,
    pub denied: BTreeMap<String, u64>,
    pub despawned: u64,
    pub deaths: u64,
    pub silent_losses: u64,
    pub recount_drift: u64,
}

pub struct SyntheticWorld {
    settings: SimSettings,
    rng: Xoshiro256StarStar,
    creatures: BTreeMap<EntityId, CreatureSnapshot>,
    observers: Vec<(EntityId, DVec3)>,
    stats: SimStats,
}

impl SyntheticWorld {
    pub fn new(settings: SimSettings, rng: Xoshiro256StarStar) -> Self {
        Self {
            settings,
            rng,
            creatures: BTreeMap::new(),
            observers: Vec::new(),
            stats: SimStats::default(),
        }
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn population(&self) -> usize {
        self.creatures.len()
    }

    fn extent(&self) -> f64 {
        (self.settings.radius_cells * CHUNK_SIZE) as f64
    }

    fn random_pos(&mut self) -> DVec3 {
        let extent = self.extent();
        DVec3::new(
            self.rng.gen_range(-extent..extent),
            self.rng.gen_range(40.0..100.0),
            self.rng.gen_range(-extent..extent),
        )
    }

    fn random_kind(&mut self) -> KindId {
        let total: u32 = SPAWN_TABLE.iter().map(|(_, w)| w).sum();
        let mut roll = self.rng.gen_range(0..total);
        for &(kind, weight) in SPAWN_TABLE {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        KindId::ZOMBIE
    }

    /// Enable the world, load its cells and let the observers join
    pub fn setup(&mut self, engine: &mut Engine) {
        let world = self.settings.world.clone();
        if !engine.enable_world(&world) {
            log::warn!("World {} is not under population control", world);
        }

        let radius = self.settings.radius_cells;
        for x in -radius..radius {
            for z in -radius..radius {
                engine.cell_loaded(&world, IVec2::new(x, z), &*self);
            }
        }

        for _ in 0..self.settings.observers {
            let id = EntityId::new();
            let pos = self.random_pos();
            engine.observer_joined(id, &world, pos, GameMode::Survival);
            self.observers.push((id, pos));
        }
        log::info!(
            "Synthetic world {}: {} cells, {} observers",
            world,
            (2 * radius) * (2 * radius),
            self.observers.len()
        );
    }

    fn wander_observers(&mut self, engine: &mut Engine) {
        let extent = self.extent() - 1.0;
        for i in 0..self.observers.len() {
            let (id, pos) = self.observers[i];
            let step = DVec3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-0.2..0.2),
                self.rng.gen_range(-1.0..1.0),
            );
            let to = (pos + step).clamp(
                DVec3::new(-extent, 0.0, -extent),
                DVec3::new(extent, 255.0, extent),
            );
            engine.observer_moved(id, to);
            self.observers[i].1 = to;
        }
    }

    fn propose_spawns(&mut self, engine: &mut Engine) {
        let world = self.settings.world.clone();
        for _ in 0..self.settings.spawn_attempts_per_tick {
            let kind = self.random_kind();
            let pos = self.random_pos();
            let is_animal = engine
                .classifier()
                .category(kind)
                .is_some_and(|c| c == MobType::Animal);
            let reason = if is_animal && self.rng.gen_bool(0.3) {
                SpawnReason::Breeding
            } else {
                SpawnReason::Natural
            };

            let mut attempt = SpawnAttempt::new(kind, pos, reason);
            if kind == KindId::SHEEP {
                let color = SHEEP_COLORS[self.rng.gen_range(0..SHEEP_COLORS.len())];
                attempt = attempt.with_variant(color);
            }

            self.stats.attempts += 1;
            let admission = engine.spawn_attempt(&world, &attempt);
            match &admission {
                Admission::Allowed => self.stats.allowed += 1,
                Admission::Uncontrolled => self.stats.uncontrolled += 1,
                Admission::Denied(reason) => {
                    *self.stats.denied.entry(format!("{:?}", reason)).or_insert(0) += 1;
                }
            }
            if !admission.permits() {
                continue;
            }

            let mut creature = CreatureSnapshot::new(EntityId::new(), kind, pos);
            creature.variant = attempt.variant.clone();
            if kind == KindId::WOLF {
                creature.tamed = self.rng.gen_bool(0.3);
            }
            if kind == KindId::ZOMBIE && self.rng.gen_bool(0.02) {
                creature = creature.with_equipment(1.0);
            }
            engine.creature_confirmed(&world, &creature);
            if reason.is_breeding() {
                engine.protect_animal(&creature);
            }
            self.creatures.insert(creature.id, creature);
        }
    }

    fn age_and_die(&mut self, engine: &mut Engine) {
        let world = self.settings.world.clone();
        let mut reported = Vec::new();
        let mut silent = Vec::new();
        for creature in self.creatures.values_mut() {
            creature.ticks_lived += 1;
            let roll: f64 = self.rng.gen();
            if roll < self.settings.silent_loss_chance {
                silent.push(creature.id);
            } else if roll < self.settings.silent_loss_chance + self.settings.death_chance {
                reported.push(creature.id);
            }
        }

        for id in silent {
            self.creatures.remove(&id);
            self.stats.silent_losses += 1;
        }
        for id in reported {
            if let Some(creature) = self.creatures.remove(&id) {
                engine.creature_removed(&world, &creature);
                self.stats.deaths += 1;
            }
        }
    }

    /// One game tick: host activity, then the engine's periodic work
    pub fn step(&mut self, engine: &mut Engine) {
        self.age_and_die(engine);
        self.wander_observers(engine);
        self.propose_spawns(engine);

        let report = engine.tick(&*self);
        for (_, outcome) in &report.recounts {
            if let RecountOutcome::Applied(summary) = outcome {
                self.stats.recount_drift += summary.drift;
            }
        }

        let removals: Vec<(String, EntityId)> = report
            .removals()
            .map(|(world, id)| (world.to_string(), id))
            .collect();
        for (world, id) in removals {
            if let Some(creature) = self.creatures.remove(&id) {
                engine.creature_removed(&world, &creature);
                self.stats.despawned += 1;
            }
        }
    }
}

impl WorldView for SyntheticWorld {
    fn creatures(&self, world: &str) -> Vec<CreatureSnapshot> {
        if world != self.settings.world {
            return Vec::new();
        }
        self.creatures.values().cloned().collect()
    }

    fn creatures_in_cell(&self, world: &str, cell: ChunkCoord) -> Vec<CreatureSnapshot> {
        if world != self.settings.world {
            return Vec::new();
        }
        self.creatures
            .values()
            .filter(|c| c.cell() == cell)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobcap_core::MobcapConfig;
    use rand::SeedableRng;

    fn run(seed: u64, ticks: usize) -> (usize, SimStats) {
        let mut config = MobcapConfig::default();
        config.general.despawn_interval_ticks = 50;
        config.general.recount_interval_ticks = 100;
        config.general.min_ticks_lived_for_despawn = 20;
        let mut engine = Engine::new(config);

        let settings = SimSettings {
            radius_cells: 4,
            observers: 2,
            ..SimSettings::default()
        };
        let mut world = SyntheticWorld::new(settings, Xoshiro256StarStar::seed_from_u64(seed));
        world.setup(&mut engine);
        for _ in 0..ticks {
            world.step(&mut engine);
        }
        (world.population(), world.stats().clone())
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let (pop_a, stats_a) = run(7, 300);
        let (pop_b, stats_b) = run(7, 300);
        assert_eq!(pop_a, pop_b);
        assert_eq!(stats_a.allowed, stats_b.allowed);
        assert_eq!(stats_a.denied, stats_b.denied);
    }

    #[test]
    fn test_attempts_add_up() {
        let (_, stats) = run(11, 200);
        let denied: u64 = stats.denied.values().sum();
        assert_eq!(stats.attempts, stats.allowed + stats.uncontrolled + denied);
        assert_eq!(stats.attempts, 200 * 4);
    }
}

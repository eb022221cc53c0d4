//! The simulation context tying all per-world state together
//!
//! One `Engine` is owned by the simulation thread. Hosts feed it events
//! (cells, observers, spawns, removals) and call [`Engine::tick`] once per
//! game tick; the engine answers admission questions and returns the
//! creatures its sweeps want gone.

use ahash::HashMap;
use glam::DVec3;
use mobcap_types::{CapKey, ChunkCoord, EntityId, GameMode, KindRegistry, MobType, chunk_of};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::classify::Classifier;
use crate::clock::{Clock, SystemClock};
use crate::config::{MobcapConfig, ProximityStrategyKind};
use crate::control::{self, Admission, DecisionContext, SpawnAttempt, SweepContext, SweepReport};
use crate::error::PersistenceError;
use crate::protection::{MemoryProtectionStore, PersistOutcome, ProtectionRegistry, ProtectionStore};
use crate::proximity::{ProximityStrategy, strategy_for};
use crate::report::{CapLine, WorldReport};
use crate::view::{CreatureSnapshot, DespawnVeto, WorldView};
use crate::world::recount::{counts_toward_population, spawn_recount};
use crate::world::{
    ObserverRegistry, RecountResult, RecountSummary, TrackedObserver, WorldSettings, WorldState,
    count_population, is_unlimited,
};

/// What a recount request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecountOutcome {
    Applied(RecountSummary),
    /// Handed to a worker; applied on a later tick
    Scheduled,
    /// A worker is still counting this world
    AlreadyPending,
    WorldInactive,
    /// The recount worker could not be started; counts are unchanged
    WorkerUnavailable,
}

/// Work done by one call to [`Engine::tick`]
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Worker recounts applied at the start of the tick
    pub recounts_applied: usize,
    pub sweeps: Vec<(String, SweepReport)>,
    pub recounts: Vec<(String, RecountOutcome)>,
    pub persist_started: bool,
}

impl TickReport {
    /// Every creature the sweeps asked to remove
    pub fn removals(&self) -> impl Iterator<Item = (&str, EntityId)> + '_ {
        self.sweeps
            .iter()
            .flat_map(|(world, report)| report.removed.iter().map(move |id| (world.as_str(), *id)))
    }
}

/// Population control for every enabled world
pub struct Engine {
    config: MobcapConfig,
    classifier: Arc<Classifier>,
    worlds: HashMap<String, WorldState>,
    observers: ObserverRegistry,
    proximity: Box<dyn ProximityStrategy>,
    protection: Arc<ProtectionRegistry>,
    vetoes: Vec<Box<dyn DespawnVeto>>,
    clock: Arc<dyn Clock>,
    tick: u64,
    next_generation: u64,
    recount_tx: Sender<RecountResult>,
    recount_rx: Receiver<RecountResult>,
    /// World name → generation of the recount being computed
    pending_recounts: HashMap<String, u64>,
    last_persist_ms: Option<u64>,
    persist_worker: Option<JoinHandle<PersistOutcome>>,
}

impl Engine {
    /// Engine with the default kind table, an in-memory protection store
    /// and the system clock
    pub fn new(mut config: MobcapConfig) -> Self {
        config.normalize();
        let (recount_tx, recount_rx) = mpsc::channel();
        let protection = Arc::new(ProtectionRegistry::from_config(
            &config.general.protection,
            Arc::new(MemoryProtectionStore::new()),
        ));
        Self {
            proximity: strategy_for(config.general.proximity_strategy),
            config,
            classifier: Arc::new(Classifier::default()),
            worlds: HashMap::default(),
            observers: ObserverRegistry::new(),
            protection,
            vetoes: Vec::new(),
            clock: Arc::new(SystemClock),
            tick: 0,
            next_generation: 0,
            recount_tx,
            recount_rx,
            pending_recounts: HashMap::default(),
            last_persist_ms: None,
            persist_worker: None,
        }
    }

    /// Use a custom kind table; call before enabling worlds
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        if !self.worlds.is_empty() {
            log::warn!("Kind registry replaced after worlds were enabled");
        }
        self.classifier = Arc::new(Classifier::new(registry));
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ProtectionStore>) -> Self {
        self.protection = Arc::new(ProtectionRegistry::from_config(
            &self.config.general.protection,
            store,
        ));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_strategy(mut self, kind: ProximityStrategyKind) -> Self {
        self.config.general.proximity_strategy = kind;
        self.proximity = strategy_for(kind);
        self
    }

    pub fn add_veto(&mut self, veto: impl DespawnVeto + 'static) {
        self.vetoes.push(Box::new(veto));
    }

    /// Read persisted protection entries into memory
    pub fn load_protection(&self) -> Result<usize, PersistenceError> {
        self.protection.load(self.clock.now_ms())
    }

    pub fn config(&self) -> &MobcapConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn protection(&self) -> &ProtectionRegistry {
        &self.protection
    }

    pub fn proximity(&self) -> &dyn ProximityStrategy {
        self.proximity.as_ref()
    }

    pub fn world(&self, name: &str) -> Option<&WorldState> {
        self.worlds.get(name)
    }

    /// Names of enabled worlds in sorted order
    pub fn world_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.worlds.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    fn decision_context(&self) -> DecisionContext<'_> {
        DecisionContext {
            classifier: &self.classifier,
            observers: &self.observers,
            proximity: self.proximity.as_ref(),
        }
    }

    // ---- world lifecycle ----

    /// Start tracking a world; false if disabled in config or already active
    pub fn enable_world(&mut self, name: &str) -> bool {
        if self.worlds.contains_key(name) {
            log::debug!("World {} is already enabled", name);
            return false;
        }
        let world_config = self.config.world(name);
        if !world_config.enabled {
            log::info!("World {} is disabled in configuration", name);
            return false;
        }

        let settings =
            WorldSettings::resolve(&self.config.general, world_config, self.classifier.registry());
        self.next_generation += 1;
        self.worlds.insert(
            name.to_string(),
            WorldState::new(name, self.next_generation, settings),
        );
        log::info!("Enabled population control for world {}", name);
        true
    }

    /// Drop all state of a world
    pub fn disable_world(&mut self, name: &str) -> bool {
        self.pending_recounts.remove(name);
        match self.worlds.remove(name) {
            Some(state) => {
                log::info!(
                    "Disabled population control for world {} ({} cells dropped)",
                    name,
                    state.loaded_cells()
                );
                true
            }
            None => false,
        }
    }

    // ---- cells ----

    /// Track a loaded cell, seeding it from observers and creatures already there
    pub fn cell_loaded(&mut self, world: &str, coord: ChunkCoord, view: &dyn WorldView) {
        let Some(state) = self.worlds.get_mut(world) else {
            return;
        };
        let observer_ys: Vec<f64> = self
            .observers
            .counted_in_cell(world, coord)
            .map(|o| o.pos.y)
            .collect();
        let creatures = view.creatures_in_cell(world, coord);
        state.load_cell(coord, &observer_ys, &creatures, &self.classifier);
    }

    pub fn cell_unloaded(&mut self, world: &str, coord: ChunkCoord) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.unload_cell(coord);
        }
    }

    // ---- observers ----

    fn counts_mode(&self, mode: GameMode) -> bool {
        !(mode == GameMode::Spectator && self.config.general.ignore_spectators)
    }

    fn enter_cell(&mut self, world: &str, pos: DVec3) {
        if let Some(cell) = self
            .worlds
            .get_mut(world)
            .and_then(|state| state.cell_mut(chunk_of(pos)))
        {
            cell.player_entered(pos.y);
        }
    }

    fn leave_cell(&mut self, world: &str, pos: DVec3) {
        if let Some(cell) = self
            .worlds
            .get_mut(world)
            .and_then(|state| state.cell_mut(chunk_of(pos)))
        {
            cell.player_left(pos.y);
        }
    }

    pub fn observer_joined(&mut self, id: EntityId, world: &str, pos: DVec3, mode: GameMode) {
        if self.observers.get(id).is_some() {
            log::warn!("{} joined twice, replacing the old entry", id);
            self.observer_quit(id);
        }
        let counted = self.counts_mode(mode);
        self.observers.insert(TrackedObserver {
            id,
            world: world.to_string(),
            pos,
            mode,
            counted,
        });
        if counted {
            self.enter_cell(world, pos);
        }
    }

    pub fn observer_quit(&mut self, id: EntityId) {
        let Some(observer) = self.observers.remove(id) else {
            log::debug!("Quit of untracked observer {}", id);
            return;
        };
        if observer.counted {
            self.leave_cell(&observer.world, observer.pos);
        }
    }

    /// Movement inside the observer's current world
    pub fn observer_moved(&mut self, id: EntityId, to: DVec3) {
        let Some(observer) = self.observers.get(id) else {
            log::debug!("Move of untracked observer {}", id);
            return;
        };
        let world = observer.world.clone();
        self.observer_teleported(id, &world, to);
    }

    /// Movement that may cross into another world
    pub fn observer_teleported(&mut self, id: EntityId, world: &str, to: DVec3) {
        let Some(observer) = self.observers.get_mut(id) else {
            log::debug!("Teleport of untracked observer {}", id);
            return;
        };
        let from_world = std::mem::replace(&mut observer.world, world.to_string());
        let from = std::mem::replace(&mut observer.pos, to);
        if !observer.counted {
            return;
        }

        if from_world == world && chunk_of(from) == chunk_of(to) {
            if let Some(cell) = self
                .worlds
                .get_mut(world)
                .and_then(|state| state.cell_mut(chunk_of(to)))
            {
                cell.player_moved(from.y, to.y);
            }
        } else {
            self.leave_cell(&from_world, from);
            self.enter_cell(world, to);
        }
    }

    pub fn observer_mode_changed(&mut self, id: EntityId, mode: GameMode) {
        let counted = self.counts_mode(mode);
        let Some(observer) = self.observers.get_mut(id) else {
            return;
        };
        observer.mode = mode;
        if observer.counted == counted {
            return;
        }
        observer.counted = counted;
        let (world, pos) = (observer.world.clone(), observer.pos);
        if counted {
            self.enter_cell(&world, pos);
        } else {
            self.leave_cell(&world, pos);
        }
    }

    // ---- creatures ----

    /// Ask whether a spawn may happen; never changes counts
    pub fn spawn_attempt(&self, world: &str, attempt: &SpawnAttempt) -> Admission {
        let admission = control::admit(&self.decision_context(), self.worlds.get(world), attempt);
        if let Admission::Denied(reason) = &admission {
            log::debug!(
                "Denied {} spawn in {}: {:?}",
                self.classifier.registry().name(attempt.kind),
                world,
                reason
            );
        }
        admission
    }

    /// Count a creature the host actually created; returns whether it counted
    pub fn creature_confirmed(&mut self, world: &str, creature: &CreatureSnapshot) -> bool {
        self.adjust_counts(world, creature, 1)
    }

    /// Uncount a creature that died or was removed
    pub fn creature_removed(&mut self, world: &str, creature: &CreatureSnapshot) -> bool {
        self.protection.forget(creature.id);
        self.adjust_counts(world, creature, -1)
    }

    fn adjust_counts(&mut self, world: &str, creature: &CreatureSnapshot, delta: i32) -> bool {
        let Some(classification) = self.classifier.classify(creature) else {
            return false;
        };
        let Some(state) = self.worlds.get_mut(world) else {
            return false;
        };
        if !counts_toward_population(&classification, creature, &state.settings().animals) {
            return false;
        }

        let keys = classification.cap_keys();
        if delta > 0 {
            state.population_mut().increment(&keys);
        } else {
            state.population_mut().decrement(&keys);
        }
        if classification.category == MobType::Animal {
            if let Some(cell) = state.cell_mut(creature.cell()) {
                cell.change_animal_count(delta);
            }
        }
        true
    }

    /// Exempt a bred or interacted-with animal from despawning for a while
    pub fn protect_animal(&self, creature: &CreatureSnapshot) -> bool {
        let is_animal = self
            .classifier
            .category(creature.kind)
            .is_some_and(|category| category == MobType::Animal);
        is_animal && self.protection.protect(creature.id, self.clock.now_ms())
    }

    // ---- periodic work ----

    /// Decide which creatures of a world should be removed
    pub fn despawn_tick(&self, world: &str, view: &dyn WorldView) -> Option<SweepReport> {
        let state = self.worlds.get(world)?;
        let creatures = view.creatures(world);
        let ctx = SweepContext {
            decision: self.decision_context(),
            world: state,
            protection: &self.protection,
            vetoes: &self.vetoes,
            now_ms: self.clock.now_ms(),
        };
        let report = control::sweep(&ctx, &creatures);
        log::info!(
            "Despawn sweep in {}: {} examined, {} to remove",
            world,
            report.examined,
            report.removed.len()
        );
        Some(report)
    }

    /// Rebuild a world's counts from the live creature list
    pub fn recount_tick(&mut self, world: &str, view: &dyn WorldView) -> RecountOutcome {
        let Some(state) = self.worlds.get_mut(world) else {
            return RecountOutcome::WorldInactive;
        };
        let creatures = view.creatures(world);

        if !self.config.general.async_recount {
            let counts = count_population(&self.classifier, state.settings(), &creatures);
            let summary = state.apply_recount(counts);
            log::debug!("Recount of {}: {:?}", world, summary);
            return RecountOutcome::Applied(summary);
        }

        if self.pending_recounts.contains_key(world) {
            return RecountOutcome::AlreadyPending;
        }
        let generation = state.generation();
        let started = spawn_recount(
            world.to_string(),
            generation,
            Arc::clone(&self.classifier),
            state.shared_settings(),
            creatures,
            self.recount_tx.clone(),
        );
        self.recount_started(world, generation, started)
    }

    fn recount_started(
        &mut self,
        world: &str,
        generation: u64,
        started: std::io::Result<JoinHandle<()>>,
    ) -> RecountOutcome {
        match started {
            Ok(_) => {
                self.pending_recounts.insert(world.to_string(), generation);
                RecountOutcome::Scheduled
            }
            Err(e) => {
                log::warn!("Failed to start recount worker for {}: {}", world, e);
                RecountOutcome::WorkerUnavailable
            }
        }
    }

    /// Apply recounts finished by workers; stale results are dropped
    pub fn apply_pending_recounts(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.recount_rx.try_recv() {
            self.settle_pending(&result);
            match self.worlds.get_mut(&result.world) {
                Some(state) if state.generation() == result.generation => {
                    let summary = state.apply_recount(result.counts);
                    log::debug!("Async recount of {}: {:?}", result.world, summary);
                    applied += 1;
                }
                _ => log::debug!("Dropping stale recount for {}", result.world),
            }
        }
        applied
    }

    fn settle_pending(&mut self, result: &RecountResult) {
        if self.pending_recounts.get(&result.world) == Some(&result.generation) {
            self.pending_recounts.remove(&result.world);
        }
    }

    /// Block until every scheduled recount has been applied
    pub fn wait_for_recounts(&mut self) -> usize {
        let mut applied = 0;
        while !self.pending_recounts.is_empty() {
            let Ok(result) = self.recount_rx.recv() else {
                break;
            };
            self.settle_pending(&result);
            if let Some(state) = self.worlds.get_mut(&result.world) {
                if state.generation() == result.generation {
                    state.apply_recount(result.counts);
                    applied += 1;
                }
            }
        }
        applied + self.apply_pending_recounts()
    }

    /// Start background persistence if the interval has passed
    fn maybe_persist(&mut self) -> bool {
        let now = self.clock.now_ms();
        let interval = self.config.general.protection.persist_interval_secs.saturating_mul(1000);
        let last = *self.last_persist_ms.get_or_insert(now);
        if now.saturating_sub(last) < interval {
            return false;
        }
        if let Some(worker) = self.persist_worker.take() {
            if !worker.is_finished() {
                self.persist_worker = Some(worker);
                return false;
            }
            if worker.join().is_err() {
                log::warn!("Protection persistence worker panicked");
            }
        }
        self.last_persist_ms = Some(now);
        self.persist_worker = self.protection.spawn_sweep_and_persist(now);
        self.persist_worker.is_some()
    }

    /// Wait for background persistence, then persist once more in place
    pub fn flush_protection(&mut self) -> PersistOutcome {
        if let Some(worker) = self.persist_worker.take() {
            if worker.join().is_err() {
                log::warn!("Protection persistence worker panicked");
            }
        }
        self.protection.sweep_and_persist(self.clock.now_ms())
    }

    /// Advance one tick, running sweeps, recounts and persistence when due
    pub fn tick(&mut self, view: &dyn WorldView) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            recounts_applied: self.apply_pending_recounts(),
            ..TickReport::default()
        };

        let general = &self.config.general;
        let sweep_due = self.tick % general.despawn_interval_ticks.max(1) == 0;
        let recount_due = self.tick % general.recount_interval_ticks.max(1) == 0;

        if sweep_due || recount_due {
            for name in self.world_names() {
                if recount_due {
                    let outcome = self.recount_tick(&name, view);
                    report.recounts.push((name.clone(), outcome));
                }
                if sweep_due {
                    if let Some(sweep) = self.despawn_tick(&name, view) {
                        report.sweeps.push((name, sweep));
                    }
                }
            }
        }

        report.persist_started = self.maybe_persist();
        report
    }

    /// Counts, caps and cell statistics of one world
    pub fn world_report(&self, name: &str) -> Option<WorldReport> {
        let state = self.worlds.get(name)?;
        let population = state.population();
        let registry = self.classifier.registry();

        let mut keys: Vec<&CapKey> = population
            .caps()
            .keys()
            .chain(population.counts().keys())
            .collect();
        keys.sort();
        keys.dedup();

        let lines = keys
            .into_iter()
            .map(|key| CapLine {
                key: key.clone(),
                label: key.describe(registry),
                count: population.count(key),
                static_cap: population
                    .cap(key)
                    .filter(|cap| !is_unlimited(cap.static_cap))
                    .map(|cap| cap.static_cap as u32),
                effective_cap: population.dynamic_cap(key),
            })
            .collect();

        Some(WorldReport {
            name: name.to_string(),
            generation: state.generation(),
            loaded_cells: state.loaded_cells(),
            active_cells: population.active_cells(),
            observers: self.observers.in_world(name).filter(|o| o.counted).count(),
            animals_in_cells: state.cells().map(|c| c.animal_count() as u64).sum(),
            lines,
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.tick)
            .field("worlds", &self.world_names())
            .field("observers", &self.observers.len())
            .field("proximity", &self.proximity.name())
            .field("protection", &self.protection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::view::EmptyView;
    use glam::IVec2;
    use mobcap_types::{KindId, SpawnReason};

    fn engine() -> Engine {
        let mut engine = Engine::new(MobcapConfig::default());
        assert!(engine.enable_world("overworld"));
        engine
    }

    #[test]
    fn test_enable_world_once() {
        let mut engine = engine();
        assert!(!engine.enable_world("overworld"));
        assert_eq!(engine.world_names(), vec!["overworld".to_string()]);
    }

    #[test]
    fn test_disabled_world_stays_off() {
        let mut config = MobcapConfig::default();
        let mut off = config.default_world.clone();
        off.enabled = false;
        config.worlds.insert("the_end".to_string(), off);

        let mut engine = Engine::new(config);
        assert!(!engine.enable_world("the_end"));
        assert!(engine.world("the_end").is_none());
    }

    #[test]
    fn test_observer_cell_bookkeeping() {
        let mut engine = engine();
        let id = EntityId::from_raw(1);
        engine.cell_loaded("overworld", IVec2::new(0, 0), &EmptyView);
        engine.cell_loaded("overworld", IVec2::new(1, 0), &EmptyView);

        engine.observer_joined(id, "overworld", DVec3::new(4.0, 64.0, 4.0), GameMode::Survival);
        let cell = |e: &Engine, x| {
            e.world("overworld")
                .unwrap()
                .cell(IVec2::new(x, 0))
                .unwrap()
                .observer_count()
        };
        assert_eq!(cell(&engine, 0), 1);

        engine.observer_moved(id, DVec3::new(20.0, 64.0, 4.0));
        assert_eq!(cell(&engine, 0), 0);
        assert_eq!(cell(&engine, 1), 1);

        engine.observer_mode_changed(id, GameMode::Spectator);
        assert_eq!(cell(&engine, 1), 0);
        engine.observer_mode_changed(id, GameMode::Creative);
        assert_eq!(cell(&engine, 1), 1);

        engine.observer_quit(id);
        assert_eq!(cell(&engine, 1), 0);
        assert!(engine.observers().is_empty());
    }

    #[test]
    fn test_cell_load_seeds_present_observers() {
        let mut engine = engine();
        let id = EntityId::from_raw(2);
        engine.observer_joined(id, "overworld", DVec3::new(1.0, 64.0, 1.0), GameMode::Survival);
        engine.cell_loaded("overworld", IVec2::new(0, 0), &EmptyView);
        assert_eq!(
            engine
                .world("overworld")
                .unwrap()
                .cell(IVec2::ZERO)
                .unwrap()
                .observer_count(),
            1
        );
    }

    #[test]
    fn test_teleport_between_worlds() {
        let mut engine = engine();
        assert!(engine.enable_world("nether"));
        engine.cell_loaded("overworld", IVec2::ZERO, &EmptyView);
        engine.cell_loaded("nether", IVec2::ZERO, &EmptyView);

        let id = EntityId::from_raw(3);
        engine.observer_joined(id, "overworld", DVec3::new(1.0, 64.0, 1.0), GameMode::Survival);
        engine.observer_teleported(id, "nether", DVec3::new(2.0, 70.0, 2.0));

        let count = |world: &str| {
            engine
                .world(world)
                .unwrap()
                .cell(IVec2::ZERO)
                .unwrap()
                .observer_count()
        };
        assert_eq!(count("overworld"), 0);
        assert_eq!(count("nether"), 1);
    }

    #[test]
    fn test_confirm_and_remove_adjust_counts() {
        let mut engine = engine();
        engine.cell_loaded("overworld", IVec2::ZERO, &EmptyView);
        let cow = CreatureSnapshot::new(
            EntityId::from_raw(10),
            KindId::COW,
            DVec3::new(1.0, 64.0, 1.0),
        );
        let key = CapKey::Category(MobType::Animal);

        assert!(engine.creature_confirmed("overworld", &cow));
        let world = engine.world("overworld").unwrap();
        assert_eq!(world.population().count(&key), 1);
        assert_eq!(world.cell(IVec2::ZERO).unwrap().animal_count(), 1);

        assert!(engine.creature_removed("overworld", &cow));
        let world = engine.world("overworld").unwrap();
        assert_eq!(world.population().count(&key), 0);
        assert_eq!(world.cell(IVec2::ZERO).unwrap().animal_count(), 0);

        let golem = CreatureSnapshot::new(EntityId::from_raw(11), KindId::IRON_GOLEM, DVec3::ZERO);
        assert!(!engine.creature_confirmed("overworld", &golem));
    }

    #[test]
    fn test_spawn_attempt_in_unknown_world_is_uncontrolled() {
        let engine = engine();
        let attempt = SpawnAttempt::new(KindId::ZOMBIE, DVec3::ZERO, SpawnReason::Natural);
        assert_eq!(engine.spawn_attempt("elsewhere", &attempt), Admission::Uncontrolled);
    }

    #[test]
    fn test_protect_animal_only_for_animals() {
        let clock = Arc::new(ManualClock::new(5_000));
        let engine = Engine::new(MobcapConfig::default()).with_clock(clock);
        let cow = CreatureSnapshot::new(EntityId::from_raw(20), KindId::COW, DVec3::ZERO);
        let zombie = CreatureSnapshot::new(EntityId::from_raw(21), KindId::ZOMBIE, DVec3::ZERO);

        assert!(engine.protect_animal(&cow));
        assert!(!engine.protect_animal(&zombie));
        assert!(engine.protection().is_protected(cow.id, 5_000));
    }

    #[test]
    fn test_tick_runs_sweeps_on_interval() {
        let mut config = MobcapConfig::default();
        config.general.despawn_interval_ticks = 3;
        config.general.recount_interval_ticks = 2;
        let mut engine = Engine::new(config);
        engine.enable_world("overworld");

        let reports: Vec<TickReport> = (0..6).map(|_| engine.tick(&EmptyView)).collect();
        let ticks_where = |pred: fn(&TickReport) -> bool| -> Vec<u64> {
            reports.iter().filter(|r| pred(r)).map(|r| r.tick).collect()
        };
        let sweeps = ticks_where(|r| !r.sweeps.is_empty());
        let recounts = ticks_where(|r| !r.recounts.is_empty());
        assert_eq!(sweeps, vec![3, 6]);
        assert_eq!(recounts, vec![2, 4, 6]);
    }

    #[test]
    fn test_recount_worker_failure_is_reported() {
        let mut engine = engine();
        let started = Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "thread limit reached",
        ));
        assert_eq!(
            engine.recount_started("overworld", 1, started),
            RecountOutcome::WorkerUnavailable
        );
        assert!(engine.pending_recounts.is_empty());

        // Nothing is left pending, so the next request is not blocked
        engine.config.general.async_recount = true;
        assert_eq!(
            engine.recount_tick("overworld", &EmptyView),
            RecountOutcome::Scheduled
        );
        assert_eq!(engine.wait_for_recounts(), 1);
    }

    #[test]
    fn test_world_report_lists_caps() {
        let mut engine = engine();
        engine.cell_loaded("overworld", IVec2::ZERO, &EmptyView);
        let report = engine.world_report("overworld").unwrap();

        assert_eq!(report.loaded_cells, 1);
        let monster = report.line(&CapKey::Category(MobType::Monster)).unwrap();
        assert_eq!(monster.static_cap, Some(512));
        assert_eq!(monster.effective_cap, Some(0));
        assert!(engine.world_report("nowhere").is_none());
    }
}

//! Mobcap core - population control for chunked voxel worlds
//!
//! Tracks per-world creature populations against static and dynamic caps,
//! gates spawn attempts, and sweeps creatures that no observer is near.
//! Everything runs on the caller's simulation thread except the optional
//! recount and protection-persistence workers.

pub mod classify;
pub mod clock;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod protection;
pub mod proximity;
pub mod report;
pub mod view;
pub mod world;

pub use classify::{Classification, Classifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AnimalConfig, CapConfig, GeneralConfig, LayerRange, MAX_SEARCH_DISTANCE, MobcapConfig,
    ProtectionConfig, ProximityStrategyKind, SearchConfig, WorldConfig,
};
pub use control::{Admission, DenyReason, DespawnDecision, KeepReason, SpawnAttempt, SweepReport};
pub use engine::{Engine, RecountOutcome, TickReport};
pub use error::{ConfigError, PersistenceError};
pub use protection::{
    FileProtectionStore, MemoryProtectionStore, PersistOutcome, ProtectionRegistry,
    ProtectionStore,
};
pub use proximity::{DirectScan, ProximityQuery, ProximityStrategy, RingScan};
pub use report::{CapLine, WorldReport};
pub use view::{CreatureSnapshot, DespawnVeto, EmptyView, WorldView};
pub use world::{WorldPopulation, WorldSettings, WorldState};

pub use mobcap_types;

//! Foundational types for mobcap
//!
//! This crate provides the data vocabulary shared by the engine and its hosts:
//! - Mob categories and cap keys (MobType, ExtendedType, CapKey)
//! - The closed creature kind table (KindId, KindDef, KindFlags, KindRegistry)
//! - Identifiers, spawn reasons and game modes
//! - Chunk coordinate helpers (CHUNK_SIZE, chunk_of)

mod coords;
mod id;
mod kinds;
mod mob_type;
mod spawn;

pub use coords::{CHUNK_SIZE, ChunkCoord, chunk_of, chunk_of_xz};
pub use id::EntityId;
pub use kinds::{KindDef, KindFlags, KindId, KindRegistry};
pub use mob_type::{CapKey, ExtendedType, MobType, ParseKeyError};
pub use spawn::{GameMode, SpawnReason};

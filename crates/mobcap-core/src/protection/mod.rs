//! Time-limited exemption of animals from the despawn sweep

mod registry;
mod store;

pub use registry::{PersistOutcome, ProtectionRegistry};
pub use store::{FileProtectionStore, MemoryProtectionStore, ProtectionEntries, ProtectionStore};

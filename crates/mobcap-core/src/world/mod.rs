//! Per-world bookkeeping: layers, chunk cells, population and observers

mod chunk_cell;
mod layer;
mod observers;
mod population;
pub mod recount;
mod settings;
mod world_state;

pub use chunk_cell::ChunkCell;
pub use layer::Layer;
pub use observers::{ObserverRegistry, TrackedObserver};
pub use population::{WorldPopulation, is_unlimited};
pub use recount::{PopulationCounts, RecountResult, RecountSummary, count_population};
pub use settings::{AnimalSettings, SearchWindow, WorldSettings};
pub use world_state::WorldState;

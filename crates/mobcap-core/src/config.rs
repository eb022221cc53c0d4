//! Engine configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. A RON file (`mobcap.ron` in the working directory unless a path is given)
//! 3. Environment variables prefixed with `MOBCAP_`
//!
//! Example environment variable: `MOBCAP_GENERAL__SEARCH__DISTANCE=96`
//!
//! Values that make no sense are corrected by `normalize()` rather than
//! rejected, so the engine only ever sees usable settings.

use config::{Config, Environment, File, FileFormat};
use mobcap_types::SpawnReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Which proximity algorithm gates spawns and despawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProximityStrategyKind {
    /// Cylinder test against every observer in the world
    #[default]
    DirectScan,
    /// Spiral over loaded cells using layer occupancy counters
    RingScan,
}

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MobcapConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Settings for any world without its own entry
    #[serde(default)]
    pub default_world: WorldConfig,

    /// Per-world settings, keyed by world name
    #[serde(default)]
    pub worlds: BTreeMap<String, WorldConfig>,
}

/// Settings shared by every world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub proximity_strategy: ProximityStrategyKind,
    /// Observer search window, unless a world overrides it
    pub search: SearchConfig,
    /// How much further below a flying creature an observer may be
    pub flying_extra_depth: f64,
    /// Spectators neither attract spawns nor keep creatures alive
    pub ignore_spectators: bool,
    pub min_ticks_lived_for_despawn: u64,
    pub despawn_interval_ticks: u64,
    pub recount_interval_ticks: u64,
    /// Compute recounts on a worker thread and apply them on a later tick
    pub async_recount: bool,
    pub enabled_spawn_reasons: Vec<SpawnReason>,
    pub protection: ProtectionConfig,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            proximity_strategy: ProximityStrategyKind::DirectScan,
            search: SearchConfig::default(),
            flying_extra_depth: 24.0,
            ignore_spectators: true,
            min_ticks_lived_for_despawn: 100,
            despawn_interval_ticks: 600,
            recount_interval_ticks: 1200,
            async_recount: false,
            enabled_spawn_reasons: SpawnReason::ALL
                .into_iter()
                .filter(|reason| !reason.is_always_allowed())
                .collect(),
            protection: ProtectionConfig::default(),
        }
    }
}

/// Largest horizontal search radius in blocks; larger values are clamped
pub const MAX_SEARCH_DISTANCE: f64 = 4096.0;

/// Observer search window around a spawn or despawn candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Horizontal radius in blocks
    pub distance: f64,
    /// Vertical half-height in blocks
    pub height: f64,
    /// Below this height the underground window applies
    pub underground_level: Option<i32>,
    pub underground_distance: f64,
    pub underground_height: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            distance: 64.0,
            height: 32.0,
            underground_level: None,
            underground_distance: 32.0,
            underground_height: 16.0,
        }
    }
}

/// Animal protection registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// How long a bred or interacted-with animal stays protected
    pub cleanup_period_secs: u64,
    pub persist_interval_secs: u64,
    pub file: PathBuf,
    /// Consecutive save failures before persistence switches itself off
    pub max_consecutive_failures: u32,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            cleanup_period_secs: 3600,
            persist_interval_secs: 300,
            file: PathBuf::from("mobcap").join("protected.bin"),
            max_consecutive_failures: 5,
        }
    }
}

/// Vertical band of a chunk cell, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRange {
    pub min_y: i32,
    pub max_y: i32,
}

impl LayerRange {
    /// Build a range, swapping the bounds if they are reversed
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            min_y: a.min(b),
            max_y: a.max(b),
        }
    }
}

/// Static cap and per-chunk scaling factor for one cap key (-1 = unlimited)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapConfig {
    pub static_cap: i32,
    pub dynamic_per_chunk: i32,
}

impl CapConfig {
    pub const UNLIMITED: i32 = -1;

    pub fn new(static_cap: i32, dynamic_per_chunk: i32) -> Self {
        Self {
            static_cap,
            dynamic_per_chunk,
        }
    }
}

/// Animal despawn and breeding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimalConfig {
    /// Whether the despawn sweep may remove animals at all
    pub despawn: bool,
    pub remove_tamed: bool,
    /// Whether tamed animals count towards caps
    pub count_tamed: bool,
    /// Cells with fewer animals than this are treated as farms
    pub num_animals_for_farm: u32,
    /// Breeding stops in a cell at this many animals (defaults to the farm size)
    pub breeding_limit_per_chunk: Option<u32>,
}

impl Default for AnimalConfig {
    fn default() -> Self {
        Self {
            despawn: false,
            remove_tamed: false,
            count_tamed: false,
            num_animals_for_farm: 16,
            breeding_limit_per_chunk: None,
        }
    }
}

impl AnimalConfig {
    pub fn breeding_limit(&self) -> u32 {
        self.breeding_limit_per_chunk
            .unwrap_or(self.num_animals_for_farm)
    }
}

/// Per-world settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub enabled: bool,
    pub layers: Vec<LayerRange>,
    /// Caps keyed by category (`monster`), kind (`skeleton`) or kind with
    /// variant (`skeleton:wither`)
    pub caps: BTreeMap<String, CapConfig>,
    /// Overrides the general search window
    pub search: Option<SearchConfig>,
    pub animals: AnimalConfig,
    /// Never touched by the despawn sweep
    pub ignored_mobs: Vec<String>,
    /// Never admitted by the spawn gate
    pub disabled_mobs: Vec<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let caps = [
            ("monster", CapConfig::new(512, 64)),
            ("animal", CapConfig::new(256, 16)),
            ("water_animal", CapConfig::new(64, 8)),
            ("ambient", CapConfig::new(32, 4)),
            ("villager", CapConfig::new(64, CapConfig::UNLIMITED)),
        ]
        .into_iter()
        .map(|(key, cap)| (key.to_string(), cap))
        .collect();

        Self {
            enabled: true,
            layers: vec![
                LayerRange::new(-64, 15),
                LayerRange::new(0, 63),
                LayerRange::new(48, 127),
                LayerRange::new(112, 319),
            ],
            caps,
            search: None,
            animals: AnimalConfig::default(),
            ignored_mobs: Vec::new(),
            disabled_mobs: Vec::new(),
        }
    }
}

impl WorldConfig {
    fn normalize(&mut self, label: &str) -> usize {
        let mut corrections = 0;

        for layer in &mut self.layers {
            if layer.min_y > layer.max_y {
                log::warn!(
                    "[{}] layer {}..{} has swapped bounds, swapping",
                    label,
                    layer.min_y,
                    layer.max_y
                );
                *layer = LayerRange::new(layer.min_y, layer.max_y);
                corrections += 1;
            }
        }

        for (key, cap) in &mut self.caps {
            if cap.static_cap < CapConfig::UNLIMITED {
                log::warn!(
                    "[{}] cap '{}' static_cap {} treated as unlimited",
                    label,
                    key,
                    cap.static_cap
                );
                cap.static_cap = CapConfig::UNLIMITED;
                corrections += 1;
            }
            if cap.dynamic_per_chunk < CapConfig::UNLIMITED {
                log::warn!(
                    "[{}] cap '{}' dynamic_per_chunk {} treated as unlimited",
                    label,
                    key,
                    cap.dynamic_per_chunk
                );
                cap.dynamic_per_chunk = CapConfig::UNLIMITED;
                corrections += 1;
            }
        }

        if let Some(search) = &mut self.search {
            corrections += search.normalize(label);
        }

        corrections
    }
}

impl SearchConfig {
    fn normalize(&mut self, label: &str) -> usize {
        let mut corrections = 0;
        for (name, value) in [
            ("distance", &mut self.distance),
            ("height", &mut self.height),
            ("underground_distance", &mut self.underground_distance),
            ("underground_height", &mut self.underground_height),
        ] {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("[{}] search {} {} clamped to 0", label, name, value);
                *value = 0.0;
                corrections += 1;
            }
        }
        for (name, value) in [
            ("distance", &mut self.distance),
            ("underground_distance", &mut self.underground_distance),
        ] {
            if *value > MAX_SEARCH_DISTANCE {
                log::warn!(
                    "[{}] search {} {} clamped to {}",
                    label,
                    name,
                    value,
                    MAX_SEARCH_DISTANCE
                );
                *value = MAX_SEARCH_DISTANCE;
                corrections += 1;
            }
        }
        corrections
    }
}

impl MobcapConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. RON file at `path`, or `mobcap.ron` if it exists
    /// 3. Environment variables prefixed with `MOBCAP_` (highest priority)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Layer 1: Compiled defaults
            .add_source(Config::try_from(&MobcapConfig::default())?);

        // Layer 2: Config file
        builder = match path {
            Some(path) => {
                builder.add_source(File::from(path).format(FileFormat::Ron).required(true))
            }
            None => builder.add_source(
                File::with_name("mobcap")
                    .format(FileFormat::Ron)
                    .required(false),
            ),
        };

        // Layer 3: Environment variables (MOBCAP_GENERAL__DESPAWN_INTERVAL_TICKS, etc.)
        builder = builder.add_source(Environment::with_prefix("MOBCAP").separator("__"));

        let mut config: MobcapConfig = builder.build()?.try_deserialize()?;
        config.normalize();
        Ok(config)
    }

    /// Parse a complete RON document (missing sections take their defaults)
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: MobcapConfig = ron::from_str(text)?;
        config.normalize();
        Ok(config)
    }

    /// Read a RON file without the environment layer
    pub fn from_ron_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Settings for a world (its own entry, or the default world)
    pub fn world(&self, name: &str) -> &WorldConfig {
        self.worlds.get(name).unwrap_or(&self.default_world)
    }

    /// Correct out-of-range values in place, returning how many were fixed
    pub fn normalize(&mut self) -> usize {
        let mut corrections = 0;
        let general = &mut self.general;

        for (name, value) in [
            ("despawn_interval_ticks", &mut general.despawn_interval_ticks),
            ("recount_interval_ticks", &mut general.recount_interval_ticks),
            ("protection.persist_interval_secs", &mut general.protection.persist_interval_secs),
        ] {
            if *value == 0 {
                log::warn!("{} must be at least 1, using 1", name);
                *value = 1;
                corrections += 1;
            }
        }

        if general.protection.max_consecutive_failures == 0 {
            log::warn!("protection.max_consecutive_failures must be at least 1, using 1");
            general.protection.max_consecutive_failures = 1;
            corrections += 1;
        }

        if !general.flying_extra_depth.is_finite() || general.flying_extra_depth < 0.0 {
            log::warn!("flying_extra_depth {} clamped to 0", general.flying_extra_depth);
            general.flying_extra_depth = 0.0;
            corrections += 1;
        }

        corrections += general.search.normalize("general");
        corrections += self.default_world.normalize("default_world");
        for (name, world) in &mut self.worlds {
            corrections += world.normalize(name);
        }

        corrections
    }
}

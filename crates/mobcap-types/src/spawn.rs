//! Spawn trigger reasons and observer game modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::mob_type::ParseKeyError;

/// Why the host is trying to create a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnReason {
    Natural,
    ChunkGen,
    Spawner,
    SpawnerEgg,
    Breeding,
    Egg,
    Jockey,
    Mount,
    Reinforcements,
    Lightning,
    BuildGolem,
    BuildSnowman,
    VillageDefense,
    VillageInvasion,
    Infection,
    Cured,
    SlimeSplit,
    /// Extra spawn raised by the ability system
    Ability,
    /// Forced spawn from an operator command
    Command,
    Default,
}

impl SpawnReason {
    pub const ALL: [SpawnReason; 20] = [
        SpawnReason::Natural,
        SpawnReason::ChunkGen,
        SpawnReason::Spawner,
        SpawnReason::SpawnerEgg,
        SpawnReason::Breeding,
        SpawnReason::Egg,
        SpawnReason::Jockey,
        SpawnReason::Mount,
        SpawnReason::Reinforcements,
        SpawnReason::Lightning,
        SpawnReason::BuildGolem,
        SpawnReason::BuildSnowman,
        SpawnReason::VillageDefense,
        SpawnReason::VillageInvasion,
        SpawnReason::Infection,
        SpawnReason::Cured,
        SpawnReason::SlimeSplit,
        SpawnReason::Ability,
        SpawnReason::Command,
        SpawnReason::Default,
    ];

    /// Reasons that bypass the enabled-reason check
    pub fn is_always_allowed(self) -> bool {
        matches!(self, SpawnReason::Ability | SpawnReason::Command)
    }

    /// Reasons subject to the per-chunk breeding limit for animals
    pub fn is_breeding(self) -> bool {
        matches!(self, SpawnReason::Breeding | SpawnReason::Egg)
    }

    pub fn name(self) -> &'static str {
        match self {
            SpawnReason::Natural => "natural",
            SpawnReason::ChunkGen => "chunk_gen",
            SpawnReason::Spawner => "spawner",
            SpawnReason::SpawnerEgg => "spawner_egg",
            SpawnReason::Breeding => "breeding",
            SpawnReason::Egg => "egg",
            SpawnReason::Jockey => "jockey",
            SpawnReason::Mount => "mount",
            SpawnReason::Reinforcements => "reinforcements",
            SpawnReason::Lightning => "lightning",
            SpawnReason::BuildGolem => "build_golem",
            SpawnReason::BuildSnowman => "build_snowman",
            SpawnReason::VillageDefense => "village_defense",
            SpawnReason::VillageInvasion => "village_invasion",
            SpawnReason::Infection => "infection",
            SpawnReason::Cured => "cured",
            SpawnReason::SlimeSplit => "slime_split",
            SpawnReason::Ability => "ability",
            SpawnReason::Command => "command",
            SpawnReason::Default => "default",
        }
    }
}

impl fmt::Display for SpawnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpawnReason {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SpawnReason::ALL
            .into_iter()
            .find(|reason| reason.name() == wanted)
            .ok_or(ParseKeyError::UnknownReason(wanted))
    }
}

/// Game mode of an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

//! Population categories and cap keys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::kinds::{KindId, KindRegistry};

/// Coarse population category of a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobType {
    Monster,
    Animal,
    WaterAnimal,
    Ambient,
    Villager,
}

impl MobType {
    pub const ALL: [MobType; 5] = [
        MobType::Monster,
        MobType::Animal,
        MobType::WaterAnimal,
        MobType::Ambient,
        MobType::Villager,
    ];

    /// Configuration name of this category
    pub fn name(self) -> &'static str {
        match self {
            MobType::Monster => "monster",
            MobType::Animal => "animal",
            MobType::WaterAnimal => "water_animal",
            MobType::Ambient => "ambient",
            MobType::Villager => "villager",
        }
    }
}

impl fmt::Display for MobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MobType {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monster" | "monsters" => Ok(MobType::Monster),
            "animal" | "animals" => Ok(MobType::Animal),
            "water_animal" | "wateranimal" | "water_animals" => Ok(MobType::WaterAnimal),
            "ambient" => Ok(MobType::Ambient),
            "villager" | "villagers" => Ok(MobType::Villager),
            other => Err(ParseKeyError::UnknownCategory(other.to_string())),
        }
    }
}

/// Errors raised when parsing configuration keys
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("unknown mob category '{0}'")]
    UnknownCategory(String),
    #[error("unknown creature kind '{0}'")]
    UnknownKind(String),
    #[error("unknown spawn reason '{0}'")]
    UnknownReason(String),
    #[error("empty key")]
    Empty,
}

/// A creature kind plus optional variant data (e.g. a skeleton sub-breed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtendedType {
    pub kind: KindId,
    pub variant: Option<String>,
}

impl ExtendedType {
    pub fn new(kind: KindId, variant: Option<&str>) -> Self {
        Self {
            kind,
            variant: variant
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Extended type without variant data
    pub fn base(kind: KindId) -> Self {
        Self {
            kind,
            variant: None,
        }
    }

    pub fn base_type(&self) -> ExtendedType {
        ExtendedType::base(self.kind)
    }

    /// `kind` or `kind:variant`, using registry names
    pub fn describe(&self, registry: &KindRegistry) -> String {
        match &self.variant {
            Some(variant) => format!("{}:{}", registry.name(self.kind), variant),
            None => registry.name(self.kind).to_string(),
        }
    }
}

/// Key under which a population is counted and capped
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapKey {
    Category(MobType),
    Extended(ExtendedType),
}

impl CapKey {
    /// Parse a configuration key: a category name (`monster`), a kind name
    /// (`skeleton`) or a kind with variant (`skeleton:wither`)
    pub fn parse(key: &str, registry: &KindRegistry) -> Result<Self, ParseKeyError> {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(ParseKeyError::Empty);
        }

        if let Ok(category) = key.parse::<MobType>() {
            return Ok(CapKey::Category(category));
        }

        let (kind_name, variant) = match key.split_once(':') {
            Some((kind, variant)) => (kind, Some(variant)),
            None => (key.as_str(), None),
        };

        let kind = registry
            .lookup(kind_name)
            .ok_or_else(|| ParseKeyError::UnknownKind(kind_name.to_string()))?;
        Ok(CapKey::Extended(ExtendedType::new(kind, variant)))
    }

    pub fn describe(&self, registry: &KindRegistry) -> String {
        match self {
            CapKey::Category(category) => category.name().to_string(),
            CapKey::Extended(extended) => extended.describe(registry),
        }
    }
}

impl From<MobType> for CapKey {
    fn from(category: MobType) -> Self {
        CapKey::Category(category)
    }
}

impl From<ExtendedType> for CapKey {
    fn from(extended: ExtendedType) -> Self {
        CapKey::Extended(extended)
    }
}

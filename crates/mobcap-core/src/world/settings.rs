//! Typed per-world settings resolved from configuration

use ahash::{HashMap, HashSet};
use mobcap_types::{CapKey, KindRegistry, SpawnReason};

use crate::config::{CapConfig, GeneralConfig, LayerRange, SearchConfig, WorldConfig};

/// Horizontal radius and vertical half-height of an observer search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWindow {
    pub distance: f64,
    pub height: f64,
}

/// Animal rules for one world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalSettings {
    pub despawn: bool,
    pub remove_tamed: bool,
    pub count_tamed: bool,
    pub farm_threshold: u32,
    pub breeding_limit: u32,
}

/// Everything the gate and sweep need to know about one world
#[derive(Debug, Clone)]
pub struct WorldSettings {
    pub layers: Vec<LayerRange>,
    pub caps: HashMap<CapKey, CapConfig>,
    pub search: SearchWindow,
    /// Height below which `underground_search` applies
    pub underground: Option<(i32, SearchWindow)>,
    pub flying_extra_depth: f64,
    pub ignore_spectators: bool,
    pub min_ticks_lived: u64,
    pub animals: AnimalSettings,
    pub ignored: HashSet<CapKey>,
    pub disabled: HashSet<CapKey>,
    pub enabled_reasons: HashSet<SpawnReason>,
}

fn parse_keys<'a>(
    names: impl IntoIterator<Item = &'a String>,
    registry: &KindRegistry,
    what: &str,
) -> Vec<(CapKey, &'a String)> {
    names
        .into_iter()
        .filter_map(|name| match CapKey::parse(name, registry) {
            Ok(key) => Some((key, name)),
            Err(err) => {
                log::warn!("Skipping {} entry '{}': {}", what, name, err);
                None
            }
        })
        .collect()
}

impl WorldSettings {
    /// Resolve a world's configuration against the general section
    pub fn resolve(general: &GeneralConfig, world: &WorldConfig, registry: &KindRegistry) -> Self {
        let search_config: &SearchConfig = world.search.as_ref().unwrap_or(&general.search);

        let caps = parse_keys(world.caps.keys(), registry, "cap")
            .into_iter()
            .map(|(key, name)| (key, world.caps[name]))
            .collect();

        let ignored = parse_keys(&world.ignored_mobs, registry, "ignored mob")
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        let disabled = parse_keys(&world.disabled_mobs, registry, "disabled mob")
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        Self {
            layers: world.layers.clone(),
            caps,
            search: SearchWindow {
                distance: search_config.distance,
                height: search_config.height,
            },
            underground: search_config.underground_level.map(|level| {
                (
                    level,
                    SearchWindow {
                        distance: search_config.underground_distance,
                        height: search_config.underground_height,
                    },
                )
            }),
            flying_extra_depth: general.flying_extra_depth,
            ignore_spectators: general.ignore_spectators,
            min_ticks_lived: general.min_ticks_lived_for_despawn,
            animals: AnimalSettings {
                despawn: world.animals.despawn,
                remove_tamed: world.animals.remove_tamed,
                count_tamed: world.animals.count_tamed,
                farm_threshold: world.animals.num_animals_for_farm,
                breeding_limit: world.animals.breeding_limit(),
            },
            ignored,
            disabled,
            enabled_reasons: general.enabled_spawn_reasons.iter().copied().collect(),
        }
    }

    /// Search window for a candidate at height `y`
    pub fn search_at(&self, y: f64) -> SearchWindow {
        match self.underground {
            Some((level, window)) if y < level as f64 => window,
            _ => self.search,
        }
    }

    pub fn is_disabled(&self, keys: &[CapKey]) -> bool {
        keys.iter().any(|key| self.disabled.contains(key))
    }

    pub fn is_ignored(&self, keys: &[CapKey]) -> bool {
        keys.iter().any(|key| self.ignored.contains(key))
    }

    pub fn reason_enabled(&self, reason: SpawnReason) -> bool {
        reason.is_always_allowed() || self.enabled_reasons.contains(&reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobcap_types::{ExtendedType, KindId, MobType};

    #[test]
    fn test_resolve_parses_keys() {
        let registry = KindRegistry::new();
        let general = GeneralConfig::default();
        let mut world = WorldConfig::default();
        world
            .caps
            .insert("skeleton:wither".to_string(), CapConfig::new(4, -1));
        world.caps.insert("dragon".to_string(), CapConfig::new(1, -1));
        world.ignored_mobs = vec!["villager".to_string(), "nonsense".to_string()];
        world.disabled_mobs = vec!["creeper".to_string()];

        let settings = WorldSettings::resolve(&general, &world, &registry);

        assert!(settings
            .caps
            .contains_key(&CapKey::Extended(ExtendedType::new(KindId::SKELETON, Some("wither")))));
        assert!(settings.caps.contains_key(&CapKey::Category(MobType::Monster)));
        // Unknown keys are dropped
        assert_eq!(settings.caps.len(), world.caps.len() - 1);
        assert_eq!(settings.ignored.len(), 1);
        assert!(settings.is_disabled(&[CapKey::Extended(ExtendedType::base(KindId::CREEPER))]));
    }

    #[test]
    fn test_world_search_overrides_general() {
        let registry = KindRegistry::new();
        let general = GeneralConfig::default();
        let mut world = WorldConfig::default();
        world.search = Some(SearchConfig {
            distance: 10.0,
            height: 5.0,
            underground_level: Some(40),
            underground_distance: 4.0,
            underground_height: 2.0,
        });

        let settings = WorldSettings::resolve(&general, &world, &registry);
        assert_eq!(settings.search_at(64.0), SearchWindow { distance: 10.0, height: 5.0 });
        assert_eq!(settings.search_at(39.5), SearchWindow { distance: 4.0, height: 2.0 });
    }

    #[test]
    fn test_always_allowed_reasons() {
        let registry = KindRegistry::new();
        let mut general = GeneralConfig::default();
        general.enabled_spawn_reasons.clear();

        let settings = WorldSettings::resolve(&general, &WorldConfig::default(), &registry);
        assert!(!settings.reason_enabled(SpawnReason::Natural));
        assert!(settings.reason_enabled(SpawnReason::Command));
        assert!(settings.reason_enabled(SpawnReason::Ability));
    }
}

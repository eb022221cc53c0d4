//! Creature classification
//!
//! Maps a concrete kind to one of the five population categories using an
//! ordered rule table built once at startup. The first matching rule wins,
//! in the order Animal, WaterAnimal, Ambient, Monster, Villager.

use mobcap_types::{CapKey, ExtendedType, KindFlags, KindId, KindRegistry, MobType};
use smallvec::SmallVec;

use crate::view::CreatureSnapshot;

/// A single classification rule
#[derive(Clone, Copy)]
struct ClassRule {
    matches: fn(KindFlags) -> bool,
    category: MobType,
}

fn is_animal(flags: KindFlags) -> bool {
    flags.contains(KindFlags::ANIMAL)
}

fn is_water_animal(flags: KindFlags) -> bool {
    flags.contains(KindFlags::WATER_ANIMAL)
}

fn is_ambient(flags: KindFlags) -> bool {
    flags.contains(KindFlags::AMBIENT)
}

fn is_monster(flags: KindFlags) -> bool {
    flags.contains(KindFlags::HOSTILE)
}

fn is_villager(flags: KindFlags) -> bool {
    flags.contains(KindFlags::VILLAGER)
}

const RULES: [ClassRule; 5] = [
    ClassRule {
        matches: is_animal,
        category: MobType::Animal,
    },
    ClassRule {
        matches: is_water_animal,
        category: MobType::WaterAnimal,
    },
    ClassRule {
        matches: is_ambient,
        category: MobType::Ambient,
    },
    ClassRule {
        matches: is_monster,
        category: MobType::Monster,
    },
    ClassRule {
        matches: is_villager,
        category: MobType::Villager,
    },
];

/// Result of classifying a creature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: MobType,
    pub extended: ExtendedType,
    pub flags: KindFlags,
}

impl Classification {
    /// Every key this creature is counted and capped under
    pub fn cap_keys(&self) -> SmallVec<[CapKey; 3]> {
        let mut keys = SmallVec::new();
        keys.push(CapKey::Category(self.category));
        keys.push(CapKey::Extended(self.extended.base_type()));
        if self.extended.variant.is_some() {
            keys.push(CapKey::Extended(self.extended.clone()));
        }
        keys
    }

    pub fn is_flying(&self) -> bool {
        self.flags.contains(KindFlags::FLYING)
    }

    pub fn is_tameable(&self) -> bool {
        self.flags.contains(KindFlags::TAMEABLE)
    }
}

/// Kind → category classifier over a closed kind table
#[derive(Debug, Clone)]
pub struct Classifier {
    registry: KindRegistry,
}

impl Classifier {
    pub fn new(registry: KindRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Category of a kind; observers and unmatched kinds have none
    pub fn category(&self, kind: KindId) -> Option<MobType> {
        let flags = self.registry.flags(kind);
        if flags.contains(KindFlags::OBSERVER) {
            return None;
        }
        RULES
            .iter()
            .find(|rule| (rule.matches)(flags))
            .map(|rule| rule.category)
    }

    pub fn classify_kind(&self, kind: KindId, variant: Option<&str>) -> Option<Classification> {
        let category = self.category(kind)?;
        Some(Classification {
            category,
            extended: ExtendedType::new(kind, variant),
            flags: self.registry.flags(kind),
        })
    }

    pub fn classify(&self, creature: &CreatureSnapshot) -> Option<Classification> {
        self.classify_kind(creature.kind, creature.variant.as_deref())
    }

    pub fn is_observer(&self, kind: KindId) -> bool {
        self.registry.flags(kind).contains(KindFlags::OBSERVER)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(KindRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_categories() {
        let classifier = Classifier::default();
        assert_eq!(classifier.category(KindId::ZOMBIE), Some(MobType::Monster));
        assert_eq!(classifier.category(KindId::GHAST), Some(MobType::Monster));
        assert_eq!(classifier.category(KindId::COW), Some(MobType::Animal));
        assert_eq!(classifier.category(KindId::SQUID), Some(MobType::WaterAnimal));
        assert_eq!(classifier.category(KindId::BAT), Some(MobType::Ambient));
        assert_eq!(classifier.category(KindId::VILLAGER), Some(MobType::Villager));
    }

    #[test]
    fn test_unclassified_kinds() {
        let classifier = Classifier::default();
        assert_eq!(classifier.category(KindId::PLAYER), None);
        assert_eq!(classifier.category(KindId::IRON_GOLEM), None);
        assert_eq!(classifier.category(KindId(4242)), None);
    }

    #[test]
    fn test_first_match_wins() {
        // A kind carrying both animal and hostile traits is an animal
        let mut registry = KindRegistry::new();
        let hoglin = registry.register_custom("hoglin", KindFlags::ANIMAL | KindFlags::HOSTILE);
        let drowned = registry.register_custom(
            "drowned",
            KindFlags::WATER_ANIMAL | KindFlags::HOSTILE,
        );
        let classifier = Classifier::new(registry);
        assert_eq!(classifier.category(hoglin), Some(MobType::Animal));
        assert_eq!(classifier.category(drowned), Some(MobType::WaterAnimal));
    }

    #[test]
    fn test_cap_keys_with_variant() {
        let classifier = Classifier::default();
        let plain = classifier.classify_kind(KindId::SKELETON, None).unwrap();
        assert_eq!(plain.cap_keys().len(), 2);

        let wither = classifier
            .classify_kind(KindId::SKELETON, Some("wither"))
            .unwrap();
        let keys = wither.cap_keys();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], CapKey::Category(MobType::Monster));
        assert_eq!(keys[1], CapKey::Extended(ExtendedType::base(KindId::SKELETON)));
        assert_eq!(
            keys[2],
            CapKey::Extended(ExtendedType::new(KindId::SKELETON, Some("wither")))
        );
    }

    #[test]
    fn test_flying_flag() {
        let classifier = Classifier::default();
        assert!(classifier.classify_kind(KindId::BAT, None).unwrap().is_flying());
        assert!(!classifier.classify_kind(KindId::COW, None).unwrap().is_flying());
    }
}

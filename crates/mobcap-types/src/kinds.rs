//! Creature kind definitions and registry
//!
//! The kind table is closed at startup: the built-in kinds are registered by
//! `KindRegistry::new()`, hosts may add their own kinds before handing the
//! registry to the engine, and nothing changes it afterwards.

use ahash::HashMap;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Built-in creature kind IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KindId(pub u16);

impl KindId {
    pub const PLAYER: KindId = KindId(0);

    // Monsters
    pub const ZOMBIE: KindId = KindId(1);
    pub const SKELETON: KindId = KindId(2);
    pub const CREEPER: KindId = KindId(3);
    pub const SPIDER: KindId = KindId(4);
    pub const CAVE_SPIDER: KindId = KindId(5);
    pub const ENDERMAN: KindId = KindId(6);
    pub const WITCH: KindId = KindId(7);
    pub const SLIME: KindId = KindId(8);
    pub const GHAST: KindId = KindId(9);
    pub const BLAZE: KindId = KindId(10);
    pub const PHANTOM: KindId = KindId(11);

    // Animals
    pub const COW: KindId = KindId(20);
    pub const PIG: KindId = KindId(21);
    pub const SHEEP: KindId = KindId(22);
    pub const CHICKEN: KindId = KindId(23);
    pub const WOLF: KindId = KindId(24);
    pub const CAT: KindId = KindId(25);
    pub const HORSE: KindId = KindId(26);

    // Water animals
    pub const SQUID: KindId = KindId(30);
    pub const DOLPHIN: KindId = KindId(31);

    // Ambient
    pub const BAT: KindId = KindId(40);

    // Villagers
    pub const VILLAGER: KindId = KindId(50);

    // Unclassified (no population category)
    pub const IRON_GOLEM: KindId = KindId(60);
    pub const ARMOR_STAND: KindId = KindId(61);

    /// First ID handed out to host-registered kinds
    pub const FIRST_CUSTOM: u16 = 1000;
}

bitflags! {
    /// Traits of a creature kind that drive classification and sweep rules
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct KindFlags: u16 {
        /// Breedable land animal
        const ANIMAL = 1 << 0;
        /// Lives in water
        const WATER_ANIMAL = 1 << 1;
        /// Harmless ambience (bats)
        const AMBIENT = 1 << 2;
        /// Hostile monster
        const HOSTILE = 1 << 3;
        /// Villager
        const VILLAGER = 1 << 4;
        /// Can fly; proximity search extends further below it
        const FLYING = 1 << 5;
        /// Can be tamed by an observer
        const TAMEABLE = 1 << 6;
        /// Observer entity (player); never counted, never despawned
        const OBSERVER = 1 << 7;
    }
}

/// Definition of a creature kind
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KindDef {
    pub id: KindId,
    /// Lowercase identifier used in configuration keys
    pub name: String,
    pub flags: KindFlags,
}

impl KindDef {
    pub fn new(id: KindId, name: &str, flags: KindFlags) -> Self {
        Self {
            id,
            name: name.to_ascii_lowercase(),
            flags,
        }
    }
}

/// Registry of all creature kinds
#[derive(Clone, Debug)]
pub struct KindRegistry {
    kinds: HashMap<KindId, KindDef>,
    by_name: HashMap<String, KindId>,
    next_custom: u16,
}

impl KindRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            kinds: HashMap::default(),
            by_name: HashMap::default(),
            next_custom: KindId::FIRST_CUSTOM,
        };
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        use KindFlags as F;

        self.register(KindDef::new(KindId::PLAYER, "player", F::OBSERVER));

        self.register(KindDef::new(KindId::ZOMBIE, "zombie", F::HOSTILE));
        self.register(KindDef::new(KindId::SKELETON, "skeleton", F::HOSTILE));
        self.register(KindDef::new(KindId::CREEPER, "creeper", F::HOSTILE));
        self.register(KindDef::new(KindId::SPIDER, "spider", F::HOSTILE));
        self.register(KindDef::new(KindId::CAVE_SPIDER, "cave_spider", F::HOSTILE));
        self.register(KindDef::new(KindId::ENDERMAN, "enderman", F::HOSTILE));
        self.register(KindDef::new(KindId::WITCH, "witch", F::HOSTILE));
        self.register(KindDef::new(KindId::SLIME, "slime", F::HOSTILE));
        self.register(KindDef::new(KindId::GHAST, "ghast", F::HOSTILE | F::FLYING));
        self.register(KindDef::new(KindId::BLAZE, "blaze", F::HOSTILE | F::FLYING));
        self.register(KindDef::new(KindId::PHANTOM, "phantom", F::HOSTILE | F::FLYING));

        self.register(KindDef::new(KindId::COW, "cow", F::ANIMAL));
        self.register(KindDef::new(KindId::PIG, "pig", F::ANIMAL));
        self.register(KindDef::new(KindId::SHEEP, "sheep", F::ANIMAL));
        self.register(KindDef::new(KindId::CHICKEN, "chicken", F::ANIMAL));
        self.register(KindDef::new(KindId::WOLF, "wolf", F::ANIMAL | F::TAMEABLE));
        self.register(KindDef::new(KindId::CAT, "cat", F::ANIMAL | F::TAMEABLE));
        self.register(KindDef::new(KindId::HORSE, "horse", F::ANIMAL | F::TAMEABLE));

        self.register(KindDef::new(KindId::SQUID, "squid", F::WATER_ANIMAL));
        self.register(KindDef::new(KindId::DOLPHIN, "dolphin", F::WATER_ANIMAL));

        self.register(KindDef::new(KindId::BAT, "bat", F::AMBIENT | F::FLYING));

        self.register(KindDef::new(KindId::VILLAGER, "villager", F::VILLAGER));

        self.register(KindDef::new(KindId::IRON_GOLEM, "iron_golem", F::empty()));
        self.register(KindDef::new(KindId::ARMOR_STAND, "armor_stand", F::empty()));
    }

    fn register(&mut self, kind: KindDef) {
        self.by_name.insert(kind.name.clone(), kind.id);
        self.kinds.insert(kind.id, kind);
    }

    /// Register a host-defined kind and return its ID
    ///
    /// Registering an existing name replaces its flags and keeps its ID.
    pub fn register_custom(&mut self, name: &str, flags: KindFlags) -> KindId {
        let name = name.to_ascii_lowercase();
        let id = match self.by_name.get(&name) {
            Some(&existing) => existing,
            None => {
                let id = KindId(self.next_custom);
                self.next_custom = self.next_custom.saturating_add(1);
                id
            }
        };
        self.register(KindDef::new(id, &name, flags));
        id
    }

    /// Get kind definition by ID
    pub fn get(&self, id: KindId) -> Option<&KindDef> {
        self.kinds.get(&id)
    }

    /// Flags for a kind (empty for unknown IDs)
    pub fn flags(&self, id: KindId) -> KindFlags {
        self.get(id).map(|k| k.flags).unwrap_or(KindFlags::empty())
    }

    /// Name for a kind, or "unknown"
    pub fn name(&self, id: KindId) -> &str {
        self.get(id).map(|k| k.name.as_str()).unwrap_or("unknown")
    }

    /// Look up a kind by its (case-insensitive) name
    pub fn lookup(&self, name: &str) -> Option<KindId> {
        self.by_name.get(&name.trim().to_ascii_lowercase()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KindDef> {
        self.kinds.values()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

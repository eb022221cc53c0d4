//! Per-world population counters and the dynamic cap formula

use ahash::HashMap;
use mobcap_types::CapKey;

use crate::config::CapConfig;

/// Whether a cap value means "no limit"
pub fn is_unlimited(value: i32) -> bool {
    value < 0 || value == i32::MAX
}

/// Aggregate creature counts for one world
///
/// Counts are maintained incrementally from spawn and removal events and
/// periodically replaced by a full recount.
#[derive(Debug, Clone)]
pub struct WorldPopulation {
    active_cells: u32,
    counts: HashMap<CapKey, u32>,
    caps: HashMap<CapKey, CapConfig>,
}

impl WorldPopulation {
    pub fn new(caps: HashMap<CapKey, CapConfig>) -> Self {
        Self {
            active_cells: 0,
            counts: HashMap::default(),
            caps,
        }
    }

    pub fn active_cells(&self) -> u32 {
        self.active_cells
    }

    pub(crate) fn cell_loaded(&mut self) {
        self.active_cells += 1;
    }

    pub(crate) fn cell_unloaded(&mut self) {
        if self.active_cells == 0 {
            log::warn!("Active cell count would drop below zero");
            return;
        }
        self.active_cells -= 1;
    }

    pub fn count(&self, key: &CapKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &HashMap<CapKey, u32> {
        &self.counts
    }

    pub fn cap(&self, key: &CapKey) -> Option<&CapConfig> {
        self.caps.get(key)
    }

    pub fn caps(&self) -> &HashMap<CapKey, CapConfig> {
        &self.caps
    }

    pub fn increment(&mut self, keys: &[CapKey]) {
        for key in keys {
            *self.counts.entry(key.clone()).or_insert(0) += 1;
        }
    }

    pub fn decrement(&mut self, keys: &[CapKey]) {
        for key in keys {
            match self.counts.get_mut(key) {
                Some(count) if *count > 0 => *count -= 1,
                _ => log::warn!("Population count for {:?} would drop below zero", key),
            }
        }
    }

    /// Effective cap for a key: `min(static, (per_chunk * active_cells) >> 8)`
    ///
    /// `None` means unlimited (no cap configured, or both parts unlimited).
    pub fn dynamic_cap(&self, key: &CapKey) -> Option<u64> {
        let cap = self.caps.get(key)?;
        let static_cap = (!is_unlimited(cap.static_cap)).then_some(cap.static_cap as u64);

        if is_unlimited(cap.dynamic_per_chunk) {
            return static_cap;
        }

        let scaled = (cap.dynamic_per_chunk as u64 * self.active_cells as u64) >> 8;
        Some(match static_cap {
            Some(limit) => limit.min(scaled),
            None => scaled,
        })
    }

    /// Whether one more creature under `key` fits both caps
    pub fn within_limit(&self, key: &CapKey) -> bool {
        let count = self.count(key) as u64;
        let Some(cap) = self.caps.get(key) else {
            return true;
        };
        if !is_unlimited(cap.static_cap) && count >= cap.static_cap as u64 {
            return false;
        }
        match self.dynamic_cap(key) {
            Some(limit) => count < limit,
            None => true,
        }
    }

    /// Whether `key` holds more creatures than its effective cap, not
    /// counting `pending` removals already decided
    pub fn over_limit(&self, key: &CapKey, pending: u32) -> bool {
        let count = self.count(key).saturating_sub(pending) as u64;
        self.dynamic_cap(key).is_some_and(|cap| count > cap)
    }

    /// First key whose cap is exhausted, if any
    pub fn first_exceeded<'k>(&self, keys: &'k [CapKey]) -> Option<&'k CapKey> {
        keys.iter().find(|key| !self.within_limit(key))
    }

    pub(crate) fn replace_counts(&mut self, counts: HashMap<CapKey, u32>) {
        self.counts = counts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobcap_types::{ExtendedType, KindId, MobType};

    fn population(key: CapKey, cap: CapConfig) -> WorldPopulation {
        let mut caps = HashMap::default();
        caps.insert(key, cap);
        WorldPopulation::new(caps)
    }

    fn load_cells(population: &mut WorldPopulation, n: u32) {
        for _ in 0..n {
            population.cell_loaded();
        }
    }

    #[test]
    fn test_dynamic_cap_scales_with_cells() {
        // 256 cells * 20 per chunk >> 8 = 20, well below the static cap
        let monster = CapKey::Category(MobType::Monster);
        let mut pop = population(monster.clone(), CapConfig::new(512, 20));
        load_cells(&mut pop, 256);
        assert_eq!(pop.dynamic_cap(&monster), Some(20));
    }

    #[test]
    fn test_dynamic_cap_clamped_to_static() {
        let monster = CapKey::Category(MobType::Monster);
        let mut pop = population(monster.clone(), CapConfig::new(30, 64));
        load_cells(&mut pop, 1000);
        assert_eq!(pop.dynamic_cap(&monster), Some(30));
    }

    #[test]
    fn test_over_limit_accounts_for_pending_removals() {
        let villager = CapKey::Category(MobType::Villager);
        let mut pop = population(villager.clone(), CapConfig::new(2, CapConfig::UNLIMITED));
        let keys = [villager.clone()];
        for _ in 0..4 {
            pop.increment(&keys);
        }
        assert!(pop.over_limit(&villager, 0));
        assert!(pop.over_limit(&villager, 1));
        assert!(!pop.over_limit(&villager, 2));
    }

    #[test]
    fn test_dynamic_cap_zero_without_cells() {
        let monster = CapKey::Category(MobType::Monster);
        let pop = population(monster.clone(), CapConfig::new(512, 20));
        assert_eq!(pop.dynamic_cap(&monster), Some(0));
        assert!(!pop.within_limit(&monster));
    }

    #[test]
    fn test_unlimited_multiplier_bypasses_formula() {
        let villager = CapKey::Category(MobType::Villager);
        let pop = population(villager.clone(), CapConfig::new(64, CapConfig::UNLIMITED));
        assert_eq!(pop.dynamic_cap(&villager), Some(64));

        let open = population(villager.clone(), CapConfig::new(-1, i32::MAX));
        assert_eq!(open.dynamic_cap(&villager), None);
        assert!(open.within_limit(&villager));
    }

    #[test]
    fn test_dynamic_cap_monotonic_in_cells() {
        let monster = CapKey::Category(MobType::Monster);
        let mut pop = population(monster.clone(), CapConfig::new(100, 37));
        let mut previous = 0;
        for _ in 0..2000 {
            pop.cell_loaded();
            let cap = pop.dynamic_cap(&monster).unwrap();
            assert!(cap >= previous);
            assert!(cap <= 100);
            previous = cap;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn test_within_limit_counts() {
        let zombie = CapKey::Extended(ExtendedType::base(KindId::ZOMBIE));
        let mut pop = population(zombie.clone(), CapConfig::new(2, -1));
        assert!(pop.within_limit(&zombie));
        pop.increment(&[zombie.clone()]);
        assert!(pop.within_limit(&zombie));
        pop.increment(&[zombie.clone()]);
        assert!(!pop.within_limit(&zombie));
        pop.decrement(&[zombie.clone()]);
        assert!(pop.within_limit(&zombie));
    }

    #[test]
    fn test_uncapped_key_always_within_limit() {
        let pop = WorldPopulation::new(HashMap::default());
        assert!(pop.within_limit(&CapKey::Category(MobType::Ambient)));
        assert_eq!(pop.dynamic_cap(&CapKey::Category(MobType::Ambient)), None);
    }

    #[test]
    fn test_counts_never_negative() {
        let animal = CapKey::Category(MobType::Animal);
        let mut pop = WorldPopulation::new(HashMap::default());
        pop.decrement(&[animal.clone()]);
        assert_eq!(pop.count(&animal), 0);

        pop.increment(&[animal.clone()]);
        pop.increment(&[animal.clone()]);
        pop.decrement(&[animal.clone()]);
        pop.decrement(&[animal.clone()]);
        pop.decrement(&[animal.clone()]);
        assert_eq!(pop.count(&animal), 0);
    }

    #[test]
    fn test_active_cells_never_negative() {
        let mut pop = WorldPopulation::new(HashMap::default());
        pop.cell_unloaded();
        assert_eq!(pop.active_cells(), 0);
        pop.cell_loaded();
        pop.cell_loaded();
        pop.cell_unloaded();
        assert_eq!(pop.active_cells(), 1);
    }

    #[test]
    fn test_first_exceeded() {
        let monster = CapKey::Category(MobType::Monster);
        let skeleton = CapKey::Extended(ExtendedType::base(KindId::SKELETON));
        let mut caps = HashMap::default();
        caps.insert(monster.clone(), CapConfig::new(10, -1));
        caps.insert(skeleton.clone(), CapConfig::new(1, -1));
        let mut pop = WorldPopulation::new(caps);

        let keys = [monster.clone(), skeleton.clone()];
        assert_eq!(pop.first_exceeded(&keys), None);
        pop.increment(&keys);
        assert_eq!(pop.first_exceeded(&keys), Some(&skeleton));
    }
}

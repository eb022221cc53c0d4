use ahash::HashMap;
use mobcap_types::{CapKey, EntityId, MobType};

use super::DecisionContext;
use crate::protection::ProtectionRegistry;
use crate::view::{CreatureSnapshot, DespawnVeto};
use crate::world::WorldState;

/// Why a creature was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeepReason {
    Observer,
    Unclassified,
    TooYoung,
    Vetoed,
    Ignored,
    AnimalDespawnDisabled,
    Tamed,
    Protected,
    /// The cell holds fewer animals than the farm threshold
    Farm,
    MissingCell,
    VillagersWithinLimit,
    GuaranteedDrop,
    ObserverNearby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DespawnDecision {
    Keep(KeepReason),
    Remove,
}

/// Everything a despawn decision reads besides the creature
pub struct SweepContext<'a> {
    pub decision: DecisionContext<'a>,
    pub world: &'a WorldState,
    pub protection: &'a ProtectionRegistry,
    pub vetoes: &'a [Box<dyn DespawnVeto>],
    pub now_ms: u64,
}

/// Outcome of one sweep over a world
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    /// Creatures the host should remove
    pub removed: Vec<EntityId>,
    pub kept: HashMap<KeepReason, usize>,
}

impl SweepReport {
    pub fn kept_for(&self, reason: KeepReason) -> usize {
        self.kept.get(&reason).copied().unwrap_or(0)
    }
}

/// Decide whether one creature should be removed
///
/// `pending` holds removals already decided earlier in the same sweep so
/// the villager limit is not enforced twice for one excess.
pub fn decide(
    ctx: &SweepContext<'_>,
    creature: &CreatureSnapshot,
    pending: &HashMap<CapKey, u32>,
) -> DespawnDecision {
    use DespawnDecision::Keep;

    let classifier = ctx.decision.classifier;
    if classifier.is_observer(creature.kind) {
        return Keep(KeepReason::Observer);
    }
    let Some(classification) = classifier.classify(creature) else {
        return Keep(KeepReason::Unclassified);
    };
    let world = ctx.world;
    let settings = world.settings();

    if creature.ticks_lived < settings.min_ticks_lived {
        return Keep(KeepReason::TooYoung);
    }
    if ctx.vetoes.iter().any(|v| v.veto(world.name(), creature)) {
        return Keep(KeepReason::Vetoed);
    }

    let keys = classification.cap_keys();
    if settings.is_ignored(&keys) {
        return Keep(KeepReason::Ignored);
    }

    match classification.category {
        MobType::Animal => {
            let animals = &settings.animals;
            if !animals.despawn {
                return Keep(KeepReason::AnimalDespawnDisabled);
            }
            if creature.tamed && !animals.remove_tamed {
                return Keep(KeepReason::Tamed);
            }
            if ctx.protection.is_protected(creature.id, ctx.now_ms) {
                return Keep(KeepReason::Protected);
            }
            let Some(cell) = world.cell(creature.cell()) else {
                return Keep(KeepReason::MissingCell);
            };
            if cell.animal_count() < animals.farm_threshold {
                return Keep(KeepReason::Farm);
            }
        }
        MobType::Villager => {
            let over = keys.iter().any(|key| {
                world
                    .population()
                    .over_limit(key, pending.get(key).copied().unwrap_or(0))
            });
            if !over {
                return Keep(KeepReason::VillagersWithinLimit);
            }
        }
        _ => {}
    }

    if creature.has_guaranteed_drop() {
        return Keep(KeepReason::GuaranteedDrop);
    }
    if ctx
        .decision
        .observer_nearby(world, &classification, creature.pos)
    {
        return Keep(KeepReason::ObserverNearby);
    }

    DespawnDecision::Remove
}

/// Decide over every creature in a world
pub fn sweep(ctx: &SweepContext<'_>, creatures: &[CreatureSnapshot]) -> SweepReport {
    let mut report = SweepReport::default();
    let mut pending: HashMap<CapKey, u32> = HashMap::default();

    for creature in creatures {
        report.examined += 1;
        match decide(ctx, creature, &pending) {
            DespawnDecision::Keep(reason) => {
                *report.kept.entry(reason).or_insert(0) += 1;
            }
            DespawnDecision::Remove => {
                log::debug!("Despawning {} in {}", creature.id, ctx.world.name());
                if let Some(classification) = ctx.decision.classifier.classify(creature) {
                    for key in classification.cap_keys() {
                        *pending.entry(key).or_insert(0) += 1;
                    }
                }
                report.removed.push(creature.id);
            }
        }
    }

    report
}

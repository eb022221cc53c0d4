use glam::DVec3;
use mobcap_types::{CapKey, KindId, MobType, SpawnReason, chunk_of};

use super::DecisionContext;
use crate::world::WorldState;

/// A creature the host is about to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnAttempt {
    pub pos: DVec3,
    pub kind: KindId,
    pub variant: Option<String>,
    pub reason: SpawnReason,
}

impl SpawnAttempt {
    pub fn new(kind: KindId, pos: DVec3, reason: SpawnReason) -> Self {
        Self {
            pos,
            kind,
            variant: None,
            reason,
        }
    }

    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_string());
        self
    }
}

/// Why a spawn was cancelled
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DenyReason {
    DisabledType,
    ReasonNotEnabled,
    BreedingLimit,
    /// No cell data where the spawn happens
    MissingCell,
    PopulationCap(CapKey),
    NoObserverNearby,
}

/// Result of the admission gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Not a controlled creature or world; the host decides alone
    Uncontrolled,
    Allowed,
    Denied(DenyReason),
}

impl Admission {
    /// False only for an explicit denial
    pub fn permits(&self) -> bool {
        !matches!(self, Admission::Denied(_))
    }
}

/// Run the admission checks for one spawn, stopping at the first failure
///
/// `world` is `None` when the world is not enabled.
pub fn admit(
    ctx: &DecisionContext<'_>,
    world: Option<&WorldState>,
    attempt: &SpawnAttempt,
) -> Admission {
    let Some(classification) = ctx
        .classifier
        .classify_kind(attempt.kind, attempt.variant.as_deref())
    else {
        return Admission::Uncontrolled;
    };
    let Some(world) = world else {
        return Admission::Uncontrolled;
    };
    let settings = world.settings();
    let keys = classification.cap_keys();

    if settings.is_disabled(&keys) {
        return Admission::Denied(DenyReason::DisabledType);
    }
    if !settings.reason_enabled(attempt.reason) {
        return Admission::Denied(DenyReason::ReasonNotEnabled);
    }

    if classification.category == MobType::Animal && attempt.reason.is_breeding() {
        let coord = chunk_of(attempt.pos);
        let Some(cell) = world.cell(coord) else {
            log::warn!(
                "Breeding spawn in {} at unloaded chunk ({}, {})",
                world.name(),
                coord.x,
                coord.y
            );
            return Admission::Denied(DenyReason::MissingCell);
        };
        if !cell.within_breeding_limit(settings.animals.breeding_limit) {
            return Admission::Denied(DenyReason::BreedingLimit);
        }
    }

    if let Some(key) = world.population().first_exceeded(&keys) {
        return Admission::Denied(DenyReason::PopulationCap(key.clone()));
    }

    if !ctx.observer_nearby(world, &classification, attempt.pos) {
        return Admission::Denied(DenyReason::NoObserverNearby);
    }

    Admission::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::config::{CapConfig, GeneralConfig, WorldConfig};
    use crate::proximity::DirectScan;
    use crate::world::{ObserverRegistry, TrackedObserver, WorldSettings};
    use glam::IVec2;
    use mobcap_types::{EntityId, GameMode};

    struct Fixture {
        classifier: Classifier,
        observers: ObserverRegistry,
        world: WorldState,
    }

    impl Fixture {
        fn new(general: GeneralConfig, config: WorldConfig) -> Self {
            let classifier = Classifier::default();
            let settings = WorldSettings::resolve(&general, &config, classifier.registry());
            let mut world = WorldState::new("overworld", 1, settings);
            for x in -16..16 {
                for z in -8..8 {
                    world.load_cell(IVec2::new(x, z), &[], &[], &classifier);
                }
            }

            let mut observers = ObserverRegistry::new();
            observers.insert(TrackedObserver {
                id: EntityId::from_raw(900),
                world: "overworld".to_string(),
                pos: DVec3::new(0.0, 64.0, 0.0),
                mode: GameMode::Survival,
                counted: true,
            });
            Self {
                classifier,
                observers,
                world,
            }
        }

        fn admit(&self, attempt: &SpawnAttempt) -> Admission {
            let ctx = DecisionContext {
                classifier: &self.classifier,
                observers: &self.observers,
                proximity: &DirectScan,
            };
            admit(&ctx, Some(&self.world), attempt)
        }
    }

    fn default_fixture() -> Fixture {
        Fixture::new(GeneralConfig::default(), WorldConfig::default())
    }

    fn zombie(reason: SpawnReason) -> SpawnAttempt {
        SpawnAttempt::new(KindId::ZOMBIE, DVec3::new(10.0, 64.0, 10.0), reason)
    }

    #[test]
    fn test_allows_natural_spawn_near_observer() {
        let fixture = default_fixture();
        assert_eq!(fixture.admit(&zombie(SpawnReason::Natural)), Admission::Allowed);
    }

    #[test]
    fn test_unclassified_is_uncontrolled() {
        let fixture = default_fixture();
        let golem = SpawnAttempt::new(KindId::IRON_GOLEM, DVec3::ZERO, SpawnReason::Natural);
        assert_eq!(fixture.admit(&golem), Admission::Uncontrolled);
    }

    #[test]
    fn test_inactive_world_is_uncontrolled() {
        let fixture = default_fixture();
        let ctx = DecisionContext {
            classifier: &fixture.classifier,
            observers: &fixture.observers,
            proximity: &DirectScan,
        };
        assert_eq!(
            admit(&ctx, None, &zombie(SpawnReason::Natural)),
            Admission::Uncontrolled
        );
    }

    #[test]
    fn test_disabled_type_denied() {
        let mut config = WorldConfig::default();
        config.disabled_mobs = vec!["zombie".to_string()];
        let fixture = Fixture::new(GeneralConfig::default(), config);
        assert_eq!(
            fixture.admit(&zombie(SpawnReason::Natural)),
            Admission::Denied(DenyReason::DisabledType)
        );
    }

    #[test]
    fn test_reason_not_enabled_denied() {
        let mut general = GeneralConfig::default();
        general.enabled_spawn_reasons = vec![SpawnReason::Natural];
        let fixture = Fixture::new(general, WorldConfig::default());

        assert_eq!(
            fixture.admit(&zombie(SpawnReason::Spawner)),
            Admission::Denied(DenyReason::ReasonNotEnabled)
        );
        // Command spawns are always allowed through this check
        assert_eq!(fixture.admit(&zombie(SpawnReason::Command)), Admission::Allowed);
    }

    #[test]
    fn test_population_cap_denied() {
        let mut config = WorldConfig::default();
        config
            .caps
            .insert("monster".to_string(), CapConfig::new(1, CapConfig::UNLIMITED));
        let mut fixture = Fixture::new(GeneralConfig::default(), config);
        fixture
            .world
            .population_mut()
            .increment(&[CapKey::Category(MobType::Monster)]);

        assert_eq!(
            fixture.admit(&zombie(SpawnReason::Natural)),
            Admission::Denied(DenyReason::PopulationCap(CapKey::Category(MobType::Monster)))
        );
    }

    #[test]
    fn test_no_observer_nearby_denied() {
        let fixture = default_fixture();
        let far = SpawnAttempt::new(
            KindId::ZOMBIE,
            DVec3::new(200.0, 64.0, 0.0),
            SpawnReason::Natural,
        );
        assert_eq!(
            fixture.admit(&far),
            Admission::Denied(DenyReason::NoObserverNearby)
        );
    }

    #[test]
    fn test_flying_creature_gets_extra_depth() {
        let fixture = default_fixture();
        // 64 + 32 height + 24 extra depth
        let phantom = SpawnAttempt::new(
            KindId::PHANTOM,
            DVec3::new(0.0, 115.0, 0.0),
            SpawnReason::Natural,
        );
        assert_eq!(fixture.admit(&phantom), Admission::Allowed);

        let zombie = SpawnAttempt::new(
            KindId::ZOMBIE,
            DVec3::new(0.0, 115.0, 0.0),
            SpawnReason::Natural,
        );
        assert_eq!(
            fixture.admit(&zombie),
            Admission::Denied(DenyReason::NoObserverNearby)
        );
    }

    #[test]
    fn test_breeding_in_unloaded_cell_denied() {
        let fixture = default_fixture();
        let cow = SpawnAttempt::new(
            KindId::COW,
            DVec3::new(5000.0, 64.0, 0.0),
            SpawnReason::Breeding,
        );
        assert_eq!(fixture.admit(&cow), Admission::Denied(DenyReason::MissingCell));
    }

    #[test]
    fn test_permits() {
        assert!(Admission::Uncontrolled.permits());
        assert!(Admission::Allowed.permits());
        assert!(!Admission::Denied(DenyReason::BreedingLimit).permits());
    }
}

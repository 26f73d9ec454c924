use bevy::prelude::*;

use super::steering::SteeringCore;
use super::{IdleBehavior, MobContext, SteeringForces};
use crate::fleet::bundle::BundleLoader;
use crate::fleet::config::FleetSettings;
use crate::fleet::registry::{ConfigError, ParamRegistry};
use crate::fleet::sensor_grid::Sensor;

/// Full parameter-bundle steering with exploration.
///
/// Every term of [`SteeringForces`] is read straight from the registry, and
/// the governor tracks exploration so `enemyBase` can pull toward the
/// guessed base before it has been seen.
#[derive(Clone, Debug)]
pub struct BundleBehavior {
    core: SteeringCore,
}

impl BundleBehavior {
    pub fn forces(&self) -> &SteeringForces {
        &self.core.forces
    }

    pub fn fleet_locus(&self) -> Option<Vec2> {
        self.core.fleet_locus()
    }
}

impl IdleBehavior for BundleBehavior {
    const NAME: &'static str = "bundle";
    const USES_MAPPING: bool = true;
    const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("curHeadingWeight.value.value", "1.0"),
        // align
        ("align.weight.value.value", "0.4"),
        ("align.weight.value.mobJitterScale", "0.1"),
        ("align.range.check", "strictOff"),
        ("align.range.radius.value.value", "100"),
        ("align.crowd.check", "strictOn"),
        ("align.crowd.size.value.value", "2"),
        ("align.crowd.radius.value.value", "100"),
        // cohere
        ("cohere.weight.value.value", "0.3"),
        ("cohere.weight.value.mobJitterScale", "0.1"),
        ("cohere.range.check", "strictOff"),
        ("cohere.range.radius.value.value", "150"),
        ("cohere.crowd.check", "strictOn"),
        ("cohere.crowd.size.value.value", "2"),
        ("cohere.crowd.radius.value.value", "150"),
        // separate
        ("separate.weight.value.value", "1.0"),
        ("separate.range.check", "linearDown"),
        ("separate.range.radius.value.value", "30"),
        ("separate.crowd.check", "always"),
        // edges and corners
        ("edges.weight.value.value", "0.8"),
        ("edges.range.check", "quadraticDown"),
        ("edges.range.radius.value.value", "50"),
        ("edges.crowd.check", "always"),
        ("corners.weight.value.value", "0.5"),
        ("corners.range.check", "strictOff"),
        ("corners.range.radius.value.value", "100"),
        ("corners.crowd.check", "always"),
        // base
        ("baseDefense.weight.value.value", "1.5"),
        ("baseDefense.range.check", "always"),
        ("baseDefense.crowd.check", "always"),
        // enemy ships: keep a little distance
        ("enemy.weight.value.value", "-0.4"),
        ("enemy.range.check", "strictOff"),
        ("enemy.range.radius.value.value", "120"),
        ("enemy.crowd.check", "strictOff"),
        ("enemy.crowd.size.value.value", "3"),
        ("enemy.crowd.radius.value.value", "120"),
        // scouting
        ("enemyBase.weight.value.value", "0.3"),
        ("enemyBase.weight.valueType", "periodic"),
        ("enemyBase.weight.period.value", "400"),
        ("enemyBase.weight.amplitude.value", "0.5"),
        ("enemyBase.weight.tickShift.value", "0"),
        ("enemyBase.weight.tickShift.mobJitterScale", "1.0"),
        ("enemyBase.range.check", "always"),
        ("enemyBase.crowd.check", "linearUp"),
        ("enemyBase.crowd.size.value.value", "4"),
        ("enemyBase.crowd.radius.value.value", "200"),
        // loot
        ("cores.weight.value.value", "0.6"),
        ("cores.range.check", "strictOff"),
        ("cores.range.radius.value.value", "400"),
        ("cores.crowd.check", "always"),
        // loci
        ("fleetLocus.weight.value.value", "0.2"),
        ("fleetLocus.range.check", "linearUp"),
        ("fleetLocus.range.radius.value.value", "300"),
        ("fleetLocus.crowd.check", "always"),
        ("fleetLocus.circularPeriod.value.value", "1000"),
        ("fleetLocus.circularWeight.value.value", "1"),
        ("fleetLocus.linearXPeriod.value.value", "1500"),
        ("fleetLocus.linearYPeriod.value.value", "900"),
        ("fleetLocus.linearWeight.value.value", "0.5"),
        ("fleetLocus.useScaled", "true"),
        ("mobLocus.weight.value.value", "0.1"),
        ("mobLocus.range.check", "always"),
        ("mobLocus.crowd.check", "always"),
        ("mobLocus.randomPeriod.value.value", "300"),
        ("mobLocus.randomWeight.value.value", "1"),
        ("mobLocus.useScaled", "true"),
    ];
    type MobState = ();

    fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError> {
        let mut loader = BundleLoader::new(registry);
        Ok(Self {
            core: SteeringCore::load(&mut loader)?,
        })
    }

    fn jitter_slots(&self) -> usize {
        self.core.slots
    }

    fn begin_tick(&mut self, tick: u64, _sensor: &dyn Sensor, settings: &FleetSettings) {
        self.core.begin_tick(tick, settings);
    }

    fn idle_target(&mut self, ctx: &mut MobContext<'_>, _state: &mut ()) -> Vec2 {
        self.core.idle_target(ctx)
    }
}

use bevy::prelude::*;

use super::steering::SteeringCore;
use super::{IdleBehavior, MobContext};
use crate::fleet::bundle::BundleLoader;
use crate::fleet::config::FleetSettings;
use crate::fleet::registry::{ConfigError, ParamRegistry};
use crate::fleet::sensor_grid::Sensor;

/// `(flock key, force prefix)` for each boids term.
const FLOCK_TERMS: [(&str, &str); 8] = [
    ("align", "align"),
    ("cohere", "cohere"),
    ("separate", "separate"),
    ("edges", "edges"),
    ("center", "center"),
    ("base", "base"),
    ("enemy", "enemy"),
    ("locus", "fleetLocus"),
];

const LOCUS_KEYS: [&str; 7] = [
    "circularPeriod",
    "circularWeight",
    "linearXPeriod",
    "linearYPeriod",
    "linearWeight",
    "randomPeriod",
    "randomWeight",
];

/// Classic boids.
///
/// Each term is a plain `flock.<term>.weight` / `flock.<term>.radius` pair
/// that fires whenever its focus lies inside the radius, whatever the crowd.
#[derive(Clone, Debug)]
pub struct Flock {
    core: SteeringCore,
}

impl Flock {
    pub fn fleet_locus(&self) -> Option<Vec2> {
        self.core.fleet_locus()
    }

    /// Rewrite flat boids keys into full force entries.
    fn expand(registry: &ParamRegistry) -> Result<ParamRegistry, ConfigError> {
        let mut expanded = ParamRegistry::new();
        for (term, prefix) in FLOCK_TERMS {
            let weight = registry.f32_or(&format!("flock.{term}.weight"), 0.0)?;
            let radius = registry.f32_or(&format!("flock.{term}.radius"), 0.0)?;
            expanded.set(format!("{prefix}.weight.value.value"), weight.to_string());
            expanded.set(format!("{prefix}.range.radius.value.value"), radius.to_string());
            expanded.set(format!("{prefix}.range.check"), "strictOff");
            expanded.set(format!("{prefix}.crowd.check"), "always");
        }
        for key in LOCUS_KEYS {
            let v = registry.f32_or(&format!("flock.locus.{key}"), 0.0)?;
            expanded.set(format!("fleetLocus.{key}.value.value"), v.to_string());
        }
        expanded.set(
            "fleetLocus.useScaled",
            registry.bool_or("flock.locus.useScaled", true)?.to_string(),
        );
        expanded.set(
            "curHeadingWeight.value.value",
            registry.f32_or("flock.curHeadingWeight", 1.0)?.to_string(),
        );
        Ok(expanded)
    }
}

impl IdleBehavior for Flock {
    const NAME: &'static str = "flock";
    const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("flock.align.weight", "0.4"),
        ("flock.align.radius", "100"),
        ("flock.cohere.weight", "0.3"),
        ("flock.cohere.radius", "150"),
        ("flock.separate.weight", "1.0"),
        ("flock.separate.radius", "30"),
        ("flock.edges.weight", "0.8"),
        ("flock.edges.radius", "60"),
        ("flock.center.weight", "0.05"),
        ("flock.center.radius", "5000"),
        ("flock.base.weight", "0.1"),
        ("flock.base.radius", "5000"),
        ("flock.enemy.weight", "-0.5"),
        ("flock.enemy.radius", "150"),
        ("flock.locus.weight", "0.2"),
        ("flock.locus.radius", "5000"),
        ("flock.locus.circularPeriod", "800"),
        ("flock.locus.circularWeight", "1"),
        ("flock.curHeadingWeight", "1.0"),
    ];
    type MobState = ();

    fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError> {
        let expanded = Self::expand(registry)?;
        let mut loader = BundleLoader::new(&expanded);
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

//! Fleet governors: turn one tick of [`FleetInput`] into [`MobCommand`]s.
//!
//! Every variant shares [`BasicGovernor`]'s state machine (evade, attack,
//! gather) and differs only in what an idle fighter does, supplied by an
//! [`IdleBehavior`]:
//!
//! | Kind | Behaviour | Sensor |
//! |---|---|---|
//! | `basic` | [`Wander`] | [`SensorGrid`] |
//! | `hold` | [`Hold`] | [`SensorGrid`] |
//! | `circle` | [`Circle`] | [`SensorGrid`] |
//! | `flock` | [`Flock`] | [`SensorGrid`] |
//! | `bundle` | [`BundleBehavior`] | [`MappingSensorGrid`] |
//!
//! [`SensorGrid`]: crate::fleet::sensor_grid::SensorGrid
//! [`MappingSensorGrid`]: crate::fleet::sensor_grid::MappingSensorGrid

use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::fleet::bundle::BundleLive;
use crate::fleet::config::FleetSettings;
use crate::fleet::math::MapBounds;
use crate::fleet::mob::{FleetInput, Mob, MobCommand};
use crate::fleet::registry::{ConfigError, ParamRegistry};
use crate::fleet::sensor_grid::Sensor;

mod basic;
mod bundle;
mod circle;
mod flock;
mod hold;
mod steering;
mod wander;

pub use basic::{BasicGovernor, BasicParams, FighterState};
pub use bundle::BundleBehavior;
pub use circle::{Circle, Orbit};
pub use flock::Flock;
pub use hold::{Hold, HoldPoint};
pub use steering::SteeringForces;
pub use wander::Wander;

/// A fleet's decision maker.
pub trait Governor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Update the sensor picture for `tick` and command every governed mob.
    fn run_tick(&mut self, tick: u64, input: &FleetInput) -> Vec<MobCommand>;

    fn sensor(&self) -> &dyn Sensor;
}

/// What an idle fighter does. Also owns any per-variant configuration.
pub trait IdleBehavior: Send + Sync + Sized {
    const NAME: &'static str;

    /// Built-in registry entries, consulted for keys the user did not set.
    const DEFAULTS: &'static [(&'static str, &'static str)] = &[];

    /// Whether the governor should track exploration with a mapping grid.
    const USES_MAPPING: bool = false;

    /// Per-mob behaviour state, created on first idle tick.
    type MobState: Default + Send + Sync;

    fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError>;

    /// Jitter slots each mob's [`BundleLive`] needs.
    fn jitter_slots(&self) -> usize {
        0
    }

    /// Fleet-wide work done once per tick, after the sensor update.
    fn begin_tick(&mut self, _tick: u64, _sensor: &dyn Sensor, _settings: &FleetSettings) {}

    fn idle_target(&mut self, ctx: &mut MobContext<'_>, state: &mut Self::MobState) -> Vec2;
}

/// One mob's view of the tick.
pub struct MobContext<'a> {
    pub sensor: &'a dyn Sensor,
    pub mob: &'a Mob,
    pub tick: u64,
    pub settings: &'a FleetSettings,
    pub live: &'a mut BundleLive,
    pub rng: &'a mut StdRng,
}

impl MobContext<'_> {
    pub fn bounds(&self) -> MapBounds {
        self.settings.bounds()
    }

    pub fn speed(&self) -> f32 {
        self.settings.fighter_speed
    }

    pub fn heading(&self) -> Vec2 {
        self.mob.velocity()
    }

    /// Friendly base position, or the map centre without one.
    pub fn anchor(&self) -> Vec2 {
        self.sensor
            .grid()
            .friend_base()
            .map_or_else(|| self.bounds().center(), |base| base.pos)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernorKind {
    #[default]
    Basic,
    Hold,
    Circle,
    Flock,
    Bundle,
}

impl GovernorKind {
    pub const ALL: [GovernorKind; 5] = [
        GovernorKind::Basic,
        GovernorKind::Hold,
        GovernorKind::Circle,
        GovernorKind::Flock,
        GovernorKind::Bundle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GovernorKind::Basic => Wander::NAME,
            GovernorKind::Hold => Hold::NAME,
            GovernorKind::Circle => Circle::NAME,
            GovernorKind::Flock => Flock::NAME,
            GovernorKind::Bundle => BundleBehavior::NAME,
        }
    }

    /// Build a governor of this kind with `registry` layered over its defaults.
    pub fn build(
        self,
        settings: &FleetSettings,
        registry: &ParamRegistry,
    ) -> Result<Box<dyn Governor>, ConfigError> {
        let governor: Box<dyn Governor> = match self {
            GovernorKind::Basic => Box::new(BasicGovernor::<Wander>::from_registry(settings, registry)?),
            GovernorKind::Hold => Box::new(BasicGovernor::<Hold>::from_registry(settings, registry)?),
            GovernorKind::Circle => Box::new(BasicGovernor::<Circle>::from_registry(settings, registry)?),
            GovernorKind::Flock => Box::new(BasicGovernor::<Flock>::from_registry(settings, registry)?),
            GovernorKind::Bundle => {
                Box::new(BasicGovernor::<BundleBehavior>::from_registry(settings, registry)?)
            }
        };
        Ok(governor)
    }
}

impl fmt::Display for GovernorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GovernorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GovernorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown governor '{}'", s))
    }
}

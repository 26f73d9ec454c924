use bevy::prelude::*;
use rand::Rng;

use super::{IdleBehavior, MobContext};
use crate::fleet::registry::{ConfigError, ParamRegistry};

/// Idle fighters roam between random map points.
#[derive(Clone, Debug, PartialEq)]
pub struct Wander {
    /// Distance at which a waypoint counts as reached.
    pub arrive_radius: f32,
}

impl IdleBehavior for Wander {
    const NAME: &'static str = "basic";
    const DEFAULTS: &'static [(&'static str, &'static str)] = &[("wander.arriveRadius", "20")];
    type MobState = Option<Vec2>;

    fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            arrive_radius: registry.f32_or("wander.arriveRadius", 20.0)?,
        })
    }

    fn idle_target(&mut self, ctx: &mut MobContext<'_>, waypoint: &mut Option<Vec2>) -> Vec2 {
        let pos = ctx.mob.pos;
        match *waypoint {
            Some(wp) if wp.distance(pos) > self.arrive_radius => wp,
            _ => {
                let bounds = ctx.bounds();
                let wp = Vec2::new(
                    ctx.rng.random_range(0.0..=bounds.width),
                    ctx.rng.random_range(0.0..=bounds.height),
                );
                *waypoint = Some(wp);
                wp
            }
        }
    }
}

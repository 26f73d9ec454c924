use bevy::prelude::*;
use rand::Rng;

use super::{IdleBehavior, MobContext};
use crate::fleet::math::{add_polar, angle_around, Polar};
use crate::fleet::registry::{ConfigError, ParamRegistry};

/// Idle fighters orbit the base (or map centre) at a fixed radius.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub radius: f32,
    /// Radians advanced per tick.
    pub step: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orbit {
    angle: f32,
    /// +1 counter-clockwise, -1 clockwise.
    direction: f32,
}

impl IdleBehavior for Circle {
    const NAME: &'static str = "circle";
    const DEFAULTS: &'static [(&'static str, &'static str)] =
        &[("circle.radius", "200"), ("circle.step", "0.02")];
    type MobState = Option<Orbit>;

    fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            radius: registry.f32_or("circle.radius", 200.0)?,
            step: registry.f32_or("circle.step", 0.02)?,
        })
    }

    fn idle_target(&mut self, ctx: &mut MobContext<'_>, orbit: &mut Option<Orbit>) -> Vec2 {
        let center = ctx.anchor();
        let o = match orbit {
            Some(o) => {
                o.angle += self.step * o.direction;
                *o
            }
            None => {
                let direction = if ctx.rng.random_bool(0.5) { 1.0 } else { -1.0 };
                let o = Orbit {
                    angle: angle_around(center, ctx.mob.pos),
                    direction,
                };
                *orbit = Some(o);
                o
            }
        };
        ctx.bounds()
            .clamp(add_polar(center, Polar::new(self.radius, o.angle)))
    }
}

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use super::{IdleBehavior, MobContext};
use crate::fleet::math::{add_polar, Polar};
use crate::fleet::registry::{ConfigError, ParamRegistry};

/// Idle fighters loiter near the base, picking a fresh spot every
/// `ticks` ticks within `radius` of it (or of the map centre).
#[derive(Clone, Debug, PartialEq)]
pub struct Hold {
    pub radius: f32,
    pub ticks: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HoldPoint {
    point: Vec2,
    chosen_tick: u64,
}

impl IdleBehavior for Hold {
    const NAME: &'static str = "hold";
    const DEFAULTS: &'static [(&'static str, &'static str)] =
        &[("hold.radius", "150"), ("hold.ticks", "200")];
    type MobState = Option<HoldPoint>;

    fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            radius: registry.f32_or("hold.radius", 150.0)?.max(0.0),
            ticks: registry.u64_or("hold.ticks", 200)?,
        })
    }

    fn idle_target(&mut self, ctx: &mut MobContext<'_>, hold: &mut Option<HoldPoint>) -> Vec2 {
        let expired = match hold {
            Some(h) => self.ticks > 0 && ctx.tick.saturating_sub(h.chosen_tick) >= self.ticks,
            None => true,
        };
        if expired {
            let anchor = ctx.anchor();
            // sqrt keeps the draw uniform over the disc
            let r = self.radius * ctx.rng.random_range(0.0f32..=1.0).sqrt();
            let theta = ctx.rng.random_range(0.0..TAU);
            let point = ctx.bounds().clamp(add_polar(anchor, Polar::new(r, theta)));
            *hold = Some(HoldPoint {
                point,
                chosen_tick: ctx.tick,
            });
        }
        hold.map_or(ctx.mob.pos, |h| h.point)
    }
}

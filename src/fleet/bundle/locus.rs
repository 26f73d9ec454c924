use bevy::prelude::*;
use rand::Rng;

use super::{BundleLive, BundleValue};
use crate::fleet::math::MapBounds;

/// A moving reference point that formations drift around.
///
/// Up to three components, each active when its weight resolves non-zero:
/// - circular orbit around the map centre, `tick / circular_period` radians,
///   radii half the map size
/// - triangle-wave sweep across the map, independently in X and Y
/// - a random map point, redrawn every `random_period` ticks
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocusParams {
    pub circular_period: BundleValue,
    pub circular_weight: BundleValue,
    pub linear_x_period: BundleValue,
    pub linear_y_period: BundleValue,
    pub linear_weight: BundleValue,
    pub random_period: BundleValue,
    pub random_weight: BundleValue,
    /// Divide the blend by the total weight.
    pub use_scaled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocusLive {
    random_point: Option<Vec2>,
    random_tick: u64,
}

/// 0 -> 1 -> 0 over two units of `phase`.
fn triangle_wave(phase: f32) -> f32 {
    let f = phase.rem_euclid(2.0);
    if f <= 1.0 {
        f
    } else {
        2.0 - f
    }
}

impl BundleLive {
    pub fn locus_point(&mut self, params: &LocusParams, tick: u64, bounds: MapBounds) -> Option<Vec2> {
        let t = tick as f32;
        let center = bounds.center();
        let mut sum = Vec2::ZERO;
        let mut total_weight = 0.0;
        let mut active = false;

        let circular_weight = self.resolve_value(&params.circular_weight, tick);
        if circular_weight != 0.0 {
            let period = self.resolve_value(&params.circular_period, tick);
            if period > 0.0 {
                let angle = t / period;
                let p = center + Vec2::new(angle.cos() * center.x, angle.sin() * center.y);
                sum += p * circular_weight;
                total_weight += circular_weight;
                active = true;
            }
        }

        let linear_weight = self.resolve_value(&params.linear_weight, tick);
        if linear_weight != 0.0 {
            let x_period = self.resolve_value(&params.linear_x_period, tick);
            let y_period = self.resolve_value(&params.linear_y_period, tick);
            if x_period > 0.0 || y_period > 0.0 {
                let x = if x_period > 0.0 {
                    triangle_wave(t / x_period) * bounds.width
                } else {
                    center.x
                };
                let y = if y_period > 0.0 {
                    triangle_wave(t / y_period) * bounds.height
                } else {
                    center.y
                };
                sum += Vec2::new(x, y) * linear_weight;
                total_weight += linear_weight;
                active = true;
            }
        }

        let random_weight = self.resolve_value(&params.random_weight, tick);
        if random_weight != 0.0 {
            let period = self.resolve_value(&params.random_period, tick).max(0.0) as u64;
            let expired = match self.locus.random_point {
                None => true,
                Some(_) => period > 0 && tick.saturating_sub(self.locus.random_tick) >= period,
            };
            if expired {
                let p = Vec2::new(
                    self.rng().random_range(0.0..=bounds.width),
                    self.rng().random_range(0.0..=bounds.height),
                );
                self.locus.random_point = Some(p);
                self.locus.random_tick = tick;
            }
            if let Some(p) = self.locus.random_point {
                sum += p * random_weight;
                total_weight += random_weight;
                active = true;
            }
        }

        if !active {
            return None;
        }
        if params.use_scaled {
            if total_weight == 0.0 {
                return None;
            }
            sum /= total_weight;
        }
        Some(sum)
    }
}

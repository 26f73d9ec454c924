use bevy::prelude::*;

use super::MobContext;
use crate::fleet::bundle::{
    steer_target, BundleCheck, BundleEval, BundleForce, BundleLive, BundleLoader, BundleValue,
    LocusParams,
};
use crate::fleet::config::FleetSettings;
use crate::fleet::filter::MobFilter;
use crate::fleet::math::MapBounds;
use crate::fleet::mob::{mob_flags, Mob};
use crate::fleet::registry::ConfigError;
use crate::fleet::sensor_grid::Sensor;

/// Every force term an idle fighter can feel, by registry prefix.
///
/// A term whose crowd or range check is `never` is skipped without
/// touching the sensor grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SteeringForces {
    pub align: BundleForce,
    pub cohere: BundleForce,
    pub separate: BundleForce,
    pub nearest_friend: BundleForce,
    pub edges: BundleForce,
    pub corners: BundleForce,
    pub center: BundleForce,
    pub base: BundleForce,
    pub base_defense: BundleForce,
    pub enemy: BundleForce,
    pub enemy_base: BundleForce,
    pub cores: BundleForce,
    pub fleet_locus: BundleForce,
    pub mob_locus: BundleForce,
    pub fleet_locus_params: LocusParams,
    pub mob_locus_params: LocusParams,
    pub cur_heading_weight: BundleValue,
}

fn enabled(force: &BundleForce) -> bool {
    force.crowd.check != BundleCheck::Never && force.range.check != BundleCheck::Never
}

/// How far to look for a force's focus: its range radius when that bounds
/// anything, otherwise everywhere.
fn query_radius(eval: &mut BundleEval<'_>, force: &BundleForce) -> f32 {
    let r = eval.value(&force.range.radius);
    if r > 0.0 && force.range.check != BundleCheck::Always {
        r
    } else {
        f32::INFINITY
    }
}

impl SteeringForces {
    pub fn load(loader: &mut BundleLoader<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            align: loader.force("align")?,
            cohere: loader.force("cohere")?,
            separate: loader.force("separate")?,
            nearest_friend: loader.force("nearestFriend")?,
            edges: loader.force("edges")?,
            corners: loader.force("corners")?,
            center: loader.force("center")?,
            base: loader.force("base")?,
            base_defense: loader.force("baseDefense")?,
            enemy: loader.force("enemy")?,
            enemy_base: loader.force("enemyBase")?,
            cores: loader.force("cores")?,
            fleet_locus: loader.force("fleetLocus")?,
            mob_locus: loader.force("mobLocus")?,
            fleet_locus_params: loader.locus("fleetLocus")?,
            mob_locus_params: loader.locus("mobLocus")?,
            cur_heading_weight: loader.value("curHeadingWeight")?,
        })
    }

    /// Sum of every active term for `eval.mob`, seeded with its heading.
    pub fn accumulate(
        &self,
        eval: &mut BundleEval<'_>,
        sensor: &dyn Sensor,
        fleet_locus: Option<Vec2>,
        bounds: MapBounds,
    ) -> Vec2 {
        let grid = eval.grid;
        let mob = eval.mob;
        let pos = mob.pos;

        let mut force = mob.velocity() * eval.value(&self.cur_heading_weight);

        if enabled(&self.align) {
            let r = query_radius(eval, &self.align);
            if let Some(v) = grid.friend_avg_velocity(pos, r, mob_flags::FIGHTER) {
                eval.apply_bundle(&mut force, &self.align, pos + v);
            }
        }

        if enabled(&self.cohere) {
            let r = query_radius(eval, &self.cohere);
            if let Some(c) = grid.friend_avg_pos(pos, r, mob_flags::FIGHTER) {
                eval.apply_bundle(&mut force, &self.cohere, c);
            }
        }

        if enabled(&self.separate) || enabled(&self.nearest_friend) {
            let not_me = |m: &Mob| m.id != mob.id;
            let neighbour_filter = MobFilter::of_type(mob_flags::FIGHTER).with_fn(&not_me);

            if enabled(&self.separate) {
                let r = query_radius(eval, &self.separate);
                let filter = neighbour_filter.with_range(pos, r);
                if let Some(n) = grid.friends().find_closest(pos, &filter) {
                    eval.repel_bundle(&mut force, &self.separate, n.pos);
                }
            }
            if enabled(&self.nearest_friend) {
                let r = query_radius(eval, &self.nearest_friend);
                let filter = neighbour_filter.with_range(pos, r);
                if let Some(n) = grid.friends().find_closest(pos, &filter) {
                    eval.apply_bundle(&mut force, &self.nearest_friend, n.pos);
                }
            }
        }

        if enabled(&self.edges) {
            for p in bounds.edge_points(pos) {
                eval.repel_bundle(&mut force, &self.edges, p);
            }
        }

        if enabled(&self.corners) {
            for p in bounds.corners() {
                eval.repel_bundle(&mut force, &self.corners, p);
            }
        }

        if enabled(&self.center) {
            eval.apply_bundle(&mut force, &self.center, bounds.center());
        }

        if let Some(base) = grid.friend_base() {
            if enabled(&self.base) {
                eval.apply_bundle(&mut force, &self.base, base.pos);
            }
            if enabled(&self.base_defense) {
                let threat = grid.find_closest_target(
                    base.pos,
                    mob_flags::SHIP | mob_flags::MISSILE,
                    None,
                );
                if let Some(threat) = threat {
                    eval.apply_bundle(&mut force, &self.base_defense, threat.pos);
                }
            }
        }

        if enabled(&self.enemy) {
            let r = query_radius(eval, &self.enemy);
            if let Some(e) = grid.find_closest_target(pos, mob_flags::SHIP, Some(r)) {
                eval.apply_bundle(&mut force, &self.enemy, e.pos);
            }
        }

        if enabled(&self.enemy_base) {
            if let Some(guess) = sensor.enemy_base_guess() {
                eval.apply_bundle(&mut force, &self.enemy_base, guess);
            }
        }

        if enabled(&self.cores) {
            let r = query_radius(eval, &self.cores);
            if let Some(core) = grid.find_closest_target(pos, mob_flags::POWER_CORE, Some(r)) {
                eval.apply_bundle(&mut force, &self.cores, core.pos);
            }
        }

        if enabled(&self.fleet_locus) {
            if let Some(locus) = fleet_locus {
                eval.apply_bundle(&mut force, &self.fleet_locus, locus);
            }
        }

        if enabled(&self.mob_locus) {
            let tick = eval.tick;
            if let Some(locus) = eval.live.locus_point(&self.mob_locus_params, tick, bounds) {
                eval.apply_bundle(&mut force, &self.mob_locus, locus);
            }
        }

        force
    }
}

/// Shared machinery of the force-driven idle behaviours.
#[derive(Clone, Debug)]
pub(super) struct SteeringCore {
    pub forces: SteeringForces,
    pub slots: usize,
    fleet_live: Option<BundleLive>,
    fleet_locus: Option<Vec2>,
}

impl SteeringCore {
    pub fn load(loader: &mut BundleLoader<'_>) -> Result<Self, ConfigError> {
        let forces = SteeringForces::load(loader)?;
        Ok(Self {
            forces,
            slots: loader.slot_count(),
            fleet_live: None,
            fleet_locus: None,
        })
    }

    pub fn fleet_locus(&self) -> Option<Vec2> {
        self.fleet_locus
    }

    /// Advance the fleet-wide locus, shared by every mob this tick.
    pub fn begin_tick(&mut self, tick: u64, settings: &FleetSettings) {
        let slots = self.slots;
        let live = self
            .fleet_live
            .get_or_insert_with(|| BundleLive::new(slots, settings.seed));
        self.fleet_locus = live.locus_point(&self.forces.fleet_locus_params, tick, settings.bounds());
    }

    pub fn idle_target(&self, ctx: &mut MobContext<'_>) -> Vec2 {
        let bounds = ctx.bounds();
        let speed = ctx.speed();
        let heading = ctx.heading();
        let sensor = ctx.sensor;
        let mob = ctx.mob;

        let mut eval = BundleEval::new(sensor.grid(), mob, ctx.tick, &mut *ctx.live);
        let force = self
            .forces
            .accumulate(&mut eval, sensor, self.fleet_locus, bounds);
        steer_target(mob.pos, heading, force, speed)
    }
}

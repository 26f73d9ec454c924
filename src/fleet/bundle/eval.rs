use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

use super::{check, BundleAtom, BundleCrowd, BundleForce, BundleRange, BundleValue, LocusLive};
use crate::fleet::math::{add_polar, Polar};
use crate::fleet::mob::{mob_flags, Mob};
use crate::fleet::sensor_grid::SensorGrid;

/// Per-mob mutable steering state.
///
/// Owned by exactly one mob's AI record and dropped with it.
#[derive(Clone, Debug)]
pub struct BundleLive {
    jitter: Vec<Option<f32>>,
    rng: StdRng,
    crowd_tick: Option<u64>,
    /// `(radius, friendly fighters within radius)` for `crowd_tick`.
    pub(super) crowd_cache: SmallVec<[(f32, usize); 8]>,
    pub(super) locus: LocusLive,
}

impl BundleLive {
    /// `num_slots` must cover every [`super::AtomSlot`] the mob will resolve.
    pub fn new(num_slots: usize, seed: u64) -> Self {
        Self {
            jitter: vec![None; num_slots],
            rng: StdRng::seed_from_u64(seed),
            crowd_tick: None,
            crowd_cache: SmallVec::new(),
            locus: LocusLive::default(),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.jitter.len()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// The mob's fixed jitter for `atom`, drawn on first use.
    ///
    /// # Panics
    /// If the atom's slot lies outside this mob's jitter table.
    pub fn jitter(&mut self, atom: &BundleAtom) -> f32 {
        let slot = atom.slot.0 as usize;
        assert!(
            slot < self.jitter.len(),
            "atom slot {} outside jitter table of {} entries",
            slot,
            self.jitter.len()
        );
        if let Some(j) = self.jitter[slot] {
            return j;
        }
        let scale = atom.mob_jitter_scale.abs();
        let j = if scale.is_finite() && scale > 0.0 {
            self.rng.random_range(-scale..=scale)
        } else {
            0.0
        };
        self.jitter[slot] = Some(j);
        j
    }

    pub fn resolve_atom(&mut self, atom: &BundleAtom) -> f32 {
        let jitter = self.jitter(atom);
        if jitter != 0.0 {
            atom.value * (1.0 + jitter)
        } else {
            atom.value
        }
    }

    pub fn resolve_value(&mut self, value: &BundleValue, tick: u64) -> f32 {
        let base = self.resolve_atom(&value.atom);
        let Some(periodic) = &value.periodic else {
            return base;
        };
        let period = self.resolve_atom(&periodic.period);
        let amplitude = self.resolve_atom(&periodic.amplitude);
        if amplitude > 0.0 && period > 1.0 {
            let shift = self.resolve_atom(&periodic.tick_shift);
            base * (1.0 + amplitude * ((tick as f32 + shift) / period).sin())
        } else {
            base
        }
    }
}

/// Everything a force term needs to evaluate for one mob on one tick.
pub struct BundleEval<'a> {
    pub grid: &'a SensorGrid,
    pub mob: &'a Mob,
    pub tick: u64,
    pub live: &'a mut BundleLive,
}

impl<'a> BundleEval<'a> {
    pub fn new(grid: &'a SensorGrid, mob: &'a Mob, tick: u64, live: &'a mut BundleLive) -> Self {
        Self {
            grid,
            mob,
            tick,
            live,
        }
    }

    pub fn value(&mut self, value: &BundleValue) -> f32 {
        self.live.resolve_value(value, self.tick)
    }

    /// Friendly fighters within `radius`, the mob itself included.
    ///
    /// Counts are memoized per tick by radius. For invariant checks a count
    /// taken at a smaller radius that already reaches `trigger` is reused,
    /// since growing the radius cannot change the outcome.
    fn crowd_count(&mut self, crowd: &BundleCrowd, radius: f32, trigger: f32) -> usize {
        if self.live.crowd_tick != Some(self.tick) {
            self.live.crowd_tick = Some(self.tick);
            self.live.crowd_cache.clear();
        }

        if let Some(&(_, n)) = self.live.crowd_cache.iter().find(|(r, _)| *r == radius) {
            return n;
        }
        if crowd.check.is_invariant() {
            if let Some(&(_, n)) = self
                .live
                .crowd_cache
                .iter()
                .find(|(r, n)| *r <= radius && *n as f32 >= trigger)
            {
                return n;
            }
        }

        let n = self
            .grid
            .num_friends_in_range(mob_flags::FIGHTER, self.mob.pos, radius);
        self.live.crowd_cache.push((radius, n));
        n
    }

    pub fn crowd_gate(&mut self, crowd: &BundleCrowd) -> Option<f32> {
        if crowd.check.is_constant() {
            return check(crowd.check, 0.0, 0.0);
        }
        let trigger = self.value(&crowd.size);
        let radius = self.value(&crowd.radius);
        let count = self.crowd_count(crowd, radius, trigger);
        check(crowd.check, count as f32, trigger)
    }

    pub fn range_gate(&mut self, range: &BundleRange, focus: Vec2) -> Option<f32> {
        if range.check.is_constant() {
            return check(range.check, 0.0, 0.0);
        }
        let radius = self.value(&range.radius);
        check(range.check, self.mob.pos.distance(focus), radius)
    }

    /// Add `bundle`'s pull toward `focus` to `force`. Returns whether anything
    /// was added.
    ///
    /// A negative weight pushes away. A focus on top of the mob has no
    /// direction and contributes nothing.
    pub fn apply_bundle(&mut self, force: &mut Vec2, bundle: &BundleForce, focus: Vec2) -> bool {
        let Some(crowd_weight) = self.crowd_gate(&bundle.crowd) else {
            return false;
        };
        let Some(range_weight) = self.range_gate(&bundle.range, focus) else {
            return false;
        };

        let magnitude = crowd_weight * range_weight * self.value(&bundle.weight);
        if magnitude == 0.0 || !magnitude.is_finite() {
            return false;
        }

        let offset = focus - self.mob.pos;
        if offset.length_squared() <= f32::EPSILON {
            return false;
        }
        *force = add_polar(*force, Polar::new(magnitude, offset.y.atan2(offset.x)));
        true
    }

    /// Like [`Self::apply_bundle`] but pushing away from `focus`.
    pub fn repel_bundle(&mut self, force: &mut Vec2, bundle: &BundleForce, focus: Vec2) -> bool {
        let mirrored = self.mob.pos * 2.0 - focus;
        self.apply_bundle(force, bundle, mirrored)
    }
}

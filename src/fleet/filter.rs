//! Declarative mob predicates.
//!
//! A [`MobFilter`] is a bundle of optional sub-predicates. Each builder call
//! switches one on; [`MobFilter::matches`] accepts a mob only if every active
//! sub-predicate does. Query code builds one filter per call and hands it to
//! [`MobSet`](crate::fleet::mob_set::MobSet) searches.
//!
//! [`filter_mobs`] is the batched form used on scratch lists. Its range test
//! runs eight mobs per step over x/y lanes so the compiler can vectorize the
//! squared-distance compare; the survivors and their order are exactly what
//! the scalar path produces.

use bevy::prelude::*;

use super::mob::Mob;

/// Which sub-predicates a filter evaluates.
pub mod filter_flags {
    pub const NONE: u32 = 0;
    pub const TYPE: u32 = 1 << 0;
    pub const RANGE: u32 = 1 << 1;
    pub const DIRECTION: u32 = 1 << 2;
    pub const FN: u32 = 1 << 3;
    /// Nothing can match (e.g. a range filter with radius <= 0).
    pub const EMPTY: u32 = 1 << 4;
}

/// Lane width of the batched range test.
pub const FILTER_LANES: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RangeFilter {
    pub pos: Vec2,
    pub radius: f32,
}

/// Accepts mobs ahead of (`forward`) or behind `pos` along `dir`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionFilter {
    pub pos: Vec2,
    pub dir: Vec2,
    pub forward: bool,
}

#[derive(Clone, Copy, Default)]
pub struct MobFilter<'a> {
    pub flags: u32,
    pub type_mask: u32,
    pub range: RangeFilter,
    pub direction: DirectionFilter,
    pub func: Option<&'a dyn Fn(&Mob) -> bool>,
}

impl std::fmt::Debug for MobFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobFilter")
            .field("flags", &self.flags)
            .field("type_mask", &self.type_mask)
            .field("range", &self.range)
            .field("direction", &self.direction)
            .field("func", &self.func.is_some())
            .finish()
    }
}

impl<'a> MobFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on a type mask only.
    pub fn of_type(type_mask: u32) -> Self {
        Self::new().with_types(type_mask)
    }

    pub fn with_types(mut self, type_mask: u32) -> Self {
        self.flags |= filter_flags::TYPE;
        self.type_mask = type_mask;
        self
    }

    /// Restrict to mobs within `radius` of `pos` (inclusive).
    ///
    /// A non-positive or NaN radius degenerates to the empty filter.
    pub fn with_range(mut self, pos: Vec2, radius: f32) -> Self {
        if !(radius > 0.0) {
            self.flags |= filter_flags::EMPTY;
            return self;
        }
        self.flags |= filter_flags::RANGE;
        self.range = RangeFilter { pos, radius };
        self
    }

    /// Optional max range: `None` leaves the filter unbounded.
    pub fn with_max_range(self, pos: Vec2, radius: Option<f32>) -> Self {
        match radius {
            Some(r) => self.with_range(pos, r),
            None => self,
        }
    }

    pub fn with_direction(mut self, pos: Vec2, dir: Vec2, forward: bool) -> Self {
        self.flags |= filter_flags::DIRECTION;
        self.direction = DirectionFilter { pos, dir, forward };
        self
    }

    pub fn with_fn(mut self, func: &'a dyn Fn(&Mob) -> bool) -> Self {
        self.flags |= filter_flags::FN;
        self.func = Some(func);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags & filter_flags::EMPTY != 0
    }

    #[inline]
    pub fn uses(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn matches(&self, mob: &Mob) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.uses(filter_flags::TYPE) && !mob.is_type(self.type_mask) {
            return false;
        }
        if self.uses(filter_flags::RANGE) && !self.in_range(mob.pos) {
            return false;
        }
        self.matches_non_range(mob)
    }

    #[inline]
    fn in_range(&self, p: Vec2) -> bool {
        p.distance_squared(self.range.pos) <= self.range.radius * self.range.radius
    }

    /// Every sub-predicate except type and range.
    fn matches_non_range(&self, mob: &Mob) -> bool {
        if self.uses(filter_flags::DIRECTION) {
            let d = &self.direction;
            let ahead = (mob.pos - d.pos).dot(d.dir) >= 0.0;
            if ahead != d.forward {
                return false;
            }
        }
        if self.uses(filter_flags::FN) {
            if let Some(func) = self.func {
                if !func(mob) {
                    return false;
                }
            }
        }
        true
    }
}

/// Free-function form of [`MobFilter::matches`].
#[inline]
pub fn filter_mob(mob: &Mob, filter: &MobFilter) -> bool {
    filter.matches(mob)
}

/// Range test over one 8-wide block. Lanes past `xs.len()` stay false.
#[inline]
fn range_lanes(xs: &[f32], ys: &[f32], center: Vec2, radius_sq: f32) -> [bool; FILTER_LANES] {
    let mut dx = [0.0f32; FILTER_LANES];
    let mut dy = [0.0f32; FILTER_LANES];
    dx[..xs.len()].copy_from_slice(xs);
    dy[..ys.len()].copy_from_slice(ys);

    let mut out = [false; FILTER_LANES];
    for lane in 0..FILTER_LANES {
        let x = dx[lane] - center.x;
        let y = dy[lane] - center.y;
        out[lane] = lane < xs.len() && x * x + y * y <= radius_sq;
    }
    out
}

/// Filter `mobs` in place, compacting survivors to the front in their
/// original relative order.
pub fn filter_mobs(mobs: &mut Vec<Mob>, filter: &MobFilter) {
    if filter.is_empty() {
        mobs.clear();
        return;
    }
    if filter.flags == filter_flags::NONE {
        return;
    }

    let mut keep = vec![true; mobs.len()];

    if filter.uses(filter_flags::RANGE) {
        let center = filter.range.pos;
        let radius_sq = filter.range.radius * filter.range.radius;
        let mut xs = [0.0f32; FILTER_LANES];
        let mut ys = [0.0f32; FILTER_LANES];
        for (block, chunk) in mobs.chunks(FILTER_LANES).enumerate() {
            for (lane, mob) in chunk.iter().enumerate() {
                xs[lane] = mob.pos.x;
                ys[lane] = mob.pos.y;
            }
            let lanes = range_lanes(&xs[..chunk.len()], &ys[..chunk.len()], center, radius_sq);
            let base = block * FILTER_LANES;
            for lane in 0..chunk.len() {
                keep[base + lane] = lanes[lane];
            }
        }
    }

    let mut write = 0;
    for read in 0..mobs.len() {
        let mob = &mobs[read];
        let survives = keep[read]
            && (!filter.uses(filter_flags::TYPE) || mob.is_type(filter.type_mask))
            && filter.matches_non_range(mob);
        if survives {
            mobs.swap(write, read);
            write += 1;
        }
    }
    mobs.truncate(write);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::mob::{mob_flags, MobType};

    fn scatter(n: u32) -> Vec<Mob> {
        (0..n)
            .map(|i| {
                let t = if i % 3 == 0 { MobType::PowerCore } else { MobType::Fighter };
                Mob::new(i, t, Vec2::new((i * 7 % 41) as f32, (i * 13 % 37) as f32))
            })
            .collect()
    }

    #[test]
    fn empty_range_matches_nothing() {
        let mob = Mob::new(1, MobType::Fighter, Vec2::ZERO);
        assert!(!MobFilter::new().with_range(Vec2::ZERO, 0.0).matches(&mob));
        assert!(!MobFilter::new().with_range(Vec2::ZERO, -3.0).matches(&mob));
        assert!(!MobFilter::new().with_range(Vec2::ZERO, f32::NAN).matches(&mob));
    }

    #[test]
    fn all_active_predicates_must_accept() {
        let mob = Mob::new(1, MobType::Fighter, Vec2::new(3.0, 0.0));
        let f = MobFilter::of_type(mob_flags::FIGHTER).with_range(Vec2::ZERO, 5.0);
        assert!(f.matches(&mob));

        let wrong_type = MobFilter::of_type(mob_flags::BASE).with_range(Vec2::ZERO, 5.0);
        assert!(!wrong_type.matches(&mob));

        let too_far = MobFilter::of_type(mob_flags::FIGHTER).with_range(Vec2::ZERO, 2.0);
        assert!(!too_far.matches(&mob));
    }

    #[test]
    fn direction_filter_splits_ahead_and_behind() {
        let ahead = Mob::new(1, MobType::Fighter, Vec2::new(5.0, 1.0));
        let behind = Mob::new(2, MobType::Fighter, Vec2::new(-5.0, 1.0));
        let f = MobFilter::new().with_direction(Vec2::ZERO, Vec2::X, true);
        assert!(f.matches(&ahead));
        assert!(!f.matches(&behind));
        let b = MobFilter::new().with_direction(Vec2::ZERO, Vec2::X, false);
        assert!(b.matches(&behind));
    }

    #[test]
    fn custom_fn_is_consulted() {
        let even = |m: &Mob| m.id.0 % 2 == 0;
        let f = MobFilter::new().with_fn(&even);
        assert!(f.matches(&Mob::new(4, MobType::Missile, Vec2::ZERO)));
        assert!(!f.matches(&Mob::new(5, MobType::Missile, Vec2::ZERO)));
    }

    #[test]
    fn batched_filter_matches_scalar_order() {
        // 29 mobs: three full blocks plus a ragged tail.
        let mobs = scatter(29);
        let odd = |m: &Mob| m.id.0 % 2 == 1;
        let filter = MobFilter::of_type(mob_flags::FIGHTER)
            .with_range(Vec2::new(20.0, 18.0), 17.0)
            .with_fn(&odd);

        let scalar: Vec<_> = mobs.iter().filter(|m| filter.matches(m)).map(|m| m.id).collect();

        let mut batched = mobs.clone();
        filter_mobs(&mut batched, &filter);
        let batched: Vec<_> = batched.iter().map(|m| m.id).collect();

        assert!(!scalar.is_empty());
        assert_eq!(scalar, batched);
    }

    #[test]
    fn batched_empty_filter_clears() {
        let mut mobs = scatter(10);
        filter_mobs(&mut mobs, &MobFilter::new().with_range(Vec2::ZERO, 0.0));
        assert!(mobs.is_empty());
    }
}

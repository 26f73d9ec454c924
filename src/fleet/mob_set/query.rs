use bevy::prelude::*;
use smallvec::SmallVec;

use super::MobSet;
use crate::fleet::filter::MobFilter;
use crate::fleet::mob::Mob;

impl MobSet {
    /// Closest mob to `pos` accepted by `filter`.
    ///
    /// Equivalent to `find_nth_closest(pos, filter, 0)` without the sort.
    pub fn find_closest(&self, pos: Vec2, filter: &MobFilter) -> Option<&Mob> {
        if filter.is_empty() {
            return None;
        }
        let mut best: Option<(f32, &Mob)> = None;
        for mob in self.mobs.iter().filter(|m| filter.matches(m)) {
            let d = mob.pos.distance_squared(pos);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, mob));
            }
        }
        best.map(|(_, m)| m)
    }

    /// Farthest mob from `pos` accepted by `filter`.
    pub fn find_farthest(&self, pos: Vec2, filter: &MobFilter) -> Option<&Mob> {
        if filter.is_empty() {
            return None;
        }
        let mut best: Option<(f32, &Mob)> = None;
        for mob in self.mobs.iter().filter(|m| filter.matches(m)) {
            let d = mob.pos.distance_squared(pos);
            if best.map_or(true, |(bd, _)| d > bd) {
                best = Some((d, mob));
            }
        }
        best.map(|(_, m)| m)
    }

    /// The `n`-th closest (0-based) mob to `pos` accepted by `filter`.
    ///
    /// Candidates are sorted by squared distance with a stable sort, so equal
    /// distances keep storage order. Returns `None` when fewer than `n + 1`
    /// mobs match.
    pub fn find_nth_closest(&self, pos: Vec2, filter: &MobFilter, n: usize) -> Option<&Mob> {
        if filter.is_empty() {
            return None;
        }
        let mut candidates: SmallVec<[(f32, usize); 32]> = self
            .mobs
            .iter()
            .enumerate()
            .filter(|(_, m)| filter.matches(m))
            .map(|(i, m)| (m.pos.distance_squared(pos), i))
            .collect();

        if n >= candidates.len() {
            return None;
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.get(n).map(|&(_, i)| &self.mobs[i])
    }

    /// Number of mobs accepted by `filter`.
    pub fn count(&self, filter: &MobFilter) -> usize {
        if filter.is_empty() {
            return 0;
        }
        self.mobs.iter().filter(|m| filter.matches(m)).count()
    }

    /// Mean of `f(mob)` over accepted mobs, `None` when nothing matches.
    pub(crate) fn average_of(&self, filter: &MobFilter, f: impl Fn(&Mob) -> Vec2) -> Option<Vec2> {
        if filter.is_empty() {
            return None;
        }
        let mut sum = Vec2::ZERO;
        let mut n = 0usize;
        for mob in self.mobs.iter().filter(|m| filter.matches(m)) {
            sum += f(mob);
            n += 1;
        }
        (n > 0).then(|| sum / n as f32)
    }
}

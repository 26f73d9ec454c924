use rustc_hash::FxHashMap;

use crate::fleet::mob::{Mob, MobId, MobType};

mod query;
#[cfg(test)]
mod tests;

/// Indexed collection of mob snapshots.
///
/// Snapshots live in a dense `Vec` so scans stay cache friendly; an
/// id → index map gives O(1) lookup, update and removal.
///
/// # Invariants
///
/// - `index[id] == i` iff `mobs[i].id == id`
/// - `type_counts[t]` equals the number of stored mobs of type `t`
/// - `base_index`, when set, points at a stored base
///
/// # Removal
///
/// Removal swaps the last snapshot into the freed slot, so iteration order is
/// not stable across removals. Use [`MobSet::cursor`] to remove while
/// iterating.
#[derive(Clone, Debug, Default)]
pub struct MobSet {
    mobs: Vec<Mob>,
    index: FxHashMap<MobId, usize>,
    base_index: Option<usize>,
    type_counts: [usize; MobType::COUNT],
}

impl MobSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mobs: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            base_index: None,
            type_counts: [0; MobType::COUNT],
        }
    }

    /// Insert a new snapshot or overwrite the stored one with the same id.
    pub fn update_mob(&mut self, mob: &Mob) {
        if let Some(&i) = self.index.get(&mob.id) {
            debug_assert_eq!(
                self.mobs[i].mob_type, mob.mob_type,
                "mob {:?} changed type across updates",
                mob.id
            );
            self.mobs[i] = *mob;
            return;
        }

        let i = self.mobs.len();
        self.mobs.push(*mob);
        self.index.insert(mob.id, i);
        self.type_counts[mob.mob_type.index()] += 1;
        if mob.mob_type == MobType::Base {
            self.base_index = Some(i);
        }
    }

    /// Remove a snapshot by id. Absent ids are ignored.
    pub fn remove_mob(&mut self, id: MobId) -> Option<Mob> {
        let i = self.index.remove(&id)?;
        let removed = self.mobs.swap_remove(i);
        self.type_counts[removed.mob_type.index()] -= 1;

        if self.base_index == Some(i) {
            self.base_index = None;
        }

        // The former last element now sits in slot i.
        if i < self.mobs.len() {
            let moved_id = self.mobs[i].id;
            self.index.insert(moved_id, i);
            if self.base_index == Some(self.mobs.len()) {
                self.base_index = Some(i);
            }
        }

        Some(removed)
    }

    pub fn clear(&mut self) {
        self.mobs.clear();
        self.index.clear();
        self.base_index = None;
        self.type_counts = [0; MobType::COUNT];
    }

    #[inline]
    pub fn get(&self, id: MobId) -> Option<&Mob> {
        self.index.get(&id).map(|&i| &self.mobs[i])
    }

    #[inline]
    pub fn contains(&self, id: MobId) -> bool {
        self.index.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mobs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mob> {
        self.mobs.iter()
    }

    pub fn as_slice(&self) -> &[Mob] {
        &self.mobs
    }

    /// Number of stored mobs whose type bit is set in `type_mask`.
    pub fn num_mobs(&self, type_mask: u32) -> usize {
        MobType::ALL
            .iter()
            .filter(|t| t.flag() & type_mask != 0)
            .map(|t| self.type_counts[t.index()])
            .sum()
    }

    /// The tracked base, from the cache when it is valid.
    ///
    /// After the cached base was removed this falls back to a linear scan;
    /// call [`MobSet::cache_base`] to store the result of that scan.
    pub fn get_base(&self) -> Option<&Mob> {
        if let Some(i) = self.base_index {
            return self.mobs.get(i);
        }
        if self.type_counts[MobType::Base.index()] == 0 {
            return None;
        }
        self.mobs.iter().find(|m| m.mob_type == MobType::Base)
    }

    /// Re-run the base scan and cache the result.
    pub fn cache_base(&mut self) -> Option<&Mob> {
        if self.base_index.is_none() && self.type_counts[MobType::Base.index()] > 0 {
            self.base_index = self.mobs.iter().position(|m| m.mob_type == MobType::Base);
        }
        self.base_index.map(|i| &self.mobs[i])
    }

    /// Keep only the mobs for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Mob) -> bool) {
        let mut cursor = self.cursor();
        while let Some(mob) = cursor.next() {
            if !keep(mob) {
                cursor.remove_current();
            }
        }
    }

    /// Iterate with the option of removing the element just returned.
    pub fn cursor(&mut self) -> MobCursor<'_> {
        let num_mobs = self.mobs.len();
        MobCursor {
            set: self,
            next_index: 0,
            current: None,
            num_returned: 0,
            num_mobs,
        }
    }
}

/// Removal-safe iteration over a [`MobSet`].
///
/// ```rust
/// use armada::fleet::mob::{Mob, MobType};
/// use armada::fleet::mob_set::MobSet;
/// use bevy::math::Vec2;
///
/// let mut set = MobSet::new();
/// for id in 0..4 {
///     set.update_mob(&Mob::new(id, MobType::Fighter, Vec2::ZERO));
/// }
///
/// let mut cursor = set.cursor();
/// while let Some(mob) = cursor.next() {
///     if mob.id.0 % 2 == 0 {
///         cursor.remove_current();
///     }
/// }
/// assert_eq!(set.len(), 2);
/// ```
pub struct MobCursor<'a> {
    set: &'a mut MobSet,
    next_index: usize,
    current: Option<usize>,
    num_returned: usize,
    num_mobs: usize,
}

impl<'a> MobCursor<'a> {
    #[inline]
    pub fn has_next(&self) -> bool {
        self.num_returned < self.num_mobs
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Mob> {
        if !self.has_next() {
            self.current = None;
            return None;
        }
        let i = self.next_index;
        self.next_index += 1;
        self.num_returned += 1;
        self.current = Some(i);
        self.set.mobs.get(i)
    }

    /// Remove the element returned by the last [`MobCursor::next`].
    pub fn remove_current(&mut self) -> Option<Mob> {
        let Some(i) = self.current.take() else {
            debug_assert!(false, "remove_current called without a current element");
            return None;
        };
        let id = self.set.mobs[i].id;
        let removed = self.set.remove_mob(id);

        // The last element was swapped into slot i and has not been returned
        // yet, so revisit the slot.
        self.next_index = i;
        self.num_returned -= 1;
        self.num_mobs -= 1;
        removed
    }
}

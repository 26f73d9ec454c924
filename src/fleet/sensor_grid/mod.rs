//! Per-fleet picture of the battlefield.
//!
//! [`SensorGrid`] keeps two [`MobSet`]s: `friends`, rebuilt from ground truth
//! every tick, and `targets`, inferred knowledge of enemy and neutral mobs
//! carried across ticks. A target leaves `targets` in one of two ways:
//!
//! - **Confirmed absent**: a friendly sensor circle covers its last known
//!   position this tick and the fresh contacts do not report it again.
//! - **Stale**: it has not been observed for longer than its type's budget
//!   (bases never go stale).
//!
//! [`MappingSensorGrid`] layers an exploration bitmap on top.

use armada_macros::profile;
use bevy::prelude::*;
use rustc_hash::FxHashMap;

use crate::fleet::config::FleetSettings;
use crate::fleet::filter::MobFilter;
use crate::fleet::mob::{mob_flags, FleetInput, Mob, MobId, MobType};
use crate::fleet::mob_set::MobSet;

mod mapping;

pub use mapping::MappingSensorGrid;

/// What a governor needs from its sensor layer.
pub trait Sensor: Send + Sync {
    /// Ingest one tick of input. Repeated calls for the same tick are no-ops.
    fn update_tick(&mut self, tick: u64, input: &FleetInput);

    fn grid(&self) -> &SensorGrid;

    /// Best known enemy base position.
    fn enemy_base_guess(&self) -> Option<Vec2> {
        self.grid().enemy_base().map(|base| base.pos)
    }

    /// A point the fleet has not looked at recently, if the sensor maps.
    fn unexplored_focus(&self) -> Option<Vec2> {
        None
    }
}

#[derive(Clone, Debug)]
pub struct SensorGrid {
    friends: MobSet,
    targets: MobSet,
    last_seen: FxHashMap<MobId, u64>,
    stale_core_time: u64,
    stale_fighter_time: u64,
    last_tick: Option<u64>,
    enemy_bases_destroyed: u32,
}

impl SensorGrid {
    pub fn new(stale_core_time: u64, stale_fighter_time: u64) -> Self {
        Self {
            friends: MobSet::new(),
            targets: MobSet::new(),
            last_seen: FxHashMap::default(),
            stale_core_time,
            stale_fighter_time,
            last_tick: None,
            enemy_bases_destroyed: 0,
        }
    }

    pub fn from_settings(settings: &FleetSettings) -> Self {
        Self::new(settings.stale_core_time, settings.stale_fighter_time)
    }

    /// Ticks a target of this type may go unobserved. `None` never expires.
    pub fn stale_budget(&self, mob_type: MobType) -> Option<u64> {
        match mob_type {
            MobType::Base => None,
            MobType::PowerCore => Some(self.stale_core_time),
            MobType::Fighter | MobType::Missile => Some(self.stale_fighter_time),
        }
    }

    /// Last tick processed by [`SensorGrid::update_tick`].
    pub fn tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn friends(&self) -> &MobSet {
        &self.friends
    }

    pub fn targets(&self) -> &MobSet {
        &self.targets
    }

    pub fn last_seen_tick(&self, id: MobId) -> Option<u64> {
        self.last_seen.get(&id).copied()
    }

    /// Running total of tracked enemy bases that disappeared.
    pub fn enemy_bases_destroyed(&self) -> u32 {
        self.enemy_bases_destroyed
    }

    /// Bring the grid up to date with `tick`.
    ///
    /// Order matters: friends are rebuilt first (evicting every target inside
    /// a friendly sensor circle), then loot and contacts re-add whatever is
    /// really there, then stale targets are swept.
    #[profile(2)]
    pub fn update_tick(&mut self, tick: u64, input: &FleetInput) {
        if let Some(last) = self.last_tick {
            debug_assert!(tick >= last, "sensor grid tick went backwards: {} < {}", tick, last);
            if tick <= last {
                return;
            }
        }
        self.last_tick = Some(tick);

        let bases_before = self.targets.num_mobs(mob_flags::BASE);

        self.refresh_friends(input);
        self.ingest_loot(tick, input);
        self.ingest_contacts(tick, input);
        self.evict_stale(tick);

        self.friends.cache_base();
        self.targets.cache_base();

        let bases_after = self.targets.num_mobs(mob_flags::BASE);
        if bases_after < bases_before {
            let lost = (bases_before - bases_after) as u32;
            self.enemy_bases_destroyed += lost;
            info!(
                "Tick {}: lost track of {} enemy base(s), {} total",
                tick, lost, self.enemy_bases_destroyed
            );
        }

        debug_assert_eq!(self.targets.len(), self.last_seen.len());
        crate::profile_log!(
            tick,
            "[SENSOR] friends: {}, targets: {}",
            self.friends.len(),
            self.targets.len()
        );
    }

    fn refresh_friends(&mut self, input: &FleetInput) {
        self.friends.clear();
        for mob in input.friends.iter().filter(|m| m.alive) {
            if mob.mob_type == MobType::PowerCore {
                continue;
            }
            self.friends.update_mob(mob);

            let radius = mob.mob_type.sensor_radius();
            let covered = MobFilter::new().with_range(mob.pos, radius);
            let last_seen = &mut self.last_seen;
            let mut cursor = self.targets.cursor();
            while let Some(target) = cursor.next() {
                if covered.matches(target) {
                    let id = target.id;
                    cursor.remove_current();
                    last_seen.remove(&id);
                    trace!("Target {:?} covered by {:?}, dropping until re-sighted", id, mob.id);
                }
            }
        }
    }

    /// Power cores in the friendly list are loot visible to everyone.
    fn ingest_loot(&mut self, tick: u64, input: &FleetInput) {
        for core in input
            .friends
            .iter()
            .filter(|m| m.alive && m.mob_type == MobType::PowerCore)
        {
            self.targets.update_mob(core);
            self.last_seen.insert(core.id, tick);
        }
    }

    fn ingest_contacts(&mut self, tick: u64, input: &FleetInput) {
        for contact in &input.sensor_contacts {
            if contact.alive {
                self.targets.update_mob(contact);
                self.last_seen.insert(contact.id, tick);
            } else {
                self.targets.remove_mob(contact.id);
                self.last_seen.remove(&contact.id);
            }
        }
    }

    fn evict_stale(&mut self, tick: u64) {
        let core_budget = self.stale_core_time;
        let fighter_budget = self.stale_fighter_time;
        let last_seen = &mut self.last_seen;
        let mut cursor = self.targets.cursor();
        while let Some(target) = cursor.next() {
            let budget = match target.mob_type {
                MobType::Base => continue,
                MobType::PowerCore => core_budget,
                MobType::Fighter | MobType::Missile => fighter_budget,
            };
            let id = target.id;
            let seen = last_seen.get(&id).copied().unwrap_or(tick);
            if tick - seen > budget {
                cursor.remove_current();
                last_seen.remove(&id);
                debug!("Target {:?} stale since tick {}, evicted at {}", id, seen, tick);
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn friend_base(&self) -> Option<&Mob> {
        self.friends.get_base()
    }

    pub fn enemy_base(&self) -> Option<&Mob> {
        self.targets.get_base()
    }

    pub fn find_closest_friend(&self, pos: Vec2, type_mask: u32, max_range: Option<f32>) -> Option<&Mob> {
        let filter = MobFilter::of_type(type_mask).with_max_range(pos, max_range);
        self.friends.find_closest(pos, &filter)
    }

    pub fn find_farthest_friend(&self, pos: Vec2, type_mask: u32, max_range: Option<f32>) -> Option<&Mob> {
        let filter = MobFilter::of_type(type_mask).with_max_range(pos, max_range);
        self.friends.find_farthest(pos, &filter)
    }

    pub fn find_nth_closest_friend(
        &self,
        pos: Vec2,
        type_mask: u32,
        max_range: Option<f32>,
        n: usize,
    ) -> Option<&Mob> {
        let filter = MobFilter::of_type(type_mask).with_max_range(pos, max_range);
        self.friends.find_nth_closest(pos, &filter, n)
    }

    pub fn find_closest_target(&self, pos: Vec2, type_mask: u32, max_range: Option<f32>) -> Option<&Mob> {
        let filter = MobFilter::of_type(type_mask).with_max_range(pos, max_range);
        self.targets.find_closest(pos, &filter)
    }

    pub fn find_farthest_target(&self, pos: Vec2, type_mask: u32, max_range: Option<f32>) -> Option<&Mob> {
        let filter = MobFilter::of_type(type_mask).with_max_range(pos, max_range);
        self.targets.find_farthest(pos, &filter)
    }

    pub fn find_nth_closest_target(
        &self,
        pos: Vec2,
        type_mask: u32,
        max_range: Option<f32>,
        n: usize,
    ) -> Option<&Mob> {
        let filter = MobFilter::of_type(type_mask).with_max_range(pos, max_range);
        self.targets.find_nth_closest(pos, &filter, n)
    }

    pub fn num_friends_in_range(&self, type_mask: u32, pos: Vec2, radius: f32) -> usize {
        self.friends
            .count(&MobFilter::of_type(type_mask).with_range(pos, radius))
    }

    pub fn num_targets_in_range(&self, type_mask: u32, pos: Vec2, radius: f32) -> usize {
        self.targets
            .count(&MobFilter::of_type(type_mask).with_range(pos, radius))
    }

    /// Mean velocity of matching friends within `radius` of `pos`.
    pub fn friend_avg_velocity(&self, pos: Vec2, radius: f32, type_mask: u32) -> Option<Vec2> {
        let filter = MobFilter::of_type(type_mask).with_range(pos, radius);
        self.friends.average_of(&filter, Mob::velocity)
    }

    /// Centroid of matching friends within `radius` of `pos`.
    pub fn friend_avg_pos(&self, pos: Vec2, radius: f32, type_mask: u32) -> Option<Vec2> {
        let filter = MobFilter::of_type(type_mask).with_range(pos, radius);
        self.friends.average_of(&filter, |m| m.pos)
    }
}

impl Sensor for SensorGrid {
    fn update_tick(&mut self, tick: u64, input: &FleetInput) {
        SensorGrid::update_tick(self, tick, input);
    }

    fn grid(&self) -> &SensorGrid {
        self
    }
}

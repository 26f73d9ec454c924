use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Sensor, SensorGrid};
use crate::fleet::config::FleetSettings;
use crate::fleet::filter::MobFilter;
use crate::fleet::math::MapBounds;
use crate::fleet::mob::{mob_flags, FleetInput, Mob, MobType};

/// Compass offsets (in half tiles) sampled around each scouting fighter.
const SCAN_OFFSETS: [(f32, f32); 9] = [
    (0.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (1.0, 1.0),
    (1.0, -1.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
];

/// Sensor grid that also remembers where the fleet has looked.
///
/// The battlefield is cut into square tiles with two bits each:
/// - **ever scanned**: some fighter has passed over it
/// - **recently scanned**: same, but cleared every
///   `recently_scanned_reset_ticks`
///
/// Each fighter marks the tile under it plus the tiles half a tile away in
/// the eight compass directions. That under-approximates a full sensor sweep,
/// and repeated ticks fill the gaps as fighters move.
///
/// From the bitmaps the grid derives:
/// - an **enemy base guess**: the real base when tracked, otherwise the
///   first never-scanned tile of a randomized sweep
/// - an **unexplored focus**: the same sweep over the recent bitmap
/// - a **farthest target shadow**: a copy of the ship-type target farthest
///   from the friendly base
#[derive(Clone, Debug)]
pub struct MappingSensorGrid {
    grid: SensorGrid,
    bounds: MapBounds,
    tile_size: f32,
    cols: usize,
    rows: usize,
    ever_scanned: FixedBitSet,
    recently_scanned: FixedBitSet,
    reset_ticks: u64,
    move_focus_ticks: u64,

    enemy_base_guess: Option<Vec2>,
    no_more_guesses: bool,
    unexplored_focus: Option<Vec2>,
    focus_needs_move: bool,
    farthest_target: Option<Mob>,

    rng: StdRng,
}

impl MappingSensorGrid {
    pub fn new(settings: &FleetSettings) -> Self {
        let bounds = settings.bounds();
        let tile_size = settings.scan_tile_size.max(1.0);
        let cols = ((bounds.width / tile_size).ceil() as usize).max(1);
        let rows = ((bounds.height / tile_size).ceil() as usize).max(1);

        Self {
            grid: SensorGrid::from_settings(settings),
            bounds,
            tile_size,
            cols,
            rows,
            ever_scanned: FixedBitSet::with_capacity(cols * rows),
            recently_scanned: FixedBitSet::with_capacity(cols * rows),
            reset_ticks: settings.recently_scanned_reset_ticks,
            move_focus_ticks: settings.recently_scanned_move_focus_ticks,
            enemy_base_guess: None,
            no_more_guesses: false,
            unexplored_focus: None,
            focus_needs_move: true,
            farthest_target: None,
            rng: StdRng::seed_from_u64(settings.seed ^ 0x6d61_7070),
        }
    }

    pub fn grid(&self) -> &SensorGrid {
        &self.grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn enemy_base_guess(&self) -> Option<Vec2> {
        self.enemy_base_guess
    }

    /// Every tile has been scanned and no base is tracked.
    pub fn no_more_guesses(&self) -> bool {
        self.no_more_guesses
    }

    pub fn unexplored_focus(&self) -> Option<Vec2> {
        self.unexplored_focus
    }

    /// Point-in-time copy of the farthest tracked ship.
    pub fn farthest_target(&self) -> Option<&Mob> {
        self.farthest_target.as_ref()
    }

    pub fn is_ever_scanned(&self, pos: Vec2) -> bool {
        self.tile_index(pos).map_or(false, |i| self.ever_scanned[i])
    }

    pub fn is_recently_scanned(&self, pos: Vec2) -> bool {
        self.tile_index(pos).map_or(false, |i| self.recently_scanned[i])
    }

    pub fn ever_scanned_count(&self) -> usize {
        self.ever_scanned.count_ones(..)
    }

    pub fn update_tick(&mut self, tick: u64, input: &FleetInput) {
        if self.grid.tick().is_some_and(|last| tick <= last) {
            self.grid.update_tick(tick, input);
            return;
        }
        self.grid.update_tick(tick, input);

        if self.reset_ticks > 0 && tick % self.reset_ticks == 0 {
            self.recently_scanned.clear();
            self.focus_needs_move = true;
        }
        if self.move_focus_ticks > 0 && tick % self.move_focus_ticks == 0 {
            self.focus_needs_move = true;
        }

        self.mark_scanned();
        self.update_enemy_base_guess(tick);
        self.update_unexplored_focus();
        self.update_farthest_target();
    }

    fn tile_index(&self, pos: Vec2) -> Option<usize> {
        if !self.bounds.contains(pos) {
            return None;
        }
        let col = ((pos.x / self.tile_size) as usize).min(self.cols - 1);
        let row = ((pos.y / self.tile_size) as usize).min(self.rows - 1);
        Some(row * self.cols + col)
    }

    fn tile_center(&self, index: usize) -> Vec2 {
        let col = index % self.cols;
        let row = index / self.cols;
        let center = Vec2::new(
            (col as f32 + 0.5) * self.tile_size,
            (row as f32 + 0.5) * self.tile_size,
        );
        self.bounds.clamp(center)
    }

    fn mark_scanned(&mut self) {
        let half = self.tile_size / 2.0;
        let mut marks = Vec::new();
        for mob in self
            .grid
            .friends()
            .iter()
            .filter(|m| m.alive && m.mob_type == MobType::Fighter)
        {
            for (dx, dy) in SCAN_OFFSETS {
                let p = mob.pos + Vec2::new(dx * half, dy * half);
                if let Some(i) = self.tile_index(p) {
                    marks.push(i);
                }
            }
        }
        for i in marks {
            self.ever_scanned.insert(i);
            self.recently_scanned.insert(i);
        }
    }

    /// First unset tile of a sweep that starts at a random row and column.
    fn sweep_unscanned(rng: &mut StdRng, bits: &FixedBitSet, cols: usize, rows: usize) -> Option<usize> {
        let start_col = rng.random_range(0..cols);
        let start_row = rng.random_range(0..rows);
        for r in 0..rows {
            let row = (start_row + r) % rows;
            for c in 0..cols {
                let col = (start_col + c) % cols;
                let i = row * cols + col;
                if !bits[i] {
                    return Some(i);
                }
            }
        }
        None
    }

    fn update_enemy_base_guess(&mut self, tick: u64) {
        if let Some(base) = self.grid.enemy_base() {
            self.enemy_base_guess = Some(base.pos);
            self.no_more_guesses = false;
            return;
        }

        if let Some(guess) = self.enemy_base_guess {
            if !self.is_ever_scanned(guess) {
                return;
            }
        }

        if self.no_more_guesses {
            self.enemy_base_guess = None;
            return;
        }

        match Self::sweep_unscanned(&mut self.rng, &self.ever_scanned, self.cols, self.rows) {
            Some(i) => {
                let guess = self.tile_center(i);
                debug!("Tick {}: new enemy base guess at {:?}", tick, guess);
                self.enemy_base_guess = Some(guess);
            }
            None => {
                info!("Tick {}: whole map scanned, no enemy base guess left", tick);
                self.enemy_base_guess = None;
                self.no_more_guesses = true;
            }
        }
    }

    fn update_unexplored_focus(&mut self) {
        let stale = match self.unexplored_focus {
            Some(focus) => self.is_recently_scanned(focus),
            None => true,
        };
        if !stale && !self.focus_needs_move {
            return;
        }
        self.focus_needs_move = false;
        self.unexplored_focus =
            Self::sweep_unscanned(&mut self.rng, &self.recently_scanned, self.cols, self.rows)
                .map(|i| self.tile_center(i));
    }

    fn update_farthest_target(&mut self) {
        let origin = self.grid.friend_base().map_or(Vec2::ZERO, |b| b.pos);
        self.farthest_target = self
            .grid
            .targets()
            .find_farthest(origin, &MobFilter::of_type(mob_flags::SHIP))
            .copied();
    }
}

impl Sensor for MappingSensorGrid {
    fn update_tick(&mut self, tick: u64, input: &FleetInput) {
        MappingSensorGrid::update_tick(self, tick, input);
    }

    fn grid(&self) -> &SensorGrid {
        &self.grid
    }

    fn enemy_base_guess(&self) -> Option<Vec2> {
        self.enemy_base_guess
    }

    fn unexplored_focus(&self) -> Option<Vec2> {
        self.unexplored_focus
    }
}

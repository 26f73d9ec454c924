use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::math::MapBounds;

/// Fleet-wide settings fixed for the lifetime of a governor.
///
/// Loaded once from a RON file (`assets/fleet_settings.ron` by default).
/// Missing fields fall back to [`FleetSettings::default`]; a missing or
/// malformed file is logged and the defaults are used wholesale.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FleetSettings {
    // Battlefield
    pub map_width: f32,
    pub map_height: f32,

    // Target tracking (ticks a target may go unobserved before eviction)
    pub stale_core_time: u64,
    pub stale_fighter_time: u64,

    // Exploration map
    pub scan_tile_size: f32,
    pub recently_scanned_reset_ticks: u64,
    pub recently_scanned_move_focus_ticks: u64,

    // Movement
    pub fighter_speed: f32,
    pub missile_speed: f32,

    /// Seed for every random draw a governor makes (jitter, sweeps, waypoints).
    pub seed: u64,
}

pub const DEFAULT_SETTINGS_PATH: &str = "assets/fleet_settings.ron";

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            map_width: 1600.0,
            map_height: 1200.0,
            stale_core_time: 20,
            stale_fighter_time: 2,
            scan_tile_size: 100.0,
            recently_scanned_reset_ticks: 1000,
            recently_scanned_move_focus_ticks: 250,
            fighter_speed: 2.5,
            missile_speed: 5.0,
            seed: 0x5eed,
        }
    }
}

impl FleetSettings {
    pub fn bounds(&self) -> MapBounds {
        MapBounds::new(self.map_width, self.map_height)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(contents)
    }

    /// Read settings from `path`, logging and defaulting on any failure.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_ron_str(&contents) {
                Ok(settings) => {
                    info!("Loaded fleet settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    error!("Failed to parse fleet settings: {}", e);
                    error!("Using default FleetSettings");
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                error!("Using default FleetSettings");
                Self::default()
            }
        }
    }
}

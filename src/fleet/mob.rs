/// Mob snapshots and the commands written back for them.
///
/// A [`Mob`] is a value copy of one simulation object taken once per tick.
/// The AI never touches the authoritative object; it only produces
/// [`MobCommand`]s that the simulation applies on its next physics step.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable identifier of a mob for as long as it is alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MobId(pub u32);

/// Closed set of mob kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobType {
    Base,
    Fighter,
    Missile,
    PowerCore,
}

/// Type masks for filtering, one bit per [`MobType`].
pub mod mob_flags {
    pub const NONE: u32 = 0;
    pub const BASE: u32 = 1 << 0;
    pub const FIGHTER: u32 = 1 << 1;
    pub const MISSILE: u32 = 1 << 2;
    pub const POWER_CORE: u32 = 1 << 3;
    /// Anything that can shoot back.
    pub const SHIP: u32 = BASE | FIGHTER;
    pub const ALL: u32 = BASE | FIGHTER | MISSILE | POWER_CORE;
}

impl MobType {
    pub const COUNT: usize = 4;
    pub const ALL: [MobType; Self::COUNT] = [
        MobType::Base,
        MobType::Fighter,
        MobType::Missile,
        MobType::PowerCore,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MobType::Base => 0,
            MobType::Fighter => 1,
            MobType::Missile => 2,
            MobType::PowerCore => 3,
        }
    }

    #[inline]
    pub fn flag(self) -> u32 {
        1 << self.index()
    }

    /// Radius of the circle this mob's sensors fully cover.
    pub fn sensor_radius(self) -> f32 {
        match self {
            MobType::Base => 250.0,
            MobType::Fighter => 50.0,
            MobType::Missile => 30.0,
            MobType::PowerCore => 0.0,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            MobType::Base => 50.0,
            MobType::Fighter => 5.0,
            MobType::Missile => 3.0,
            MobType::PowerCore => 2.0,
        }
    }
}

/// Movement target and spawn request for a single mob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MobCmd {
    pub target: Vec2,
    pub spawn_type: Option<MobType>,
}

/// Per-tick snapshot of a simulation object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    pub id: MobId,
    pub mob_type: MobType,
    pub pos: Vec2,
    pub last_pos: Vec2,
    pub alive: bool,
    pub fuel: i32,
    pub health: i32,
    pub cmd: MobCmd,
}

impl Mob {
    pub fn new(id: u32, mob_type: MobType, pos: Vec2) -> Self {
        Self {
            id: MobId(id),
            mob_type,
            pos,
            last_pos: pos,
            alive: true,
            fuel: 0,
            health: 1,
            cmd: MobCmd {
                target: pos,
                spawn_type: None,
            },
        }
    }

    pub fn with_last_pos(mut self, last_pos: Vec2) -> Self {
        self.last_pos = last_pos;
        self
    }

    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }

    /// Displacement over the last tick.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.last_pos
    }

    #[inline]
    pub fn is_type(&self, mask: u32) -> bool {
        self.mob_type.flag() & mask != 0
    }
}

/// Command produced by a governor for one of its mobs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MobCommand {
    pub mob_id: MobId,
    pub target: Vec2,
    pub spawn_type: Option<MobType>,
}

/// Everything a governor sees of the simulation in one tick.
#[derive(Clone, Debug, Default)]
pub struct FleetInput {
    /// Every living friendly mob with full fidelity.
    pub friends: Vec<Mob>,
    /// Enemy and neutral contacts reported by sensors, tagged alive or not.
    pub sensor_contacts: Vec<Mob>,
}

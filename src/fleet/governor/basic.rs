use armada_macros::profile;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use super::{Governor, IdleBehavior, MobContext};
use crate::fleet::bundle::BundleLive;
use crate::fleet::config::FleetSettings;
use crate::fleet::math::project_heading;
use crate::fleet::mob::{mob_flags, FleetInput, Mob, MobCommand, MobId, MobType};
use crate::fleet::registry::{ConfigError, ParamRegistry};
use crate::fleet::sensor_grid::{MappingSensorGrid, Sensor, SensorGrid};

const BASIC_DEFAULTS: &[(&str, &str)] = &[
    ("attackRange", "150"),
    ("gatherRange", "200"),
    ("guardRange", "250"),
    ("evadeRange", "80"),
    ("evadeFighters", "false"),
    ("spawnFighterRate", "0.02"),
    ("attackLead", "1.0"),
];

/// Thresholds for the fighter state machine shared by every governor.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicParams {
    pub attack_range: f32,
    pub gather_range: f32,
    /// Enemies this close to the friendly base are engaged from anywhere.
    pub guard_range: f32,
    pub evade_range: f32,
    pub evade_fighters: bool,
    /// Chance per tick that the base requests a new fighter.
    pub spawn_fighter_rate: f32,
    /// Ticks of enemy velocity to lead an intercept by.
    pub attack_lead: f32,
}

impl Default for BasicParams {
    fn default() -> Self {
        Self {
            attack_range: 150.0,
            gather_range: 200.0,
            guard_range: 250.0,
            evade_range: 80.0,
            evade_fighters: false,
            spawn_fighter_rate: 0.02,
            attack_lead: 1.0,
        }
    }
}

impl BasicParams {
    pub fn from_registry(registry: &ParamRegistry) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            attack_range: registry.f32_or("attackRange", d.attack_range)?,
            gather_range: registry.f32_or("gatherRange", d.gather_range)?,
            guard_range: registry.f32_or("guardRange", d.guard_range)?,
            evade_range: registry.f32_or("evadeRange", d.evade_range)?,
            evade_fighters: registry.bool_or("evadeFighters", d.evade_fighters)?,
            spawn_fighter_rate: registry.f32_or("spawnFighterRate", d.spawn_fighter_rate)?,
            attack_lead: registry.f32_or("attackLead", d.attack_lead)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FighterState {
    #[default]
    Idle,
    Gather,
    Attack,
    Evade,
}

struct AiRecord<S> {
    state: FighterState,
    live: BundleLive,
    behavior: S,
}

impl<S: Default> AiRecord<S> {
    fn new(slots: usize, seed: u64, id: MobId) -> Self {
        Self {
            state: FighterState::Idle,
            live: BundleLive::new(slots, seed ^ (id.0 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)),
            behavior: S::default(),
        }
    }
}

/// State-machine governor parameterised over idle behaviour.
///
/// Per tick:
/// 1. the sensor ingests the input
/// 2. records of mobs that left the friendly list are dropped
/// 3. bases maybe spawn, fighters run evade -> attack -> gather -> idle,
///    missiles home on the closest enemy ship
pub struct BasicGovernor<B: IdleBehavior> {
    settings: FleetSettings,
    params: BasicParams,
    sensor: Box<dyn Sensor>,
    behavior: B,
    records: FxHashMap<MobId, AiRecord<B::MobState>>,
    rng: StdRng,
}

impl<B: IdleBehavior> BasicGovernor<B> {
    pub fn new(settings: FleetSettings, params: BasicParams, behavior: B) -> Self {
        let sensor: Box<dyn Sensor> = if B::USES_MAPPING {
            Box::new(MappingSensorGrid::new(&settings))
        } else {
            Box::new(SensorGrid::from_settings(&settings))
        };
        let rng = StdRng::seed_from_u64(settings.seed);
        Self {
            settings,
            params,
            sensor,
            behavior,
            records: FxHashMap::default(),
            rng,
        }
    }

    /// Layer `user` over the behaviour's defaults and the shared defaults,
    /// then build.
    pub fn from_registry(settings: &FleetSettings, user: &ParamRegistry) -> Result<Self, ConfigError> {
        let registry = user.layered_over(B::DEFAULTS).layered_over(BASIC_DEFAULTS);
        let params = BasicParams::from_registry(&registry)?;
        let behavior = B::from_registry(&registry)?;
        info!(
            "Built {} governor: {} jitter slots per mob, mapping: {}",
            B::NAME,
            behavior.jitter_slots(),
            B::USES_MAPPING
        );
        Ok(Self::new(settings.clone(), params, behavior))
    }

    pub fn params(&self) -> &BasicParams {
        &self.params
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn fighter_state(&self, id: MobId) -> Option<FighterState> {
        self.records.get(&id).map(|r| r.state)
    }

    /// Number of mobs with live AI state.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    #[profile(4)]
    fn run(&mut self, tick: u64, input: &FleetInput) -> Vec<MobCommand> {
        self.sensor.update_tick(tick, input);

        let Self {
            settings,
            params,
            sensor,
            behavior,
            records,
            rng,
        } = self;
        let sensor: &dyn Sensor = &**sensor;
        let settings: &FleetSettings = settings;
        let params: &BasicParams = params;
        let friends = sensor.grid().friends();

        behavior.begin_tick(tick, sensor, settings);
        records.retain(|id, _| friends.contains(*id));

        let slots = behavior.jitter_slots();
        let mut commands = Vec::with_capacity(friends.len());
        for mob in friends.iter() {
            let (target, spawn_type) = match mob.mob_type {
                MobType::Base => (mob.pos, base_spawn(params, rng)),
                MobType::Missile => (missile_target(params, sensor.grid(), mob, settings), None),
                MobType::PowerCore => continue,
                MobType::Fighter => {
                    let record = records
                        .entry(mob.id)
                        .or_insert_with(|| AiRecord::new(slots, settings.seed, mob.id));

                    let (state, target) = match fighter_action(params, sensor.grid(), mob, settings) {
                        Some(action) => action,
                        None => {
                            let mut ctx = MobContext {
                                sensor,
                                mob,
                                tick,
                                settings,
                                live: &mut record.live,
                                rng: &mut *rng,
                            };
                            (FighterState::Idle, behavior.idle_target(&mut ctx, &mut record.behavior))
                        }
                    };
                    if record.state != state {
                        trace!("Tick {}: {:?} {:?} -> {:?}", tick, mob.id, record.state, state);
                        record.state = state;
                    }
                    (target, None)
                }
            };

            commands.push(MobCommand {
                mob_id: mob.id,
                target: settings.bounds().clamp(target),
                spawn_type,
            });
        }

        crate::profile_log!(tick, "[GOVERNOR] {}: {} commands", B::NAME, commands.len());
        commands
    }
}

fn base_spawn(params: &BasicParams, rng: &mut StdRng) -> Option<MobType> {
    let p = params.spawn_fighter_rate;
    (p.is_finite() && p > 0.0 && rng.random_bool(p.min(1.0) as f64)).then_some(MobType::Fighter)
}

fn intercept(params: &BasicParams, enemy: &Mob) -> Vec2 {
    enemy.pos + enemy.velocity() * params.attack_lead
}

fn missile_target(params: &BasicParams, grid: &SensorGrid, mob: &Mob, settings: &FleetSettings) -> Vec2 {
    match grid.find_closest_target(mob.pos, mob_flags::SHIP, None) {
        Some(enemy) => intercept(params, enemy),
        None => project_heading(mob.pos, mob.velocity(), settings.missile_speed),
    }
}

/// The non-idle part of the fighter state machine, `None` when idle.
fn fighter_action(
    params: &BasicParams,
    grid: &SensorGrid,
    mob: &Mob,
    settings: &FleetSettings,
) -> Option<(FighterState, Vec2)> {
    let pos = mob.pos;

    if params.evade_fighters {
        if let Some(threat) = grid.find_closest_target(pos, mob_flags::FIGHTER, Some(params.evade_range)) {
            let away = pos - threat.pos;
            let dir = if away == Vec2::ZERO { mob.velocity() } else { away };
            return Some((FighterState::Evade, project_heading(pos, dir, settings.fighter_speed)));
        }
    }

    let enemy = grid
        .find_closest_target(pos, mob_flags::SHIP, Some(params.attack_range))
        .or_else(|| {
            let base = grid.friend_base()?;
            grid.find_closest_target(
                base.pos,
                mob_flags::SHIP | mob_flags::MISSILE,
                Some(params.guard_range),
            )
        });
    if let Some(enemy) = enemy {
        return Some((FighterState::Attack, intercept(params, enemy)));
    }

    grid.find_closest_target(pos, mob_flags::POWER_CORE, Some(params.gather_range))
        .map(|core| (FighterState::Gather, core.pos))
}

impl<B: IdleBehavior> Governor for BasicGovernor<B> {
    fn name(&self) -> &'static str {
        B::NAME
    }

    fn run_tick(&mut self, tick: u64, input: &FleetInput) -> Vec<MobCommand> {
        self.run(tick, input)
    }

    fn sensor(&self) -> &dyn Sensor {
        self.sensor.as_ref()
    }
}

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use armada::fleet::config::DEFAULT_SETTINGS_PATH;
use armada::fleet::governor::GovernorKind;
use armada::fleet::mob::{FleetInput, Mob, MobType};
use armada::fleet::registry::ParamRegistry;
use armada::fleet::{FleetAiPlugin, FleetCommand, FleetId, FleetRoster, FleetSet, FleetSettings, FleetTick};

use std::fs;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_TICKS: u64 = 5000;
const NUM_CORES: usize = 40;
const START_FIGHTERS: usize = 8;
const MAX_FIGHTERS: usize = 60;
const BASE_HEALTH: i32 = 50;
const WEAPON_RANGE: f32 = 10.0;
const PICKUP_RANGE: f32 = 5.0;

fn setup_file_logging() -> String {
    let log_dir = PathBuf::from("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).expect("Failed to create logs directory");
    }

    // Keep only the newest 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("armada_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("armada=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &PathBuf, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("armada") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

struct Side {
    fleet: FleetId,
    mobs: Vec<Mob>,
    bases_lost: u32,
    cores_collected: u32,
}

impl Side {
    fn fighters(&self) -> usize {
        self.mobs
            .iter()
            .filter(|m| m.mob_type == MobType::Fighter)
            .count()
    }

    fn base_health(&self) -> i32 {
        self.mobs
            .iter()
            .find(|m| m.mob_type == MobType::Base)
            .map_or(0, |m| m.health)
    }
}

/// A toy two-fleet skirmish: point-mass ships, contact damage, free cores.
#[derive(Resource)]
struct Skirmish {
    settings: FleetSettings,
    sides: [Side; 2],
    cores: Vec<Mob>,
    next_id: u32,
}

impl Skirmish {
    fn new(settings: FleetSettings, fleets: [FleetId; 2]) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let bounds = settings.bounds();
        let mut next_id = 0;
        let mut id = || {
            next_id += 1;
            next_id
        };

        let base_at = [
            Vec2::new(bounds.width * 0.1, bounds.height * 0.1),
            Vec2::new(bounds.width * 0.9, bounds.height * 0.9),
        ];
        let sides = [0, 1].map(|i| {
            let mut base = Mob::new(id(), MobType::Base, base_at[i]);
            base.health = BASE_HEALTH;
            let mut mobs = vec![base];
            for _ in 0..START_FIGHTERS {
                mobs.push(Mob::new(id(), MobType::Fighter, base_at[i]));
            }
            Side {
                fleet: fleets[i],
                mobs,
                bases_lost: 0,
                cores_collected: 0,
            }
        });
        let cores = (0..NUM_CORES)
            .map(|_| {
                let pos = Vec2::new(
                    rng.random_range(0.0..bounds.width),
                    rng.random_range(0.0..bounds.height),
                );
                Mob::new(id(), MobType::PowerCore, pos)
            })
            .collect();

        Self {
            settings,
            sides,
            cores,
            next_id,
        }
    }

    /// What side `i` can see: its own mobs, plus enemies and cores inside
    /// any friendly sensor circle.
    fn observe(&self, i: usize) -> FleetInput {
        let own = &self.sides[i].mobs;
        let covered = |p: Vec2| {
            own.iter()
                .any(|m| m.pos.distance(p) <= m.mob_type.sensor_radius())
        };
        let sensor_contacts = self.sides[1 - i]
            .mobs
            .iter()
            .chain(self.cores.iter())
            .filter(|m| covered(m.pos))
            .copied()
            .collect();
        FleetInput {
            friends: own.clone(),
            sensor_contacts,
        }
    }

    fn step(&mut self) {
        let bounds = self.settings.bounds();
        for side in self.sides.iter_mut() {
            let mut spawned = Vec::new();
            let fighters = side.fighters();
            for mob in side.mobs.iter_mut() {
                mob.last_pos = mob.pos;
                let speed = match mob.mob_type {
                    MobType::Fighter => self.settings.fighter_speed,
                    MobType::Missile => self.settings.missile_speed,
                    _ => 0.0,
                };
                let to = mob.cmd.target - mob.pos;
                mob.pos = bounds.clamp(mob.pos + to.clamp_length_max(speed));

                if mob.cmd.spawn_type == Some(MobType::Fighter) && fighters + spawned.len() < MAX_FIGHTERS {
                    spawned.push(mob.pos);
                }
                mob.cmd.spawn_type = None;
            }
            for pos in spawned {
                self.next_id += 1;
                side.mobs.push(Mob::new(self.next_id, MobType::Fighter, pos));
            }
        }

        // Fighters hurt every enemy ship they touch.
        for (a, b) in [(0, 1), (1, 0)] {
            let attackers: Vec<Vec2> = self.sides[a]
                .mobs
                .iter()
                .filter(|m| m.mob_type == MobType::Fighter)
                .map(|m| m.pos)
                .collect();
            for target in self.sides[b].mobs.iter_mut() {
                let reach = WEAPON_RANGE + target.mob_type.radius();
                let hits = attackers.iter().filter(|p| p.distance(target.pos) <= reach).count();
                target.health -= hits as i32;
            }
        }

        for side in self.sides.iter_mut() {
            let before = side.mobs.len();
            let lost_base = side
                .mobs
                .iter()
                .any(|m| m.mob_type == MobType::Base && m.health <= 0);
            side.mobs.retain(|m| m.health > 0);
            if lost_base {
                side.bases_lost += 1;
                warn!("Fleet {:?} lost its base", side.fleet);
            }
            trace!("Fleet {:?} lost {} mobs", side.fleet, before - side.mobs.len());

            let fighters: Vec<Vec2> = side
                .mobs
                .iter()
                .filter(|m| m.mob_type == MobType::Fighter)
                .map(|m| m.pos)
                .collect();
            let cores_before = self.cores.len();
            self.cores
                .retain(|c| !fighters.iter().any(|p| p.distance(c.pos) <= PICKUP_RANGE));
            side.cores_collected += (cores_before - self.cores.len()) as u32;
        }
    }
}

fn submit_observations(skirmish: Res<Skirmish>, mut roster: ResMut<FleetRoster>) {
    for i in 0..2 {
        roster.submit(skirmish.sides[i].fleet, skirmish.observe(i));
    }
}

fn apply_fleet_commands(mut skirmish: ResMut<Skirmish>, mut commands: MessageReader<FleetCommand>) {
    for FleetCommand { fleet, command } in commands.read() {
        let Some(side) = skirmish.sides.iter_mut().find(|s| s.fleet == *fleet) else {
            continue;
        };
        if let Some(mob) = side.mobs.iter_mut().find(|m| m.id == command.mob_id) {
            mob.cmd.target = command.target;
            mob.cmd.spawn_type = command.spawn_type;
        }
    }
    skirmish.step();
}

fn report(tick: u64, skirmish: &Skirmish) {
    for side in &skirmish.sides {
        info!(
            "Tick {}: fleet {:?} fighters {}, base health {}, cores {}, bases lost {}",
            tick,
            side.fleet,
            side.fighters(),
            side.base_health(),
            side.cores_collected,
            side.bases_lost
        );
    }
}

fn main() {
    let log_file = setup_file_logging();
    println!("armada soak run, logging to {}", log_file);

    // armada [governor-a] [governor-b] [ticks] [params.ron]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parse_kind = |i: usize| -> GovernorKind {
        match args.get(i).map(|s| s.parse::<GovernorKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                error!("{}; using {}", e, GovernorKind::default());
                GovernorKind::default()
            }
            None => GovernorKind::default(),
        }
    };
    let kinds = [parse_kind(0), parse_kind(1)];
    let ticks = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);
    let registry = match args.get(3) {
        Some(path) => match ParamRegistry::load(path) {
            Ok(registry) => registry,
            Err(e) => {
                error!("Cannot load parameters: {}", e);
                std::process::exit(1);
            }
        },
        None => ParamRegistry::new(),
    };

    let settings = FleetSettings::load(DEFAULT_SETTINGS_PATH);

    let mut roster = FleetRoster::default();
    let mut fleets = Vec::with_capacity(2);
    for kind in kinds {
        match kind.build(&settings, &registry) {
            Ok(governor) => fleets.push(roster.add(governor)),
            Err(e) => {
                error!("Cannot build {} governor: {}", kind, e);
                std::process::exit(1);
            }
        }
    }
    let fleets = [fleets[0], fleets[1]];

    let mut app = App::new();
    app.add_plugins(FleetAiPlugin)
        .insert_resource(roster)
        .insert_resource(Skirmish::new(settings, fleets))
        .add_systems(
            Update,
            (
                submit_observations.before(FleetSet::Govern),
                apply_fleet_commands.after(FleetSet::Govern),
            ),
        );

    info!("{} vs {} for {} ticks", kinds[0], kinds[1], ticks);
    for _ in 0..ticks {
        app.update();
        let tick = app.world().resource::<FleetTick>().0;
        if tick % 500 == 0 {
            report(tick, app.world().resource::<Skirmish>());
        }
    }
    report(
        app.world().resource::<FleetTick>().0,
        app.world().resource::<Skirmish>(),
    );
}

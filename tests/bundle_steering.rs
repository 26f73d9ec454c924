use bevy::math::Vec2;

use armada::fleet::bundle::{steer_target, BundleCheck, BundleEval, BundleLive, BundleLoader};
use armada::fleet::config::FleetSettings;
use armada::fleet::mob::{mob_flags, FleetInput, Mob, MobId, MobType};
use armada::fleet::registry::{ConfigError, ParamRegistry};
use armada::fleet::sensor_grid::{MappingSensorGrid, Sensor, SensorGrid};

const PARAMS: &str = r#"{
    "pull.weight.valueType": "periodic",
    "pull.weight.value.value": "10",
    "pull.weight.period.value": "100",
    "pull.weight.amplitude.value": "0.5",
    "pull.weight.tickShift.value": "0",
    "pull.range.check": "always",
    "pull.crowd.check": "always",

    "gang.weight.value.value": "1",
    "gang.range.check": "always",
    "gang.crowd.check": "strictOn",
    "gang.crowd.size.value.value": "3",
    "gang.crowd.radius.value.value": "50",
}"#;

fn fighter(id: u32, x: f32, y: f32) -> Mob {
    Mob::new(id, MobType::Fighter, Vec2::new(x, y))
}

#[test]
fn registry_file_drives_a_periodic_force() {
    let registry = ParamRegistry::from_ron_str(PARAMS).unwrap();
    let mut loader = BundleLoader::new(&registry);
    let pull = loader.force("pull").unwrap();
    assert_eq!(pull.range.check, BundleCheck::Always);

    let mut grid = SensorGrid::new(20, 2);
    let me = fighter(1, 100.0, 100.0);
    grid.update_tick(25, &FleetInput {
        friends: vec![me],
        sensor_contacts: vec![],
    });

    let mut live = BundleLive::new(loader.slot_count(), 3);
    let mut eval = BundleEval::new(&grid, &me, 25, &mut live);
    let mut force = Vec2::ZERO;
    assert!(eval.apply_bundle(&mut force, &pull, Vec2::new(200.0, 100.0)));

    // 10 * (1 + 0.5 * sin(25 / 100))
    assert!((force.x - 11.237).abs() < 1e-3, "got {force}");
    assert!(force.y.abs() < 1e-3);
}

#[test]
fn crowd_gate_needs_company() {
    let registry = ParamRegistry::from_ron_str(PARAMS).unwrap();
    let mut loader = BundleLoader::new(&registry);
    let gang = loader.force("gang").unwrap();
    let focus = Vec2::new(500.0, 500.0);

    let lonely = fighter(1, 100.0, 100.0);
    let mut grid = SensorGrid::new(20, 2);
    grid.update_tick(1, &FleetInput {
        friends: vec![lonely, fighter(2, 120.0, 100.0), fighter(3, 400.0, 400.0)],
        sensor_contacts: vec![],
    });
    let mut live = BundleLive::new(loader.slot_count(), 3);
    let mut force = Vec2::ZERO;
    assert!(!BundleEval::new(&grid, &lonely, 1, &mut live).apply_bundle(&mut force, &gang, focus));
    assert_eq!(force, Vec2::ZERO);

    grid.update_tick(2, &FleetInput {
        friends: vec![lonely, fighter(2, 120.0, 100.0), fighter(3, 100.0, 130.0)],
        sensor_contacts: vec![],
    });
    assert!(BundleEval::new(&grid, &lonely, 2, &mut live).apply_bundle(&mut force, &gang, focus));
    assert!(force.x > 0.0 && force.y > 0.0);
    assert_eq!(grid.num_friends_in_range(mob_flags::FIGHTER, lonely.pos, 50.0), 3);
}

#[test]
fn typo_in_check_is_reported_with_its_key() {
    let registry = ParamRegistry::from_pairs([("pull.crowd.check", "StrictOn")]);
    let mut loader = BundleLoader::new(&registry);
    match loader.force("pull") {
        Err(ConfigError::UnknownCheck { key, value }) => {
            assert_eq!(key, "pull.crowd.check");
            assert_eq!(value, "StrictOn");
        }
        other => panic!("expected an unknown check error, got {other:?}"),
    }
}

#[test]
fn steering_falls_back_to_heading() {
    let pos = Vec2::new(10.0, 10.0);
    assert_eq!(
        steer_target(pos, Vec2::new(0.0, 3.0), Vec2::ZERO, 2.0),
        Vec2::new(10.0, 12.0)
    );
    assert_eq!(
        steer_target(pos, Vec2::ZERO, Vec2::new(-5.0, 0.0), 2.0),
        Vec2::new(8.0, 10.0)
    );
}

#[test]
fn nth_closest_target_through_the_grid() {
    let mut grid = SensorGrid::new(20, 20);
    let contacts = [5.0, 10.0, 15.0]
        .iter()
        .enumerate()
        .map(|(i, x)| fighter(10 + i as u32, 1000.0 + x, 1000.0))
        .collect();
    grid.update_tick(1, &FleetInput {
        friends: vec![],
        sensor_contacts: contacts,
    });

    let origin = Vec2::new(1000.0, 1000.0);
    let nth = |n| grid.find_nth_closest_target(origin, mob_flags::SHIP, None, n).map(|m| m.id);
    assert_eq!(nth(0), Some(MobId(10)));
    assert_eq!(nth(2), Some(MobId(12)));
    assert_eq!(nth(3), None);
}

#[test]
fn mapping_grid_as_a_sensor() {
    let settings = FleetSettings {
        map_width: 1000.0,
        map_height: 1000.0,
        scan_tile_size: 100.0,
        ..FleetSettings::default()
    };
    let mut mapping = MappingSensorGrid::new(&settings);
    let sensor: &mut dyn Sensor = &mut mapping;

    sensor.update_tick(1, &FleetInput {
        friends: vec![fighter(1, 450.0, 450.0)],
        sensor_contacts: vec![fighter(50, 460.0, 450.0)],
    });
    assert!(sensor.grid().targets().contains(MobId(50)));
    let guess = sensor.enemy_base_guess().unwrap();
    assert!(guess.x >= 0.0 && guess.x <= 1000.0 && guess.y >= 0.0 && guess.y <= 1000.0);

    let enemy_base = Mob::new(60, MobType::Base, Vec2::new(900.0, 900.0));
    sensor.update_tick(2, &FleetInput {
        friends: vec![fighter(1, 450.0, 450.0)],
        sensor_contacts: vec![enemy_base],
    });
    assert_eq!(sensor.enemy_base_guess(), Some(enemy_base.pos));
    assert!(mapping.is_ever_scanned(Vec2::new(450.0, 450.0)));
    assert!(!mapping.is_ever_scanned(Vec2::new(950.0, 50.0)));
}

use bevy::prelude::*;

use super::*;
use crate::fleet::math::MapBounds;
use crate::fleet::mob::{FleetInput, Mob, MobType};
use crate::fleet::registry::{ConfigError, ParamRegistry};
use crate::fleet::sensor_grid::SensorGrid;

fn atom(value: f32, slot: u16) -> BundleAtom {
    BundleAtom::new(value, 0.0, AtomSlot(slot))
}

fn constant(value: f32, slot: u16) -> BundleValue {
    BundleValue::constant(atom(value, slot))
}

fn always_force(weight: f32) -> BundleForce {
    BundleForce {
        weight: constant(weight, 0),
        range: BundleRange {
            check: BundleCheck::Always,
            radius: constant(0.0, 1),
        },
        crowd: BundleCrowd {
            check: BundleCheck::Always,
            size: constant(0.0, 2),
            radius: constant(0.0, 3),
        },
    }
}

fn grid_with(friends: Vec<Mob>) -> SensorGrid {
    let mut grid = SensorGrid::new(20, 2);
    grid.update_tick(
        1,
        &FleetInput {
            friends,
            sensor_contacts: vec![],
        },
    );
    grid
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn constant_checks_ignore_inputs() {
    assert_eq!(check(BundleCheck::Never, 5.0, 1.0), None);
    assert_eq!(check(BundleCheck::Always, f32::NAN, -1.0), Some(1.0));
}

#[test]
fn strict_checks_are_thresholds() {
    assert_eq!(check(BundleCheck::StrictOn, 3.0, 3.0), Some(1.0));
    assert_eq!(check(BundleCheck::StrictOn, 2.9, 3.0), None);
    assert_eq!(check(BundleCheck::StrictOff, 2.9, 3.0), Some(1.0));
    assert_eq!(check(BundleCheck::StrictOff, 3.0, 3.0), None);
}

#[test]
fn curves_handle_degenerate_inputs() {
    assert_eq!(check(BundleCheck::LinearUp, 5.0, 0.0), Some(MAX_CHECK_WEIGHT));
    assert_eq!(check(BundleCheck::LinearUp, 0.0, 5.0), None);
    assert_eq!(check(BundleCheck::LinearDown, 0.0, 5.0), Some(MAX_CHECK_WEIGHT));
    assert_eq!(check(BundleCheck::LinearDown, 5.0, 0.0), None);
    assert_eq!(check(BundleCheck::QuadraticUp, 1000.0, 1.0), Some(MAX_CHECK_WEIGHT));
    for kind in [BundleCheck::StrictOn, BundleCheck::LinearUp, BundleCheck::QuadraticDown] {
        assert_eq!(check(kind, f32::NAN, 1.0), None);
        assert_eq!(check(kind, 1.0, f32::NAN), None);
    }
}

#[test]
fn curves_scale_with_ratio() {
    assert_eq!(check(BundleCheck::LinearUp, 5.0, 10.0), Some(0.5));
    assert_eq!(check(BundleCheck::QuadraticUp, 5.0, 10.0), Some(0.25));
    assert_eq!(check(BundleCheck::LinearDown, 20.0, 10.0), Some(0.5));
    assert_eq!(check(BundleCheck::QuadraticDown, 20.0, 10.0), Some(0.25));
}

#[test]
fn up_curves_non_decreasing_down_curves_non_increasing() {
    let weight = |kind, v| check(kind, v, 7.5).unwrap_or(0.0);
    let mut prev_up = 0.0;
    let mut prev_quad = 0.0;
    let mut prev_down = f32::INFINITY;
    for i in -20..2000 {
        let v = i as f32 * 0.25;
        let up = weight(BundleCheck::LinearUp, v);
        let quad = weight(BundleCheck::QuadraticUp, v);
        let down = weight(BundleCheck::LinearDown, v);
        assert!(up >= prev_up, "linearUp dipped at {v}");
        assert!(quad >= prev_quad, "quadraticUp dipped at {v}");
        assert!(down <= prev_down, "linearDown rose at {v}");
        prev_up = up;
        prev_quad = quad;
        prev_down = down;
    }
}

#[test]
fn check_keys_round_trip() {
    for key in [
        "never",
        "always",
        "strictOn",
        "strictOff",
        "linearUp",
        "linearDown",
        "quadraticUp",
        "quadraticDown",
    ] {
        assert_eq!(BundleCheck::from_key(key).unwrap().as_key(), key);
    }
    assert!(BundleCheck::from_key("LinearUp").is_none());
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn periodic_value_follows_sine_envelope() {
    let value = BundleValue::periodic(
        atom(10.0, 0),
        Periodic {
            period: atom(100.0, 1),
            amplitude: atom(0.5, 2),
            tick_shift: atom(0.0, 3),
        },
    );
    let mut live = BundleLive::new(4, 1);
    let resolved = live.resolve_value(&value, 25);
    assert!((resolved - 11.237).abs() < 1e-3, "got {resolved}");
}

#[test]
fn periodic_envelope_disabled_by_short_period_or_flat_amplitude() {
    let mut live = BundleLive::new(4, 1);
    let short = BundleValue::periodic(
        atom(10.0, 0),
        Periodic {
            period: atom(1.0, 1),
            amplitude: atom(0.5, 2),
            tick_shift: atom(0.0, 3),
        },
    );
    assert_eq!(live.resolve_value(&short, 25), 10.0);

    let flat = BundleValue::periodic(
        atom(10.0, 0),
        Periodic {
            period: atom(100.0, 1),
            amplitude: atom(0.0, 2),
            tick_shift: atom(0.0, 3),
        },
    );
    assert_eq!(live.resolve_value(&flat, 25), 10.0);
}

#[test]
fn jitter_is_drawn_once_and_bounded() {
    let jittery = BundleAtom::new(10.0, 0.2, AtomSlot(0));
    let mut live = BundleLive::new(1, 99);

    let first = live.resolve_atom(&jittery);
    assert!((8.0..=12.0).contains(&first));
    for _ in 0..10 {
        assert_eq!(live.resolve_atom(&jittery), first);
    }
}

#[test]
fn different_mobs_get_independent_jitter() {
    let jittery = BundleAtom::new(10.0, 0.5, AtomSlot(0));
    let draws: Vec<f32> = (0..8)
        .map(|seed| BundleLive::new(1, seed).resolve_atom(&jittery))
        .collect();
    assert!(draws.windows(2).any(|w| w[0] != w[1]));
}

#[test]
#[should_panic(expected = "outside jitter table")]
fn slot_outside_table_panics() {
    let mut live = BundleLive::new(2, 0);
    live.resolve_atom(&atom(1.0, 2));
}

// ============================================================================
// apply_bundle
// ============================================================================

#[test]
fn force_points_toward_focus() {
    let mob = Mob::new(1, MobType::Fighter, Vec2::new(100.0, 100.0));
    let grid = grid_with(vec![mob]);
    let mut live = BundleLive::new(4, 0);
    let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);

    let mut force = Vec2::ZERO;
    assert!(eval.apply_bundle(&mut force, &always_force(2.0), Vec2::new(100.0, 200.0)));
    assert!(force.distance(Vec2::new(0.0, 2.0)) < 1e-5);

    let mut away = Vec2::ZERO;
    assert!(eval.repel_bundle(&mut away, &always_force(2.0), Vec2::new(100.0, 200.0)));
    assert!(away.distance(Vec2::new(0.0, -2.0)) < 1e-5);
}

#[test]
fn zero_weight_adds_nothing_whatever_the_gates() {
    let mob = Mob::new(1, MobType::Fighter, Vec2::new(100.0, 100.0));
    let grid = grid_with(vec![mob]);
    let checks = [
        BundleCheck::Never,
        BundleCheck::Always,
        BundleCheck::StrictOn,
        BundleCheck::StrictOff,
        BundleCheck::LinearUp,
        BundleCheck::QuadraticDown,
    ];
    for range_check in checks {
        for crowd_check in checks {
            let mut bundle = always_force(0.0);
            bundle.range.check = range_check;
            bundle.range.radius = constant(50.0, 1);
            bundle.crowd.check = crowd_check;
            bundle.crowd.size = constant(1.0, 2);
            bundle.crowd.radius = constant(50.0, 3);

            let mut live = BundleLive::new(4, 0);
            let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);
            let mut force = Vec2::new(0.25, -0.5);
            eval.apply_bundle(&mut force, &bundle, Vec2::new(120.0, 90.0));
            assert_eq!(force, Vec2::new(0.25, -0.5));
        }
    }
}

#[test]
fn coincident_focus_contributes_nothing() {
    let mob = Mob::new(1, MobType::Fighter, Vec2::new(10.0, 10.0));
    let grid = grid_with(vec![mob]);
    let mut live = BundleLive::new(4, 0);
    let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);

    let mut force = Vec2::ZERO;
    assert!(!eval.apply_bundle(&mut force, &always_force(1.0), mob.pos));
    assert_eq!(force, Vec2::ZERO);
}

#[test]
fn range_gate_uses_distance_to_focus() {
    let mob = Mob::new(1, MobType::Fighter, Vec2::ZERO);
    let grid = grid_with(vec![mob]);
    let mut bundle = always_force(1.0);
    bundle.range.check = BundleCheck::StrictOff;
    bundle.range.radius = constant(50.0, 1);

    let mut live = BundleLive::new(4, 0);
    let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);
    let mut force = Vec2::ZERO;
    assert!(eval.apply_bundle(&mut force, &bundle, Vec2::new(30.0, 0.0)));
    assert!(!eval.apply_bundle(&mut force, &bundle, Vec2::new(80.0, 0.0)));
}

#[test]
fn crowd_counts_the_mob_itself() {
    let mob = Mob::new(1, MobType::Fighter, Vec2::new(500.0, 500.0));
    let others = vec![
        mob,
        Mob::new(2, MobType::Fighter, Vec2::new(510.0, 500.0)),
        Mob::new(3, MobType::Fighter, Vec2::new(900.0, 900.0)),
    ];
    let grid = grid_with(others);

    let mut crowd = BundleCrowd {
        check: BundleCheck::StrictOn,
        size: constant(2.0, 0),
        radius: constant(50.0, 1),
    };
    let mut live = BundleLive::new(2, 0);
    let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);
    assert_eq!(eval.crowd_gate(&crowd), Some(1.0));

    crowd.size = constant(3.0, 0);
    let mut live = BundleLive::new(2, 0);
    let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);
    assert_eq!(eval.crowd_gate(&crowd), None);
}

#[test]
fn invariant_crowd_reuses_smaller_radius_count() {
    let mob = Mob::new(1, MobType::Fighter, Vec2::new(500.0, 500.0));
    let grid = grid_with(vec![mob, Mob::new(2, MobType::Fighter, Vec2::new(505.0, 500.0))]);
    let mut live = BundleLive::new(4, 0);

    let small = BundleCrowd {
        check: BundleCheck::StrictOff,
        size: constant(2.0, 0),
        radius: constant(10.0, 1),
    };
    let large = BundleCrowd {
        check: BundleCheck::StrictOff,
        size: constant(2.0, 2),
        radius: constant(400.0, 3),
    };

    let mut eval = BundleEval::new(&grid, &mob, 1, &mut live);
    assert_eq!(eval.crowd_gate(&small), None);
    assert_eq!(eval.crowd_gate(&large), None);
    assert_eq!(live.crowd_cache.len(), 1, "larger radius answered from cache");
}

// ============================================================================
// Loader
// ============================================================================

#[test]
fn loader_reads_dotted_keys() {
    let reg = ParamRegistry::from_pairs([
        ("align.weight.value.value", "0.75"),
        ("align.weight.value.mobJitterScale", "0.1"),
        ("align.range.check", "strictOff"),
        ("align.range.radius.value.value", "120"),
        ("align.crowd.check", "always"),
        ("align.weight.valueType", "periodic"),
        ("align.weight.period.value", "50"),
        ("align.weight.amplitude.value", "0.25"),
    ]);
    let mut loader = BundleLoader::new(&reg);
    let force = loader.force("align").unwrap();

    assert_eq!(force.weight.atom.value, 0.75);
    assert_eq!(force.weight.atom.mob_jitter_scale, 0.1);
    let periodic = force.weight.periodic.unwrap();
    assert_eq!(periodic.period.value, 50.0);
    assert_eq!(periodic.amplitude.value, 0.25);
    assert_eq!(periodic.tick_shift.value, 0.0);
    assert_eq!(force.range.check, BundleCheck::StrictOff);
    assert_eq!(force.range.radius.atom.value, 120.0);
    assert_eq!(force.crowd.check, BundleCheck::Always);
    assert_eq!(force.crowd.size.atom.value, 0.0);

    // weight (4 atoms) + range radius + crowd size + crowd radius
    assert_eq!(loader.slot_count(), 7);
}

#[test]
fn loader_defaults_missing_force_to_never() {
    let reg = ParamRegistry::new();
    let force = BundleLoader::new(&reg).force("edges").unwrap();
    assert_eq!(force.range.check, BundleCheck::Never);
    assert_eq!(force.crowd.check, BundleCheck::Never);
    assert!(force.weight.periodic.is_none());
}

#[test]
fn loader_rejects_unknown_strings() {
    let reg = ParamRegistry::from_pairs([("a.range.check", "sometimes")]);
    assert!(matches!(
        BundleLoader::new(&reg).force("a"),
        Err(ConfigError::UnknownCheck { .. })
    ));

    let reg = ParamRegistry::from_pairs([("a.weight.valueType", "sawtooth")]);
    assert!(matches!(
        BundleLoader::new(&reg).force("a"),
        Err(ConfigError::UnknownValueType { .. })
    ));
}

// ============================================================================
// Locus and composition
// ============================================================================

#[test]
fn locus_without_components_is_none() {
    let mut live = BundleLive::new(16, 0);
    assert!(live
        .locus_point(&LocusParams::default(), 10, MapBounds::default())
        .is_none());
}

#[test]
fn circular_locus_orbits_map_center() {
    let bounds = MapBounds::new(1000.0, 600.0);
    let params = LocusParams {
        circular_period: constant(100.0, 0),
        circular_weight: constant(1.0, 1),
        use_scaled: true,
        ..LocusParams::default()
    };
    let mut live = BundleLive::new(2, 0);

    let at_zero = live.locus_point(&params, 0, bounds).unwrap();
    assert!(at_zero.distance(Vec2::new(1000.0, 300.0)) < 1e-3);

    let quarter = (std::f32::consts::FRAC_PI_2 * 100.0).round() as u64;
    let at_quarter = live.locus_point(&params, quarter, bounds).unwrap();
    assert!(at_quarter.distance(Vec2::new(500.0, 600.0)) < 1.0);
}

#[test]
fn random_locus_holds_until_period_expires() {
    let bounds = MapBounds::default();
    let params = LocusParams {
        random_period: constant(10.0, 0),
        random_weight: constant(1.0, 1),
        use_scaled: true,
        ..LocusParams::default()
    };
    let mut live = BundleLive::new(2, 3);

    let first = live.locus_point(&params, 0, bounds).unwrap();
    assert!(bounds.contains(first));
    assert_eq!(live.locus_point(&params, 9, bounds), Some(first));
    assert_ne!(live.locus_point(&params, 10, bounds), Some(first));
}

#[test]
fn steer_target_keeps_heading_on_zero_force() {
    let pos = Vec2::new(10.0, 10.0);
    assert_eq!(steer_target(pos, Vec2::new(0.0, 3.0), Vec2::ZERO, 2.0), Vec2::new(10.0, 12.0));
    assert_eq!(steer_target(pos, Vec2::ZERO, Vec2::new(-5.0, 0.0), 2.0), Vec2::new(8.0, 10.0));
    assert_eq!(steer_target(pos, Vec2::ZERO, Vec2::ZERO, 2.0), pos);
}

use bevy::prelude::*;

use super::*;
use crate::fleet::filter::MobFilter;
use crate::fleet::mob::mob_flags;

fn fighter(id: u32, x: f32, y: f32) -> Mob {
    Mob::new(id, MobType::Fighter, Vec2::new(x, y))
}

#[test]
fn update_inserts_then_overwrites() {
    let mut set = MobSet::new();
    set.update_mob(&fighter(1, 0.0, 0.0));
    set.update_mob(&fighter(1, 5.0, 5.0));

    assert_eq!(set.len(), 1);
    assert_eq!(set.get(MobId(1)).unwrap().pos, Vec2::new(5.0, 5.0));
    assert_eq!(set.num_mobs(mob_flags::FIGHTER), 1);
}

#[test]
fn remove_absent_is_noop() {
    let mut set = MobSet::new();
    set.update_mob(&fighter(1, 0.0, 0.0));
    assert!(set.remove_mob(MobId(42)).is_none());
    assert_eq!(set.len(), 1);
}

#[test]
fn remove_swaps_last_into_hole() {
    let mut set = MobSet::new();
    for id in 0..4 {
        set.update_mob(&fighter(id, id as f32, 0.0));
    }
    set.remove_mob(MobId(1));

    assert_eq!(set.len(), 3);
    assert!(set.get(MobId(1)).is_none());
    for id in [0, 2, 3] {
        assert_eq!(set.get(MobId(id)).unwrap().id, MobId(id));
    }
}

#[test]
fn base_cache_follows_swaps_and_removal() {
    let mut set = MobSet::new();
    set.update_mob(&fighter(1, 0.0, 0.0));
    set.update_mob(&fighter(2, 0.0, 0.0));
    set.update_mob(&Mob::new(9, MobType::Base, Vec2::new(100.0, 100.0)));

    // Base is the last element; removing slot 0 moves it.
    set.remove_mob(MobId(1));
    assert_eq!(set.get_base().unwrap().id, MobId(9));

    set.remove_mob(MobId(9));
    assert!(set.get_base().is_none());
    assert!(set.cache_base().is_none());
}

#[test]
fn base_lookup_scans_after_cache_invalidation() {
    let mut set = MobSet::new();
    set.update_mob(&Mob::new(1, MobType::Base, Vec2::ZERO));
    set.update_mob(&Mob::new(2, MobType::Base, Vec2::ONE));
    set.remove_mob(MobId(2));

    assert_eq!(set.get_base().unwrap().id, MobId(1));
    assert_eq!(set.cache_base().unwrap().id, MobId(1));
}

#[test]
fn nth_closest_orders_by_distance() {
    let mut set = MobSet::new();
    set.update_mob(&fighter(15, 15.0, 0.0));
    set.update_mob(&fighter(5, 5.0, 0.0));
    set.update_mob(&fighter(10, 0.0, 10.0));
    let filter = MobFilter::of_type(mob_flags::FIGHTER);

    assert_eq!(set.find_nth_closest(Vec2::ZERO, &filter, 0).unwrap().id, MobId(5));
    assert_eq!(set.find_nth_closest(Vec2::ZERO, &filter, 1).unwrap().id, MobId(10));
    assert_eq!(set.find_nth_closest(Vec2::ZERO, &filter, 2).unwrap().id, MobId(15));
    assert!(set.find_nth_closest(Vec2::ZERO, &filter, 3).is_none());

    assert_eq!(set.find_closest(Vec2::ZERO, &filter).unwrap().id, MobId(5));
    assert_eq!(set.find_farthest(Vec2::ZERO, &filter).unwrap().id, MobId(15));
}

#[test]
fn range_limits_queries() {
    let mut set = MobSet::new();
    set.update_mob(&fighter(1, 3.0, 4.0));
    set.update_mob(&fighter(2, 30.0, 40.0));
    let near = MobFilter::of_type(mob_flags::ALL).with_range(Vec2::ZERO, 5.0);

    assert_eq!(set.count(&near), 1);
    assert_eq!(set.find_farthest(Vec2::ZERO, &near).unwrap().id, MobId(1));
    assert!(set.find_closest(Vec2::ZERO, &MobFilter::new().with_range(Vec2::ZERO, 0.0)).is_none());
}

#[test]
fn cursor_removal_visits_every_element_once() {
    let mut set = MobSet::new();
    for id in 0..10 {
        set.update_mob(&fighter(id, 0.0, 0.0));
    }

    let mut visited = Vec::new();
    let mut cursor = set.cursor();
    while let Some(mob) = cursor.next() {
        let id = mob.id.0;
        visited.push(id);
        if id % 3 == 0 {
            cursor.remove_current();
        }
    }
    assert!(!cursor.has_next());

    visited.sort_unstable();
    assert_eq!(visited, (0..10).collect::<Vec<_>>());
    assert_eq!(set.len(), 6);
    for id in [0, 3, 6, 9] {
        assert!(!set.contains(MobId(id)));
    }
}

#[test]
fn cursor_removing_everything_empties_set() {
    let mut set = MobSet::new();
    for id in 0..5 {
        set.update_mob(&fighter(id, 0.0, 0.0));
    }
    set.retain(|_| false);
    assert!(set.is_empty());
    assert_eq!(set.num_mobs(mob_flags::ALL), 0);
}

#[test]
fn random_operations_keep_index_and_counts_consistent() {
    let mut rng = fastrand::Rng::with_seed(42);
    let mut set = MobSet::new();
    let mut model: std::collections::HashMap<u32, Mob> = std::collections::HashMap::new();

    let type_of = |id: u32| MobType::ALL[(id % 4) as usize];

    for _ in 0..2_000 {
        let id = rng.u32(0..64);
        if rng.bool() {
            let mob = Mob::new(id, type_of(id), Vec2::new(rng.f32() * 100.0, rng.f32() * 100.0));
            set.update_mob(&mob);
            model.insert(id, mob);
        } else {
            set.remove_mob(MobId(id));
            model.remove(&id);
        }

        assert_eq!(set.len(), model.len());
        for probe in 0..64 {
            assert_eq!(set.get(MobId(probe)), model.get(&probe));
        }
        for t in MobType::ALL {
            let expected = model.values().filter(|m| m.mob_type == t).count();
            assert_eq!(set.num_mobs(t.flag()), expected);
        }
        assert_eq!(
            set.num_mobs(mob_flags::SHIP),
            set.num_mobs(mob_flags::BASE) + set.num_mobs(mob_flags::FIGHTER)
        );
        assert_eq!(set.get_base().is_some(), set.num_mobs(mob_flags::BASE) > 0);
    }
}

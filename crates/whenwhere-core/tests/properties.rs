//! Property tests for the value types and policy handling.

use proptest::prelude::*;
use whenwhere_core::location::{distance_between, within_distance};
use whenwhere_core::{Coordinate, Day, DayRange, PolicySet, TimeOfDay, TimeRange};

fn any_day() -> impl Strategy<Value = Day> {
    (0i64..7).prop_map(|code| Day::from_code(code).unwrap())
}

fn any_time() -> impl Strategy<Value = TimeOfDay> {
    (0i64..24, 0i64..60).prop_map(|(h, m)| TimeOfDay::new(h, m).unwrap())
}

fn any_coordinate() -> impl Strategy<Value = Coordinate> {
    (-89.0f64..89.0, -179.0f64..179.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
}

proptest! {
    #[test]
    fn successor_cycles_in_seven_steps(day in any_day()) {
        let mut next = day;
        for _ in 0..7 {
            next = next.successor();
        }
        prop_assert_eq!(next, day);
        prop_assert_ne!(day.successor(), day);
    }

    #[test]
    fn out_of_range_day_codes_fail(code in prop_oneof![i64::MIN..0i64, 7i64..i64::MAX]) {
        prop_assert!(Day::from_code(code).is_err());
    }

    #[test]
    fn empty_range_includes_everything(day in any_day(), time in any_time()) {
        prop_assert!(DayRange::new("u", "Empty").includes(day));
        prop_assert!(TimeRange::new("u", "Empty").includes(time));
    }

    #[test]
    fn non_empty_range_includes_exactly_members(
        members in prop::collection::btree_set(any_day(), 1..7),
        probe in any_day(),
    ) {
        let mut range = DayRange::new("u", "Some");
        range.set_slots(members.iter().copied());
        prop_assert_eq!(range.includes(probe), members.contains(&probe));
    }

    #[test]
    fn set_slots_replaces_previous_set(
        first in prop::collection::vec(any_time(), 0..10),
        second in prop::collection::vec(any_time(), 0..10),
    ) {
        let mut replaced = TimeRange::new("u", "A");
        replaced.set_slots(first);
        replaced.set_slots(second.clone());

        let mut fresh = TimeRange::new("u", "B");
        fresh.set_slots(second);
        prop_assert_eq!(replaced.slot_vec(), fresh.slot_vec());
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self(a in any_coordinate(), b in any_coordinate()) {
        prop_assert!((distance_between(a, b) - distance_between(b, a)).abs() < 1e-9);
        prop_assert!(distance_between(a, a).abs() < 1e-9);
        prop_assert!(within_distance(a, a, 1.0));
        prop_assert!(!within_distance(a, a, 0.0));
    }

    #[test]
    fn unknown_policy_keys_change_nothing(
        known in prop::collection::vec((0usize..3, any::<bool>()), 0..6),
        unknown in prop::collection::vec(("[a-z_]{1,16}", any::<bool>()), 0..6),
    ) {
        let keys = ["use_location", "important_only", "long_lasting_only"];
        let known: Vec<(String, serde_json::Value)> = known
            .into_iter()
            .map(|(i, v)| (keys[i].to_string(), serde_json::Value::Bool(v)))
            .collect();
        let unknown: Vec<(String, serde_json::Value)> = unknown
            .into_iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k, serde_json::Value::Bool(v)))
            .collect();

        let mut mixed = unknown.clone();
        mixed.extend(known.iter().cloned());
        mixed.extend(unknown);

        prop_assert_eq!(PolicySet::from_map(mixed), PolicySet::from_map(known));
    }
}

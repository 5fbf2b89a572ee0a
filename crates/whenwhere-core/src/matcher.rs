//! Task activity matching.
//!
//! Checks run in a fixed order and stop at the first failure:
//! day, time, location, flags.

use crate::context::{Context, CurrentLocation};
use crate::error::{CoreError, Result};
use crate::location::{includes_location_or_empty, Location};
use crate::overrides::{resolve_constraints, EffectiveConstraints, Rangeable};
use crate::policy::PolicySet;
use crate::storage::Store;
use crate::task::Task;

/// Whether a location set admits the current location.
///
/// An empty set admits everything, as does a current location with neither
/// id nor coordinate. Otherwise the set must contain the current id or a
/// member geocoded within `threshold_miles` of the current coordinate.
pub fn location_set_matches(set: &[Location], current: &CurrentLocation, threshold_miles: f64) -> bool {
    if set.is_empty() || current.is_unknown() {
        return true;
    }
    if let Some(id) = &current.id {
        let ids: Vec<&str> = set.iter().map(|l| l.id.as_str()).collect();
        if includes_location_or_empty(&ids, id) {
            return true;
        }
    }
    match current.coordinate {
        Some(here) => set.iter().any(|l| l.is_near(here, threshold_miles)),
        None => false,
    }
}

/// Match already-resolved constraints against a context.
pub fn matches_constraints(
    task: &Task,
    constraints: &EffectiveConstraints,
    context: &Context,
    policies: &PolicySet,
    threshold_miles: f64,
) -> bool {
    let day_ok = match context.day {
        None => true,
        Some(day) => constraints.day.as_ref().map_or(true, |r| r.includes_or_empty(day)),
    };
    if !day_ok {
        return false;
    }

    // Time ranges hold whole-hour slots; the current time is matched by its hour.
    let time_ok = match context.time {
        None => true,
        Some(time) => constraints
            .time
            .as_ref()
            .map_or(true, |r| r.includes_or_empty(time.hour_slot())),
    };
    if !time_ok {
        return false;
    }

    if policies.use_location
        && !location_set_matches(&constraints.locations, &context.location, threshold_miles)
    {
        return false;
    }

    policies.flags_hold(task)
}

/// Resolve `task`'s constraints and match them against `context`.
pub fn matches<S: Store + ?Sized>(
    store: &S,
    task: &Task,
    context: &Context,
    policies: &PolicySet,
    threshold_miles: f64,
) -> Result<bool> {
    let constraints = resolve_constraints(store, Rangeable::Task(task))?;
    let active = matches_constraints(task, &constraints, context, policies, threshold_miles);
    tracing::debug!(task = %task.id, active, "matched task");
    Ok(active)
}

/// Same as [`matches`] for a task looked up by id.
///
/// # Errors
/// Returns [`CoreError::NotFound`] when no task has that id.
pub fn matches_by_id<S: Store + ?Sized>(
    store: &S,
    task_id: &str,
    context: &Context,
    policies: &PolicySet,
    threshold_miles: f64,
) -> Result<bool> {
    let task = store
        .find_task(task_id)?
        .ok_or_else(|| CoreError::not_found("task", task_id))?;
    matches(store, &task, context, policies, threshold_miles)
}

/// Keep the tasks that are active in `context`, preserving order.
pub fn filter_tasks<S: Store + ?Sized>(
    store: &S,
    tasks: Vec<Task>,
    context: &Context,
    policies: &PolicySet,
    threshold_miles: f64,
) -> Result<Vec<Task>> {
    let mut active = Vec::with_capacity(tasks.len());
    for task in tasks {
        if matches(store, &task, context, policies, threshold_miles)? {
            active.push(task);
        }
    }
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::Day;
    use crate::location::{Coordinate, DEFAULT_THRESHOLD_MILES};
    use crate::range::{DayRange, TimeRange};
    use crate::time_of_day::TimeOfDay;

    fn t(h: i64, m: i64) -> TimeOfDay {
        TimeOfDay::new(h, m).unwrap()
    }

    fn days(slots: &[Day]) -> DayRange {
        let mut r = DayRange::new("u", "d");
        r.set_slots(slots.iter().copied());
        r
    }

    fn times(slots: &[TimeOfDay]) -> TimeRange {
        let mut r = TimeRange::new("u", "t");
        r.set_slots(slots.iter().copied());
        r
    }

    fn located(name: &str, coord: Option<Coordinate>) -> Location {
        let mut l = Location::new("u", name);
        l.coordinate = coord;
        l
    }

    fn ctx(day: Option<Day>, time: Option<TimeOfDay>) -> Context {
        Context {
            day,
            time,
            location: CurrentLocation::default(),
        }
    }

    fn check(constraints: &EffectiveConstraints, context: &Context) -> bool {
        matches_constraints(
            &Task::new("u", "x"),
            constraints,
            context,
            &PolicySet::default(),
            DEFAULT_THRESHOLD_MILES,
        )
    }

    #[test]
    fn null_day_dimension_ignores_configured_range() {
        let c = EffectiveConstraints {
            day: Some(days(&[Day::Monday])),
            ..Default::default()
        };
        assert!(check(&c, &ctx(None, None)));
        assert!(!check(&c, &ctx(Some(Day::Tuesday), None)));
    }

    #[test]
    fn empty_day_range_matches_any_day() {
        let c = EffectiveConstraints {
            day: Some(days(&[])),
            ..Default::default()
        };
        for day in Day::ALL {
            assert!(check(&c, &ctx(Some(day), None)));
        }
    }

    #[test]
    fn missing_range_matches_any_day() {
        let c = EffectiveConstraints::default();
        assert!(check(&c, &ctx(Some(Day::Wednesday), Some(t(3, 0)))));
    }

    #[test]
    fn time_checked_by_hour_slot() {
        let c = EffectiveConstraints {
            time: Some(times(&[t(9, 0)])),
            ..Default::default()
        };
        assert!(check(&c, &ctx(Some(Day::Monday), Some(t(9, 0)))));
        assert!(check(&c, &ctx(Some(Day::Monday), Some(t(9, 37)))));
        assert!(check(&c, &ctx(Some(Day::Monday), Some(t(9, 59)))));
        assert!(!check(&c, &ctx(Some(Day::Monday), Some(t(10, 0)))));
        assert!(!check(&c, &ctx(Some(Day::Monday), Some(t(8, 59)))));
        assert!(check(&c, &ctx(Some(Day::Monday), None)));
    }

    #[test]
    fn location_set_rules() {
        let here = Coordinate::new(37.7749, -122.4194);
        let near = located("Near", Some(Coordinate::new(37.7750, -122.4195)));
        let far = located("Far", Some(Coordinate::new(34.0522, -118.2437)));
        let unknown = located("Unknown", None);

        assert!(location_set_matches(&[], &CurrentLocation::at_coordinate(here), 1.0));
        assert!(location_set_matches(&[far.clone()], &CurrentLocation::default(), 1.0));
        assert!(location_set_matches(
            &[far.clone(), near.clone()],
            &CurrentLocation::at_coordinate(here),
            1.0
        ));
        assert!(!location_set_matches(&[far.clone()], &CurrentLocation::at_coordinate(here), 1.0));
        assert!(!location_set_matches(&[unknown.clone()], &CurrentLocation::at_coordinate(here), 1.0));
        assert!(location_set_matches(
            &[unknown.clone()],
            &CurrentLocation::at_location(unknown.id.clone()),
            1.0
        ));
        assert!(!location_set_matches(&[far], &CurrentLocation::at_location(near.id), 1.0));
    }

    #[test]
    fn location_policy_off_skips_location() {
        let here = Coordinate::new(0.0, 0.0);
        let c = EffectiveConstraints {
            locations: vec![located("Far", Some(Coordinate::new(10.0, 10.0)))],
            ..Default::default()
        };
        let context = Context {
            day: None,
            time: None,
            location: CurrentLocation::at_coordinate(here),
        };
        let task = Task::new("u", "x");
        let on = PolicySet::default();
        let off = PolicySet {
            use_location: false,
            ..PolicySet::default()
        };
        assert!(!matches_constraints(&task, &c, &context, &on, 1.0));
        assert!(matches_constraints(&task, &c, &context, &off, 1.0));
    }

    #[test]
    fn flag_policies_apply_last() {
        let mut task = Task::new("u", "x");
        let important_only = PolicySet {
            important_only: true,
            ..PolicySet::default()
        };
        let c = EffectiveConstraints::default();
        let context = ctx(Some(Day::Monday), Some(t(9, 0)));
        assert!(!matches_constraints(&task, &c, &context, &important_only, 1.0));
        task.important = true;
        assert!(matches_constraints(&task, &c, &context, &important_only, 1.0));
    }

    #[test]
    fn matches_by_id_reports_missing_task() {
        let store = crate::storage::SqliteStore::open_memory().unwrap();
        let err = matches_by_id(&store, "nope", &ctx(None, None), &PolicySet::default(), 1.0)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "task", .. }));
    }
}

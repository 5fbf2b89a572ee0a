//! Day and time interval sets.
//!
//! A range is a named set of selected slots owned by a user. A range whose
//! `parent_tag_id` is set is a hidden override belonging to that tag; it
//! never shows up in the user's range listings.
//!
//! An empty range matches everything: an unconfigured range filters nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::day::Day;
use crate::error::ValidationErrors;
use crate::time_of_day::TimeOfDay;

pub const RANGE_NAME_MAX_LENGTH: usize = 20;

/// Name given to hidden override ranges.
pub const OVERRIDE_RANGE_NAME: &str = "Custom";

/// A value that can be selected in a range.
pub trait Slot: Copy + Ord {
    /// Entity name used in storage and error messages.
    const KIND: &'static str;
}

impl Slot for Day {
    const KIND: &'static str = "day_range";
}

impl Slot for TimeOfDay {
    const KIND: &'static str = "time_range";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange<T: Slot> {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Set when this range is a hidden override of a tag.
    pub parent_tag_id: Option<String>,
    slots: BTreeSet<T>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub type DayRange = SlotRange<Day>;
pub type TimeRange = SlotRange<TimeOfDay>;

impl<T: Slot> SlotRange<T> {
    /// Create an empty, user-visible range.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            parent_tag_id: None,
            slots: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an empty hidden override for `tag_id`.
    pub fn override_for(user_id: impl Into<String>, tag_id: impl Into<String>) -> Self {
        let mut range = Self::new(user_id, OVERRIDE_RANGE_NAME);
        range.parent_tag_id = Some(tag_id.into());
        range
    }

    /// Rebuild a range from stored parts.
    pub fn from_parts(
        id: String,
        user_id: String,
        name: String,
        parent_tag_id: Option<String>,
        slots: impl IntoIterator<Item = T>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            parent_tag_id,
            slots: slots.into_iter().collect(),
            created_at,
            updated_at,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.parent_tag_id.is_some()
    }

    /// Replace every selected slot with `values`.
    ///
    /// The new set is built before it is swapped in, so the range is never
    /// observed half-updated.
    pub fn set_slots(&mut self, values: impl IntoIterator<Item = T>) {
        let next: BTreeSet<T> = values.into_iter().collect();
        self.slots = next;
        self.updated_at = Utc::now();
    }

    /// Selected slots in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = T> + '_ {
        self.slots.iter().copied()
    }

    pub fn slot_vec(&self) -> Vec<T> {
        self.slots().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Strict membership, ignoring the empty-range rule.
    pub fn contains(&self, value: T) -> bool {
        self.slots.contains(&value)
    }

    /// True when `value` is selected or nothing is selected at all.
    pub fn includes(&self, value: T) -> bool {
        self.is_empty() || self.contains(value)
    }

    /// Same predicate as [`includes`](Self::includes), named for the
    /// matcher's call sites.
    pub fn includes_or_empty(&self, value: T) -> bool {
        self.includes(value)
    }

    /// # Errors
    /// Returns every failed rule for `name`.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "can't be blank");
        } else if name.chars().count() > RANGE_NAME_MAX_LENGTH {
            errors.add(
                "name",
                format!("is too long (maximum is {RANGE_NAME_MAX_LENGTH} characters)"),
            );
        }
        errors.into_result()
    }
}

impl TimeRange {
    /// Hour slots from `start` up to, not including, `end`, wrapping past
    /// midnight. Equal bounds cover the whole day.
    ///
    /// `span(20:00, 06:00)` yields 20:00, 21:00, 22:00, 23:00, 00:00 … 05:00.
    pub fn span(start: TimeOfDay, end: TimeOfDay) -> Vec<TimeOfDay> {
        let start = start.hour_slot();
        let hours = match start.minutes_until(end.hour_slot()) / 60 {
            0 => 24,
            n => n,
        };
        (0..hours)
            .map(|i| start.wrapping_add_minutes(i * 60))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: i64, m: i64) -> TimeOfDay {
        TimeOfDay::new(h, m).unwrap()
    }

    #[test]
    fn empty_range_includes_every_day() {
        let range = DayRange::new("user-1", "Anything");
        for day in Day::ALL {
            assert!(range.includes(day));
            assert!(range.includes_or_empty(day));
            assert!(!range.contains(day));
        }
    }

    #[test]
    fn configured_range_includes_only_members() {
        let mut range = DayRange::new("user-1", "Weekdays");
        range.set_slots([Day::Monday, Day::Tuesday]);
        assert!(range.includes(Day::Monday));
        assert!(range.includes(Day::Tuesday));
        assert!(!range.includes(Day::Wednesday));
        assert!(!range.includes(Day::Sunday));
    }

    #[test]
    fn set_slots_replaces_previous_contents() {
        let mut range = DayRange::new("user-1", "Week");
        range.set_slots([Day::Saturday, Day::Sunday]);
        range.set_slots([Day::Wednesday]);
        assert_eq!(range.slot_vec(), vec![Day::Wednesday]);
        assert!(!range.includes(Day::Saturday));
        assert!(!range.includes(Day::Sunday));
    }

    #[test]
    fn set_slots_with_nothing_clears_to_match_all() {
        let mut range = DayRange::new("user-1", "Week");
        range.set_slots([Day::Friday]);
        range.set_slots(Vec::new());
        assert!(range.is_empty());
        assert!(range.includes(Day::Monday));
    }

    #[test]
    fn time_range_membership_is_exact() {
        let mut range = TimeRange::new("user-1", "Lunch");
        range.set_slots([t(12, 30)]);
        assert_eq!(range.slot_vec(), vec![t(12, 30)]);
        assert!(range.includes(t(12, 30)));
        assert!(!range.includes(t(12, 0)));
        assert!(!range.includes(t(12, 15)));
    }

    #[test]
    fn time_range_keeps_distinct_minutes() {
        let mut range = TimeRange::new("user-1", "Lunch");
        range.set_slots([t(12, 45), t(12, 30), t(12, 30), t(13, 10)]);
        assert_eq!(range.slot_vec(), vec![t(12, 30), t(12, 45), t(13, 10)]);
    }

    #[test]
    fn span_wraps_past_midnight() {
        let night = TimeRange::span(t(20, 0), t(6, 0));
        assert_eq!(night.len(), 10);
        assert_eq!(night.first(), Some(&t(20, 0)));
        assert!(night.contains(&t(23, 0)));
        assert!(night.contains(&t(0, 0)));
        assert_eq!(night.last(), Some(&t(5, 0)));
    }

    #[test]
    fn span_with_equal_bounds_is_whole_day() {
        assert_eq!(TimeRange::span(t(8, 0), t(8, 0)).len(), 24);
        assert_eq!(TimeRange::span(t(6, 0), t(12, 0)).len(), 6);
    }

    #[test]
    fn override_range_is_hidden() {
        let range = TimeRange::override_for("user-1", "tag-1");
        assert!(range.is_hidden());
        assert_eq!(range.parent_tag_id.as_deref(), Some("tag-1"));
        assert!(!TimeRange::new("user-1", "Evening").is_hidden());
    }

    #[test]
    fn validate_checks_name() {
        assert!(DayRange::new("u", "Weekend").validate().is_ok());

        let blank = DayRange::new("u", "   ").validate().unwrap_err();
        assert!(blank.has("name"));

        let long = DayRange::new("u", "x".repeat(RANGE_NAME_MAX_LENGTH + 1))
            .validate()
            .unwrap_err();
        assert_eq!(long.len(), 1);
    }
}

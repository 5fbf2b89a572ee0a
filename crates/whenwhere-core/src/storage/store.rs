//! Persistence boundary for the engine.
//!
//! `list_*`/`visible_*` methods return only records the user can see;
//! hidden overrides are reached through the `hidden_*` lookups by parent id.
//! `save_*` validates and upserts. `destroy_*` cascades to owned records.

use crate::day::Day;
use crate::error::Result;
use crate::location::Location;
use crate::range::{DayRange, Slot, SlotRange, TimeRange};
use crate::tag::Tag;
use crate::task::Task;
use crate::time_of_day::TimeOfDay;
use crate::user::User;

pub trait Store {
    fn find_user(&self, id: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn save_user(&self, user: &User) -> Result<()>;
    fn destroy_user(&self, id: &str) -> Result<()>;

    fn find_day_range(&self, id: &str) -> Result<Option<DayRange>>;
    /// Named day ranges, hidden overrides excluded.
    fn visible_day_ranges(&self, user_id: &str) -> Result<Vec<DayRange>>;
    /// The override day range owned by `tag_id`, if one exists.
    fn hidden_day_range(&self, tag_id: &str) -> Result<Option<DayRange>>;
    fn save_day_range(&self, range: &DayRange) -> Result<()>;
    fn destroy_day_range(&self, id: &str) -> Result<()>;

    fn find_time_range(&self, id: &str) -> Result<Option<TimeRange>>;
    /// Named time ranges, hidden overrides excluded.
    fn visible_time_ranges(&self, user_id: &str) -> Result<Vec<TimeRange>>;
    /// The override time range owned by `tag_id`, if one exists.
    fn hidden_time_range(&self, tag_id: &str) -> Result<Option<TimeRange>>;
    fn save_time_range(&self, range: &TimeRange) -> Result<()>;
    fn destroy_time_range(&self, id: &str) -> Result<()>;

    fn find_location(&self, id: &str) -> Result<Option<Location>>;
    fn find_location_by_name(&self, user_id: &str, name: &str) -> Result<Option<Location>>;
    fn list_locations(&self, user_id: &str) -> Result<Vec<Location>>;
    fn save_location(&self, location: &Location) -> Result<()>;
    fn destroy_location(&self, id: &str) -> Result<()>;

    fn find_tag(&self, id: &str) -> Result<Option<Tag>>;
    /// Named tags, hidden task overrides excluded.
    fn visible_tags(&self, user_id: &str) -> Result<Vec<Tag>>;
    /// The hidden tag holding `task_id`'s overrides, if one exists.
    fn hidden_tag(&self, task_id: &str) -> Result<Option<Tag>>;
    fn save_tag(&self, tag: &Tag) -> Result<()>;
    fn destroy_tag(&self, id: &str) -> Result<()>;

    fn find_task(&self, id: &str) -> Result<Option<Task>>;
    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>>;
    fn save_task(&self, task: &Task) -> Result<()>;
    fn destroy_task(&self, id: &str) -> Result<()>;

    /// Resolve `ids` to locations in the given order, skipping ids that no
    /// longer exist.
    fn locations_by_ids(&self, ids: &[String]) -> Result<Vec<Location>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(location) = self.find_location(id)? {
                found.push(location);
            }
        }
        Ok(found)
    }
}

/// Routes generic range operations to the per-kind [`Store`] methods.
pub trait StoredSlot: Slot {
    fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<SlotRange<Self>>>;
    fn visible<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<Vec<SlotRange<Self>>>;
    fn hidden<S: Store + ?Sized>(store: &S, tag_id: &str) -> Result<Option<SlotRange<Self>>>;
    fn save<S: Store + ?Sized>(store: &S, range: &SlotRange<Self>) -> Result<()>;
    fn destroy<S: Store + ?Sized>(store: &S, id: &str) -> Result<()>;
}

impl StoredSlot for Day {
    fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<DayRange>> {
        store.find_day_range(id)
    }
    fn visible<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<Vec<DayRange>> {
        store.visible_day_ranges(user_id)
    }
    fn hidden<S: Store + ?Sized>(store: &S, tag_id: &str) -> Result<Option<DayRange>> {
        store.hidden_day_range(tag_id)
    }
    fn save<S: Store + ?Sized>(store: &S, range: &DayRange) -> Result<()> {
        store.save_day_range(range)
    }
    fn destroy<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
        store.destroy_day_range(id)
    }
}

impl StoredSlot for TimeOfDay {
    fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<TimeRange>> {
        store.find_time_range(id)
    }
    fn visible<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<Vec<TimeRange>> {
        store.visible_time_ranges(user_id)
    }
    fn hidden<S: Store + ?Sized>(store: &S, tag_id: &str) -> Result<Option<TimeRange>> {
        store.hidden_time_range(tag_id)
    }
    fn save<S: Store + ?Sized>(store: &S, range: &TimeRange) -> Result<()> {
        store.save_time_range(range)
    }
    fn destroy<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
        store.destroy_time_range(id)
    }
}

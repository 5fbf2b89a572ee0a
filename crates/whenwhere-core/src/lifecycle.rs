//! Record workflows that span more than one store call.
//!
//! New users get the configured preset records. Locations are normalized,
//! validated and then geocoded. Override editing creates a task's hidden
//! tag on first use and removes hidden ranges when an override is cleared.

use chrono::Utc;

use crate::error::{CoreError, Result, ValidationErrors};
use crate::geocode::Geocoder;
use crate::location::{Address, Location};
use crate::range::SlotRange;
use crate::storage::{DefaultsConfig, PresetRecords, Store, StoredSlot};
use crate::tag::Tag;
use crate::task::Task;
use crate::user::User;

fn require<T>(found: Option<T>, entity: &'static str, id: &str) -> Result<T> {
    found.ok_or_else(|| CoreError::not_found(entity, id))
}

fn invalid(field: &str, message: &str) -> CoreError {
    let mut errors = ValidationErrors::new();
    errors.add(field, message);
    CoreError::Validation(errors)
}

// === Users ===

/// Create a user along with the preset ranges and locations in `defaults`.
///
/// Every record is built and checked before the first write. If a write
/// still fails, the user and anything already saved for them are removed.
pub fn create_user<S: Store + ?Sized>(
    store: &S,
    first_name: &str,
    last_name: &str,
    defaults: &DefaultsConfig,
) -> Result<User> {
    let user = User::new(first_name.trim(), last_name.trim());
    user.validate()?;
    let presets = defaults.records(&user.id)?;

    store.save_user(&user)?;
    if let Err(e) = save_presets(store, &presets) {
        if let Err(cleanup) = store.destroy_user(&user.id) {
            tracing::error!(user = %user.id, error = %cleanup, "failed to remove partial user");
        }
        return Err(e);
    }

    tracing::info!(user = %user.id, "created user");
    Ok(user)
}

fn save_presets<S: Store + ?Sized>(store: &S, presets: &PresetRecords) -> Result<()> {
    for range in &presets.time_ranges {
        store.save_time_range(range)?;
    }
    for range in &presets.day_ranges {
        store.save_day_range(range)?;
    }
    for location in &presets.locations {
        store.save_location(location)?;
    }
    Ok(())
}

// === Named ranges ===

pub fn create_range<T, S>(
    store: &S,
    user_id: &str,
    name: &str,
    slots: impl IntoIterator<Item = T>,
) -> Result<SlotRange<T>>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    require(store.find_user(user_id)?, "user", user_id)?;
    let mut range = SlotRange::new(user_id, name.trim());
    range.set_slots(slots);
    T::save(store, &range)?;
    tracing::info!(kind = T::KIND, range = %range.id, "created range");
    Ok(range)
}

/// Look up a named range. Hidden overrides are not addressable this way.
pub fn find_visible_range<T, S>(store: &S, id: &str) -> Result<SlotRange<T>>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    match T::find(store, id)? {
        Some(range) if !range.is_hidden() => Ok(range),
        _ => Err(CoreError::not_found(T::KIND, id)),
    }
}

/// Rename a named range and/or replace its slots.
pub fn update_range<T, S>(
    store: &S,
    id: &str,
    name: Option<&str>,
    slots: Option<Vec<T>>,
) -> Result<SlotRange<T>>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    let mut range = find_visible_range::<T, S>(store, id)?;
    if let Some(name) = name {
        range.name = name.trim().to_string();
        range.updated_at = Utc::now();
    }
    if let Some(slots) = slots {
        range.set_slots(slots);
    }
    T::save(store, &range)?;
    Ok(range)
}

pub fn destroy_range<T, S>(store: &S, id: &str) -> Result<()>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    let range = find_visible_range::<T, S>(store, id)?;
    T::destroy(store, &range.id)?;
    tracing::info!(kind = T::KIND, range = %range.id, "deleted range");
    Ok(())
}

// === Locations ===

/// Field validation plus per-user name uniqueness.
fn check_location<S: Store + ?Sized>(store: &S, location: &Location) -> Result<()> {
    let mut errors = match location.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    if let Some(existing) = store.find_location_by_name(&location.user_id, &location.name)? {
        if existing.id != location.id {
            errors.add("name", "has already been taken");
        }
    }
    errors.into_result()?;
    Ok(())
}

/// Normalize, validate, geocode and store a location.
///
/// A failed lookup is logged and leaves the coordinate empty; the save
/// still goes through.
pub fn save_location<S: Store + ?Sized>(
    store: &S,
    geocoder: &dyn Geocoder,
    mut location: Location,
) -> Result<Location> {
    location.normalize_name();
    check_location(store, &location)?;

    location.coordinate = None;
    if !location.address.is_blank() {
        let query = location.address.one_line();
        match geocoder.geocode(&query) {
            Ok(coordinate) => location.coordinate = Some(coordinate),
            Err(e) => {
                tracing::warn!(location = %location.id, address = %query, error = %e, "geocoding failed")
            }
        }
    }

    location.updated_at = Utc::now();
    store.save_location(&location)?;
    tracing::info!(location = %location.id, name = %location.name, "saved location");
    Ok(location)
}

pub fn create_location<S: Store + ?Sized>(
    store: &S,
    geocoder: &dyn Geocoder,
    user_id: &str,
    name: &str,
    address: Address,
) -> Result<Location> {
    require(store.find_user(user_id)?, "user", user_id)?;
    let mut location = Location::new(user_id, name);
    location.address = address;
    save_location(store, geocoder, location)
}

/// Rename and/or readdress a location. The coordinate is recomputed.
pub fn update_location<S: Store + ?Sized>(
    store: &S,
    geocoder: &dyn Geocoder,
    id: &str,
    name: Option<&str>,
    address: Option<Address>,
) -> Result<Location> {
    let mut location = require(store.find_location(id)?, "location", id)?;
    if let Some(name) = name {
        location.name = name.to_string();
    }
    if let Some(address) = address {
        location.address = address;
    }
    save_location(store, geocoder, location)
}

// === Tags and tasks ===

/// Every id must name a location owned by `user_id`.
fn check_location_ids<S: Store + ?Sized>(store: &S, user_id: &str, ids: &[String]) -> Result<()> {
    for id in ids {
        match store.find_location(id)? {
            Some(location) if location.user_id == user_id => {}
            _ => return Err(invalid("locations", &format!("contains unknown location '{id}'"))),
        }
    }
    Ok(())
}

pub fn create_tag<S: Store + ?Sized>(store: &S, user_id: &str, name: &str) -> Result<Tag> {
    require(store.find_user(user_id)?, "user", user_id)?;
    let tag = Tag::new(user_id, name.trim());
    store.save_tag(&tag)?;
    tracing::info!(tag = %tag.id, "created tag");
    Ok(tag)
}

/// Look up a named tag. Hidden tags are not addressable this way.
pub fn find_visible_tag<S: Store + ?Sized>(store: &S, id: &str) -> Result<Tag> {
    match store.find_tag(id)? {
        Some(tag) if !tag.is_hidden() => Ok(tag),
        _ => Err(CoreError::not_found("tag", id)),
    }
}

pub fn rename_tag<S: Store + ?Sized>(store: &S, id: &str, name: &str) -> Result<Tag> {
    let mut tag = find_visible_tag(store, id)?;
    tag.name = name.trim().to_string();
    tag.updated_at = Utc::now();
    store.save_tag(&tag)?;
    Ok(tag)
}

pub fn destroy_tag<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
    let tag = find_visible_tag(store, id)?;
    store.destroy_tag(&tag.id)?;
    tracing::info!(tag = %tag.id, "deleted tag");
    Ok(())
}

/// Fields of a task a caller may set.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub important: Option<bool>,
    pub long_lasting: Option<bool>,
    /// `Some(None)` detaches the task from its tag.
    pub tag_id: Option<Option<String>>,
}

fn apply_task_input<S: Store + ?Sized>(store: &S, task: &mut Task, input: TaskInput) -> Result<()> {
    if let Some(title) = input.title {
        task.title = title.trim().to_string();
    }
    if let Some(content) = input.content {
        task.content = content;
    }
    if let Some(important) = input.important {
        task.important = important;
    }
    if let Some(long_lasting) = input.long_lasting {
        task.long_lasting = long_lasting;
    }
    if let Some(tag_id) = input.tag_id {
        if let Some(id) = &tag_id {
            match store.find_tag(id)? {
                Some(tag) if !tag.is_hidden() && tag.user_id == task.user_id => {}
                _ => return Err(invalid("tag", &format!("unknown tag '{id}'"))),
            }
        }
        task.tag_id = tag_id;
    }
    task.updated_at = Utc::now();
    Ok(())
}

pub fn create_task<S: Store + ?Sized>(store: &S, user_id: &str, input: TaskInput) -> Result<Task> {
    require(store.find_user(user_id)?, "user", user_id)?;
    let mut task = Task::new(user_id, "");
    apply_task_input(store, &mut task, input)?;
    store.save_task(&task)?;
    tracing::info!(task = %task.id, "created task");
    Ok(task)
}

pub fn update_task<S: Store + ?Sized>(store: &S, id: &str, input: TaskInput) -> Result<Task> {
    let mut task = require(store.find_task(id)?, "task", id)?;
    apply_task_input(store, &mut task, input)?;
    store.save_task(&task)?;
    Ok(task)
}

pub fn destroy_task<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
    let task = require(store.find_task(id)?, "task", id)?;
    store.destroy_task(&task.id)?;
    tracing::info!(task = %task.id, "deleted task");
    Ok(())
}

// === Overrides ===

/// Whose overrides are being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideTarget {
    Tag(String),
    Task(String),
}

impl OverrideTarget {
    pub fn id(&self) -> &str {
        match self {
            OverrideTarget::Tag(id) | OverrideTarget::Task(id) => id,
        }
    }
}

/// The tag holding `target`'s overrides, created for a task on first use
/// when `create` is set.
fn override_tag<S: Store + ?Sized>(store: &S, target: &OverrideTarget, create: bool) -> Result<Option<Tag>> {
    match target {
        OverrideTarget::Tag(id) => find_visible_tag(store, id).map(Some),
        OverrideTarget::Task(id) => {
            let task = require(store.find_task(id)?, "task", id)?;
            match store.hidden_tag(&task.id)? {
                Some(tag) => Ok(Some(tag)),
                None if create => {
                    let tag = Tag::hidden_for(&task.user_id, &task.id);
                    store.save_tag(&tag)?;
                    tracing::debug!(task = %task.id, tag = %tag.id, "created hidden tag");
                    Ok(Some(tag))
                }
                None => Ok(None),
            }
        }
    }
}

/// Drop a task's hidden tag once it no longer overrides anything.
/// Returns whether the tag was removed.
fn prune_hidden_tag<S: Store + ?Sized>(store: &S, tag: &Tag) -> Result<bool> {
    if !tag.is_hidden() || tag.overrides_locations() {
        return Ok(false);
    }
    if store.hidden_day_range(&tag.id)?.is_some() || store.hidden_time_range(&tag.id)?.is_some() {
        return Ok(false);
    }
    store.destroy_tag(&tag.id)?;
    tracing::debug!(tag = %tag.id, "pruned empty hidden tag");
    Ok(true)
}

/// Replace `target`'s override for one range kind. An empty slot list
/// still overrides: it lets every value through.
pub fn set_range_override<T, S>(
    store: &S,
    target: &OverrideTarget,
    slots: impl IntoIterator<Item = T>,
) -> Result<SlotRange<T>>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    let tag = require(override_tag(store, target, true)?, "tag", target.id())?;
    let mut range = match T::hidden(store, &tag.id)? {
        Some(range) => range,
        None => SlotRange::override_for(&tag.user_id, &tag.id),
    };
    range.set_slots(slots);
    T::save(store, &range)?;
    Ok(range)
}

/// Owner of the tag or task behind `target`.
fn target_user_id<S: Store + ?Sized>(store: &S, target: &OverrideTarget) -> Result<String> {
    match target {
        OverrideTarget::Tag(id) => Ok(find_visible_tag(store, id)?.user_id),
        OverrideTarget::Task(id) => Ok(require(store.find_task(id)?, "task", id)?.user_id),
    }
}

/// Copy a named range's slots into `target`'s override. The range must
/// belong to the same user as the target.
pub fn apply_range_preset<T, S>(store: &S, target: &OverrideTarget, preset_id: &str) -> Result<SlotRange<T>>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    let preset = find_visible_range::<T, S>(store, preset_id)?;
    if preset.user_id != target_user_id(store, target)? {
        return Err(CoreError::not_found(T::KIND, preset_id));
    }
    set_range_override(store, target, preset.slots())
}

/// Remove `target`'s override for one range kind so the parent's value
/// applies again. Returns whether anything was removed.
pub fn clear_range_override<T, S>(store: &S, target: &OverrideTarget) -> Result<bool>
where
    T: StoredSlot,
    S: Store + ?Sized,
{
    let Some(tag) = override_tag(store, target, false)? else {
        return Ok(false);
    };
    let Some(range) = T::hidden(store, &tag.id)? else {
        return Ok(false);
    };
    T::destroy(store, &range.id)?;
    prune_hidden_tag(store, &tag)?;
    Ok(true)
}

/// Replace `target`'s location set. An empty list clears the override.
///
/// Returns the tag now holding the set, or `None` when a task is left
/// without a hidden tag.
pub fn set_location_override<S: Store + ?Sized>(
    store: &S,
    target: &OverrideTarget,
    location_ids: &[String],
) -> Result<Option<Tag>> {
    let create = !location_ids.is_empty();
    let Some(mut tag) = override_tag(store, target, create)? else {
        return Ok(None);
    };
    check_location_ids(store, &tag.user_id, location_ids)?;
    tag.set_location_ids(location_ids.iter().cloned());
    store.save_tag(&tag)?;
    if prune_hidden_tag(store, &tag)? {
        return Ok(None);
    }
    Ok(Some(tag))
}

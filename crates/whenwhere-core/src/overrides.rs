//! Override hierarchy resolution.
//!
//! Each dimension (day range, time range, location set) resolves by walking
//! a short chain of tags and taking the first one that overrides it:
//!
//! - for a tag: the tag itself;
//! - for a task: its hidden tag, then the tag it is filed under.
//!
//! A tag overrides a range dimension when it owns a hidden range of that
//! kind, even an empty one. It overrides the location dimension when it has
//! at least one location. Parent references that no longer resolve are
//! skipped, which reads as "no override".

use serde::Serialize;

use crate::error::Result;
use crate::location::Location;
use crate::range::{DayRange, TimeRange};
use crate::storage::Store;
use crate::tag::Tag;
use crate::task::Task;

/// Something that can carry override ranges.
#[derive(Debug, Clone, Copy)]
pub enum Rangeable<'a> {
    Tag(&'a Tag),
    Task(&'a Task),
}

impl<'a> From<&'a Tag> for Rangeable<'a> {
    fn from(tag: &'a Tag) -> Self {
        Rangeable::Tag(tag)
    }
}

impl<'a> From<&'a Task> for Rangeable<'a> {
    fn from(task: &'a Task) -> Self {
        Rangeable::Task(task)
    }
}

/// Effective day and time ranges. `None` means nothing in the chain
/// overrides that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveRanges {
    pub day: Option<DayRange>,
    pub time: Option<TimeRange>,
}

/// Every dimension the task matcher checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectiveConstraints {
    pub day: Option<DayRange>,
    pub time: Option<TimeRange>,
    /// Empty when nothing overrides the location dimension.
    pub locations: Vec<Location>,
}

impl From<EffectiveConstraints> for EffectiveRanges {
    fn from(c: EffectiveConstraints) -> Self {
        Self {
            day: c.day,
            time: c.time,
        }
    }
}

/// Tags consulted for `target`, highest precedence first.
pub fn override_chain<S: Store + ?Sized>(store: &S, target: Rangeable<'_>) -> Result<Vec<Tag>> {
    match target {
        Rangeable::Tag(tag) => Ok(vec![tag.clone()]),
        Rangeable::Task(task) => {
            let mut chain = Vec::with_capacity(2);
            if let Some(hidden) = store.hidden_tag(&task.id)? {
                chain.push(hidden);
            }
            if let Some(tag_id) = &task.tag_id {
                match store.find_tag(tag_id)? {
                    Some(tag) => chain.push(tag),
                    None => tracing::debug!(task = %task.id, tag = %tag_id, "parent tag missing"),
                }
            }
            Ok(chain)
        }
    }
}

/// The tag whose values `target` sees first: a task's hidden tag when it
/// has one, otherwise its parent tag.
pub fn effective_tag<S: Store + ?Sized>(store: &S, target: Rangeable<'_>) -> Result<Option<Tag>> {
    Ok(override_chain(store, target)?.into_iter().next())
}

fn first_day_range<S: Store + ?Sized>(store: &S, chain: &[Tag]) -> Result<Option<DayRange>> {
    for tag in chain {
        if let Some(range) = store.hidden_day_range(&tag.id)? {
            tracing::debug!(tag = %tag.id, range = %range.id, "day range override");
            return Ok(Some(range));
        }
    }
    Ok(None)
}

fn first_time_range<S: Store + ?Sized>(store: &S, chain: &[Tag]) -> Result<Option<TimeRange>> {
    for tag in chain {
        if let Some(range) = store.hidden_time_range(&tag.id)? {
            tracing::debug!(tag = %tag.id, range = %range.id, "time range override");
            return Ok(Some(range));
        }
    }
    Ok(None)
}

fn first_locations<S: Store + ?Sized>(store: &S, chain: &[Tag]) -> Result<Vec<Location>> {
    match chain.iter().find(|tag| tag.overrides_locations()) {
        Some(tag) => {
            tracing::debug!(tag = %tag.id, count = tag.location_ids.len(), "location override");
            store.locations_by_ids(&tag.location_ids)
        }
        None => Ok(Vec::new()),
    }
}

pub fn effective_day_range<S: Store + ?Sized>(
    store: &S,
    target: Rangeable<'_>,
) -> Result<Option<DayRange>> {
    first_day_range(store, &override_chain(store, target)?)
}

pub fn effective_time_range<S: Store + ?Sized>(
    store: &S,
    target: Rangeable<'_>,
) -> Result<Option<TimeRange>> {
    first_time_range(store, &override_chain(store, target)?)
}

pub fn effective_locations<S: Store + ?Sized>(
    store: &S,
    target: Rangeable<'_>,
) -> Result<Vec<Location>> {
    first_locations(store, &override_chain(store, target)?)
}

/// All three dimensions from a single walk of the chain.
pub fn resolve_constraints<S: Store + ?Sized>(
    store: &S,
    target: Rangeable<'_>,
) -> Result<EffectiveConstraints> {
    let chain = override_chain(store, target)?;
    Ok(EffectiveConstraints {
        day: first_day_range(store, &chain)?,
        time: first_time_range(store, &chain)?,
        locations: first_locations(store, &chain)?,
    })
}

pub fn resolve_effective_ranges<S: Store + ?Sized>(
    store: &S,
    target: Rangeable<'_>,
) -> Result<EffectiveRanges> {
    resolve_constraints(store, target).map(EffectiveRanges::from)
}

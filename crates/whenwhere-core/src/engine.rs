//! Entry points for filtering a user's tasks against a moment and place.
//!
//! [`Engine`] owns a store and the matching settings. Every call resolves
//! overrides fresh from the store; nothing is cached between calls.

use chrono::NaiveDateTime;

use crate::context::{self, Context, CurrentLocation, TimeFrame};
use crate::error::{CoreError, Result};
use crate::lifecycle::OverrideTarget;
use crate::location::DEFAULT_THRESHOLD_MILES;
use crate::matcher;
use crate::overrides::{self, EffectiveConstraints, EffectiveRanges, Rangeable};
use crate::policy::PolicySet;
use crate::storage::{Config, Store};
use crate::task::Task;

pub struct Engine<S: Store> {
    store: S,
    threshold_miles: f64,
    utc_offset_minutes: i32,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            threshold_miles: DEFAULT_THRESHOLD_MILES,
            utc_offset_minutes: 0,
        }
    }

    /// Engine using the threshold and clock offset from `config`.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self {
            store,
            threshold_miles: config.matching.location_threshold_miles,
            utc_offset_minutes: config.filter.utc_offset_minutes,
        }
    }

    pub fn with_threshold(mut self, miles: f64) -> Self {
        self.threshold_miles = miles;
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn threshold_miles(&self) -> f64 {
        self.threshold_miles
    }

    /// The engine's local clock.
    pub fn local_now(&self) -> Result<NaiveDateTime> {
        Ok(context::local_now(self.utc_offset_minutes)?)
    }

    /// Fill in the coordinate of a current location given only by id.
    /// With `user_id` set, the location must belong to that user.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] when the id names no location, or
    /// one owned by somebody else.
    pub fn resolve_location(&self, user_id: Option<&str>, mut current: CurrentLocation) -> Result<CurrentLocation> {
        if let (Some(id), None) = (&current.id, current.coordinate) {
            let location = match self.store.find_location(id)? {
                Some(location) if user_id.map_or(true, |owner| location.user_id == owner) => location,
                _ => return Err(CoreError::not_found("location", id.as_str())),
            };
            current.coordinate = location.coordinate;
        }
        Ok(current)
    }

    /// Context for `mode` at the engine's local clock.
    pub fn build_context(&self, mode: TimeFrame, location: CurrentLocation) -> Result<Context> {
        self.build_context_at(mode, self.local_now()?, location)
    }

    /// Context not tied to any user; a current location id may name any
    /// stored location.
    pub fn build_context_at(
        &self,
        mode: TimeFrame,
        now_local: NaiveDateTime,
        location: CurrentLocation,
    ) -> Result<Context> {
        let location = self.resolve_location(None, location)?;
        Ok(context::build_context(mode, now_local, location))
    }

    /// Context for matching `user_id`'s tasks. A current location id must
    /// name one of that user's locations.
    pub fn build_user_context_at(
        &self,
        user_id: &str,
        mode: TimeFrame,
        now_local: NaiveDateTime,
        location: CurrentLocation,
    ) -> Result<Context> {
        let location = self.resolve_location(Some(user_id), location)?;
        Ok(context::build_context(mode, now_local, location))
    }

    /// The user's tasks that are active right now under `mode`.
    pub fn filter_tasks(
        &self,
        user_id: &str,
        mode: TimeFrame,
        policies: &PolicySet,
        location: CurrentLocation,
    ) -> Result<Vec<Task>> {
        self.filter_tasks_at(user_id, mode, self.local_now()?, policies, location)
    }

    /// Same as [`filter_tasks`](Self::filter_tasks) at a fixed local time.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] for an unknown user or current
    /// location id.
    pub fn filter_tasks_at(
        &self,
        user_id: &str,
        mode: TimeFrame,
        now_local: NaiveDateTime,
        policies: &PolicySet,
        location: CurrentLocation,
    ) -> Result<Vec<Task>> {
        if self.store.find_user(user_id)?.is_none() {
            return Err(CoreError::not_found("user", user_id));
        }
        let context = self.build_user_context_at(user_id, mode, now_local, location)?;
        let tasks = self.store.list_tasks(user_id)?;
        let total = tasks.len();
        let active = matcher::filter_tasks(&self.store, tasks, &context, policies, self.threshold_miles)?;
        tracing::debug!(user = %user_id, mode = %mode, total, active = active.len(), "filtered tasks");
        Ok(active)
    }

    /// Whether a single task is active in `context`.
    pub fn task_is_active(&self, task_id: &str, context: &Context, policies: &PolicySet) -> Result<bool> {
        matcher::matches_by_id(&self.store, task_id, context, policies, self.threshold_miles)
    }

    /// Effective day and time ranges of a tag or task.
    pub fn resolve_effective_ranges(&self, target: &OverrideTarget) -> Result<EffectiveRanges> {
        self.resolve_constraints(target).map(EffectiveRanges::from)
    }

    /// Effective ranges plus the effective location set.
    pub fn resolve_constraints(&self, target: &OverrideTarget) -> Result<EffectiveConstraints> {
        match target {
            OverrideTarget::Tag(id) => {
                let tag = self
                    .store
                    .find_tag(id)?
                    .ok_or_else(|| CoreError::not_found("tag", id.as_str()))?;
                overrides::resolve_constraints(&self.store, Rangeable::Tag(&tag))
            }
            OverrideTarget::Task(id) => {
                let task = self
                    .store
                    .find_task(id)?
                    .ok_or_else(|| CoreError::not_found("task", id.as_str()))?;
                overrides::resolve_constraints(&self.store, Rangeable::Task(&task))
            }
        }
    }
}

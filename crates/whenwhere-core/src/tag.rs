//! Tags group tasks under shared day, time and location constraints.
//!
//! A tag with a `parent_task_id` is hidden: it only exists to hold one
//! task's custom overrides and is excluded from the user's tag list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

pub const TAG_NAME_MAX_LENGTH: usize = 20;

/// Name given to a task's hidden override tag.
pub const OVERRIDE_TAG_NAME: &str = "Custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Set when this tag carries a task's overrides.
    pub parent_task_id: Option<String>,
    /// Associated locations, in association order.
    #[serde(default)]
    pub location_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            parent_task_id: None,
            location_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Empty hidden tag for `task_id`.
    pub fn hidden_for(user_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        let mut tag = Self::new(user_id, OVERRIDE_TAG_NAME);
        tag.parent_task_id = Some(task_id.into());
        tag
    }

    pub fn is_hidden(&self) -> bool {
        self.parent_task_id.is_some()
    }

    /// A hidden tag only overrides the location dimension once it has at
    /// least one location.
    pub fn overrides_locations(&self) -> bool {
        !self.location_ids.is_empty()
    }

    /// Replace the associated locations, dropping duplicates while keeping
    /// first-seen order.
    pub fn set_location_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if !next.contains(&id) {
                next.push(id);
            }
        }
        self.location_ids = next;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "can't be blank");
        } else if name.chars().count() > TAG_NAME_MAX_LENGTH {
            errors.add(
                "name",
                format!("is too long (maximum is {TAG_NAME_MAX_LENGTH} characters)"),
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_tag_points_at_task() {
        let tag = Tag::hidden_for("user-1", "task-1");
        assert!(tag.is_hidden());
        assert_eq!(tag.name, OVERRIDE_TAG_NAME);
        assert_eq!(tag.parent_task_id.as_deref(), Some("task-1"));
        assert!(!Tag::new("user-1", "Errands").is_hidden());
    }

    #[test]
    fn location_override_needs_a_location() {
        let mut tag = Tag::hidden_for("user-1", "task-1");
        assert!(!tag.overrides_locations());
        tag.set_location_ids(["home"]);
        assert!(tag.overrides_locations());
    }

    #[test]
    fn set_location_ids_dedups_in_order() {
        let mut tag = Tag::new("user-1", "Errands");
        tag.set_location_ids(["work", "home", "work"]);
        assert_eq!(tag.location_ids, vec!["work", "home"]);
        tag.set_location_ids(Vec::<String>::new());
        assert!(tag.location_ids.is_empty());
    }

    #[test]
    fn validate_name() {
        assert!(Tag::new("u", "Errands").validate().is_ok());
        assert!(Tag::new("u", "").validate().unwrap_err().has("name"));
        assert!(Tag::new("u", "a".repeat(21)).validate().is_err());
    }
}

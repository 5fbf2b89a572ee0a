use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

pub const TASK_TITLE_MAX_LENGTH: usize = 100;

/// A reminder the user wants surfaced at the right time and place.
///
/// `tag_id` points at the visible tag whose constraints the task inherits.
/// The task's own overrides live on its hidden tag, which is looked up by
/// `parent_task_id` rather than stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub long_lasting: bool,
    pub tag_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            content: String::new(),
            important: false,
            long_lasting: false,
            tag_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_id = Some(tag_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "can't be blank");
        } else if title.chars().count() > TASK_TITLE_MAX_LENGTH {
            errors.add(
                "title",
                format!("is too long (maximum is {TASK_TITLE_MAX_LENGTH} characters)"),
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults() {
        let task = Task::new("user-1", "Buy milk").with_content("2%");
        assert!(!task.important);
        assert!(!task.long_lasting);
        assert!(task.tag_id.is_none());
        assert_eq!(task.content, "2%");
        assert!(task.validate().is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let errors = Task::new("user-1", "  ").validate().unwrap_err();
        assert!(errors.has("title"));
    }

    #[test]
    fn deserializes_with_missing_flags() {
        let json = r#"{
            "id": "t1", "user_id": "u1", "title": "Call mom", "tag_id": null,
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(!task.important);
        assert_eq!(task.content, "");
    }
}

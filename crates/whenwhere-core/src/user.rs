use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

pub const USER_NAME_MAX_LENGTH: usize = 20;

/// Owner of every other record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Split on the first space: "Ada King Lovelace" becomes first name
    /// "Ada", last name "King Lovelace". A single word leaves the last
    /// name empty.
    pub fn set_full_name(&mut self, full_name: &str) {
        let full_name = full_name.trim();
        let (first, last) = full_name.split_once(' ').unwrap_or((full_name, ""));
        self.first_name = first.to_string();
        self.last_name = last.trim().to_string();
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().is_empty() {
                errors.add(field, "can't be blank");
            } else if value.chars().count() > USER_NAME_MAX_LENGTH {
                errors.add(
                    field,
                    format!("is too long (maximum is {USER_NAME_MAX_LENGTH} characters)"),
                );
            }
        }
        errors.into_result()
    }
}

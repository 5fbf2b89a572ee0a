//! Boolean filter policies.
//!
//! Only the keys in [`Policy::ALL`] mean anything. Maps built from user
//! input keep the allow-listed keys and drop the rest without error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Apply the location dimension at all.
    UseLocation,
    /// Only tasks flagged important.
    ImportantOnly,
    /// Only tasks flagged long-lasting.
    LongLastingOnly,
}

impl Policy {
    pub const ALL: [Policy; 3] = [
        Policy::UseLocation,
        Policy::ImportantOnly,
        Policy::LongLastingOnly,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Policy::UseLocation => "use_location",
            Policy::ImportantOnly => "important_only",
            Policy::LongLastingOnly => "long_lasting_only",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolved value of every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    #[serde(default = "default_true")]
    pub use_location: bool,
    #[serde(default)]
    pub important_only: bool,
    #[serde(default)]
    pub long_lasting_only: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            use_location: true,
            important_only: false,
            long_lasting_only: false,
        }
    }
}

impl PolicySet {
    pub fn get(&self, policy: Policy) -> bool {
        match policy {
            Policy::UseLocation => self.use_location,
            Policy::ImportantOnly => self.important_only,
            Policy::LongLastingOnly => self.long_lasting_only,
        }
    }

    pub fn set(&mut self, policy: Policy, value: bool) {
        match policy {
            Policy::UseLocation => self.use_location = value,
            Policy::ImportantOnly => self.important_only = value,
            Policy::LongLastingOnly => self.long_lasting_only = value,
        }
    }

    /// Start from `self` and apply every allow-listed entry of `entries`.
    /// Unknown keys are skipped.
    pub fn merged<K, I>(mut self, entries: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, serde_json::Value)>,
    {
        for (key, value) in entries {
            match Policy::from_key(key.as_ref()) {
                Some(policy) => self.set(policy, truthy(&value)),
                None => tracing::debug!(key = key.as_ref(), "ignoring unknown policy"),
            }
        }
        self
    }

    /// Defaults overlaid with the allow-listed entries of `entries`.
    pub fn from_map<K, I>(entries: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, serde_json::Value)>,
    {
        Self::default().merged(entries)
    }

    /// Whether the task's flags satisfy every active flag policy.
    pub fn flags_hold(&self, task: &Task) -> bool {
        (!self.important_only || task.important) && (!self.long_lasting_only || task.long_lasting)
    }
}

/// Boolean coercion for untrusted input. Null, `false`, zero, and the
/// strings "", "0", "false", "no" and "off" are false; anything else is true.
fn truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let set = PolicySet::default();
        assert!(set.get(Policy::UseLocation));
        assert!(!set.get(Policy::ImportantOnly));
        assert!(!set.get(Policy::LongLastingOnly));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let set = PolicySet::from_map([
            ("important_only", json!(true)),
            ("delete_everything", json!(true)),
        ]);
        assert_eq!(
            set,
            PolicySet {
                important_only: true,
                ..PolicySet::default()
            }
        );
    }

    #[test]
    fn values_are_coerced_to_booleans() {
        let set = PolicySet::from_map([
            ("use_location", json!("false")),
            ("important_only", json!(1)),
            ("long_lasting_only", json!("yes")),
        ]);
        assert!(!set.use_location);
        assert!(set.important_only);
        assert!(set.long_lasting_only);

        let set = PolicySet::from_map([("important_only", serde_json::Value::Null)]);
        assert!(!set.important_only);
    }

    #[test]
    fn from_key_round_trips() {
        for policy in Policy::ALL {
            assert_eq!(Policy::from_key(policy.key()), Some(policy));
        }
        assert_eq!(Policy::from_key("Important_Only"), None);
    }

    #[test]
    fn flags_hold_checks_active_policies() {
        let mut task = Task::new("u", "Taxes");
        let strict = PolicySet {
            important_only: true,
            long_lasting_only: true,
            ..PolicySet::default()
        };
        assert!(PolicySet::default().flags_hold(&task));
        assert!(!strict.flags_hold(&task));

        task.important = true;
        assert!(!strict.flags_hold(&task));
        task.long_lasting = true;
        assert!(strict.flags_hold(&task));
    }
}

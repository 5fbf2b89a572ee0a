//! TOML-based application configuration.
//!
//! Stores:
//! - The location match radius
//! - Saved filter preferences (time frame, UTC offset, policies)
//! - Geocoder endpoint settings
//! - The preset records created for every new user
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::context::TimeFrame;
use crate::day::Day;
use crate::error::ConfigError;
use crate::location::{Location, DEFAULT_THRESHOLD_MILES};
use crate::policy::PolicySet;
use crate::range::{DayRange, SlotRange, TimeRange};
use crate::time_of_day::TimeOfDay;

pub const CONFIG_FILE: &str = "config.toml";

/// Location matching configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub location_threshold_miles: f64,
}

/// Saved filter preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub time_frame: TimeFrame,
    /// Minutes east of UTC used to compute "now".
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_true")]
    pub use_location: bool,
    #[serde(default)]
    pub important_only: bool,
    #[serde(default)]
    pub long_lasting_only: bool,
}

/// Geocoding service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// A named time range created for new users. `end` is exclusive and may
/// be earlier than `start` to wrap past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangePreset {
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// A named day range created for new users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRangePreset {
    pub name: String,
    pub days: Vec<Day>,
}

/// Records created for every new user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_time_ranges")]
    pub time_ranges: Vec<TimeRangePreset>,
    #[serde(default = "default_day_ranges")]
    pub day_ranges: Vec<DayRangePreset>,
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

// Default functions
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_MILES
}
fn default_true() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".into()
}
fn default_user_agent() -> String {
    concat!("whenwhere/", env!("CARGO_PKG_VERSION")).into()
}
fn default_timeout_secs() -> u64 {
    10
}

fn hour(h: i64) -> TimeOfDay {
    TimeOfDay::at_hour(h).unwrap_or(TimeOfDay::MIDNIGHT)
}

fn time_preset(name: &str, start: i64, end: i64) -> TimeRangePreset {
    TimeRangePreset {
        name: name.into(),
        start: hour(start),
        end: hour(end),
    }
}

fn default_time_ranges() -> Vec<TimeRangePreset> {
    vec![
        time_preset("Morning", 6, 12),
        time_preset("Afternoon", 12, 16),
        time_preset("Evening", 16, 20),
        time_preset("Night", 20, 6),
    ]
}

fn default_day_ranges() -> Vec<DayRangePreset> {
    vec![
        DayRangePreset {
            name: "Weekdays".into(),
            days: vec![Day::Monday, Day::Tuesday, Day::Wednesday, Day::Thursday, Day::Friday],
        },
        DayRangePreset {
            name: "Weekend".into(),
            days: vec![Day::Sunday, Day::Saturday],
        },
    ]
}

fn default_locations() -> Vec<String> {
    vec!["Home".into(), "Work".into(), "Shopping".into()]
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            location_threshold_miles: default_threshold(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            time_frame: TimeFrame::default(),
            utc_offset_minutes: 0,
            use_location: true,
            important_only: false,
            long_lasting_only: false,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            time_ranges: default_time_ranges(),
            day_ranges: default_day_ranges(),
            locations: default_locations(),
        }
    }
}

/// Records built from [`DefaultsConfig`] for one user, not yet stored.
#[derive(Debug, Clone)]
pub struct PresetRecords {
    pub time_ranges: Vec<TimeRange>,
    pub day_ranges: Vec<DayRange>,
    pub locations: Vec<Location>,
}

impl DefaultsConfig {
    /// Build the preset records for `user_id`, checking each one against
    /// the rules it is saved under. Location names are normalized first
    /// and must come out distinct.
    pub fn records(&self, user_id: &str) -> Result<PresetRecords, ConfigError> {
        let invalid = |key: &str, name: &str, message: String| ConfigError::InvalidValue {
            key: format!("defaults.{key}"),
            message: format!("'{name}': {message}"),
        };

        let mut time_ranges = Vec::with_capacity(self.time_ranges.len());
        for preset in &self.time_ranges {
            let mut range = TimeRange::new(user_id, preset.name.trim());
            range.set_slots(TimeRange::span(preset.start, preset.end));
            range
                .validate()
                .map_err(|e| invalid("time_ranges", &preset.name, e.to_string()))?;
            time_ranges.push(range);
        }

        let mut day_ranges = Vec::with_capacity(self.day_ranges.len());
        for preset in &self.day_ranges {
            let mut range = SlotRange::new(user_id, preset.name.trim());
            range.set_slots(preset.days.iter().copied());
            range
                .validate()
                .map_err(|e| invalid("day_ranges", &preset.name, e.to_string()))?;
            day_ranges.push(range);
        }

        let mut locations = Vec::with_capacity(self.locations.len());
        let mut names = BTreeSet::new();
        for name in &self.locations {
            let mut location = Location::new(user_id, name.as_str());
            location.normalize_name();
            location
                .validate()
                .map_err(|e| invalid("locations", name, e.to_string()))?;
            if !names.insert(location.name.clone()) {
                return Err(invalid("locations", name, "is listed more than once".into()));
            }
            locations.push(location);
        }

        Ok(PresetRecords {
            time_ranges,
            day_ranges,
            locations,
        })
    }
}

impl FilterConfig {
    pub fn policies(&self) -> PolicySet {
        PolicySet {
            use_location: self.use_location,
            important_only: self.important_only,
            long_lasting_only: self.long_lasting_only,
        }
    }

    pub fn set_policies(&mut self, policies: PolicySet) {
        self.use_location = policies.use_location;
        self.important_only = policies.important_only;
        self.long_lasting_only = policies.long_lasting_only;
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => parse_number(value)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Load from `<data_dir>/config.toml`, writing the defaults there on
    /// first use.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `<data_dir>/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Values the types alone do not rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.matching.location_threshold_miles;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "matching.location_threshold_miles".into(),
                message: format!("must be a positive number, got {threshold}"),
            });
        }
        if self.filter.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: "filter.utc_offset_minutes".into(),
                message: "must be less than a day in either direction".into(),
            });
        }
        self.defaults.records("preset-check")?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update one value by dot-separated key without saving.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Update one value by key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<i64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}

mod config;
pub mod migrations;
mod sqlite;
mod store;

pub use config::{
    Config, DayRangePreset, DefaultsConfig, FilterConfig, GeocoderConfig, MatchingConfig,
    PresetRecords, TimeRangePreset, CONFIG_FILE,
};
pub use sqlite::{SqliteStore, DB_FILE};
pub use store::{Store, StoredSlot};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `WHENWHERE_DATA_DIR` wins when set. Otherwise this is
/// `~/.config/whenwhere`, or `~/.config/whenwhere-dev` with
/// `WHENWHERE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("WHENWHERE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WHENWHERE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("whenwhere-dev")
            } else {
                base_dir.join("whenwhere")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

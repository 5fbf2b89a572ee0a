//! Subcommand implementations and the argument types they share.

pub mod config;
pub mod context;
pub mod filter;
pub mod location;
pub mod range;
pub mod tag;
pub mod task;
pub mod user;

use chrono::NaiveDateTime;
use clap::Args;
use serde::Serialize;
use whenwhere_core::{Coordinate, CurrentLocation, OverrideTarget, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_store() -> Result<SqliteStore, Box<dyn std::error::Error>> {
    Ok(SqliteStore::open()?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Where the user is, as given on the command line.
#[derive(Args, Debug, Default)]
pub struct LocationArgs {
    /// Id of a saved location the user is at
    #[arg(long = "at-location")]
    pub location_id: Option<String>,
    /// Current latitude
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Current longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    pub fn current(&self) -> CurrentLocation {
        CurrentLocation {
            id: self.location_id.clone(),
            coordinate: match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
                _ => None,
            },
        }
    }
}

/// Local wall-clock time in `YYYY-MM-DDTHH:MM` form.
pub fn parse_local_time(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM: {e}"))
}

/// A tag or task whose overrides are edited.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Tag id
    #[arg(long)]
    pub tag: Option<String>,
    /// Task id
    #[arg(long)]
    pub task: Option<String>,
}

impl TargetArgs {
    pub fn target(&self) -> Result<OverrideTarget, Box<dyn std::error::Error>> {
        match (&self.tag, &self.task) {
            (Some(id), None) => Ok(OverrideTarget::Tag(id.clone())),
            (None, Some(id)) => Ok(OverrideTarget::Task(id.clone())),
            _ => Err("exactly one of --tag or --task is required".into()),
        }
    }
}

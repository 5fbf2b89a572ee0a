//! Day and time range commands for CLI.
//!
//! Named ranges double as presets; the override actions edit the hidden
//! ranges of a tag or task.

use clap::{Args, Subcommand, ValueEnum};
use std::str::FromStr;
use whenwhere_core::lifecycle::{
    apply_range_preset, clear_range_override, create_range, destroy_range, find_visible_range,
    set_range_override, update_range,
};
use whenwhere_core::{Day, SlotRange, SqliteStore, StoredSlot, TimeOfDay, TimeRange};

use super::{open_store, print_json, CliResult, TargetArgs};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RangeKind {
    /// Weekdays, given by name ("monday", "mon") or code 0-6 from Sunday
    Day,
    /// Hours of the day, given as HH:MM or a FROM-TO span such as 20:00-06:00
    Time,
}

#[derive(Args, Debug)]
pub struct SlotArgs {
    /// Comma-separated slots
    #[arg(value_delimiter = ',', allow_hyphen_values = true)]
    pub slots: Vec<String>,
}

#[derive(Subcommand)]
pub enum RangeAction {
    /// Create a named range
    Create {
        kind: RangeKind,
        /// Owner user ID
        user_id: String,
        name: String,
        #[command(flatten)]
        slots: SlotArgs,
    },
    /// List a user's named ranges
    List { kind: RangeKind, user_id: String },
    /// Get range details
    Get { kind: RangeKind, id: String },
    /// Rename a range and/or replace its slots
    Update {
        kind: RangeKind,
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Comma-separated replacement slots; pass an empty string to clear
        #[arg(long, allow_hyphen_values = true)]
        slots: Option<String>,
    },
    /// Delete a named range
    Delete { kind: RangeKind, id: String },
    /// Replace a tag's or task's override range
    SetOverride {
        kind: RangeKind,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        slots: SlotArgs,
    },
    /// Copy a named range's slots into a tag's or task's override
    ApplyPreset {
        kind: RangeKind,
        #[command(flatten)]
        target: TargetArgs,
        /// Named range ID
        preset_id: String,
    },
    /// Remove an override so the parent tag's range applies again
    ClearOverride {
        kind: RangeKind,
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Parses command-line slot values for one range kind.
trait SlotInput: StoredSlot + serde::Serialize {
    fn parse_into(value: &str, out: &mut Vec<Self>) -> Result<(), Box<dyn std::error::Error>>;

    fn parse_all(values: &[String]) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        let mut slots = Vec::new();
        for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Self::parse_into(value, &mut slots)?;
        }
        Ok(slots)
    }
}

impl SlotInput for Day {
    fn parse_into(value: &str, out: &mut Vec<Self>) -> Result<(), Box<dyn std::error::Error>> {
        let day = match value.parse::<i64>() {
            Ok(code) => Day::from_code(code)?,
            Err(_) => Day::from_str(value)?,
        };
        out.push(day);
        Ok(())
    }
}

/// Times are entered as whole-hour slots; "09:30" selects 09:00.
impl SlotInput for TimeOfDay {
    fn parse_into(value: &str, out: &mut Vec<Self>) -> Result<(), Box<dyn std::error::Error>> {
        match value.split_once('-') {
            Some((from, to)) => {
                let from = TimeOfDay::from_str(from.trim())?;
                let to = TimeOfDay::from_str(to.trim())?;
                out.extend(TimeRange::span(from, to));
            }
            None => out.push(TimeOfDay::from_str(value)?.hour_slot()),
        }
        Ok(())
    }
}

fn split_slots(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}

fn run_kind<T: SlotInput>(store: &SqliteStore, action: RangeAction) -> CliResult
where
    SlotRange<T>: serde::Serialize,
{
    match action {
        RangeAction::Create {
            user_id,
            name,
            slots,
            ..
        } => {
            let range = create_range(store, &user_id, &name, T::parse_all(&slots.slots)?)?;
            print_json(&range)?;
        }
        RangeAction::List { user_id, .. } => {
            print_json(&T::visible(store, &user_id)?)?;
        }
        RangeAction::Get { id, .. } => {
            print_json(&find_visible_range::<T, _>(store, &id)?)?;
        }
        RangeAction::Update { id, name, slots, .. } => {
            let slots = match slots {
                Some(value) => Some(T::parse_all(&split_slots(&value))?),
                None => None,
            };
            let range = update_range(store, &id, name.as_deref(), slots)?;
            print_json(&range)?;
        }
        RangeAction::Delete { id, .. } => {
            destroy_range::<T, _>(store, &id)?;
            println!("Range deleted: {id}");
        }
        RangeAction::SetOverride { target, slots, .. } => {
            let range = set_range_override(store, &target.target()?, T::parse_all(&slots.slots)?)?;
            print_json(&range)?;
        }
        RangeAction::ApplyPreset {
            target, preset_id, ..
        } => {
            let range = apply_range_preset::<T, _>(store, &target.target()?, &preset_id)?;
            print_json(&range)?;
        }
        RangeAction::ClearOverride { target, .. } => {
            let removed = clear_range_override::<T, _>(store, &target.target()?)?;
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
    }
    Ok(())
}

impl RangeAction {
    fn kind(&self) -> RangeKind {
        match self {
            RangeAction::Create { kind, .. }
            | RangeAction::List { kind, .. }
            | RangeAction::Get { kind, .. }
            | RangeAction::Update { kind, .. }
            | RangeAction::Delete { kind, .. }
            | RangeAction::SetOverride { kind, .. }
            | RangeAction::ApplyPreset { kind, .. }
            | RangeAction::ClearOverride { kind, .. } => *kind,
        }
    }
}

pub fn run(action: RangeAction) -> CliResult {
    let store = open_store()?;
    match action.kind() {
        RangeKind::Day => run_kind::<Day>(&store, action),
        RangeKind::Time => run_kind::<TimeOfDay>(&store, action),
    }
}

//! Task filtering command for CLI.
//!
//! The time frame and policies default to the `[filter]` section of the
//! config; `--save` writes the values used back there.

use clap::Args;
use whenwhere_core::{Config, Engine, TimeFrame};

use super::{open_store, parse_local_time, print_json, CliResult, LocationArgs};

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// User ID
    pub user_id: String,
    /// Time frame: now, today, tomorrow or week
    #[arg(long)]
    pub mode: Option<TimeFrame>,
    /// Policy override as KEY=VALUE; unknown keys are ignored
    #[arg(long = "policy", value_parser = parse_policy)]
    pub policies: Vec<(String, serde_json::Value)>,
    /// Local time to filter at instead of the clock (YYYY-MM-DDTHH:MM)
    #[arg(long, value_parser = parse_local_time)]
    pub at: Option<chrono::NaiveDateTime>,
    #[command(flatten)]
    pub location: LocationArgs,
    /// Remember the time frame and policies in the config
    #[arg(long)]
    pub save: bool,
}

fn parse_policy(value: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))?;
    let parsed = serde_json::from_str(raw.trim())
        .unwrap_or_else(|_| serde_json::Value::String(raw.trim().to_string()));
    Ok((key.trim().to_string(), parsed))
}

pub fn run(args: FilterArgs) -> CliResult {
    let mut config = Config::load()?;
    let mode = args.mode.unwrap_or(config.filter.time_frame);
    let policies = config.filter.policies().merged(args.policies);

    if args.save {
        config.filter.time_frame = mode;
        config.filter.set_policies(policies);
        config.save()?;
    }

    let engine = Engine::from_config(open_store()?, &config);
    let location = args.location.current();
    let tasks = match args.at {
        Some(now) => engine.filter_tasks_at(&args.user_id, mode, now, &policies, location)?,
        None => engine.filter_tasks(&args.user_id, mode, &policies, location)?,
    };
    print_json(&tasks)
}

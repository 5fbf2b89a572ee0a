use clap::Args;
use whenwhere_core::{Config, Engine, TimeFrame};

use super::{open_store, parse_local_time, print_json, CliResult, LocationArgs};

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Time frame: now, today, tomorrow or week (default from config)
    #[arg(long)]
    pub mode: Option<TimeFrame>,
    /// Local time to use instead of the clock (YYYY-MM-DDTHH:MM)
    #[arg(long, value_parser = parse_local_time)]
    pub at: Option<chrono::NaiveDateTime>,
    #[command(flatten)]
    pub location: LocationArgs,
}

pub fn run(args: ContextArgs) -> CliResult {
    let config = Config::load()?;
    let engine = Engine::from_config(open_store()?, &config);
    let mode = args.mode.unwrap_or(config.filter.time_frame);
    let context = match args.at {
        Some(now) => engine.build_context_at(mode, now, args.location.current())?,
        None => engine.build_context(mode, args.location.current())?,
    };
    print_json(&context)
}

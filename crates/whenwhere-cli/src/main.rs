use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "whenwhere", version, about = "Whenwhere CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Day and time range management
    Range {
        #[command(subcommand)]
        action: commands::range::RangeAction,
    },
    /// Location management
    Location {
        #[command(subcommand)]
        action: commands::location::LocationAction,
    },
    /// Tag management
    Tag {
        #[command(subcommand)]
        action: commands::tag::TagAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Show the filtering context for a time frame
    Context(commands::context::ContextArgs),
    /// List a user's tasks that are active now
    Filter(commands::filter::FilterArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::User { action } => commands::user::run(action),
        Commands::Range { action } => commands::range::run(action),
        Commands::Location { action } => commands::location::run(action),
        Commands::Tag { action } => commands::tag::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Context(args) => commands::context::run(args),
        Commands::Filter(args) => commands::filter::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

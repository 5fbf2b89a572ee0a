//! Task management commands for CLI.

use clap::Subcommand;
use whenwhere_core::lifecycle::{create_task, destroy_task, set_location_override, update_task};
use whenwhere_core::{Config, CoreError, Engine, OverrideTarget, Store, TaskInput, TimeFrame};

use super::{open_store, parse_local_time, print_json, CliResult, LocationArgs};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Owner user ID
        user_id: String,
        /// Task title
        title: String,
        /// Free-form notes
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        important: bool,
        #[arg(long)]
        long_lasting: bool,
        /// Tag ID to file the task under
        #[arg(long)]
        tag: Option<String>,
    },
    /// List a user's tasks
    List { user_id: String },
    /// Get task details
    Get { id: String },
    /// Update a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        important: Option<bool>,
        #[arg(long)]
        long_lasting: Option<bool>,
        /// New tag ID
        #[arg(long, conflicts_with = "untag")]
        tag: Option<String>,
        /// Remove the task from its tag
        #[arg(long)]
        untag: bool,
    },
    /// Delete a task and its overrides
    Delete { id: String },
    /// Replace the task's own locations; no ids clears the override
    Locations {
        id: String,
        #[arg(value_delimiter = ',')]
        location_ids: Vec<String>,
    },
    /// Show the task's effective day range, time range and locations
    Effective { id: String },
    /// Check whether one task is active
    Active {
        id: String,
        /// Time frame: now, today, tomorrow or week
        #[arg(long)]
        mode: Option<TimeFrame>,
        /// Local time to check instead of the clock (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_local_time)]
        at: Option<chrono::NaiveDateTime>,
        #[command(flatten)]
        location: LocationArgs,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let store = open_store()?;

    match action {
        TaskAction::Create {
            user_id,
            title,
            content,
            important,
            long_lasting,
            tag,
        } => {
            let input = TaskInput {
                title: Some(title),
                content,
                important: Some(important),
                long_lasting: Some(long_lasting),
                tag_id: tag.map(Some),
            };
            let task = create_task(&store, &user_id, input)?;
            print_json(&task)?;
        }
        TaskAction::List { user_id } => {
            print_json(&store.list_tasks(&user_id)?)?;
        }
        TaskAction::Get { id } => {
            let task = store
                .find_task(&id)?
                .ok_or_else(|| CoreError::not_found("task", id.as_str()))?;
            print_json(&task)?;
        }
        TaskAction::Update {
            id,
            title,
            content,
            important,
            long_lasting,
            tag,
            untag,
        } => {
            let tag_id = if untag { Some(None) } else { tag.map(Some) };
            let input = TaskInput {
                title,
                content,
                important,
                long_lasting,
                tag_id,
            };
            print_json(&update_task(&store, &id, input)?)?;
        }
        TaskAction::Delete { id } => {
            destroy_task(&store, &id)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Locations { id, location_ids } => {
            let tag = set_location_override(&store, &OverrideTarget::Task(id), &location_ids)?;
            print_json(&tag)?;
        }
        TaskAction::Effective { id } => {
            let engine = Engine::from_config(store, &Config::load_or_default());
            print_json(&engine.resolve_constraints(&OverrideTarget::Task(id))?)?;
        }
        TaskAction::Active {
            id,
            mode,
            at,
            location,
        } => {
            let config = Config::load()?;
            let task = store
                .find_task(&id)?
                .ok_or_else(|| CoreError::not_found("task", id.as_str()))?;
            let engine = Engine::from_config(store, &config);
            let mode = mode.unwrap_or(config.filter.time_frame);
            let now = match at {
                Some(now) => now,
                None => engine.local_now()?,
            };
            let context = engine.build_user_context_at(&task.user_id, mode, now, location.current())?;
            let active = engine.task_is_active(&id, &context, &config.filter.policies())?;
            print_json(&serde_json::json!({ "id": id, "active": active, "context": context }))?;
        }
    }
    Ok(())
}

//! Tag management commands for CLI.

use clap::Subcommand;
use whenwhere_core::lifecycle::{
    create_tag, destroy_tag, find_visible_tag, rename_tag, set_location_override,
};
use whenwhere_core::{Config, Engine, OverrideTarget, Store};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Create {
        /// Owner user ID
        user_id: String,
        name: String,
    },
    /// List a user's tags
    List { user_id: String },
    /// Get tag details
    Get { id: String },
    /// Rename a tag
    Rename { id: String, name: String },
    /// Delete a tag; its tasks become untagged
    Delete { id: String },
    /// Replace the tag's locations; no ids clears them
    Locations {
        id: String,
        #[arg(value_delimiter = ',')]
        location_ids: Vec<String>,
    },
    /// Show the tag's effective day range, time range and locations
    Effective { id: String },
}

pub fn run(action: TagAction) -> CliResult {
    let store = open_store()?;

    match action {
        TagAction::Create { user_id, name } => {
            print_json(&create_tag(&store, &user_id, &name)?)?;
        }
        TagAction::List { user_id } => {
            print_json(&store.visible_tags(&user_id)?)?;
        }
        TagAction::Get { id } => {
            print_json(&find_visible_tag(&store, &id)?)?;
        }
        TagAction::Rename { id, name } => {
            print_json(&rename_tag(&store, &id, &name)?)?;
        }
        TagAction::Delete { id } => {
            destroy_tag(&store, &id)?;
            println!("Tag deleted: {id}");
        }
        TagAction::Locations { id, location_ids } => {
            let tag = set_location_override(&store, &OverrideTarget::Tag(id), &location_ids)?;
            print_json(&tag)?;
        }
        TagAction::Effective { id } => {
            find_visible_tag(&store, &id)?;
            let engine = Engine::from_config(store, &Config::load_or_default());
            print_json(&engine.resolve_constraints(&OverrideTarget::Tag(id))?)?;
        }
    }
    Ok(())
}

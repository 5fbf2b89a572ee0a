//! User management commands for CLI.

use clap::Subcommand;
use whenwhere_core::lifecycle::create_user;
use whenwhere_core::{Config, CoreError, Store};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user along with the configured default ranges and locations
    Create {
        first_name: String,
        last_name: String,
    },
    /// List users
    List,
    /// Get user details
    Get {
        /// User ID
        id: String,
    },
    /// Change a user's name; the first space separates first from last name
    Rename {
        /// User ID
        id: String,
        full_name: String,
    },
    /// Delete a user and everything they own
    Delete {
        /// User ID
        id: String,
    },
}

pub fn run(action: UserAction) -> CliResult {
    let store = open_store()?;

    match action {
        UserAction::Create {
            first_name,
            last_name,
        } => {
            let config = Config::load()?;
            let user = create_user(&store, &first_name, &last_name, &config.defaults)?;
            print_json(&user)?;
        }
        UserAction::List => {
            print_json(&store.list_users()?)?;
        }
        UserAction::Get { id } => {
            let user = store
                .find_user(&id)?
                .ok_or_else(|| CoreError::not_found("user", id.as_str()))?;
            print_json(&user)?;
        }
        UserAction::Rename { id, full_name } => {
            let mut user = store
                .find_user(&id)?
                .ok_or_else(|| CoreError::not_found("user", id.as_str()))?;
            user.set_full_name(&full_name);
            user.updated_at = chrono::Utc::now();
            store.save_user(&user)?;
            print_json(&user)?;
        }
        UserAction::Delete { id } => {
            if store.find_user(&id)?.is_none() {
                return Err(CoreError::not_found("user", id.as_str()).into());
            }
            store.destroy_user(&id)?;
            println!("User deleted: {id}");
        }
    }
    Ok(())
}

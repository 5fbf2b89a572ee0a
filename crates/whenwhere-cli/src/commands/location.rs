//! Location management commands for CLI.

use clap::{Args, Subcommand};
use whenwhere_core::lifecycle::{create_location, update_location};
use whenwhere_core::location::distance_between;
use whenwhere_core::{geocoder_from_config, Address, Config, CoreError, Store};

use super::{open_store, print_json, CliResult};

#[derive(Args, Debug, Default)]
pub struct AddressArgs {
    #[arg(long)]
    pub street: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub zip: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
}

impl AddressArgs {
    fn is_empty(&self) -> bool {
        self.street.is_none() && self.city.is_none() && self.zip.is_none() && self.state.is_none()
    }

    /// `base` with every given field replaced.
    fn apply_to(self, base: &Address) -> Result<Address, CoreError> {
        let fields = [
            ("street", self.street.or_else(|| base.street.clone())),
            ("city", self.city.or_else(|| base.city.clone())),
            ("zip", self.zip.or_else(|| base.zip.clone())),
            ("state", self.state.or_else(|| base.state.clone())),
        ];
        let present = fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)));
        Ok(Address::from_fields(present)?)
    }
}

#[derive(Subcommand)]
pub enum LocationAction {
    /// Create a location; a given address is geocoded
    Create {
        /// Owner user ID
        user_id: String,
        name: String,
        #[command(flatten)]
        address: AddressArgs,
    },
    /// List a user's locations
    List { user_id: String },
    /// Get location details
    Get { id: String },
    /// Rename a location or change its address
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        address: AddressArgs,
    },
    /// Delete a location
    Delete { id: String },
    /// Great-circle distance in miles between two geocoded locations
    Distance { from: String, to: String },
}

pub fn run(action: LocationAction) -> CliResult {
    let store = open_store()?;
    let find = |id: &str| -> Result<_, CoreError> {
        store
            .find_location(id)?
            .ok_or_else(|| CoreError::not_found("location", id))
    };

    match action {
        LocationAction::Create {
            user_id,
            name,
            address,
        } => {
            let config = Config::load()?;
            let geocoder = geocoder_from_config(&config.geocoder);
            let address = address.apply_to(&Address::default())?;
            let location = create_location(&store, geocoder.as_ref(), &user_id, &name, address)?;
            print_json(&location)?;
        }
        LocationAction::List { user_id } => {
            print_json(&store.list_locations(&user_id)?)?;
        }
        LocationAction::Get { id } => {
            print_json(&find(&id)?)?;
        }
        LocationAction::Update { id, name, address } => {
            let config = Config::load()?;
            let geocoder = geocoder_from_config(&config.geocoder);
            let address = if address.is_empty() {
                None
            } else {
                Some(address.apply_to(&find(&id)?.address)?)
            };
            let location = update_location(&store, geocoder.as_ref(), &id, name.as_deref(), address)?;
            print_json(&location)?;
        }
        LocationAction::Delete { id } => {
            let location = find(&id)?;
            store.destroy_location(&location.id)?;
            println!("Location deleted: {id}");
        }
        LocationAction::Distance { from, to } => {
            let (from, to) = (find(&from)?, find(&to)?);
            match (from.coordinate, to.coordinate) {
                (Some(a), Some(b)) => {
                    print_json(&serde_json::json!({ "miles": distance_between(a, b) }))?;
                }
                _ => return Err("both locations need coordinates".into()),
            }
        }
    }
    Ok(())
}

//! # Whenwhere Core Library
//!
//! Decides which of a user's tasks are relevant at a given moment and place.
//! Everything is available through the standalone `whenwhere` CLI, which is
//! a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Values**: [`Day`], [`TimeOfDay`] and the slot sets built from them
//!   ([`DayRange`], [`TimeRange`])
//! - **Records**: [`User`], [`Location`], [`Tag`], [`Task`], persisted
//!   through the [`Store`] trait ([`SqliteStore`] on disk or in memory)
//! - **Overrides**: tags and tasks hide their parent's ranges and locations
//!   behind their own; see [`overrides`]
//! - **Matching**: a [`Context`] built from a [`TimeFrame`] is checked
//!   against each task's effective constraints and the active [`PolicySet`]
//! - **Geocoding**: addresses become coordinates through a [`Geocoder`]
//!
//! ## Key Components
//!
//! - [`Engine`]: filtering and resolution entry points
//! - [`lifecycle`]: create/update workflows, including override editing
//! - [`Config`]: TOML configuration with dot-path access

pub mod context;
pub mod day;
pub mod engine;
pub mod error;
pub mod geocode;
pub mod lifecycle;
pub mod location;
pub mod matcher;
pub mod overrides;
pub mod policy;
pub mod range;
pub mod storage;
pub mod tag;
pub mod task;
pub mod time_of_day;
pub mod user;

pub use context::{build_context, Context, CurrentLocation, TimeFrame};
pub use day::Day;
pub use engine::Engine;
pub use error::{
    ConfigError, CoreError, DatabaseError, GeocodeError, Result, ValidationError,
    ValidationErrors, ValueError,
};
pub use geocode::{geocoder_from_config, DisabledGeocoder, Geocoder, NominatimGeocoder};
pub use lifecycle::{OverrideTarget, TaskInput};
pub use location::{distance_between, within_distance, Address, Coordinate, Location};
pub use overrides::{EffectiveConstraints, EffectiveRanges, Rangeable};
pub use policy::{Policy, PolicySet};
pub use range::{DayRange, Slot, SlotRange, TimeRange};
pub use storage::{Config, SqliteStore, Store, StoredSlot};
pub use tag::Tag;
pub use task::Task;
pub use time_of_day::TimeOfDay;
pub use user::User;

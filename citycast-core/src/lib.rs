//! Core library for the `citycast` weather lookup.
//!
//! This crate defines:
//! - Configuration & the persisted user settings
//! - Abstraction over the weather provider, plus a fail-soft client on top
//! - The debounced city-suggestion pipeline
//! - Fetch orchestration with last-write-wins cancellation
//! - Display formatting for readings
//!
//! It is used by `citycast-cli`, but can also be embedded by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod location;
pub mod model;
pub mod provider;
pub mod session;
pub mod settings;
pub mod status;
pub mod suggest;

#[cfg(test)]
pub(crate) mod testing;

pub use client::WeatherClient;
pub use config::{Config, Endpoints};
pub use error::{LocationError, WeatherError};
pub use location::{ConfiguredLocation, Geolocator};
pub use model::{CityMatch, Condition, Coordinates, WeatherReading};
pub use provider::{WeatherProvider, provider_from_config};
pub use session::{FetchOutcome, WeatherSession, is_valid_city_name};
pub use settings::{
    FileStore, KeyValueStore, MemoryStore, Settings, SettingsPatch, SettingsStore,
    TemperatureUnit, TimeFormat,
};
pub use status::ServiceStatus;
pub use suggest::{SuggestionEngine, SuggestionState};

//! Core library for the `citycast` weather screen.
//!
//! This crate defines:
//! - Configuration handling
//! - The location search / forecast loading coordinator
//! - Abstractions over the search and forecast providers, plus a
//!   WeatherAPI.com implementation
//! - Persistence of the last chosen city
//! - Shared domain models
//!
//! Renderers drive a [`Coordinator`] with text and selection events and
//! display the [`ViewState`] snapshots it publishes.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use config::Config;
pub use coordinator::{Collaborators, Coordinator, SearchState, Settings, ViewState, startup_city};
pub use error::CoordinatorError;
pub use model::{
    CurrentConditions, DayForecast, ForecastRequest, ForecastSnapshot, LocationCandidate,
    LocationId, PlaceName,
};
pub use provider::{ForecastProvider, LocationSearchProvider, provider_from_config};
pub use store::{FileStore, KeyValueStore, MemoryStore};

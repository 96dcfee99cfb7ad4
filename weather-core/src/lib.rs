//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` trait
//! - Typed, validated weather models
//! - The dashboard view-model, its renderer and the search controller
//!
//! It is used by the `weather-dashboard` binary, but carries no terminal or
//! I/O assumptions beyond HTTP.

pub mod config;
pub mod dashboard;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod view;

pub use config::{Config, FallbackCities};
pub use dashboard::{Dashboard, SearchOutcome};
pub use geolocation::{GeolocationError, Geolocator, NoGeolocation, StaticGeolocator};
pub use model::{Coordinates, CurrentWeather, Forecast, ForecastSample, Location};
pub use provider::{FetchError, WeatherProvider, openweather::OpenWeatherProvider};
pub use view::{DashboardView, ForecastTile, Renderer};

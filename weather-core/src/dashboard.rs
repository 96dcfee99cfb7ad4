//! Search controller: resolves input, drives the two lookups and writes the
//! outcome into the view-model.
//!
//! Every search takes a new generation number. Responses that arrive after
//! a newer search has started are dropped, so a slow lookup can never
//! overwrite fresher results.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::{Config, FallbackCities},
    geolocation::{GeolocationError, Geolocator},
    model::{Coordinates, Location},
    provider::{FetchError, WeatherProvider},
    view::{DashboardView, Renderer},
};

pub const MSG_NOT_FOUND: &str = "City not found. Please try again.";
pub const MSG_FETCH_FAILED: &str = "An error occurred fetching weather data.";
pub const MSG_NETWORK: &str = "Network error. Please check your connection.";
pub const MSG_GEOLOCATION_FAILED: &str =
    "Could not get your location. Please use the search bar.";
pub const MSG_GEOLOCATION_UNSUPPORTED: &str =
    "Geolocation not supported on this device. Please use the search bar.";

/// How a single search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Current conditions were rendered (the forecast may still have failed).
    Rendered,
    /// The current-weather lookup failed and the error was reported.
    Failed,
    /// A newer search started first; nothing was written.
    Superseded,
    /// Blank input; no request was made.
    Ignored,
}

#[derive(Debug)]
pub struct Dashboard<P> {
    provider: P,
    renderer: Renderer,
    fallback: FallbackCities,
    generation: AtomicU64,
    view: Mutex<DashboardView>,
}

impl<P: WeatherProvider> Dashboard<P> {
    pub fn new(provider: P, renderer: Renderer, fallback: FallbackCities) -> Self {
        Self {
            provider,
            renderer,
            fallback,
            generation: AtomicU64::new(0),
            view: Mutex::new(DashboardView::placeholder()),
        }
    }

    pub fn from_config(provider: P, config: &Config) -> Self {
        Self::new(
            provider,
            Renderer::new(config.icon_base_url.clone()),
            config.fallback.clone(),
        )
    }

    /// Snapshot of what is currently displayed.
    pub async fn view(&self) -> DashboardView {
        self.view.lock().await.clone()
    }

    /// Search for typed city text. Blank input is ignored.
    pub async fn search_city(&self, text: &str) -> SearchOutcome {
        match Location::city(text) {
            Some(location) => self.run(location, None).await,
            None => {
                debug!("Ignoring blank search");
                SearchOutcome::Ignored
            }
        }
    }

    /// Start-up path: device position first, fallback city otherwise.
    pub async fn load_from_geolocation(&self, geolocator: &dyn Geolocator) -> SearchOutcome {
        let (notice, city) = match geolocator.current_position().await {
            Ok(position) => return self.run(Location::Coordinates(position), None).await,
            Err(GeolocationError::Failed(reason)) => {
                warn!(%reason, "Geolocation failed, using fallback city");
                (MSG_GEOLOCATION_FAILED, &self.fallback.on_geolocation_error)
            }
            Err(GeolocationError::Unsupported) => {
                info!("Geolocation unsupported, using fallback city");
                (
                    MSG_GEOLOCATION_UNSUPPORTED,
                    &self.fallback.on_geolocation_unsupported,
                )
            }
        };

        match Location::city(city) {
            Some(location) => self.run(location, Some(notice)).await,
            None => {
                let mut view = self.view.lock().await;
                view.error = notice.to_string();
                SearchOutcome::Ignored
            }
        }
    }

    async fn run(&self, location: Location, notice: Option<&str>) -> SearchOutcome {
        let generation = self.begin(notice).await;
        debug!(generation, %location, "Starting search");

        let result = self.provider.fetch_current(&location).await;

        let coordinates = {
            let mut view = self.view.lock().await;
            if !self.is_latest(generation) {
                debug!(generation, %location, "Discarding stale current-weather response");
                return SearchOutcome::Superseded;
            }

            match result {
                Ok(current) => {
                    self.renderer.render_current(&mut view, &current);
                    // The previous location's tiles must not sit next to these conditions.
                    view.forecast.clear();
                    current.coordinates
                }
                Err(err) => {
                    warn!(error = %err, %location, "Current weather lookup failed");
                    report_failure(&mut view, &err);
                    return SearchOutcome::Failed;
                }
            }
        };

        self.refresh_forecast(generation, coordinates).await
    }

    /// New generation; clears the error slot, then posts `notice` if any.
    async fn begin(&self, notice: Option<&str>) -> u64 {
        let mut view = self.view.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        view.error = notice.map(str::to_owned).unwrap_or_default();
        generation
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn refresh_forecast(&self, generation: u64, coordinates: Coordinates) -> SearchOutcome {
        let result = self.provider.fetch_forecast(coordinates).await;

        let mut view = self.view.lock().await;
        if !self.is_latest(generation) {
            debug!(generation, "Discarding stale forecast response");
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(forecast) => view.forecast = self.renderer.forecast_tiles(&forecast),
            Err(err) => {
                // Never touches the error slot: it may hold an unrelated message.
                warn!(error = %err, %coordinates, "Forecast lookup failed");
                view.forecast.clear();
            }
        }

        SearchOutcome::Rendered
    }
}

fn report_failure(view: &mut DashboardView, err: &FetchError) {
    match err {
        FetchError::NotFound => {
            view.error = MSG_NOT_FOUND.to_string();
            view.reset_data();
        }
        FetchError::Status { .. } | FetchError::InvalidResponse(_) => {
            view.error = MSG_FETCH_FAILED.to_string();
            view.reset_data();
        }
        // Transport failures keep whatever was displayed before.
        FetchError::Transport(_) => {
            view.error = MSG_NETWORK.to_string();
        }
    }
}

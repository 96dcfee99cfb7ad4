//! View-model and the pure mapping from weather data onto it.
//!
//! Nothing here performs I/O. Front-ends decide how a [`DashboardView`] is
//! displayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CurrentWeather, Forecast, ForecastSample};

/// Placeholder shown in value fields with nothing to show.
pub const PLACEHOLDER: &str = "---";

/// Number of daily tiles in the forecast strip.
pub const FORECAST_DAYS: usize = 5;

/// One day in the forecast strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastTile {
    pub day: String,
    pub icon_url: String,
    pub icon_alt: String,
    /// Whole degrees Celsius, without unit.
    pub temperature: String,
}

/// Everything the dashboard displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    pub location: String,
    pub date: String,
    /// Degrees Celsius with one decimal, without unit.
    pub temperature: String,
    pub icon_url: String,
    pub icon_alt: String,
    pub description: String,
    pub humidity: String,
    pub wind_speed: String,
    pub forecast: Vec<ForecastTile>,
    pub error: String,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl DashboardView {
    pub fn placeholder() -> Self {
        Self {
            location: PLACEHOLDER.to_string(),
            date: String::new(),
            temperature: PLACEHOLDER.to_string(),
            icon_url: String::new(),
            icon_alt: String::new(),
            description: String::new(),
            humidity: PLACEHOLDER.to_string(),
            wind_speed: PLACEHOLDER.to_string(),
            forecast: Vec::new(),
            error: String::new(),
        }
    }

    /// Reset every data field, keeping the error message.
    pub fn reset_data(&mut self) {
        let error = std::mem::take(&mut self.error);
        *self = Self { error, ..Self::placeholder() };
    }

    pub fn has_data(&self) -> bool {
        self.location != PLACEHOLDER
    }
}

/// Maps typed weather data into view fields.
#[derive(Debug, Clone)]
pub struct Renderer {
    icon_base_url: String,
}

impl Renderer {
    pub fn new(icon_base_url: impl Into<String>) -> Self {
        let base: String = icon_base_url.into();
        Self {
            icon_base_url: base.trim_end_matches('/').to_string(),
        }
    }

    /// Write current conditions into `view`. Forecast and error are left alone.
    pub fn render_current(&self, view: &mut DashboardView, current: &CurrentWeather) {
        view.location = match &current.country {
            Some(country) => format!("{}, {}", current.location_name, country),
            None => current.location_name.clone(),
        };
        view.date = format_date(current.observed_at);
        view.temperature = celsius(current.temperature_k, 1);
        view.icon_url = format!("{}/{}@2x.png", self.icon_base_url, current.icon);
        view.icon_alt = current.description.clone();
        view.description = capitalize_words(&current.description);
        view.humidity = format!("{}%", current.humidity_pct);
        view.wind_speed = format!("{} m/s", current.wind_speed_mps);
    }

    /// Tiles for the midday sample of each day, at most [`FORECAST_DAYS`].
    pub fn forecast_tiles(&self, forecast: &Forecast) -> Vec<ForecastTile> {
        forecast
            .daily(FORECAST_DAYS)
            .map(|sample| self.tile(sample))
            .collect()
    }

    fn tile(&self, sample: &ForecastSample) -> ForecastTile {
        ForecastTile {
            day: sample.timestamp.format("%a").to_string(),
            icon_url: format!("{}/{}.png", self.icon_base_url, sample.icon),
            icon_alt: sample.description.clone(),
            temperature: celsius(sample.temperature_k, 0),
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

/// Celsius text for a Kelvin value with a fixed number of decimals.
pub fn celsius(kelvin: f64, decimals: usize) -> String {
    // Halves round away from zero; `format!` alone would round them to even.
    let scale = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let c = (kelvin_to_celsius(kelvin) * scale).round() / scale;
    // Avoid "-0" for values that round to zero from below.
    let text = format!("{c:.decimals$}");
    if text.starts_with('-') && text[1..].chars().all(|ch| ch == '0' || ch == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// Upper-case the first letter of each space-separated word.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Long date, e.g. `Monday, January 15, 2024`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y").to_string()
}

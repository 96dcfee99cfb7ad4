use crate::{
    Config,
    model::{Coordinates, CurrentWeather, Forecast, Location},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// Why a weather request produced no usable data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service answered 404 for the requested location.
    #[error("location not found")]
    NotFound,

    /// Any other non-2xx answer.
    #[error("weather service returned HTTP {status}")]
    Status { status: reqwest::StatusCode },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("request to weather service failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// A 2xx body that is not JSON, or lacks a field the dashboard needs.
    #[error("invalid weather response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    pub(crate) fn missing(field: &str) -> Self {
        FetchError::InvalidResponse(format!("missing field `{field}`"))
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city or coordinate pair.
    async fn fetch_current(&self, location: &Location) -> Result<CurrentWeather, FetchError>;

    /// 5-day / 3-hour forecast at a coordinate pair.
    async fn fetch_forecast(&self, coordinates: Coordinates) -> Result<Forecast, FetchError>;
}

/// Construct the OpenWeather provider from config, resolving the API key.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.resolve_api_key()?;
    OpenWeatherProvider::from_config(api_key, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        if std::env::var_os(crate::config::API_KEY_ENV).is_some() {
            return;
        }
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            ..Config::default()
        };
        assert!(provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn missing_field_message_names_field() {
        let err = FetchError::missing("main.temp");
        assert_eq!(err.to_string(), "invalid weather response: missing field `main.temp`");
    }
}

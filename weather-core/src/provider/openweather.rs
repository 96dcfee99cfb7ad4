use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    model::{Coordinates, CurrentWeather, Forecast, ForecastSample, Location, is_midday_slot},
};

use super::{FetchError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Build a provider honouring the configured base URL and optional timeout.
    pub fn from_config(api_key: String, config: &Config) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// GET `{base_url}/{endpoint}` and return the body of a 2xx answer.
    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "Requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(FetchError::Transport)?;

        // The status decides the error; a body that fails to arrive only matters on success.
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            debug!(endpoint, "OpenWeather answered 404");
            return Err(FetchError::NotFound);
        }

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(
                endpoint,
                %status,
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(FetchError::Status { status });
        }

        res.text().await.map_err(FetchError::Transport)
    }
}

fn location_query(location: &Location) -> Vec<(&'static str, String)> {
    match location {
        Location::City(name) => vec![("q", name.clone())],
        Location::Coordinates(coords) => coords_query(*coords),
    }
}

fn coords_query(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.latitude.to_string()),
        ("lon", coords.longitude.to_string()),
    ]
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip_all, fields(%location))]
    async fn fetch_current(&self, location: &Location) -> Result<CurrentWeather, FetchError> {
        let body = self.get("weather", &location_query(location)).await?;
        parse_current(&body)
    }

    #[instrument(skip_all, fields(%coordinates))]
    async fn fetch_forecast(&self, coordinates: Coordinates) -> Result<Forecast, FetchError> {
        let body = self.get("forecast", &coords_query(coordinates)).await?;
        parse_forecast(&body)
    }
}

// Wire format. Every field is optional here; `parse_*` decides what is required.

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    coord: Option<OwCoord>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: Option<i64>,
    dt_txt: Option<String>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Option<Vec<OwForecastEntry>>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, FetchError> {
    value.ok_or_else(|| FetchError::missing(field))
}

fn finite_temp(value: Option<f64>, field: &str) -> Result<f64, FetchError> {
    let temp = required(value, field)?;
    if temp.is_finite() {
        Ok(temp)
    } else {
        Err(FetchError::InvalidResponse(format!("`{field}` is not a finite number")))
    }
}

fn condition(weather: Vec<OwWeather>, prefix: &str) -> Result<(String, String), FetchError> {
    let first = weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::missing(&format!("{prefix}weather[0]")))?;

    let description = required(first.description, &format!("{prefix}weather[0].description"))?;
    let icon = required(first.icon, &format!("{prefix}weather[0].icon"))?;
    if icon.trim().is_empty() {
        return Err(FetchError::InvalidResponse(format!(
            "`{prefix}weather[0].icon` is empty"
        )));
    }

    Ok((description, icon))
}

fn unix_to_utc(ts: i64, field: &str) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| FetchError::InvalidResponse(format!("`{field}` is out of range")))
}

pub(crate) fn parse_current(body: &str) -> Result<CurrentWeather, FetchError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("malformed current JSON: {e}")))?;

    let main = required(parsed.main, "main")?;
    let wind = required(parsed.wind, "wind")?;
    let coord = required(parsed.coord, "coord")?;
    let (description, icon) = condition(parsed.weather, "")?;

    Ok(CurrentWeather {
        location_name: required(parsed.name, "name")?,
        country: parsed
            .sys
            .and_then(|sys| sys.country)
            .filter(|c| !c.is_empty()),
        observed_at: unix_to_utc(required(parsed.dt, "dt")?, "dt")?,
        temperature_k: finite_temp(main.temp, "main.temp")?,
        humidity_pct: required(main.humidity, "main.humidity")?,
        wind_speed_mps: required(wind.speed, "wind.speed")?,
        description,
        icon,
        coordinates: Coordinates::new(
            required(coord.lat, "coord.lat")?,
            required(coord.lon, "coord.lon")?,
        ),
    })
}

pub(crate) fn parse_forecast(body: &str) -> Result<Forecast, FetchError> {
    let parsed: OwForecastResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("malformed forecast JSON: {e}")))?;

    let samples = required(parsed.list, "list")?
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| parse_forecast_entry(i, entry).transpose())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Forecast { samples })
}

/// Validate one entry if it is a midday slot; other slots are skipped unchecked.
fn parse_forecast_entry(
    i: usize,
    entry: OwForecastEntry,
) -> Result<Option<ForecastSample>, FetchError> {
    let prefix = format!("list[{i}].");
    let field = |name: &str| format!("{prefix}{name}");

    let dt_txt = required(entry.dt_txt, &field("dt_txt"))?;
    let slot = NaiveDateTime::parse_from_str(&dt_txt, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        FetchError::InvalidResponse(format!("`{}` is not a timestamp: {e}", field("dt_txt")))
    })?;
    if !is_midday_slot(slot) {
        return Ok(None);
    }

    let main = required(entry.main, &field("main"))?;
    let (description, icon) = condition(entry.weather, &prefix)?;

    Ok(Some(ForecastSample {
        timestamp: unix_to_utc(required(entry.dt, &field("dt"))?, &field("dt"))?,
        slot,
        temperature_k: finite_temp(main.temp, &field("main.temp"))?,
        description,
        icon,
    }))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn london() -> serde_json::Value {
        json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
            "main": { "temp": 300.15, "feels_like": 299.0, "humidity": 81 },
            "wind": { "speed": 4.12, "deg": 250 },
            "dt": 1705320000,
            "sys": { "country": "GB" },
            "name": "London",
            "cod": 200
        })
    }

    #[test]
    fn parses_current_weather() {
        let current = parse_current(&london().to_string()).unwrap();

        assert_eq!(current.location_name, "London");
        assert_eq!(current.country.as_deref(), Some("GB"));
        assert_eq!(current.temperature_k, 300.15);
        assert_eq!(current.humidity_pct, 81);
        assert_eq!(current.wind_speed_mps, 4.12);
        assert_eq!(current.description, "light rain");
        assert_eq!(current.icon, "10d");
        assert_eq!(current.coordinates, Coordinates::new(51.5085, -0.1257));
        assert_eq!(current.observed_at.timestamp(), 1705320000);
    }

    #[test]
    fn missing_country_is_tolerated() {
        let mut body = london();
        body["sys"] = json!({});
        let current = parse_current(&body.to_string()).unwrap();
        assert_eq!(current.country, None);
    }

    #[test]
    fn missing_temperature_is_reported() {
        let mut body = london();
        body["main"] = json!({ "humidity": 81 });
        let err = parse_current(&body.to_string()).unwrap_err();
        assert!(err.to_string().contains("main.temp"), "{err}");
    }

    #[test]
    fn empty_weather_array_is_reported() {
        let mut body = london();
        body["weather"] = json!([]);
        let err = parse_current(&body.to_string()).unwrap_err();
        assert!(err.to_string().contains("weather[0]"), "{err}");
    }

    #[test]
    fn blank_icon_is_rejected() {
        let mut body = london();
        body["weather"][0]["icon"] = json!(" ");
        assert!(matches!(
            parse_current(&body.to_string()),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn non_json_body_is_invalid_response() {
        assert!(matches!(parse_current("<html>"), Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn parses_midday_forecast_samples() {
        let body = json!({
            "cod": "200",
            "list": [
                {
                    "dt": 1705309200,
                    "dt_txt": "2024-01-15 09:00:00",
                    "main": { "temp": 280.0 },
                    "weather": [{ "description": "few clouds", "icon": "02d" }]
                },
                {
                    "dt": 1705320000,
                    "dt_txt": "2024-01-15 12:00:00",
                    "main": { "temp": 282.4 },
                    "weather": [{ "description": "light rain", "icon": "10d" }]
                }
            ]
        });

        let forecast = parse_forecast(&body.to_string()).unwrap();
        assert_eq!(forecast.samples.len(), 1);
        assert!(forecast.samples[0].is_midday());
        assert_eq!(forecast.samples[0].icon, "10d");
        assert_eq!(forecast.samples[0].temperature_k, 282.4);
    }

    #[test]
    fn malformed_non_midday_entry_is_skipped() {
        let body = json!({
            "list": [
                { "dt": 1705287600, "dt_txt": "2024-01-15 03:00:00" },
                { "dt": 1705320000, "dt_txt": "2024-01-15 12:00:00", "main": { "temp": 280.0 },
                  "weather": [{ "description": "clear sky", "icon": "01d" }] },
                { "dt": 1705330800, "dt_txt": "2024-01-15 15:00:00", "main": {}, "weather": [] }
            ]
        });

        let forecast = parse_forecast(&body.to_string()).unwrap();
        assert_eq!(forecast.samples.len(), 1);
        assert_eq!(forecast.samples[0].description, "clear sky");
    }

    #[test]
    fn malformed_midday_entry_is_reported() {
        let body = json!({
            "list": [
                { "dt": 1705320000, "dt_txt": "2024-01-15 12:00:00", "weather": [] }
            ]
        });
        let err = parse_forecast(&body.to_string()).unwrap_err();
        assert!(err.to_string().contains("list[0].main"), "{err}");
    }

    #[test]
    fn forecast_entry_errors_name_the_index() {
        let body = json!({
            "list": [
                { "dt": 1, "dt_txt": "2024-01-15 12:00:00", "main": { "temp": 280.0 },
                  "weather": [{ "description": "x", "icon": "01d" }] },
                { "dt": 2, "dt_txt": "noon", "main": { "temp": 280.0 },
                  "weather": [{ "description": "x", "icon": "01d" }] }
            ]
        });
        let err = parse_forecast(&body.to_string()).unwrap_err();
        assert!(err.to_string().contains("list[1].dt_txt"), "{err}");
    }

    #[test]
    fn query_for_city_and_coordinates() {
        assert_eq!(
            location_query(&Location::City("New York".into())),
            vec![("q", "New York".to_string())]
        );
        assert_eq!(
            location_query(&Location::Coordinates(Coordinates::new(51.5, -0.12))),
            vec![("lat", "51.5".to_string()), ("lon", "-0.12".to_string())]
        );
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenWeatherProvider::with_base_url("k".into(), "http://host/api/".into());
        assert_eq!(provider.base_url, "http://host/api");
    }
}

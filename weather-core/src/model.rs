use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// What a current-weather lookup is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coordinates(Coordinates),
}

impl Location {
    /// Build a city query from free text. Blank input yields `None`.
    pub fn city(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Location::City(trimmed.to_string()))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::Coordinates(coords) => write!(f, "({coords})"),
        }
    }
}

/// Current conditions, validated from the `/weather` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location_name: String,
    pub country: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub temperature_k: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
    pub coordinates: Coordinates,
}

/// One 3-hour sample of the `/forecast` feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    /// Slot label as sent by the API (`dt_txt`), parsed.
    pub slot: NaiveDateTime,
    pub temperature_k: f64,
    pub description: String,
    pub icon: String,
}

impl ForecastSample {
    pub fn is_midday(&self) -> bool {
        is_midday_slot(self.slot)
    }
}

/// True for the 12:00:00 slot of a day.
pub fn is_midday_slot(slot: NaiveDateTime) -> bool {
    let t = slot.time();
    t.hour() == 12 && t.minute() == 0 && t.second() == 0
}

/// The midday forecast samples, in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub samples: Vec<ForecastSample>,
}

impl Forecast {
    /// One sample per day: the midday slots, capped at `limit`.
    pub fn daily(&self, limit: usize) -> impl Iterator<Item = &ForecastSample> {
        self.samples.iter().filter(|s| s.is_midday()).take(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn sample(hour: u32, day: u32) -> ForecastSample {
        let slot = NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap();
        ForecastSample {
            timestamp: slot.and_utc(),
            slot,
            temperature_k: 280.0 + f64::from(day),
            description: "clear sky".into(),
            icon: "01d".into(),
        }
    }

    #[test]
    fn city_trims_and_rejects_blank() {
        assert_eq!(Location::city("  Paris "), Some(Location::City("Paris".into())));
        assert_eq!(Location::city("   "), None);
        assert_eq!(Location::city(""), None);
    }

    #[test]
    fn daily_keeps_only_midday_in_order() {
        let samples = (1..=7)
            .flat_map(|day| [9, 12, 15].map(|h| sample(h, day)))
            .collect();
        let forecast = Forecast { samples };

        let days: Vec<u32> = forecast.daily(5).map(|s| s.slot.day()).collect();

        assert_eq!(days, vec![1, 2, 3, 4, 5]);
        assert!(forecast.daily(5).all(ForecastSample::is_midday));
    }

    #[test]
    fn daily_with_fewer_middays_than_limit() {
        let forecast = Forecast {
            samples: vec![sample(9, 1), sample(12, 1), sample(21, 1), sample(12, 2)],
        };
        assert_eq!(forecast.daily(5).count(), 2);
    }
}

//! Device position lookup.
//!
//! A dashboard asks for the position once at start-up. Where it comes from
//! is up to the front-end: a configured home position, command-line
//! coordinates, or nothing at all.

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    /// There is no position source on this host.
    #[error("geolocation is not supported")]
    Unsupported,

    /// A position source exists but could not produce a fix.
    #[error("could not determine position: {0}")]
    Failed(String),
}

/// One-shot position lookup; no tracking, no re-prompting.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Reports a fixed, pre-configured position.
#[derive(Debug, Clone, Copy)]
pub struct StaticGeolocator {
    position: Coordinates,
}

impl StaticGeolocator {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let Coordinates { latitude, longitude } = self.position;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeolocationError::Failed(format!(
                "position {} is out of range",
                self.position
            )));
        }
        Ok(self.position)
    }
}

/// Used when no position source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Pick a geolocator: explicit coordinates first, then the configured home.
pub fn geolocator_for(
    explicit: Option<Coordinates>,
    home: Option<Coordinates>,
) -> Box<dyn Geolocator> {
    match explicit.or(home) {
        Some(position) => Box::new(StaticGeolocator::new(position)),
        None => Box::new(NoGeolocation),
    }
}

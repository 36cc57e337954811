use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;

use crate::{config::GeolocationConfig, error::GeoError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Age of a cached position that is still acceptable.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        GeolocationConfig::default().position_options()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

/// One-shot position source.
#[async_trait]
pub trait Geolocation: Send + Sync + Debug {
    fn is_supported(&self) -> bool {
        true
    }

    /// Permission state if the platform can report it.
    async fn permission_state(&self) -> Option<PermissionState> {
        None
    }

    async fn current_position(&self, options: &PositionOptions) -> Result<Position, GeoError>;
}

/// Position taken from configuration. Unsupported when none is configured.
#[derive(Debug, Clone, Default)]
pub struct FixedGeolocation {
    position: Option<Position>,
}

impl FixedGeolocation {
    pub fn new(position: Option<Position>) -> Self {
        Self { position }
    }

    pub fn from_config(config: &GeolocationConfig) -> Self {
        Self::new(
            config.fixed_position().map(|(latitude, longitude)| Position { latitude, longitude }),
        )
    }
}

#[async_trait]
impl Geolocation for FixedGeolocation {
    fn is_supported(&self) -> bool {
        self.position.is_some()
    }

    async fn permission_state(&self) -> Option<PermissionState> {
        self.position.map(|_| PermissionState::Granted)
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, GeoError> {
        self.position.ok_or(GeoError::Unsupported)
    }
}

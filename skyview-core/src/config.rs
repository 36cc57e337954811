use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{geo::PositionOptions, model::Coordinates};

/// Coordinates loaded when no input is given (Irvine, CA).
pub const DEFAULT_LAT: &str = "33.6846";
pub const DEFAULT_LON: &str = "-117.8265";

/// Location used for the initial load and for blank form fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultLocation {
    pub lat: String,
    pub lon: String,
    pub label: String,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LAT.to_string(),
            lon: DEFAULT_LON.to_string(),
            label: "Irvine, CA".to_string(),
        }
    }
}

impl DefaultLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(&self.lat, &self.lon)
    }
}

/// Position lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
    /// Delay before the single retry after a transient failure.
    pub retry_delay_ms: u64,

    /// Fixed position reported by the lookup. Without one, geolocation is
    /// treated as unsupported.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout_ms: 8_000,
            maximum_age_ms: 300_000,
            retry_delay_ms: 1_500,
            latitude: None,
            longitude: None,
        }
    }
}

impl GeolocationConfig {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_base_url = "http://127.0.0.1:5000"
///
/// [default_location]
/// lat = "33.6846"
/// lon = "-117.8265"
/// label = "Irvine, CA"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub alerts_limit: usize,
    pub default_location: DefaultLocation,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 12,
            alerts_limit: 5,
            default_location: DefaultLocation::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or clear the fixed position used for geolocation.
    pub fn set_fixed_position(&mut self, position: Option<(f64, f64)>) {
        self.geolocation.latitude = position.map(|(lat, _)| lat);
        self.geolocation.longitude = position.map(|(_, lon)| lon);
    }
}

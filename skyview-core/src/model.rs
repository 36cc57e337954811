use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Latitude/longitude pair as entered by the user.
///
/// Values are passed through to the API untouched; no range validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub lat: String,
    pub lon: String,
}

impl Coordinates {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self { lat: lat.into(), lon: lon.into() }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self { lat: lat.to_string(), lon: lon.to_string() }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Body of `GET /api/weather`.
///
/// The panel sections stay as raw JSON so that one malformed section only
/// fails the panel that renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub location: String,
    #[serde(default)]
    pub current: Value,
    #[serde(default)]
    pub outfit: Value,
    #[serde(default)]
    pub hourly: Value,
}

impl WeatherResponse {
    pub fn current(&self) -> Result<CurrentConditions, serde_json::Error> {
        CurrentConditions::deserialize(&self.current)
    }

    pub fn outfit(&self) -> Result<OutfitSuggestion, serde_json::Error> {
        OutfitSuggestion::deserialize(&self.outfit)
    }

    pub fn hourly(&self) -> Result<Vec<HourlyPoint>, serde_json::Error> {
        Vec::<HourlyPoint>::deserialize(&self.hourly)
    }

    /// Two-letter region code used for the alerts lookup, if the location has one.
    pub fn state_code(&self) -> Option<&str> {
        state_code(&self.location)
    }
}

/// Second comma-separated segment of `location`, trimmed, when it is exactly
/// two characters long.
pub fn state_code(location: &str) -> Option<&str> {
    let segment = location.split(',').nth(1)?.trim();
    (segment.chars().count() == 2).then_some(segment)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub short_forecast: String,
    pub temperature: serde_json::Number,
    #[serde(default)]
    pub wind_speed: Option<String>,
    #[serde(default)]
    pub wind_direction: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitSuggestion {
    pub headline: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub start_time: String,
    pub temperature: f64,
}

/// Body of `GET /api/alerts`. A missing or `null` list means no alerts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alerts: Vec<Alert>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub effective: Option<String>,
    #[serde(default)]
    pub ends: Option<String>,
}

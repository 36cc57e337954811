use thiserror::Error;

/// Failure of a request to the weather backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}: {body}")]
    BadStatus { endpoint: &'static str, status: u16, body: String },

    #[error("failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::BadStatus { .. } => "status",
            FetchError::Parse { .. } => "parse",
        }
    }
}

/// Failure of a position lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("geolocation is not supported")]
    Unsupported,

    #[error("location permission denied")]
    PermissionDenied,

    /// Transient; retried once by the controller.
    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("location error: {0}")]
    Other(String),
}

/// Failure of the geolocation trigger: either the lookup or the load after it.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Failure while filling one panel. Never propagated to sibling panels.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed `{panel}` section: {source}")]
    Malformed {
        panel: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("chart error: {0}")]
    Chart(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Failure of the alerts sub-flow. Logged, never shown in the banner.
#[derive(Debug, Error)]
pub enum AlertsError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

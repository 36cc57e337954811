use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    Config,
    error::FetchError,
    model::{AlertsResponse, Coordinates, WeatherResponse},
};

pub const WEATHER_ENDPOINT: &str = "/api/weather";
pub const ALERTS_ENDPOINT: &str = "/api/alerts";

/// Backend serving weather, outfit and alert data.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn weather(&self, coords: &Coordinates) -> Result<WeatherResponse, FetchError>;

    async fn alerts(&self, state: &str) -> Result<AlertsResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpWeatherApi {
    base_url: String,
    http: Client,
}

impl HttpWeatherApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, ?query, "sending request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Network { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Network { endpoint, source })?;

        if !status.is_success() {
            return Err(FetchError::BadStatus {
                endpoint,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Parse { endpoint, source })
    }
}

#[async_trait]
impl WeatherApi for HttpWeatherApi {
    async fn weather(&self, coords: &Coordinates) -> Result<WeatherResponse, FetchError> {
        let query = [("lat", coords.lat.as_str()), ("lon", coords.lon.as_str())];
        self.get_json(WEATHER_ENDPOINT, &query).await
    }

    async fn alerts(&self, state: &str) -> Result<AlertsResponse, FetchError> {
        self.get_json(ALERTS_ENDPOINT, &[("state", state)]).await
    }
}

/// Construct the HTTP client from config.
pub fn api_from_config(config: &Config) -> anyhow::Result<HttpWeatherApi> {
    HttpWeatherApi::new(&config.api_base_url, Duration::from_secs(config.request_timeout_secs))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

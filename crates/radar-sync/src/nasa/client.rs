//! NASA open API client.
//!
//! Uses reqwest to call the NeoWs feed and APOD endpoints. No retries: the
//! repository decides what a failed fetch means.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use radar_core::config::ApiConfig;
use radar_core::model::format_date;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use super::NeoApi;
use super::types::PictureResponse;

/// NASA API client errors.
#[derive(Debug, Error)]
pub enum NasaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NASA API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for connecting to the NASA API.
#[derive(Debug, Clone)]
pub struct NasaConfig {
    /// API root (e.g., "<https://api.nasa.gov>").
    pub base_url: String,
    /// Key sent as the `api_key` query parameter.
    pub api_key: String,
    pub timeout: Duration,
}

impl From<&ApiConfig> for NasaConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            api_key: api.api_key.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }
}

/// NASA open API client.
#[derive(Debug)]
pub struct NasaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NasaClient {
    /// Create a new NASA API client.
    pub fn new(config: &NasaConfig) -> Result<Self, NasaError> {
        if config.base_url.is_empty() {
            return Err(NasaError::Config("base_url is empty".into()));
        }
        if config.api_key.is_empty() {
            return Err(NasaError::Config("api_key is empty".into()));
        }
        Url::parse(&config.base_url)
            .map_err(|e| NasaError::Config(format!("invalid base_url: {e}")))?;

        // reqwest is built with rustls-no-provider; an `Err` here only means a
        // provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .user_agent(concat!("asteroid-radar/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Build the full URL for an endpoint path, appending `params` and the
    /// API key.
    pub(crate) fn endpoint_url(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Url, NasaError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| NasaError::Config(format!("invalid endpoint URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("api_key", &self.api_key);
        }
        Ok(url)
    }

    /// Build the feed URL; omitted bounds are left out of the query.
    pub(crate) fn feed_url(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Url, NasaError> {
        let mut params = Vec::with_capacity(2);
        if let Some(start) = start_date {
            params.push(("start_date", format_date(start)));
        }
        if let Some(end) = end_date {
            params.push(("end_date", format_date(end)));
        }
        self.endpoint_url("/neo/rest/v1/feed", &params)
    }

    /// Check HTTP response status, returning error for non-success codes.
    fn check_status(resp: &reqwest::Response) -> Result<(), NasaError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(NasaError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").into(),
            });
        }
        Ok(())
    }

    /// Fetch the raw asteroid feed body.
    pub async fn fetch_asteroid_feed(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<String, NasaError> {
        let url = self.feed_url(start_date, end_date)?;
        debug!(path = url.path(), ?start_date, ?end_date, "Requesting asteroid feed");

        let resp = self.http.get(url).send().await?;
        Self::check_status(&resp)?;
        let body = resp.text().await?;

        debug!(bytes = body.len(), "Asteroid feed received");
        Ok(body)
    }

    /// Fetch and decode the astronomy picture of the day.
    pub async fn fetch_picture_of_day(&self) -> Result<PictureResponse, NasaError> {
        let url = self.endpoint_url("/planetary/apod", &[])?;
        debug!(path = url.path(), "Requesting picture of the day");

        let resp = self.http.get(url).send().await?;
        Self::check_status(&resp)?;
        let body = resp.text().await?;

        serde_json::from_str(&body).map_err(|e| NasaError::Decode(e.to_string()))
    }
}

#[async_trait]
impl NeoApi for NasaClient {
    async fn fetch_asteroid_feed(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<String, NasaError> {
        Self::fetch_asteroid_feed(self, start_date, end_date).await
    }

    async fn fetch_picture_of_day(&self) -> Result<PictureResponse, NasaError> {
        Self::fetch_picture_of_day(self).await
    }
}

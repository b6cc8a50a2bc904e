//! HTTP-based `StopListFetcher`.
//!
//! [`HttpStopListFetcher`] issues one `GET` per call and maps every failure
//! onto [`FetchError`]. It never retries; a failed fetch is reported and the
//! caller decides whether to ask again.
//!
//! # Example
//!
//! ```no_run
//! use ridetrack_core::StopListFetcher;
//! use ridetrack_data::stops::HttpStopListFetcher;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpStopListFetcher::new()?;
//! let stops = fetcher.fetch("http://localhost:5000/busstops").await?;
//! println!("{} stops", stops.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use ridetrack_core::{FetchError, StopListFetcher, StopOfInterest};
use thiserror::Error;

use super::wire::StopRecord;

/// Error type for [`HttpStopListFetcher`] construction failures.
#[derive(Debug, Error)]
pub enum FetcherBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Default user agent for stop-list requests.
pub const DEFAULT_USER_AGENT: &str = "ridetrack-stops/0.1";

/// Default stop-list endpoint.
pub const DEFAULT_STOP_LIST_ENDPOINT: &str = "http://localhost:5000/busstops";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpStopListFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStopListFetcherConfig {
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpStopListFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpStopListFetcherConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches the stop list over HTTP.
///
/// The underlying client is reused across calls. Rows whose coordinates do
/// not validate fail the whole fetch with [`FetchError::ParseError`]; a
/// partially valid list is never returned.
#[derive(Debug, Clone)]
pub struct HttpStopListFetcher {
    client: Client,
    config: HttpStopListFetcherConfig,
}

impl HttpStopListFetcher {
    /// Create a fetcher with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, FetcherBuildError> {
        Self::with_config(HttpStopListFetcherConfig::default())
    }

    /// Create a fetcher with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpStopListFetcherConfig) -> Result<Self, FetcherBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(FetcherBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpStopListFetcherConfig {
        &self.config
    }

    /// Convert a reqwest error to a `FetchError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        FetchError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Decode a stop-list body.
pub(crate) fn parse_stop_list(body: &[u8]) -> Result<Vec<StopOfInterest>, FetchError> {
    let records: Vec<StopRecord> =
        serde_json::from_slice(body).map_err(|err| FetchError::ParseError {
            message: err.to_string(),
        })?;

    records
        .into_iter()
        .map(|record| {
            let id = record.id.clone();
            StopOfInterest::try_from(record).map_err(|err| FetchError::ParseError {
                message: format!("stop {id}: {err}"),
            })
        })
        .collect()
}

#[async_trait]
impl StopListFetcher for HttpStopListFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<StopOfInterest>, FetchError> {
        debug!("fetching stop list from {endpoint}");
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, endpoint))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, endpoint))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, endpoint))?;

        let stops = parse_stop_list(&body)?;
        info!("fetched {} stops from {endpoint}", stops.len());
        Ok(stops)
    }
}

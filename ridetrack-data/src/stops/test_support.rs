//! Test utilities for stop-list fetchers.
//!
//! [`StubStopListFetcher`] returns a canned outcome without touching the
//! network and records the endpoints it was asked for.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use ridetrack_core::{FetchError, StopListFetcher, StopOfInterest};

/// Stub `StopListFetcher` for testing.
///
/// # Example
///
/// ```
/// use ridetrack_core::StopListFetcher;
/// use ridetrack_data::stops::test_support::StubStopListFetcher;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = StubStopListFetcher::with_stops(Vec::new());
/// let stops = fetcher.fetch("http://example.com/busstops").await;
/// assert_eq!(stops, Ok(Vec::new()));
/// # }
/// ```
#[derive(Debug)]
pub struct StubStopListFetcher {
    response: Result<Vec<StopOfInterest>, FetchError>,
    requests: Mutex<Vec<String>>,
}

impl StubStopListFetcher {
    /// Create a fetcher that returns the given stops.
    #[must_use]
    pub fn with_stops(stops: Vec<StopOfInterest>) -> Self {
        Self {
            response: Ok(stops),
            requests: Mutex::default(),
        }
    }

    /// Create a fetcher that fails with the given error.
    #[must_use]
    pub fn with_error(error: FetchError) -> Self {
        Self {
            response: Err(error),
            requests: Mutex::default(),
        }
    }

    /// Endpoints requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StopListFetcher for StubStopListFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<StopOfInterest>, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(endpoint.to_owned());
        self.response.clone()
    }
}

//! Stop-list fetcher trait.

use async_trait::async_trait;

use crate::StopOfInterest;

use super::error::FetchError;

/// Fetch the static list of stops shown on the map.
///
/// No pagination and no streaming: a call resolves once, with the full list
/// or an error. An empty list is a success.
#[async_trait]
pub trait StopListFetcher: Send + Sync {
    /// Retrieve every stop published at `endpoint`.
    async fn fetch(&self, endpoint: &str) -> Result<Vec<StopOfInterest>, FetchError>;
}

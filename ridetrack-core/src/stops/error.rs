use thiserror::Error;

/// Errors from [`crate::stops::StopListFetcher::fetch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Timeout that elapsed, in seconds.
        timeout_secs: u64,
    },
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Transport description of the failure.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("request to {url} failed: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Transport description of the failure.
        message: String,
    },
    /// The body was not a valid stop list.
    #[error("failed to parse stop list: {message}")]
    ParseError {
        /// Parser description of the failure.
        message: String,
    },
}

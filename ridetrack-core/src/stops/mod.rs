//! One-shot retrieval of the transit stop list.
//!
//! The [`StopListFetcher`] trait abstracts the HTTP stop-list API. Each call
//! completes or fails exactly once; retries are the caller's decision.

mod error;
mod fetcher;

pub use error::FetchError;
pub use fetcher::StopListFetcher;

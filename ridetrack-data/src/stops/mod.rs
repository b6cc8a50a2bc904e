//! HTTP stop-list fetching.
//!
//! This module provides [`HttpStopListFetcher`], an implementation of
//! [`ridetrack_core::StopListFetcher`] that downloads the stop list from the
//! stop-list API in a single request.

mod provider;
mod wire;

#[doc(hidden)]
pub mod test_support;

pub use provider::{
    DEFAULT_STOP_LIST_ENDPOINT, DEFAULT_USER_AGENT, FetcherBuildError, HttpStopListFetcher,
    HttpStopListFetcherConfig,
};
pub use wire::{RecordError, StopRecord, WireDegrees};

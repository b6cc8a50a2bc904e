//! Facade crate for the ridetrack live position sync engine.
//!
//! This crate re-exports the core domain types and exposes the network,
//! replay and overlay adapters behind the `adapters` feature.

#![forbid(unsafe_code)]

pub use ridetrack_core::{
    AccessGranted, AccuracyMode, ChannelError, ChannelSession, ChannelState, CoordinateError,
    Delivery, EngineConfig, EngineDiagnostics, EngineError, EngineHandle, EngineSnapshot,
    EngineStatus, FetchError, LocationError, LocationSource, LocationUpdate, MapView,
    PositionSample, PositionStream, RegionDefaults, RiderIdentity, RiderIdentityError,
    RouteOverlay, RouteOverlayTable, ScreenState, StopListFetcher, StopListState, StopMarker,
    StopOfInterest, SyncEngine, ViewportRegion, render_screen,
};

#[cfg(feature = "test-support")]
pub use ridetrack_core::test_support;

#[cfg(feature = "adapters")]
pub use ridetrack_data::{
    HttpStopListFetcher, HttpStopListFetcherConfig, OverlayLoadError, ReplayConfig,
    ReplayLocationSource, TcpChannelConfig, TcpChannelSession, load_overlay_table,
};

//! Core domain types and the live position sync engine.
//!
//! Responsibilities:
//! - Validate positions, identities, stops and route overlays at construction.
//! - Define the collaborator traits: [`LocationSource`], [`ChannelSession`]
//!   and [`StopListFetcher`].
//! - Run the [`SyncEngine`], which forwards fixes to the channel while it is
//!   connected and exposes the latest fix to observers.
//! - Fold engine, stop and overlay state into a [`ScreenState`].
//!
//! Boundaries:
//! - No I/O. Sockets, HTTP and files live in `ridetrack-data`.
//! - No logger installation; the `log` facade only.
//!
//! Invariants:
//! - A fix is never queued for later delivery.
//! - Every location subscription is released on every exit path.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod channel;
mod engine;
mod identity;
pub mod location;
mod overlay;
mod position;
mod screen;
mod stop;
pub mod stops;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use channel::{ChannelError, ChannelSession, ChannelState, Delivery};
pub use engine::{
    DEFAULT_ENDPOINT, DEFAULT_WATCH_RETRY_DELAY, EngineConfig, EngineDiagnostics, EngineError,
    EngineHandle, EngineSnapshot, EngineStatus, SyncEngine,
};
pub use identity::{
    LocationUpdate, RiderIdentity, RiderIdentityError, UPDATE_LOCATION_EVENT, WireLocation,
};
pub use location::{AccessGranted, AccuracyMode, LocationError, LocationSource, PositionStream};
pub use overlay::{RouteOverlay, RouteOverlayTable};
pub use position::{
    CoordinateError, DEFAULT_LATITUDE, DEFAULT_LATITUDE_SPAN, DEFAULT_LONGITUDE,
    DEFAULT_LONGITUDE_SPAN, PositionSample, RegionDefaults, ViewportRegion, validate_coordinate,
};
pub use screen::{MapView, ScreenState, StopMarker, render_screen};
pub use stop::{STOP_LIST_FAILURE_MESSAGE, StopListState, StopOfInterest};
pub use stops::{FetchError, StopListFetcher};

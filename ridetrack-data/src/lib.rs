//! Adapters connecting the ridetrack engine to the outside world.
//!
//! Responsibilities:
//! - Speak the live channel protocol over TCP.
//! - Fetch the stop list over HTTP.
//! - Replay recorded tracks as a location source.
//! - Load route overlay files.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `ridetrack-core`).
//! - Keep blocking I/O off async executors; prefer async-capable clients.
//!
//! Invariants:
//! - Thread-safe by default where feasible.
//! - No global mutable state.

pub mod channel;
pub mod location;
pub mod overlay;
pub mod stops;

pub use channel::{TcpChannelConfig, TcpChannelSession};
pub use location::{ReplayConfig, ReplayLocationSource};
pub use overlay::{OverlayLoadError, load_overlay_table, parse_overlay_table};
pub use stops::{HttpStopListFetcher, HttpStopListFetcherConfig};

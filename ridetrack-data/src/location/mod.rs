//! Location sources backed by recorded data.
//!
//! [`ReplayLocationSource`] feeds a recorded track file to the engine at a
//! fixed pace, standing in for device hardware in the CLI and in tests.

mod replay;
mod track;

pub use replay::{DEFAULT_REPLAY_INTERVAL, ReplayConfig, ReplayLocationSource};
pub use track::{TrackLoadError, TrackPoint, load_track, parse_track};

//! Device location access.
//!
//! The [`LocationSource`] trait abstracts the device's geolocation service.
//! Callers request access once, then open a [`PositionStream`] per
//! subscription. Dropping the stream releases the underlying hardware.
//!
//! Errors are reported through [`LocationError`]: a denial is terminal for the
//! session, a hardware failure is not.

mod error;
mod source;

pub use error::LocationError;
pub use source::{AccessGranted, AccuracyMode, LocationSource, PositionStream};

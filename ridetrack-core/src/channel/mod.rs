//! Push channel to the live server.
//!
//! A [`ChannelSession`] owns one logical connection. It reports its
//! [`ChannelState`] to listeners and delivers events on a best-effort basis:
//! anything sent while the session is not connected is dropped and counted,
//! never queued or retried. Position data goes stale quickly, so a late
//! update is worth less than none.

mod error;
mod session;

pub use error::ChannelError;
pub use session::{ChannelSession, ChannelState, Delivery};

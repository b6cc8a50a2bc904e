//! TCP transport for the live channel.
//!
//! [`TcpChannelSession`] implements [`ridetrack_core::ChannelSession`] on top
//! of a Tokio `TcpStream`, exchanging newline-delimited JSON [`Frame`]s.

mod frame;
mod session;

pub use frame::{Frame, JOIN_EVENT};
pub use session::{DEFAULT_CONNECT_TIMEOUT, OUTBOUND_CAPACITY, TcpChannelConfig, TcpChannelSession};

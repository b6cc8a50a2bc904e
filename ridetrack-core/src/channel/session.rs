//! Channel session trait and connection state.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::RiderIdentity;

use super::error::ChannelError;

/// Connection state of a [`ChannelSession`].
///
/// Only the session writes this value. Everyone else reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// No connection and none in progress.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Events can be delivered.
    Connected,
}

/// What happened to a single [`ChannelSession::send`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Delivery {
    /// The event was handed to the transport. Arrival is not guaranteed.
    Dispatched,
    /// The session was not connected, or the transport refused the event.
    Dropped,
}

/// A single logical connection to the remote peer.
///
/// Reconnection policy belongs to the caller. Sessions never retry on their
/// own, never queue events for later, and never raise errors from
/// [`send`](Self::send).
pub trait ChannelSession: Send + Sync {
    /// Begin connecting to `endpoint` as `identity`.
    ///
    /// Returns immediately. The state moves `Disconnected → Connecting →
    /// Connected` as the attempt progresses. Calling this while already
    /// connecting or connected does nothing.
    fn connect(&self, endpoint: &str, identity: &RiderIdentity);

    /// Fire-and-forget delivery of `payload` under the event name `event`.
    ///
    /// Drops the event and bumps [`dropped_sends`](Self::dropped_sends)
    /// unless the session is [`ChannelState::Connected`].
    fn send(&self, event: &str, payload: serde_json::Value) -> Delivery;

    /// Close the connection.
    ///
    /// Safe in every state. The intent takes effect immediately; the
    /// transport finishes closing in the background.
    fn disconnect(&self) -> Result<(), ChannelError>;

    /// Current connection state.
    fn state(&self) -> ChannelState;

    /// Listen for state transitions.
    ///
    /// The receiver sees each transition made after subscribing.
    fn subscribe_state(&self) -> broadcast::Receiver<ChannelState>;

    /// Number of sends dropped because the session was not connected.
    fn dropped_sends(&self) -> u64;
}

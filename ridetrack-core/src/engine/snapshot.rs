//! Observable engine state.

use serde::Serialize;

use crate::{ChannelState, PositionSample, ViewportRegion};

/// Lifecycle of a [`crate::SyncEngine`] run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineStatus {
    /// Waiting for the location permission outcome.
    #[default]
    RequestingAccess,
    /// Watching the location source and forwarding fixes.
    Tracking,
    /// Location access was refused. Terminal.
    PermissionDenied {
        /// User-facing explanation.
        message: String,
    },
    /// The engine was stopped.
    Stopped,
}

impl EngineStatus {
    /// The user-facing error, if the status carries one.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { message } => Some(message),
            Self::RequestingAccess | Self::Tracking | Self::Stopped => None,
        }
    }
}

/// Counters describing what the engine did with each fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineDiagnostics {
    /// Fixes received from the location stream.
    pub samples_received: u64,
    /// Updates handed to the channel.
    pub updates_sent: u64,
    /// Fixes not delivered because the channel was not connected.
    pub samples_dropped: u64,
    /// Hardware failures reported by the location source.
    pub hardware_errors: u64,
    /// Times the engine re-opened the location watch.
    pub watch_restarts: u64,
}

/// Everything a consumer may observe about the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EngineSnapshot {
    /// Lifecycle status.
    pub status: EngineStatus,
    /// Most recent fix. Earlier fixes are not retained.
    pub position: Option<PositionSample>,
    /// Viewport centred on the most recent fix.
    pub region: ViewportRegion,
    /// Channel state as last observed by the engine.
    pub channel: ChannelState,
    /// Delivery counters.
    pub diagnostics: EngineDiagnostics,
}

impl EngineSnapshot {
    /// Initial snapshot for a run starting at `region`.
    #[must_use]
    pub fn starting(region: ViewportRegion) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }
}

//! The live position sync engine.
//!
//! [`SyncEngine`] wires a [`LocationSource`] to a [`ChannelSession`]. Once
//! started it requests location access, opens a watch and connects the
//! channel, then forwards each fix as an `updateLocation` event while the
//! channel is connected. Fixes that arrive while the channel is not
//! connected still update the local snapshot but are never queued.
//!
//! The engine runs as a single Tokio task. Consumers observe it through an
//! [`EngineHandle`], which publishes [`EngineSnapshot`] values and owns the
//! teardown path.

mod config;
mod runner;
mod snapshot;

use std::sync::Arc;

use log::warn;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{ChannelSession, LocationSource, PositionSample, RiderIdentity, ViewportRegion};

pub use config::{DEFAULT_ENDPOINT, DEFAULT_WATCH_RETRY_DELAY, EngineConfig};
pub use snapshot::{EngineDiagnostics, EngineSnapshot, EngineStatus};

use runner::Runner;

/// Errors raised while starting an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start` was called outside a Tokio runtime.
    #[error("the sync engine must be started from within a Tokio runtime")]
    NoRuntime,
}

/// Couples a location source to a channel session for one rider.
pub struct SyncEngine {
    location: Arc<dyn LocationSource>,
    channel: Arc<dyn ChannelSession>,
    identity: RiderIdentity,
    config: EngineConfig,
}

impl SyncEngine {
    /// Assemble an engine. Nothing happens until [`start`](Self::start).
    #[must_use]
    pub fn new(
        location: Arc<dyn LocationSource>,
        channel: Arc<dyn ChannelSession>,
        identity: RiderIdentity,
        config: EngineConfig,
    ) -> Self {
        Self {
            location,
            channel,
            identity,
            config,
        }
    }

    /// Spawn the engine on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoRuntime`] when called outside a runtime.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use ridetrack_core::test_support::{RecordingChannelSession, ScriptedLocationSource};
    /// use ridetrack_core::{EngineConfig, EngineStatus, RiderIdentity, SyncEngine};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let location = Arc::new(ScriptedLocationSource::new());
    /// let channel = Arc::new(RecordingChannelSession::new());
    /// let identity = RiderIdentity::new("rider-7", "42")?;
    ///
    /// let handle = SyncEngine::new(location, channel, identity, EngineConfig::default()).start()?;
    /// let snapshot = handle.stop().await;
    /// assert_eq!(snapshot.status, EngineStatus::Stopped);
    /// # Ok(())
    /// # }
    /// ```
    pub fn start(self) -> Result<EngineHandle, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let region = ViewportRegion::from(self.config.region);
        let (publisher, observer) = watch::channel(EngineSnapshot::starting(region));
        let cancel = CancellationToken::new();
        let runner = Runner::new(
            self.location,
            self.channel,
            self.identity,
            self.config,
            cancel.clone(),
            publisher,
        );
        let task = runtime.spawn(runner.run());
        Ok(EngineHandle {
            observer,
            cancel,
            task: Some(task),
        })
    }
}

/// Observes and controls a running [`SyncEngine`].
///
/// Dropping the handle cancels the engine; the task then releases the
/// location watch and disconnects the channel in the background. Call
/// [`stop`](Self::stop) to wait for that teardown instead.
pub struct EngineHandle {
    observer: watch::Receiver<EngineSnapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.observer.borrow().clone()
    }

    /// A receiver notified on every snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.observer.clone()
    }

    /// The most recent fix, if any.
    #[must_use]
    pub fn current_position(&self) -> Option<PositionSample> {
        self.observer.borrow().position
    }

    /// The current lifecycle status.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        self.observer.borrow().status.clone()
    }

    /// Whether the engine task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the engine to end on its own, e.g. after access is refused.
    pub async fn finished(&mut self) -> EngineSnapshot {
        if let Some(task) = self.task.as_mut() {
            if let Err(err) = task.await {
                warn!("sync engine task failed: {err}");
            }
            self.task = None;
        }
        self.snapshot()
    }

    /// Stop the engine and wait for teardown.
    ///
    /// The location watch is released and the channel disconnected before
    /// this returns. No update is sent after it returns.
    pub async fn stop(mut self) -> EngineSnapshot {
        self.cancel.cancel();
        self.finished().await
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

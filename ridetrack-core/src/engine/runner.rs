//! The consumer task behind a running [`SyncEngine`](super::SyncEngine).
//!
//! One task per engine owns the location stream, the snapshot and the
//! decision to forward. Events from the location source, channel transitions
//! and cancellation are handled one at a time by a biased `select!`, so no
//! two callbacks for the same engine ever overlap.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::StreamExt;
use log::{debug, info, trace, warn};
use tokio::sync::{broadcast, watch};
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    ChannelSession, ChannelState, Delivery, LocationError, LocationSource, LocationUpdate,
    PositionSample, PositionStream, RiderIdentity, UPDATE_LOCATION_EVENT,
};

use super::config::EngineConfig;
use super::snapshot::{EngineSnapshot, EngineStatus};

/// The location subscription, or the pause before re-opening it.
enum Watch {
    Active(PositionStream),
    Backoff(Pin<Box<Sleep>>),
}

enum WatchEvent {
    Sample(PositionSample),
    Failed(LocationError),
    Ended,
    RetryDue,
}

impl Watch {
    async fn next_event(&mut self) -> WatchEvent {
        match self {
            Self::Active(stream) => match stream.next().await {
                Some(Ok(sample)) => WatchEvent::Sample(sample),
                Some(Err(err)) => WatchEvent::Failed(err),
                None => WatchEvent::Ended,
            },
            Self::Backoff(delay) => {
                delay.as_mut().await;
                WatchEvent::RetryDue
            }
        }
    }
}

pub(super) struct Runner {
    location: Arc<dyn LocationSource>,
    channel: Arc<dyn ChannelSession>,
    identity: RiderIdentity,
    config: EngineConfig,
    cancel: CancellationToken,
    publisher: watch::Sender<EngineSnapshot>,
    snapshot: EngineSnapshot,
}

impl Runner {
    pub(super) fn new(
        location: Arc<dyn LocationSource>,
        channel: Arc<dyn ChannelSession>,
        identity: RiderIdentity,
        config: EngineConfig,
        cancel: CancellationToken,
        publisher: watch::Sender<EngineSnapshot>,
    ) -> Self {
        let snapshot = publisher.borrow().clone();
        Self {
            location,
            channel,
            identity,
            config,
            cancel,
            publisher,
            snapshot,
        }
    }

    pub(super) async fn run(mut self) {
        info!(
            "sync engine starting for rider {} on route {}",
            self.identity.id(),
            self.identity.route_id()
        );

        let access = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            result = self.location.request_access() => Some(result),
        };
        match access {
            None => {
                self.finish(EngineStatus::Stopped);
                return;
            }
            Some(Err(err)) => {
                warn!("location access refused: {err}");
                self.finish(denied(&err));
                return;
            }
            Some(Ok(_)) => debug!("location access granted"),
        }

        let mut transitions = Some(self.channel.subscribe_state());
        self.channel.connect(&self.config.endpoint, &self.identity);
        let mut watch = match self.open_watch() {
            Ok(watch) => watch,
            Err(err) => {
                self.teardown(None, denied(&err));
                return;
            }
        };

        self.snapshot.status = EngineStatus::Tracking;
        self.snapshot.channel = self.channel.state();
        self.publish();

        let status = loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break EngineStatus::Stopped,
                transition = next_transition(&mut transitions) => {
                    self.observe_channel(transition);
                }
                event = watch.next_event() => match event {
                    WatchEvent::Sample(sample) => self.handle_sample(sample),
                    WatchEvent::Failed(err) if err.is_terminal() => break denied(&err),
                    WatchEvent::Failed(err) => {
                        warn!("location watch failed: {err}");
                        self.snapshot.diagnostics.hardware_errors += 1;
                        self.publish();
                        watch = self.backoff();
                    }
                    WatchEvent::Ended => {
                        debug!("location watch ended; re-opening");
                        watch = self.backoff();
                    }
                    WatchEvent::RetryDue => match self.open_watch() {
                        Ok(next) => {
                            if matches!(next, Watch::Active(_)) {
                                self.snapshot.diagnostics.watch_restarts += 1;
                                self.publish();
                            }
                            watch = next;
                        }
                        Err(err) => break denied(&err),
                    },
                },
            }
        };

        self.teardown(Some(watch), status);
    }

    /// Open a watch, falling back to a backoff on recoverable failures.
    fn open_watch(&mut self) -> Result<Watch, LocationError> {
        match self.location.watch(self.config.accuracy) {
            Ok(stream) => Ok(Watch::Active(stream)),
            Err(err) if err.is_terminal() => Err(err),
            Err(err) => {
                warn!("could not open location watch: {err}");
                self.snapshot.diagnostics.hardware_errors += 1;
                self.publish();
                Ok(self.backoff())
            }
        }
    }

    fn backoff(&self) -> Watch {
        Watch::Backoff(Box::pin(tokio::time::sleep(self.config.watch_retry_delay)))
    }

    fn observe_channel(&mut self, transition: Option<ChannelState>) {
        let state = transition.unwrap_or_else(|| self.channel.state());
        debug!("channel state now {state:?}");
        self.snapshot.channel = state;
        self.publish();
    }

    fn handle_sample(&mut self, sample: PositionSample) {
        self.snapshot.position = Some(sample);
        self.snapshot.region = self.snapshot.region.recentred(&sample);
        self.snapshot.diagnostics.samples_received += 1;

        // Re-read the state on every fix; a cached flag goes stale.
        let channel = self.channel.state();
        self.snapshot.channel = channel;

        if self.cancel.is_cancelled() {
            trace!("engine stopping; not forwarding fix");
        } else if channel == ChannelState::Connected {
            self.forward(&sample);
        } else {
            trace!("channel {channel:?}; fix kept locally only");
            self.snapshot.diagnostics.samples_dropped += 1;
        }
        self.publish();
    }

    fn forward(&mut self, sample: &PositionSample) {
        let update = LocationUpdate::new(&self.identity, sample);
        let delivery = match serde_json::to_value(&update) {
            Ok(payload) => self.channel.send(UPDATE_LOCATION_EVENT, payload),
            Err(err) => {
                warn!("failed to encode location update: {err}");
                Delivery::Dropped
            }
        };
        match delivery {
            Delivery::Dispatched => self.snapshot.diagnostics.updates_sent += 1,
            Delivery::Dropped => {
                debug!("channel dropped location update");
                self.snapshot.diagnostics.samples_dropped += 1;
            }
        }
    }

    /// Release the location subscription, then disconnect.
    ///
    /// The subscription is dropped first and unconditionally, so a failing
    /// disconnect cannot leave the device engaged.
    fn teardown(mut self, watch: Option<Watch>, status: EngineStatus) {
        drop(watch);
        if let Err(err) = self.channel.disconnect() {
            warn!("channel disconnect failed: {err}");
        }
        self.snapshot.channel = self.channel.state();
        self.finish(status);
    }

    fn finish(&mut self, status: EngineStatus) {
        info!("sync engine finished: {status:?}");
        self.snapshot.status = status;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.snapshot.clone();
        self.publisher.send_modify(|current| *current = snapshot);
    }
}

fn denied(err: &LocationError) -> EngineStatus {
    EngineStatus::PermissionDenied {
        message: err.to_string(),
    }
}

/// Wait for the next channel transition.
///
/// Returns `None` when transitions were missed or the sender went away; the
/// caller then falls back to reading the current state. A closed receiver is
/// discarded so later calls pend forever instead of spinning.
async fn next_transition(
    receiver: &mut Option<broadcast::Receiver<ChannelState>>,
) -> Option<ChannelState> {
    let Some(listener) = receiver.as_mut() else {
        return std::future::pending().await;
    };
    match listener.recv().await {
        Ok(state) => Some(state),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            trace!("missed {skipped} channel transitions");
            None
        }
        Err(broadcast::error::RecvError::Closed) => {
            *receiver = None;
            None
        }
    }
}

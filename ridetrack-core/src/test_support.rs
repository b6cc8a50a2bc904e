//! Test doubles for the engine's collaborators, used by unit and behaviour
//! tests.
//!
//! [`ScriptedLocationSource`] is driven by the test: it can refuse access,
//! push fixes and failures into every open subscription, and reports how many
//! subscriptions are still alive. [`RecordingChannelSession`] records every
//! event it accepts and lets the test move it between connection states.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tokio::sync::{broadcast, mpsc};

use crate::{
    AccessGranted, AccuracyMode, ChannelError, ChannelSession, ChannelState, CoordinateError,
    Delivery, LocationError, LocationSource, PositionSample, PositionStream, RiderIdentity,
};

type Fix = Result<PositionSample, LocationError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrements the live subscription count when its stream goes away.
struct SubscriptionGuard(Arc<AtomicUsize>);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct SourceScript {
    denied: bool,
    fail_next_watch: Option<String>,
    subscribers: Vec<mpsc::UnboundedSender<Fix>>,
    access_requests: usize,
    watch_calls: usize,
    last_accuracy: Option<AccuracyMode>,
}

/// Location source whose fixes are pushed by the test.
///
/// Fixes emitted while no subscription is open are lost, as they would be on
/// a device with updates stopped.
#[derive(Debug, Default)]
pub struct ScriptedLocationSource {
    script: Mutex<SourceScript>,
    active: Arc<AtomicUsize>,
}

impl ScriptedLocationSource {
    /// A source that grants access.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that refuses access.
    #[must_use]
    pub fn denying() -> Self {
        let source = Self::default();
        source.deny();
        source
    }

    /// Refuse future access requests.
    pub fn deny(&self) {
        lock(&self.script).denied = true;
    }

    /// Make the next [`LocationSource::watch`] call fail with a hardware error.
    pub fn fail_next_watch(&self, message: impl Into<String>) {
        lock(&self.script).fail_next_watch = Some(message.into());
    }

    /// Push a fix to every open subscription. Returns how many received it.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when the coordinate is invalid.
    pub fn emit(&self, latitude: f64, longitude: f64) -> Result<usize, CoordinateError> {
        let sample = PositionSample::now(latitude, longitude)?;
        Ok(self.emit_sample(sample))
    }

    /// Push an existing fix to every open subscription.
    pub fn emit_sample(&self, sample: PositionSample) -> usize {
        self.push(&Ok(sample))
    }

    /// Push a hardware failure to every open subscription.
    pub fn fail(&self, message: impl Into<String>) -> usize {
        self.push(&Err(LocationError::Hardware {
            message: message.into(),
        }))
    }

    /// Revoke access mid-session by pushing a denial to every subscription.
    pub fn revoke(&self) -> usize {
        lock(&self.script).denied = true;
        self.push(&Err(LocationError::PermissionDenied))
    }

    /// End every open subscription as if the platform closed it.
    pub fn end(&self) {
        lock(&self.script).subscribers.clear();
    }

    /// Subscriptions whose stream has not been dropped yet.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of [`LocationSource::watch`] calls, failed ones included.
    #[must_use]
    pub fn watch_calls(&self) -> usize {
        lock(&self.script).watch_calls
    }

    /// Number of [`LocationSource::request_access`] calls.
    #[must_use]
    pub fn access_requests(&self) -> usize {
        lock(&self.script).access_requests
    }

    /// Accuracy requested by the most recent watch.
    #[must_use]
    pub fn last_accuracy(&self) -> Option<AccuracyMode> {
        lock(&self.script).last_accuracy
    }

    fn push(&self, fix: &Fix) -> usize {
        let mut script = lock(&self.script);
        script
            .subscribers
            .retain(|subscriber| subscriber.send(fix.clone()).is_ok());
        script.subscribers.len()
    }
}

#[async_trait]
impl LocationSource for ScriptedLocationSource {
    async fn request_access(&self) -> Result<AccessGranted, LocationError> {
        let mut script = lock(&self.script);
        script.access_requests += 1;
        if script.denied {
            Err(LocationError::PermissionDenied)
        } else {
            Ok(AccessGranted)
        }
    }

    fn watch(&self, accuracy: AccuracyMode) -> Result<PositionStream, LocationError> {
        let mut script = lock(&self.script);
        script.watch_calls += 1;
        script.last_accuracy = Some(accuracy);
        if script.denied {
            return Err(LocationError::PermissionDenied);
        }
        if let Some(message) = script.fail_next_watch.take() {
            return Err(LocationError::Hardware { message });
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        script.subscribers.push(sender);
        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = SubscriptionGuard(Arc::clone(&self.active));
        let fixes = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
            let fix = receiver.recv().await?;
            Some((fix, (receiver, guard)))
        });
        Ok(fixes.boxed())
    }
}

/// An event accepted by [`RecordingChannelSession::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentEvent {
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: serde_json::Value,
}

#[derive(Debug, Default)]
struct Recording {
    state: ChannelState,
    auto_connect: bool,
    fail_disconnect: bool,
    endpoint: Option<String>,
    identity: Option<RiderIdentity>,
    sent: Vec<SentEvent>,
    connect_calls: usize,
    connect_attempts: usize,
    disconnect_calls: usize,
}

/// Channel session that records sends instead of transmitting them.
///
/// By default a connect attempt stays [`ChannelState::Connecting`] until the
/// test calls [`complete_connection`](Self::complete_connection).
#[derive(Debug)]
pub struct RecordingChannelSession {
    recording: Mutex<Recording>,
    transitions: broadcast::Sender<ChannelState>,
    dropped: AtomicU64,
}

impl Default for RecordingChannelSession {
    fn default() -> Self {
        let (transitions, _) = broadcast::channel(16);
        Self {
            recording: Mutex::default(),
            transitions,
            dropped: AtomicU64::new(0),
        }
    }
}

impl RecordingChannelSession {
    /// A session that waits for the test to complete each connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose connect attempts succeed immediately.
    #[must_use]
    pub fn auto_connecting() -> Self {
        let session = Self::default();
        lock(&session.recording).auto_connect = true;
        session
    }

    /// Make every later [`ChannelSession::disconnect`] fail.
    pub fn fail_disconnect(&self) {
        lock(&self.recording).fail_disconnect = true;
    }

    /// Finish the pending connection attempt.
    pub fn complete_connection(&self) {
        let mut recording = lock(&self.recording);
        self.transition(&mut recording, ChannelState::Connected);
    }

    /// Simulate the peer closing the connection.
    pub fn drop_connection(&self) {
        let mut recording = lock(&self.recording);
        self.transition(&mut recording, ChannelState::Disconnected);
    }

    /// Events accepted so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEvent> {
        lock(&self.recording).sent.clone()
    }

    /// Calls to [`ChannelSession::connect`], no-ops included.
    #[must_use]
    pub fn connect_calls(&self) -> usize {
        lock(&self.recording).connect_calls
    }

    /// Connect calls that started a new attempt.
    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        lock(&self.recording).connect_attempts
    }

    /// Calls to [`ChannelSession::disconnect`].
    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        lock(&self.recording).disconnect_calls
    }

    /// Endpoint passed to the most recent attempt.
    #[must_use]
    pub fn endpoint(&self) -> Option<String> {
        lock(&self.recording).endpoint.clone()
    }

    /// Identity passed to the most recent attempt.
    #[must_use]
    pub fn identity(&self) -> Option<RiderIdentity> {
        lock(&self.recording).identity.clone()
    }

    fn transition(&self, recording: &mut Recording, next: ChannelState) {
        if recording.state == next {
            return;
        }
        recording.state = next;
        if self.transitions.send(next).is_err() {
            log::trace!("no listeners for channel transition to {next:?}");
        }
    }
}

impl ChannelSession for RecordingChannelSession {
    fn connect(&self, endpoint: &str, identity: &RiderIdentity) {
        let mut recording = lock(&self.recording);
        recording.connect_calls += 1;
        if recording.state != ChannelState::Disconnected {
            return;
        }
        recording.connect_attempts += 1;
        recording.endpoint = Some(endpoint.to_owned());
        recording.identity = Some(identity.clone());
        self.transition(&mut recording, ChannelState::Connecting);
        if recording.auto_connect {
            self.transition(&mut recording, ChannelState::Connected);
        }
    }

    fn send(&self, event: &str, payload: serde_json::Value) -> Delivery {
        let mut recording = lock(&self.recording);
        if recording.state != ChannelState::Connected {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            return Delivery::Dropped;
        }
        recording.sent.push(SentEvent {
            event: event.to_owned(),
            payload,
        });
        Delivery::Dispatched
    }

    fn disconnect(&self) -> Result<(), ChannelError> {
        let mut recording = lock(&self.recording);
        recording.disconnect_calls += 1;
        self.transition(&mut recording, ChannelState::Disconnected);
        if recording.fail_disconnect {
            return Err(ChannelError::Transport {
                endpoint: recording.endpoint.clone().unwrap_or_default(),
                message: "scripted disconnect failure".to_owned(),
            });
        }
        Ok(())
    }

    fn state(&self) -> ChannelState {
        lock(&self.recording).state
    }

    fn subscribe_state(&self) -> broadcast::Receiver<ChannelState> {
        self.transitions.subscribe()
    }

    fn dropped_sends(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }
}

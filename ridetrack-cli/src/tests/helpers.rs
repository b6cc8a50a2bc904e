//! Test helpers for CLI scenarios: on-disk fixtures and stub adapters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use ridetrack_core::test_support::RecordingChannelSession;
use ridetrack_core::{FetchError, StopListFetcher, StopOfInterest};
use ridetrack_data::stops::test_support::StubStopListFetcher;
use tempfile::TempDir;

use crate::CliError;
use crate::stops::FetcherBuilder;

/// Three fixes heading north-west.
pub(super) const TRACK: &str = r#"{"latitude": 37.1, "longitude": -122.1, "captured_at": "2024-05-02T08:00:00Z"}
{"latitude": 37.2, "longitude": -122.2}
{"latitude": 37.3, "longitude": -122.3}
"#;

pub(super) const OVERLAY: &str = r#"{"42": [
    {"latitude": 37.1, "longitude": -122.1},
    {"latitude": 37.3, "longitude": -122.3}
]}"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture");
}

/// A temporary directory addressed through UTF-8 paths.
pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Builds stub fetchers answering with a canned outcome.
#[derive(Debug)]
pub(super) struct StubFetcherBuilder {
    outcome: Result<Vec<StopOfInterest>, FetchError>,
    timeouts: Mutex<Vec<Duration>>,
}

impl StubFetcherBuilder {
    pub(super) fn answering(outcome: Result<Vec<StopOfInterest>, FetchError>) -> Self {
        Self {
            outcome,
            timeouts: Mutex::default(),
        }
    }

    pub(super) fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().expect("timeouts lock").clone()
    }
}

impl FetcherBuilder for StubFetcherBuilder {
    fn build(&self, timeout: Duration) -> Result<Box<dyn StopListFetcher>, CliError> {
        self.timeouts.lock().expect("timeouts lock").push(timeout);
        let stub = match &self.outcome {
            Ok(stops) => StubStopListFetcher::with_stops(stops.clone()),
            Err(err) => StubStopListFetcher::with_error(err.clone()),
        };
        Ok(Box::new(stub))
    }
}

/// Builds fetchers that answer with no stops after `delay`, noting how many
/// updates the channel had carried by then.
#[derive(Debug)]
pub(super) struct SlowFetcherBuilder {
    delay: Duration,
    channel: Arc<RecordingChannelSession>,
    sends_when_resolved: Arc<Mutex<Option<usize>>>,
}

impl SlowFetcherBuilder {
    pub(super) fn new(delay: Duration, channel: Arc<RecordingChannelSession>) -> Self {
        Self {
            delay,
            channel,
            sends_when_resolved: Arc::default(),
        }
    }

    pub(super) fn sends_when_resolved(&self) -> Option<usize> {
        *self.sends_when_resolved.lock().expect("sends lock")
    }
}

impl FetcherBuilder for SlowFetcherBuilder {
    fn build(&self, _timeout: Duration) -> Result<Box<dyn StopListFetcher>, CliError> {
        Ok(Box::new(SlowFetcher {
            delay: self.delay,
            channel: Arc::clone(&self.channel),
            sends_when_resolved: Arc::clone(&self.sends_when_resolved),
        }))
    }
}

struct SlowFetcher {
    delay: Duration,
    channel: Arc<RecordingChannelSession>,
    sends_when_resolved: Arc<Mutex<Option<usize>>>,
}

#[async_trait]
impl StopListFetcher for SlowFetcher {
    async fn fetch(&self, _endpoint: &str) -> Result<Vec<StopOfInterest>, FetchError> {
        tokio::time::sleep(self.delay).await;
        let sends = self.channel.sent().len();
        *self.sends_when_resolved.lock().expect("sends lock") = Some(sends);
        Ok(Vec::new())
    }
}

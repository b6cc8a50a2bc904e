use std::time::Duration;

use crate::{AccuracyMode, RegionDefaults};

/// Default channel endpoint.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:5000";

/// Default pause before re-opening a failed location watch.
pub const DEFAULT_WATCH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Configuration for [`crate::SyncEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Address handed to [`crate::ChannelSession::connect`].
    pub endpoint: String,
    /// Accuracy requested from the location source.
    pub accuracy: AccuracyMode,
    /// Initial viewport before the first fix arrives.
    pub region: RegionDefaults,
    /// Pause before re-opening a watch after a hardware error.
    pub watch_retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            accuracy: AccuracyMode::default(),
            region: RegionDefaults::default(),
            watch_retry_delay: DEFAULT_WATCH_RETRY_DELAY,
        }
    }
}

impl EngineConfig {
    /// Create a configuration for the given channel endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the requested accuracy.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy: AccuracyMode) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the initial viewport.
    #[must_use]
    pub const fn with_region(mut self, region: RegionDefaults) -> Self {
        self.region = region;
        self
    }

    /// Set the pause before re-opening a failed watch.
    #[must_use]
    pub const fn with_watch_retry_delay(mut self, delay: Duration) -> Self {
        self.watch_retry_delay = delay;
        self
    }
}

//! `LocationSource` that replays a recorded track.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8Path;
use chrono::Utc;
use futures_util::{StreamExt, stream};
use log::debug;
use ridetrack_core::{
    AccessGranted, AccuracyMode, LocationError, LocationSource, PositionSample, PositionStream,
};

use super::track::{TrackLoadError, TrackPoint, load_track};

/// Default pause between replayed fixes.
pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`ReplayLocationSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Pause between consecutive fixes.
    pub interval: Duration,
    /// Start again from the first point after the last one.
    pub looping: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REPLAY_INTERVAL,
            looping: false,
        }
    }
}

impl ReplayConfig {
    /// Set the pause between fixes.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Choose whether the replay starts over after the last point.
    #[must_use]
    pub const fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

/// Replays a recorded track as if it came from the device.
///
/// Access is always granted. Each [`watch`](LocationSource::watch) replays
/// the track from its first point. Without looping the stream stays open
/// after the last point, like a device parked in place. Recorded timestamps
/// are used on the first pass; later passes, and points without one, are
/// stamped with the current time.
#[derive(Debug, Clone)]
pub struct ReplayLocationSource {
    track: Arc<[TrackPoint]>,
    config: ReplayConfig,
}

impl ReplayLocationSource {
    /// Create a source replaying `track`.
    #[must_use]
    pub fn new(track: Vec<TrackPoint>, config: ReplayConfig) -> Self {
        Self {
            track: track.into(),
            config,
        }
    }

    /// Load the track file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackLoadError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Utf8Path, config: ReplayConfig) -> Result<Self, TrackLoadError> {
        Ok(Self::new(load_track(path)?, config))
    }

    /// Number of points in the track.
    #[must_use]
    pub fn len(&self) -> usize {
        self.track.len()
    }

    /// Whether the track has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }
}

struct Cursor {
    track: Arc<[TrackPoint]>,
    config: ReplayConfig,
    index: usize,
    pass: usize,
    started: bool,
}

impl Cursor {
    fn fix(&self, point: &TrackPoint) -> Result<PositionSample, LocationError> {
        let at = match point.captured_at() {
            Some(recorded) if self.pass == 0 => recorded,
            _ => Utc::now(),
        };
        point
            .sample_at(at)
            .map_err(|err| LocationError::Hardware {
                message: err.to_string(),
            })
    }
}

async fn next_fix(
    mut cursor: Cursor,
) -> Option<(Result<PositionSample, LocationError>, Cursor)> {
    if cursor.started {
        tokio::time::sleep(cursor.config.interval).await;
    }
    if cursor.index >= cursor.track.len() {
        if !cursor.config.looping {
            std::future::pending::<()>().await;
        }
        cursor.index = 0;
        cursor.pass += 1;
    }
    let point = *cursor.track.get(cursor.index)?;
    let fix = cursor.fix(&point);
    cursor.index += 1;
    cursor.started = true;
    Some((fix, cursor))
}

#[async_trait]
impl LocationSource for ReplayLocationSource {
    async fn request_access(&self) -> Result<AccessGranted, LocationError> {
        Ok(AccessGranted)
    }

    fn watch(&self, accuracy: AccuracyMode) -> Result<PositionStream, LocationError> {
        if self.track.is_empty() {
            return Err(LocationError::Hardware {
                message: "replay track is empty".to_owned(),
            });
        }
        debug!(
            "replaying {} fixes every {:?} (requested accuracy {accuracy:?})",
            self.track.len(),
            self.config.interval
        );
        let cursor = Cursor {
            track: Arc::clone(&self.track),
            config: self.config,
            index: 0,
            pass: 0,
            started: false,
        };
        Ok(stream::unfold(cursor, next_fix).boxed())
    }
}

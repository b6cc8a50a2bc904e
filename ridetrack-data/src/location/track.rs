//! Recorded track files.
//!
//! A track file holds one JSON object per line:
//!
//! ```text
//! {"latitude": 48.1105, "longitude": -1.6795, "captured_at": "2024-05-02T08:00:00Z"}
//! {"latitude": 48.1112, "longitude": -1.6781}
//! ```
//!
//! `captured_at` is optional. Blank lines are skipped. Coordinates are
//! validated when the file is loaded, so a replay never yields an invalid fix.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use ridetrack_core::{CoordinateError, PositionSample, validate_coordinate};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a track file.
#[derive(Debug, Error)]
pub enum TrackLoadError {
    /// The file could not be read.
    #[error("failed to read track file {path}: {source}")]
    Io {
        /// Path of the track file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A line was not a track record.
    #[error("line {line}: invalid track record: {source}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A line held an invalid coordinate.
    #[error("line {line}: {source}")]
    InvalidCoordinate {
        /// One-based line number.
        line: usize,
        /// Validation error.
        #[source]
        source: CoordinateError,
    },
    /// The file held no records.
    #[error("track file contains no fixes")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct TrackRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    captured_at: Option<DateTime<Utc>>,
}

/// One validated point of a recorded track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    latitude: f64,
    longitude: f64,
    captured_at: Option<DateTime<Utc>>,
}

impl TrackPoint {
    /// Validate and construct a track point.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when the coordinate is invalid.
    pub fn new(
        latitude: f64,
        longitude: f64,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<Self, CoordinateError> {
        validate_coordinate(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            captured_at,
        })
    }

    /// Recorded capture time, if the file had one.
    #[must_use]
    pub const fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Turn the point into a fix captured at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when the coordinate is invalid.
    pub fn sample_at(&self, at: DateTime<Utc>) -> Result<PositionSample, CoordinateError> {
        PositionSample::new(self.latitude, self.longitude, at)
    }
}

/// Parse track file contents.
///
/// # Errors
///
/// Returns [`TrackLoadError`] for malformed lines, invalid coordinates or an
/// empty track.
pub fn parse_track(contents: &str) -> Result<Vec<TrackPoint>, TrackLoadError> {
    let mut points = Vec::new();
    for (index, text) in contents.lines().enumerate() {
        let line = index + 1;
        if text.trim().is_empty() {
            continue;
        }
        let record: TrackRecord =
            serde_json::from_str(text).map_err(|source| TrackLoadError::Parse { line, source })?;
        let point = TrackPoint::new(record.latitude, record.longitude, record.captured_at)
            .map_err(|source| TrackLoadError::InvalidCoordinate { line, source })?;
        points.push(point);
    }
    if points.is_empty() {
        return Err(TrackLoadError::Empty);
    }
    Ok(points)
}

/// Load and validate the track file at `path`.
///
/// # Errors
///
/// Returns [`TrackLoadError::Io`] when the file cannot be read, otherwise
/// the errors of [`parse_track`].
pub fn load_track(path: &Utf8Path) -> Result<Vec<TrackPoint>, TrackLoadError> {
    let contents = ridetrack_fs::read_utf8_file(path).map_err(|source| TrackLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_track(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_records_and_skips_blank_lines() {
        let contents = "{\"latitude\": 37.1, \"longitude\": -122.1, \"captured_at\": \"2024-05-02T08:00:00Z\"}\n\n{\"latitude\": 37.2, \"longitude\": -122.2}\n";
        let points = parse_track(contents).expect("valid track");

        assert_eq!(points.len(), 2);
        assert!(points[0].captured_at().is_some());
        assert!(points[1].captured_at().is_none());
    }

    #[rstest]
    #[case("{\"latitude\": 37.1}", 1)]
    #[case("{\"latitude\": 37.1, \"longitude\": -122.1}\nnot json", 2)]
    fn reports_the_malformed_line(#[case] contents: &str, #[case] expected: usize) {
        match parse_track(contents) {
            Err(TrackLoadError::Parse { line, .. }) => assert_eq!(line, expected),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[rstest]
    fn rejects_invalid_coordinates() {
        let err = parse_track("{\"latitude\": 137.1, \"longitude\": 0.0}").expect_err("invalid");
        assert!(matches!(
            err,
            TrackLoadError::InvalidCoordinate { line: 1, .. }
        ));
    }

    #[rstest]
    fn rejects_empty_tracks() {
        assert!(matches!(parse_track("\n \n"), Err(TrackLoadError::Empty)));
    }
}

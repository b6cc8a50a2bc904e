//! Position samples and the viewport derived from them.

use chrono::{DateTime, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Latitude of the default viewport centre.
pub const DEFAULT_LATITUDE: f64 = 37.7749;
/// Longitude of the default viewport centre.
pub const DEFAULT_LONGITUDE: f64 = -122.4194;
/// Default latitude span of the viewport, in degrees.
pub const DEFAULT_LATITUDE_SPAN: f64 = 0.0922;
/// Default longitude span of the viewport, in degrees.
pub const DEFAULT_LONGITUDE_SPAN: f64 = 0.0421;

/// Errors returned when validating a WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude or longitude was NaN or infinite.
    #[error("coordinate components must be finite")]
    NonFinite,
    /// Latitude was outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude was outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Validate a latitude/longitude pair and return it as a `geo` coordinate.
///
/// The returned coordinate follows the `geo` convention of `x = longitude`
/// and `y = latitude`.
///
/// # Examples
/// ```
/// use ridetrack_core::{CoordinateError, validate_coordinate};
///
/// let coord = validate_coordinate(51.5, -0.1)?;
/// assert_eq!(coord.x, -0.1);
/// assert!(validate_coordinate(91.0, 0.0).is_err());
/// # Ok::<(), CoordinateError>(())
/// ```
pub fn validate_coordinate(latitude: f64, longitude: f64) -> Result<Coord<f64>, CoordinateError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(CoordinateError::NonFinite);
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(CoordinateError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(CoordinateError::LongitudeOutOfRange(longitude));
    }
    Ok(Coord {
        x: longitude,
        y: latitude,
    })
}

/// A single fix reported by a [`LocationSource`](crate::LocationSource).
///
/// Samples are immutable. A newer sample supersedes an older one; nothing
/// mutates a sample after construction.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use ridetrack_core::PositionSample;
///
/// let sample = PositionSample::new(37.1, -122.1, Utc::now())?;
/// assert_eq!(sample.latitude(), 37.1);
/// # Ok::<(), ridetrack_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    latitude: f64,
    longitude: f64,
    captured_at: DateTime<Utc>,
}

impl PositionSample {
    /// Validates and constructs a [`PositionSample`].
    pub fn new(
        latitude: f64,
        longitude: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, CoordinateError> {
        validate_coordinate(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            captured_at,
        })
    }

    /// Construct a sample stamped with the current time.
    pub fn now(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        Self::new(latitude, longitude, Utc::now())
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// When the device captured the fix.
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// The sample as a `geo` coordinate (`x = longitude`, `y = latitude`).
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

/// Default zoom applied to a fresh viewport.
///
/// The spans are a rendering preference rather than part of any wire
/// contract, so callers may override them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionDefaults {
    /// Latitude of the initial centre.
    pub latitude: f64,
    /// Longitude of the initial centre.
    pub longitude: f64,
    /// Latitude span in degrees.
    pub latitude_span: f64,
    /// Longitude span in degrees.
    pub longitude_span: f64,
}

impl Default for RegionDefaults {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            latitude_span: DEFAULT_LATITUDE_SPAN,
            longitude_span: DEFAULT_LONGITUDE_SPAN,
        }
    }
}

impl RegionDefaults {
    /// Override the spans used for new viewports.
    #[must_use]
    pub const fn with_spans(mut self, latitude_span: f64, longitude_span: f64) -> Self {
        self.latitude_span = latitude_span;
        self.longitude_span = longitude_span;
        self
    }
}

/// The map area a renderer should display.
///
/// Only the centre follows the position stream. Spans chosen by the user
/// (or the defaults) survive every recentre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRegion {
    /// Centre latitude.
    pub latitude: f64,
    /// Centre longitude.
    pub longitude: f64,
    /// Visible latitude span in degrees.
    pub latitude_span: f64,
    /// Visible longitude span in degrees.
    pub longitude_span: f64,
}

impl Default for ViewportRegion {
    fn default() -> Self {
        Self::from(RegionDefaults::default())
    }
}

impl From<RegionDefaults> for ViewportRegion {
    fn from(defaults: RegionDefaults) -> Self {
        Self {
            latitude: defaults.latitude,
            longitude: defaults.longitude,
            latitude_span: defaults.latitude_span,
            longitude_span: defaults.longitude_span,
        }
    }
}

impl ViewportRegion {
    /// Move the centre to `sample`, keeping the current spans.
    ///
    /// # Examples
    /// ```
    /// use ridetrack_core::{PositionSample, ViewportRegion};
    ///
    /// let region = ViewportRegion::default();
    /// let sample = PositionSample::now(48.85, 2.35)?;
    /// let moved = region.recentred(&sample);
    /// assert_eq!(moved.latitude, 48.85);
    /// assert_eq!(moved.latitude_span, region.latitude_span);
    /// # Ok::<(), ridetrack_core::CoordinateError>(())
    /// ```
    #[must_use]
    pub const fn recentred(&self, sample: &PositionSample) -> Self {
        Self {
            latitude: sample.latitude(),
            longitude: sample.longitude(),
            latitude_span: self.latitude_span,
            longitude_span: self.longitude_span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-90.0, -180.0)]
    #[case(90.0, 180.0)]
    #[case(0.0, 0.0)]
    fn accepts_boundary_coordinates(#[case] latitude: f64, #[case] longitude: f64) {
        assert!(PositionSample::now(latitude, longitude).is_ok());
    }

    #[rstest]
    #[case(90.5, 0.0, CoordinateError::LatitudeOutOfRange(90.5))]
    #[case(-91.0, 0.0, CoordinateError::LatitudeOutOfRange(-91.0))]
    #[case(0.0, 180.1, CoordinateError::LongitudeOutOfRange(180.1))]
    #[case(f64::NAN, 0.0, CoordinateError::NonFinite)]
    #[case(0.0, f64::INFINITY, CoordinateError::NonFinite)]
    fn rejects_invalid_coordinates(
        #[case] latitude: f64,
        #[case] longitude: f64,
        #[case] expected: CoordinateError,
    ) {
        let err = PositionSample::now(latitude, longitude).expect_err("invalid coordinate");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn recentre_preserves_custom_spans() {
        let region = ViewportRegion::from(RegionDefaults::default().with_spans(0.5, 0.25));
        let sample = PositionSample::now(37.3, -122.3).expect("valid sample");

        let moved = region.recentred(&sample);

        assert_eq!(moved.latitude, 37.3);
        assert_eq!(moved.longitude, -122.3);
        assert_eq!(moved.latitude_span, 0.5);
        assert_eq!(moved.longitude_span, 0.25);
    }

    #[rstest]
    fn default_region_uses_default_spans() {
        let region = ViewportRegion::default();
        assert_eq!(region.latitude_span, DEFAULT_LATITUDE_SPAN);
        assert_eq!(region.longitude_span, DEFAULT_LONGITUDE_SPAN);
    }

    #[rstest]
    fn coord_maps_longitude_to_x() {
        let sample = PositionSample::now(10.0, 20.0).expect("valid sample");
        assert_eq!(sample.coord(), Coord { x: 20.0, y: 10.0 });
    }
}

use geo::Coord;
use serde::Serialize;

use crate::{CoordinateError, validate_coordinate};

/// Message shown when the stop list cannot be fetched.
pub const STOP_LIST_FAILURE_MESSAGE: &str = "Error fetching bus stops data.";

/// A transit stop worth marking on the map.
///
/// Stops are snapshots from a one-shot fetch. A refetch replaces the whole
/// collection; individual stops are never merged or updated.
///
/// # Examples
/// ```
/// use ridetrack_core::StopOfInterest;
///
/// let stop = StopOfInterest::new("s1", "Gare", 48.1, -1.6, "Rennes", "STAR")?;
/// assert_eq!(stop.location.y, 48.1);
/// # Ok::<(), ridetrack_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopOfInterest {
    /// Stable identifier assigned by the stop-list API.
    pub id: String,
    /// Display name shown on the marker.
    pub name: String,
    /// WGS84 position, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Municipality the stop belongs to.
    pub municipality: String,
    /// Transit operator serving the stop.
    pub operator_name: String,
}

impl StopOfInterest {
    /// Validates the coordinate and constructs a [`StopOfInterest`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        municipality: impl Into<String>,
        operator_name: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let location = validate_coordinate(latitude, longitude)?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            location,
            municipality: municipality.into(),
            operator_name: operator_name.into(),
        })
    }

    /// Marker subtitle: `"{municipality}, {operator}"`.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{}, {}", self.municipality, self.operator_name)
    }
}

/// Outcome of the stop-list fetch for one screen visit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum StopListState {
    /// The fetch has not completed yet.
    #[default]
    Loading,
    /// The fetch succeeded. May be empty.
    Loaded(Vec<StopOfInterest>),
    /// The fetch failed with a user-facing message.
    Failed(String),
}

impl StopListState {
    /// Stops available for rendering; empty while loading or after failure.
    #[must_use]
    pub fn stops(&self) -> &[StopOfInterest] {
        match self {
            Self::Loaded(stops) => stops,
            Self::Loading | Self::Failed(_) => &[],
        }
    }

    /// The user-facing failure message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Loading | Self::Loaded(_) => None,
        }
    }
}

impl<E> From<Result<Vec<StopOfInterest>, E>> for StopListState
where
    E: std::fmt::Display,
{
    fn from(result: Result<Vec<StopOfInterest>, E>) -> Self {
        match result {
            Ok(stops) => Self::Loaded(stops),
            Err(err) => {
                log::warn!("stop list fetch failed: {err}");
                Self::Failed(STOP_LIST_FAILURE_MESSAGE.to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_joins_municipality_and_operator() {
        let stop = StopOfInterest::new("1", "Gare", 48.1, -1.6, "Rennes", "STAR").expect("stop");
        assert_eq!(stop.description(), "Rennes, STAR");
    }

    #[test]
    fn failed_fetch_maps_to_fixed_message() {
        let state = StopListState::from(Err::<Vec<StopOfInterest>, _>("boom"));
        assert_eq!(state.error(), Some(STOP_LIST_FAILURE_MESSAGE));
        assert!(state.stops().is_empty());
    }

    #[test]
    fn empty_fetch_is_loaded_without_error() {
        let state = StopListState::from(Ok::<_, String>(Vec::new()));
        assert_eq!(state, StopListState::Loaded(Vec::new()));
        assert!(state.error().is_none());
    }
}

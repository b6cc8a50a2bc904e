//! View model for the live map screen.
//!
//! [`render_screen`] folds the engine snapshot, the stop-list outcome and the
//! route overlay table into the one thing a renderer needs to draw. Errors
//! win over everything else; without a fix the screen keeps loading.

use geo::Coord;
use serde::Serialize;

use crate::{EngineSnapshot, RouteOverlayTable, StopListState, StopOfInterest, ViewportRegion};

/// A stop marker ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopMarker {
    /// Stop identifier, used as the marker key.
    pub id: String,
    /// Marker title.
    pub title: String,
    /// Marker subtitle, `"{municipality}, {operator}"`.
    pub description: String,
    /// Marker position, `x = longitude`, `y = latitude`.
    pub coordinate: Coord<f64>,
}

impl From<&StopOfInterest> for StopMarker {
    fn from(stop: &StopOfInterest) -> Self {
        Self {
            id: stop.id.clone(),
            title: stop.name.clone(),
            description: stop.description(),
            coordinate: stop.location,
        }
    }
}

/// Everything drawn on a ready map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Visible region, centred on the rider.
    pub region: ViewportRegion,
    /// The rider's marker.
    pub current: Coord<f64>,
    /// Polyline of the rider's route. Empty for unknown routes.
    pub overlay: Vec<Coord<f64>>,
    /// Transit stops.
    pub stops: Vec<StopMarker>,
}

/// What the screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenState {
    /// A full-screen error message.
    Error {
        /// User-facing text.
        message: String,
    },
    /// Waiting for the first fix.
    Loading,
    /// The map with every layer available so far.
    Ready(MapView),
}

/// Derive the screen from the current state of its inputs.
///
/// A refused location permission takes precedence over a failed stop fetch.
/// Stops still loading do not hold the map back; they appear once fetched.
///
/// # Examples
/// ```
/// use ridetrack_core::{
///     EngineSnapshot, RouteOverlayTable, ScreenState, StopListState, ViewportRegion,
///     render_screen,
/// };
///
/// let snapshot = EngineSnapshot::starting(ViewportRegion::default());
/// let overlays = RouteOverlayTable::default();
/// let screen = render_screen(&snapshot, &StopListState::Loading, &overlays, "42");
/// assert_eq!(screen, ScreenState::Loading);
/// ```
#[must_use]
pub fn render_screen(
    snapshot: &EngineSnapshot,
    stops: &StopListState,
    overlays: &RouteOverlayTable,
    route_id: &str,
) -> ScreenState {
    if let Some(message) = snapshot.status.error().or_else(|| stops.error()) {
        return ScreenState::Error {
            message: message.to_owned(),
        };
    }
    let Some(position) = snapshot.position else {
        return ScreenState::Loading;
    };
    ScreenState::Ready(MapView {
        region: snapshot.region,
        current: position.coord(),
        overlay: overlays.lookup(route_id).to_vec(),
        stops: stops.stops().iter().map(StopMarker::from).collect(),
    })
}

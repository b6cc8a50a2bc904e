//! Static route polylines keyed by route identifier.
//!
//! The table is loaded once at process start and never mutated afterwards.
//! Lookups for unknown routes yield an empty overlay rather than an error.

use std::collections::HashMap;

use geo::{Coord, LineString};
use serde::Serialize;

use crate::{CoordinateError, validate_coordinate};

/// Ordered polyline drawn for a route.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteOverlay {
    points: Vec<Coord<f64>>,
}

impl RouteOverlay {
    /// Validate and construct an overlay from `(latitude, longitude)` pairs.
    ///
    /// # Examples
    /// ```
    /// use ridetrack_core::RouteOverlay;
    ///
    /// let overlay = RouteOverlay::from_lat_lon([(37.77, -122.41), (37.78, -122.42)])?;
    /// assert_eq!(overlay.points().len(), 2);
    /// # Ok::<(), ridetrack_core::CoordinateError>(())
    /// ```
    pub fn from_lat_lon<I>(points: I) -> Result<Self, CoordinateError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let points = points
            .into_iter()
            .map(|(latitude, longitude)| validate_coordinate(latitude, longitude))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    /// Points in drawing order (`x = longitude`, `y = latitude`).
    #[must_use]
    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    /// The overlay as a `geo` line string.
    #[must_use]
    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(self.points.clone())
    }

    /// Whether the overlay has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Read-only lookup of route overlays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteOverlayTable {
    routes: HashMap<String, RouteOverlay>,
}

impl RouteOverlayTable {
    /// Build a table from `(route_id, overlay)` entries.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, RouteOverlay)>,
    {
        Self {
            routes: entries.into_iter().collect(),
        }
    }

    /// Overlay for `route_id`, or an empty overlay when the route is unknown.
    #[must_use]
    pub fn lookup(&self, route_id: &str) -> &[Coord<f64>] {
        self.routes
            .get(route_id)
            .map(RouteOverlay::points)
            .unwrap_or_default()
    }

    /// Number of routes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn table() -> RouteOverlayTable {
        let overlay = RouteOverlay::from_lat_lon([(37.77, -122.41), (37.78, -122.42)])
            .expect("valid overlay");
        RouteOverlayTable::new([("42".to_owned(), overlay)])
    }

    #[rstest]
    fn lookup_returns_points_in_order(table: RouteOverlayTable) {
        let points = table.lookup("42");
        assert_eq!(
            points,
            [
                Coord {
                    x: -122.41,
                    y: 37.77
                },
                Coord {
                    x: -122.42,
                    y: 37.78
                },
            ]
        );
    }

    #[rstest]
    fn unknown_route_yields_empty_overlay(table: RouteOverlayTable) {
        assert!(table.lookup("7").is_empty());
    }

    #[rstest]
    fn rejects_invalid_points() {
        let err = RouteOverlay::from_lat_lon([(0.0, 0.0), (95.0, 0.0)]).expect_err("bad point");
        assert_eq!(err, CoordinateError::LatitudeOutOfRange(95.0));
    }

    #[rstest]
    fn line_string_preserves_points(table: RouteOverlayTable) {
        let overlay = RouteOverlay::from_lat_lon([(1.0, 2.0)]).expect("overlay");
        assert_eq!(overlay.line_string().0, vec![Coord { x: 2.0, y: 1.0 }]);
        assert_eq!(table.len(), 1);
    }
}

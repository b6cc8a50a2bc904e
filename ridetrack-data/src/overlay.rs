//! Route overlay files.
//!
//! An overlay file is a JSON object mapping route identifiers to ordered
//! polylines:
//!
//! ```json
//! {"42": [{"latitude": 37.77, "longitude": -122.41},
//!         {"latitude": 37.78, "longitude": -122.42}]}
//! ```

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use ridetrack_core::{CoordinateError, RouteOverlay, RouteOverlayTable};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading an overlay file.
#[derive(Debug, Error)]
pub enum OverlayLoadError {
    /// The file could not be read.
    #[error("failed to read overlay file {path}: {source}")]
    Io {
        /// Path of the overlay file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The contents were not an overlay table.
    #[error("invalid overlay table: {source}")]
    Parse {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A route held an invalid point.
    #[error("route {route}: {source}")]
    InvalidCoordinate {
        /// Route whose polyline failed validation.
        route: String,
        /// Validation error.
        #[source]
        source: CoordinateError,
    },
}

#[derive(Debug, Deserialize)]
struct OverlayPoint {
    latitude: f64,
    longitude: f64,
}

/// Parse an overlay table from JSON text.
///
/// # Errors
///
/// Returns [`OverlayLoadError::Parse`] for malformed JSON and
/// [`OverlayLoadError::InvalidCoordinate`] for out-of-range points.
pub fn parse_overlay_table(contents: &str) -> Result<RouteOverlayTable, OverlayLoadError> {
    let raw: BTreeMap<String, Vec<OverlayPoint>> =
        serde_json::from_str(contents).map_err(|source| OverlayLoadError::Parse { source })?;

    let routes = raw
        .into_iter()
        .map(|(route, points)| {
            let pairs = points.iter().map(|p| (p.latitude, p.longitude));
            match RouteOverlay::from_lat_lon(pairs) {
                Ok(overlay) => Ok((route, overlay)),
                Err(source) => Err(OverlayLoadError::InvalidCoordinate { route, source }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RouteOverlayTable::new(routes))
}

/// Load the overlay table stored at `path`.
///
/// # Errors
///
/// Returns [`OverlayLoadError::Io`] when the file cannot be read, otherwise
/// the errors of [`parse_overlay_table`].
pub fn load_overlay_table(path: &Utf8Path) -> Result<RouteOverlayTable, OverlayLoadError> {
    let contents = ridetrack_fs::read_utf8_file(path).map_err(|source| OverlayLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_overlay_table(&contents)?;
    info!("loaded {} route overlays from {path}", table.len());
    Ok(table)
}

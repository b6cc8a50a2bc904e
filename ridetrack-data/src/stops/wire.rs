//! Stop-list API response rows.
//!
//! The API answers with a JSON array of rows such as:
//!
//! ```json
//! [{"_id": "5f1", "stop_lat": 48.11, "stop_lon": -1.68, "stop_name": "Gares",
//!   "nom_commune": "Rennes", "operatorname": "STAR"}]
//! ```
//!
//! Some exports encode the coordinates as strings; both forms are accepted.

use ridetrack_core::{CoordinateError, StopOfInterest};
use serde::Deserialize;
use thiserror::Error;

/// A coordinate component as published by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireDegrees {
    /// A JSON number.
    Number(f64),
    /// A decimal number encoded as a string.
    Text(String),
}

impl WireDegrees {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// One row of the stop-list response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopRecord {
    /// Stop identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Latitude in degrees.
    pub stop_lat: WireDegrees,
    /// Longitude in degrees.
    pub stop_lon: WireDegrees,
    /// Display name.
    pub stop_name: String,
    /// Municipality the stop belongs to.
    #[serde(default)]
    pub nom_commune: String,
    /// Operator running the stop.
    #[serde(default)]
    pub operatorname: String,
}

/// Why a row could not become a [`StopOfInterest`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// A coordinate string was not a number.
    #[error("coordinate is not a number")]
    NotANumber,
    /// The coordinate failed validation.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

impl TryFrom<StopRecord> for StopOfInterest {
    type Error = RecordError;

    fn try_from(record: StopRecord) -> Result<Self, Self::Error> {
        let latitude = record.stop_lat.value().ok_or(RecordError::NotANumber)?;
        let longitude = record.stop_lon.value().ok_or(RecordError::NotANumber)?;
        Self::new(
            record.id,
            record.stop_name,
            latitude,
            longitude,
            record.nom_commune,
            record.operatorname,
        )
        .map_err(RecordError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_numeric_row() {
        let json = r#"[{"_id": "a", "stop_lat": 48.1, "stop_lon": -1.6,
            "stop_name": "Gares", "nom_commune": "Rennes", "operatorname": "STAR"}]"#;

        let rows: Vec<StopRecord> = serde_json::from_str(json).expect("should deserialise");
        let stop = StopOfInterest::try_from(rows[0].clone()).expect("valid row");

        assert_eq!(stop.id, "a");
        assert_eq!(stop.location.y, 48.1);
        assert_eq!(stop.description(), "Rennes, STAR");
    }

    #[test]
    fn deserialise_string_coordinates() {
        let json = r#"{"_id": "b", "stop_lat": " 48.2", "stop_lon": "-1.7",
            "stop_name": "Republique"}"#;

        let row: StopRecord = serde_json::from_str(json).expect("should deserialise");
        let stop = StopOfInterest::try_from(row).expect("valid row");

        assert_eq!(stop.location.x, -1.7);
        assert_eq!(stop.municipality, "");
    }

    #[test]
    fn rejects_out_of_range_and_garbage_coordinates() {
        let out_of_range = StopRecord {
            id: "c".into(),
            stop_lat: WireDegrees::Number(95.0),
            stop_lon: WireDegrees::Number(0.0),
            stop_name: "Nowhere".into(),
            nom_commune: String::new(),
            operatorname: String::new(),
        };
        let garbage = StopRecord {
            stop_lat: WireDegrees::Text("north".into()),
            ..out_of_range.clone()
        };

        assert!(matches!(
            StopOfInterest::try_from(out_of_range),
            Err(RecordError::Coordinate(CoordinateError::LatitudeOutOfRange(_)))
        ));
        assert_eq!(
            StopOfInterest::try_from(garbage),
            Err(RecordError::NotANumber)
        );
    }
}

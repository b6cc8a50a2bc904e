//! Rider identity and the outbound location update payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PositionSample;

/// Channel event carrying a rider's latest position.
pub const UPDATE_LOCATION_EVENT: &str = "updateLocation";

/// Who is riding, and on which route.
///
/// Supplied by the embedding application and constant for the lifetime of a
/// channel session. Every outbound update carries it.
///
/// # Examples
/// ```
/// use ridetrack_core::RiderIdentity;
///
/// let identity = RiderIdentity::new("rider-7", "42")?;
/// assert_eq!(identity.route_id(), "42");
/// # Ok::<(), ridetrack_core::RiderIdentityError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RiderIdentity {
    id: String,
    route_id: String,
}

/// Errors returned by [`RiderIdentity::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiderIdentityError {
    /// The rider id was blank.
    #[error("rider id must not be empty")]
    EmptyId,
    /// The route id was blank.
    #[error("route id must not be empty")]
    EmptyRouteId,
}

impl RiderIdentity {
    /// Validates and constructs a [`RiderIdentity`].
    pub fn new(
        id: impl Into<String>,
        route_id: impl Into<String>,
    ) -> Result<Self, RiderIdentityError> {
        let id = id.into();
        let route_id = route_id.into();
        if id.trim().is_empty() {
            return Err(RiderIdentityError::EmptyId);
        }
        if route_id.trim().is_empty() {
            return Err(RiderIdentityError::EmptyRouteId);
        }
        Ok(Self { id, route_id })
    }

    /// Opaque rider identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the route the rider is on.
    #[must_use]
    pub fn route_id(&self) -> &str {
        &self.route_id
    }
}

/// Latitude/longitude pair as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Payload of an [`UPDATE_LOCATION_EVENT`].
///
/// Serialises as `{"id": .., "busLine": .., "location": {"latitude": .., "longitude": ..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Rider identifier.
    pub id: String,
    /// Route the rider is on.
    #[serde(rename = "busLine")]
    pub bus_line: String,
    /// Reported position.
    pub location: WireLocation,
}

impl LocationUpdate {
    /// Tag `sample` with `identity`.
    #[must_use]
    pub fn new(identity: &RiderIdentity, sample: &PositionSample) -> Self {
        Self {
            id: identity.id().to_owned(),
            bus_line: identity.route_id().to_owned(),
            location: WireLocation {
                latitude: sample.latitude(),
                longitude: sample.longitude(),
            },
        }
    }
}

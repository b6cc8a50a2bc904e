//! Line-delimited JSON frames.
//!
//! Every frame is one JSON object followed by `\n`:
//!
//! ```text
//! {"event":"join","data":{"id":"rider-7","busLine":"42"}}
//! {"event":"updateLocation","data":{"id":"rider-7","busLine":"42","location":{...}}}
//! ```

use ridetrack_core::RiderIdentity;
use serde::{Deserialize, Serialize};

/// Event announcing the rider on a fresh connection.
pub const JOIN_EVENT: &str = "join";

/// A named event and its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Event name.
    pub event: String,
    /// Event payload.
    pub data: serde_json::Value,
}

#[derive(Serialize)]
struct JoinPayload<'a> {
    id: &'a str,
    #[serde(rename = "busLine")]
    bus_line: &'a str,
}

impl Frame {
    /// Build a frame from an event name and payload.
    #[must_use]
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// The `join` frame sent first on every connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be serialised.
    pub fn join(identity: &RiderIdentity) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_value(JoinPayload {
            id: identity.id(),
            bus_line: identity.route_id(),
        })?;
        Ok(Self::new(JOIN_EVENT, data))
    }

    /// Encode the frame as a single newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialised.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Decode a frame from one line, with or without its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a frame.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn join_frame_carries_identity() {
        let identity = RiderIdentity::new("rider-7", "42").expect("valid identity");
        let line = Frame::join(&identity)
            .and_then(|frame| frame.encode())
            .expect("encodes");

        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let decoded = Frame::decode(&line).expect("decodes");
        assert_eq!(decoded.event, JOIN_EVENT);
        assert_eq!(decoded.data, json!({"id": "rider-7", "busLine": "42"}));
    }

    #[rstest]
    fn rejects_lines_without_an_event() {
        assert!(Frame::decode("{\"data\": 1}").is_err());
    }
}

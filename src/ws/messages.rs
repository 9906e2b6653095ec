//! Wire format for frames delivered to clients.
//!
//! Every application frame is a JSON text message:
//!
//! ```json
//! {"type": "user_updated", "data": {"id": 7}, "timestamp": "2024-05-01T12:00:00Z"}
//! ```
//!
//! Liveness uses WebSocket ping/pong control frames and never appears here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{EventType, HubMessage};

/// Borrowed view of a [`HubMessage`] in its on-the-wire shape.
#[derive(Debug, Serialize)]
pub struct WireFrame<'a> {
    /// Event tag.
    #[serde(rename = "type")]
    pub event_type: &'a EventType,
    /// Event payload.
    pub data: &'a serde_json::Value,
    /// RFC 3339 timestamp of when the message was produced.
    pub timestamp: DateTime<Utc>,
}

impl<'a> From<&'a HubMessage> for WireFrame<'a> {
    fn from(message: &'a HubMessage) -> Self {
        Self {
            event_type: &message.event_type,
            data: &message.payload,
            timestamp: message.created_at,
        }
    }
}

/// Serializes a message into the JSON text sent to clients.
///
/// # Errors
///
/// Returns the underlying [`serde_json::Error`] if the payload cannot be
/// serialized.
pub fn encode(message: &HubMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireFrame::from(message))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_type_data_and_timestamp() {
        let message = HubMessage::new(
            EventType::ROLE_CHANGED,
            serde_json::json!({"user_id": 3, "role": "admin"}),
        );
        let Ok(text) = encode(&message) else {
            panic!("encode failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            panic!("frame is not JSON");
        };

        assert_eq!(value["type"], "role_changed");
        assert_eq!(value["data"]["role"], "admin");
        let Some(ts) = value["timestamp"].as_str() else {
            panic!("timestamp missing");
        };
        let Ok(parsed) = DateTime::parse_from_rfc3339(ts) else {
            panic!("timestamp is not RFC 3339");
        };
        assert_eq!(parsed.with_timezone(&Utc), message.created_at);
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
    }
}

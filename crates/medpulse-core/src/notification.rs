//! Notification events and their wire envelope.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable logical event handed to the hub by a producer.
///
/// Carries no timestamp of its own: the delivery timestamp is stamped once
/// per delivery attempt (see [`Notification::stamped`]), so two recipients of
/// the same logical event may observe slightly different timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Type tag, e.g. `patient_called`, `prescription_ready`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable title.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Free-form structured payload.
    #[serde(default)]
    pub data: Value,
}

impl Notification {
    /// Create a new notification.
    pub fn new(
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            data,
        }
    }

    /// Stamp this event for one delivery attempt.
    ///
    /// The timestamp is captured now, in UTC, RFC 3339.
    pub fn stamped(&self) -> WireNotification {
        WireNotification {
            kind: self.kind.clone(),
            title: self.title.clone(),
            message: self.message.clone(),
            data: self.data.clone(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// The wire shape delivered to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireNotification {
    /// Type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable title.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Free-form structured payload.
    #[serde(default)]
    pub data: Value,
    /// Delivery timestamp, RFC 3339 UTC, stamped at send time.
    pub timestamp: String,
}

impl WireNotification {
    /// Serialize to the JSON text sent down the socket.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[test]
    fn stamped_carries_parseable_timestamp() {
        let event = Notification::new("echo", "Echo", "pong", Value::Null);
        let wire = event.stamped();
        assert!(DateTime::parse_from_rfc3339(&wire.timestamp).is_ok());
    }

    #[test]
    fn stamp_is_taken_at_call_time() {
        let event = Notification::new("echo", "Echo", "pong", Value::Null);
        let before = Utc::now();
        let wire = event.stamped();
        let after = Utc::now();
        let ts = DateTime::parse_from_rfc3339(&wire.timestamp).unwrap();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn each_stamp_is_independent() {
        let event = Notification::new("x", "t", "m", Value::Null);
        let first = event.stamped();
        let second = event.stamped();
        let t1 = DateTime::parse_from_rfc3339(&first.timestamp).unwrap();
        let t2 = DateTime::parse_from_rfc3339(&second.timestamp).unwrap();
        // Monotonic per call site; equality is allowed when the clock does
        // not advance between calls.
        assert!(t2 >= t1);
    }

    #[test]
    fn wire_json_uses_type_field() {
        let event = Notification::new(
            "patient_called",
            "It's your turn",
            "Room 3",
            json!({ "room": "3" }),
        );
        let json_text = event.stamped().to_json().unwrap();
        let parsed: Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(parsed["type"], "patient_called");
        assert_eq!(parsed["title"], "It's your turn");
        assert_eq!(parsed["message"], "Room 3");
        assert_eq!(parsed["data"]["room"], "3");
        assert!(parsed["timestamp"].is_string());
    }

    #[test]
    fn notification_deserializes_without_data() {
        let event: Notification =
            serde_json::from_str(r#"{"type":"x","title":"t","message":"m"}"#).unwrap();
        assert_eq!(event.kind, "x");
        assert_eq!(event.data, Value::Null);
    }

    #[test]
    fn stamping_does_not_mutate_the_event() {
        let event = Notification::new("x", "t", "m", json!({"k": 1}));
        let copy = event.clone();
        let _ = event.stamped();
        assert_eq!(event, copy);
    }
}

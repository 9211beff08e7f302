//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the
/// envelope's payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events of specific matches.
    Subscribe {
        /// Match IDs to subscribe to. Use `["*"]` for all matches.
        match_ids: Vec<String>,
    },
    /// Unsubscribe from events of specific matches.
    Unsubscribe {
        /// Match IDs to unsubscribe from.
        match_ids: Vec<String>,
    },
    /// Get the full state of an open session.
    GetState {
        /// Target match ID.
        match_id: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn command_parses_from_envelope_payload() {
        let json = r#"{"id":"c1","type":"command","timestamp":"2026-01-01T00:00:00Z",
            "payload":{"command":"subscribe","match_ids":["7","*"]}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(json) else {
            panic!("envelope rejected");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        let Ok(cmd) = serde_json::from_value::<WsCommand>(msg.payload) else {
            panic!("command rejected");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                match_ids: vec!["7".into(), "*".into()]
            }
        );
    }

    #[test]
    fn error_reply_carries_code() {
        let msg = WsMessage::error("x", 2001, "no session");
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 2001);
    }
}

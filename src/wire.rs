//! JSON wire model for the realtime channel.
//!
//! One envelope shape flows both ways: requests carry a fresh `id`,
//! acknowledgments answer with `parent_id` set to it, and server pushes
//! arrive as `board:event` envelopes with no parent. Payloads stay flexible
//! (`serde_json::Value`); the single multiplexed data event is the only
//! payload with a typed shell.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outbound room-join request event.
pub const JOIN_EVENT: &str = "board:join";
/// Inbound multiplexed data event.
pub const DATA_EVENT: &str = "board:event";

/// Error returned by [`decode`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text frame could not be decoded as an envelope.
    #[error("failed to decode frame: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single message on the realtime wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique identifier for this message (UUID string).
    pub id: String,
    /// Id of the request this acknowledges, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Event name, e.g. `"board:join"`.
    pub event: String,
    /// Arbitrary JSON payload.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// A `board:join` request for one board room.
    #[must_use]
    pub fn join(board_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id: None,
            event: JOIN_EVENT.to_owned(),
            data: serde_json::json!({ "board": board_id }),
        }
    }

    /// The error carried by an acknowledgment, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Value> {
        match self.data.get("error") {
            None | Some(Value::Null) => None,
            Some(error) => Some(error),
        }
    }
}

/// Payload of a `board:event` envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Id of the board the event belongs to.
    pub board: String,
    #[serde(default)]
    pub data: Value,
}

/// Discriminator of the single multiplexed server event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    TicketCreate,
    TicketEdit,
    TicketRemove,
    BoardEdit,
    BoardRemove,
}

/// Encode an envelope as a text frame.
#[must_use]
pub fn encode(envelope: &Envelope) -> String {
    // Serializing an Envelope cannot fail; every field is JSON-native.
    serde_json::to_string(envelope).unwrap_or_default()
}

/// Decode a text frame.
///
/// # Errors
///
/// [`CodecError::Decode`] for malformed frames.
pub fn decode(text: &str) -> Result<Envelope, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;

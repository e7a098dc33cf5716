//! Chat messages and the delivery records pushed to connected chatters.

use serde::{Deserialize, Serialize};

use super::room::RoomId;

/// A single chat message.
///
/// Immutable once created. The serde field names are also the persisted
/// history record format, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the sender
    pub sender: String,
    /// Message body, non-empty after trimming
    pub message: String,
    /// RFC 3339 timestamp assigned at send time
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(
        sender: impl Into<String>,
        message: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// One record delivered to a chatter's outbound sink.
///
/// Transports decide how to frame each variant: the WebSocket transport
/// serializes them as tagged JSON events, the line transport renders plain
/// text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The chatter created a room and is now its first member.
    Created { room_id: RoomId },
    /// The chatter joined an existing room.
    Joined { room_id: RoomId },
    /// One replayed message from the room history, sent at join time.
    History(ChatMessage),
    /// A live message from another room member.
    Chat(ChatMessage),
    /// Human-readable system notice.
    Notice(String),
    /// Re-prompt for corrected input after a recoverable error.
    Prompt,
    /// An error surfaced to the client.
    Error {
        code: &'static str,
        message: String,
    },
}

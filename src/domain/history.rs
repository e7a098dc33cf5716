//! HistoryStore trait definition.
//!
//! The domain layer defines the interface it needs for durable per-room
//! message logs; the infrastructure layer provides the implementation
//! (dependency inversion).

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::{message::ChatMessage, room::RoomId};

/// Errors from the durable history log.
///
/// None of these are fatal to a session: append failures are logged and the
/// message is still delivered live, read failures degrade to an empty
/// history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only per-room message log on stable storage.
///
/// `append` is the only mutating primitive besides whole-log `delete`; any
/// ordered durable log can implement this without changing the room or
/// registry contracts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one message to the room's log, durably and in order.
    async fn append(&self, room_id: RoomId, message: &ChatMessage) -> Result<(), HistoryError>;

    /// Read the full log in append order. A missing log is an empty
    /// sequence, not an error.
    async fn read_all(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, HistoryError>;

    /// Remove all persisted data for a retired room. Idempotent.
    async fn delete(&self, room_id: RoomId) -> Result<(), HistoryError>;
}

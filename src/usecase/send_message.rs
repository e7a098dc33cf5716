//! UseCase: message send — persist, then fan out to the other room members.

use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::{ChatMessage, ChatterId, Delivery, HistoryStore, SharedRegistry};

/// Persist one inbound message and enqueue it for every other member of the
/// sender's room.
pub struct SendMessageUseCase {
    registry: SharedRegistry,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        registry: SharedRegistry,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            history,
            clock,
        }
    }

    /// Send a message into the sender's current room.
    ///
    /// Returns the constructed message, or `None` if the body trimmed empty
    /// (dropped) or the sender is no longer registered or in a room (its
    /// connection is tearing down).
    ///
    /// Ordering: the history append completes before the recipient snapshot
    /// is taken, so a concurrent history read can never miss a message that
    /// was delivered live. Delivery is best-effort per recipient; a failed
    /// enqueue means that recipient's connection has gone stale and is left
    /// for its own session to clean up.
    pub async fn execute(&self, chatter_id: &ChatterId, text: &str) -> Option<ChatMessage> {
        let body = text.trim();
        if body.is_empty() {
            return None;
        }

        let (display_name, room_id) = {
            let registry = self.registry.lock().await;
            let chatter = registry.chatter(chatter_id)?;
            (chatter.display_name.clone(), chatter.room?)
        };

        let message = ChatMessage::new(display_name, body, self.clock.now_rfc3339());

        // Persistence failure is logged, not fatal: the message still
        // reaches live recipients.
        if let Err(e) = self.history.append(room_id, &message).await {
            tracing::warn!("Failed to persist message for room {}: {}", room_id, e);
        }

        let targets = {
            let registry = self.registry.lock().await;
            registry.broadcast_targets(room_id, chatter_id)
        };
        for (recipient, sink) in targets {
            if sink.send(Delivery::Chat(message.clone())).is_err() {
                tracing::warn!(
                    "Failed to enqueue message for chatter {}, connection stale",
                    recipient
                );
            }
        }

        Some(message)
    }
}

//! UseCase: session teardown — leave the room, retire it if emptied,
//! deregister the chatter.

use std::sync::Arc;

use crate::domain::{ChatterId, HistoryStore, SharedRegistry};

/// Clean up after a disconnected chatter. Idempotent; safe to call whether
/// or not a room was ever joined.
pub struct DisconnectChatterUseCase {
    registry: SharedRegistry,
    history: Arc<dyn HistoryStore>,
}

impl DisconnectChatterUseCase {
    pub fn new(registry: SharedRegistry, history: Arc<dyn HistoryStore>) -> Self {
        Self { registry, history }
    }

    /// Remove the chatter from its room and from the registry.
    ///
    /// If the departure emptied the room, the room is retired under the same
    /// lock and its history deleted afterwards; a room is never left
    /// orphaned at zero occupancy.
    pub async fn execute(&self, chatter_id: &ChatterId) {
        let retired_room = {
            let mut registry = self.registry.lock().await;
            let retired_room = registry.leave_room(chatter_id);
            registry.remove_chatter(chatter_id);
            retired_room
        };

        if let Some(room_id) = retired_room {
            if let Err(e) = self.history.delete(room_id).await {
                tracing::warn!("Failed to delete history for retired room {}: {}", room_id, e);
            }
        }
    }
}

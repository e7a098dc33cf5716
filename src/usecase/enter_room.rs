//! UseCase: room creation and joining, with history replay for joiners.

use std::sync::Arc;

use crate::domain::{
    Capacity, ChatterId, Delivery, HistoryStore, RegistryError, RoomId, SharedRegistry,
};

/// Put a registered chatter into a room, either by creating a new one or by
/// joining an existing one.
pub struct EnterRoomUseCase {
    registry: SharedRegistry,
    history: Arc<dyn HistoryStore>,
}

impl EnterRoomUseCase {
    pub fn new(registry: SharedRegistry, history: Arc<dyn HistoryStore>) -> Self {
        Self { registry, history }
    }

    /// Create a room from the handshake's capacity text and join it as the
    /// first member.
    ///
    /// Room creation and the initial join are one atomic step under the
    /// registry lock, so no observer ever sees the room empty.
    pub async fn create(
        &self,
        chatter_id: &ChatterId,
        capacity_text: &str,
    ) -> Result<RoomId, RegistryError> {
        let capacity = Capacity::parse(capacity_text)?;
        let mut registry = self.registry.lock().await;
        let room_id = registry.create_room(capacity)?;
        registry.join_room(room_id, chatter_id)?;
        Ok(room_id)
    }

    /// Join an existing room and replay its full history to the joiner.
    ///
    /// The replay is enqueued into the joiner's sink while the registry lock
    /// is still held. Broadcasts snapshot their recipients under the same
    /// lock, so no message sent after this join can be delivered to the
    /// joiner ahead of the replay.
    pub async fn join(&self, chatter_id: &ChatterId, room_id: RoomId) -> Result<(), RegistryError> {
        let mut registry = self.registry.lock().await;
        registry.join_room(room_id, chatter_id)?;

        // A read failure degrades to "no history available", never a failed
        // join.
        let history = match self.history.read_all(room_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Failed to read history for room {}: {}", room_id, e);
                Vec::new()
            }
        };

        if let Some(chatter) = registry.chatter(chatter_id) {
            for message in history {
                if chatter.sink.send(Delivery::History(message)).is_err() {
                    break;
                }
            }
        }

        Ok(())
    }
}

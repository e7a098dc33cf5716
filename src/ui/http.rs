//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::domain::{ChatMessage, RoomId};
use crate::infrastructure::dto::http::RoomSummaryDto;

use super::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let registry = state.registry.lock().await;
    let mut summaries: Vec<RoomSummaryDto> = registry
        .rooms()
        .map(|room| RoomSummaryDto {
            id: room.id().value(),
            occupancy: room.occupancy(),
            capacity: room.capacity().value(),
        })
        .collect();
    summaries.sort_by_key(|room| room.id);
    Json(summaries)
}

/// Get the persisted history of a live room
pub async fn get_room_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<u32>,
) -> Result<Json<Vec<ChatMessage>>, StatusCode> {
    let room_id = RoomId::new(room_id);

    // Retired rooms have no history left; only live rooms are readable.
    if state.registry.lock().await.lookup_room(room_id).is_err() {
        return Err(StatusCode::NOT_FOUND);
    }

    match state.history.read_all(room_id).await {
        Ok(messages) => Ok(Json(messages)),
        Err(e) => {
            tracing::error!("Failed to read history for room {}: {}", room_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

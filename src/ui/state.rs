//! Shared application state handed to every connection task.

use std::sync::Arc;

use crate::domain::{HistoryStore, SharedRegistry};
use crate::usecase::{
    DisconnectChatterUseCase, EnterRoomUseCase, RegisterChatterUseCase, SendMessageUseCase,
};

/// Shared application state: the usecases driven by session tasks, plus the
/// registry and history store read directly by the HTTP API.
pub struct AppState {
    pub register_chatter: Arc<RegisterChatterUseCase>,
    pub enter_room: Arc<EnterRoomUseCase>,
    pub send_message: Arc<SendMessageUseCase>,
    pub disconnect_chatter: Arc<DisconnectChatterUseCase>,
    pub registry: SharedRegistry,
    pub history: Arc<dyn HistoryStore>,
}

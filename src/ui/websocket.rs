//! WebSocket transport.
//!
//! JSON frames over `/ws`. The first text frame of every connection must be
//! the `init` handshake; every later text frame is a `message`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};

use crate::domain::Delivery;
use crate::infrastructure::dto::{
    Handshake, ProtocolError,
    websocket::{InboundFrame, encode_delivery, parse_frame},
};

use super::{
    connection::{Connection, ConnectionClosed},
    session::run_session,
    state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        tracing::info!("WebSocket client connected");
        run_session(WsConnection::new(socket), state).await;
        tracing::info!("WebSocket client disconnected");
    })
}

/// One WebSocket client connection.
pub struct WsConnection {
    socket: WebSocket,
}

impl WsConnection {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }

    /// Next parsed text frame, skipping control frames. `None` on close or a
    /// transport error.
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, ProtocolError>> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(parse_frame(&text)),
                Ok(Message::Close(_)) => return None,
                // Ping/pong handled by the protocol layer.
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("WebSocket read failed: {}", e);
                    return None;
                }
            }
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn recv_handshake(&mut self) -> Option<Result<Handshake, ProtocolError>> {
        let frame = match self.next_frame().await? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        match Option::<Handshake>::from(frame) {
            Some(handshake) => Some(Ok(handshake)),
            None => Some(Err(ProtocolError::MalformedHandshake(
                "expected an init frame".to_string(),
            ))),
        }
    }

    async fn recv_text(&mut self) -> Option<Result<String, ProtocolError>> {
        let frame = match self.next_frame().await? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        match frame {
            InboundFrame::Message { text } => Some(Ok(text)),
            InboundFrame::Init { .. } => Some(Err(ProtocolError::MalformedFrame(
                "init frame after registration".to_string(),
            ))),
        }
    }

    async fn send(&mut self, delivery: &Delivery) -> Result<(), ConnectionClosed> {
        // Deliveries with no JSON representation are silently skipped.
        let Some(frame) = encode_delivery(delivery) else {
            return Ok(());
        };
        self.socket
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| ConnectionClosed(e.to_string()))
    }
}

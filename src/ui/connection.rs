//! Transport-agnostic connection capability.
//!
//! The session state machine depends only on this interface; the line and
//! WebSocket transports implement it.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Delivery;
use crate::infrastructure::dto::{Handshake, ProtocolError};

/// The transport wrote nothing; the peer is gone.
#[derive(Debug, Error)]
#[error("connection closed: {0}")]
pub struct ConnectionClosed(pub String);

/// One client connection: receive one inbound record, send one delivery.
///
/// `None` from either receive method means the transport reached
/// end-of-stream or failed, which always drives the session to
/// `Disconnected`.
#[async_trait]
pub trait Connection: Send {
    /// Receive the registration handshake, the first record of every
    /// connection.
    async fn recv_handshake(&mut self) -> Option<Result<Handshake, ProtocolError>>;

    /// Receive one text payload: a chat message, or corrected input after a
    /// re-prompt.
    async fn recv_text(&mut self) -> Option<Result<String, ProtocolError>>;

    /// Write one delivery record to the client.
    async fn send(&mut self, delivery: &Delivery) -> Result<(), ConnectionClosed>;
}

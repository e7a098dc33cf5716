//! Wire-format DTOs, organized by protocol:
//! - `websocket`: JSON frames for the WebSocket transport
//! - `line`: pipe-delimited handshake and plain-text lines for the TCP
//!   transport
//! - `http`: JSON payloads for the read-only HTTP API

pub mod http;
pub mod line;
pub mod websocket;

use thiserror::Error;

/// The registration handshake record, one per connection.
///
/// Carried as the first line (`identity|displayName|intent|intentData`) on
/// the TCP transport, or as the `init` JSON payload on WebSocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Requested identity; empty requests a server-generated one
    pub identity: String,
    pub display_name: String,
    /// "1" = create a room, "2" = join an existing room
    pub intent: String,
    /// Capacity text for create, room id text for join
    pub intent_data: String,
}

/// Protocol-format errors. Fatal to the connection: reported, then the
/// session disconnects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed handshake: {0}")]
    MalformedHandshake(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

impl ProtocolError {
    pub fn wire_code(&self) -> &'static str {
        "invalid-format"
    }
}

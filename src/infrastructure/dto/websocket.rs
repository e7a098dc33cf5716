//! WebSocket protocol: JSON frame DTOs and delivery encoding.
//!
//! Inbound frames are tagged by `type` (`init` for the handshake, `message`
//! for chat). Outbound frames are either tagged responses
//! (`{"type":"response","event":...,"payload":...}`) or errors
//! (`{"type":"error","message":<code>}`).

use serde::Deserialize;
use serde_json::json;

use crate::domain::Delivery;

use super::{Handshake, ProtocolError};

/// Inbound WebSocket frame, dispatched on the `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    /// Registration handshake, first frame of a connection
    Init {
        #[serde(default)]
        id: String,
        #[serde(default, rename = "displayName")]
        display_name: String,
        #[serde(default)]
        choice: String,
        #[serde(default, rename = "roomData")]
        room_data: String,
    },
    /// Chat text, or corrected input when re-prompted
    Message {
        #[serde(default)]
        text: String,
    },
}

/// Parse one inbound text frame.
pub fn parse_frame(text: &str) -> Result<InboundFrame, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
}

impl From<InboundFrame> for Option<Handshake> {
    fn from(frame: InboundFrame) -> Self {
        match frame {
            InboundFrame::Init {
                id,
                display_name,
                choice,
                room_data,
            } => Some(Handshake {
                identity: id,
                display_name,
                intent: choice,
                intent_data: room_data,
            }),
            InboundFrame::Message { .. } => None,
        }
    }
}

/// Encode one delivery as an outbound JSON frame.
///
/// Returns `None` for deliveries with no WebSocket representation (the
/// re-prompt; JSON clients resubmit without a prompt).
pub fn encode_delivery(delivery: &Delivery) -> Option<String> {
    let frame = match delivery {
        Delivery::Created { room_id } | Delivery::Joined { room_id } => {
            response("joined", json!({ "roomID": room_id.value() }))
        }
        Delivery::History(msg) => {
            response("history", json!({ "from": msg.sender, "text": msg.message }))
        }
        Delivery::Chat(msg) => {
            response("message", json!({ "from": msg.sender, "text": msg.message }))
        }
        Delivery::Notice(text) => response("notice", json!({ "text": text })),
        Delivery::Prompt => return None,
        Delivery::Error { code, .. } => json!({ "type": "error", "message": code }),
    };
    Some(frame.to_string())
}

fn response(event: &str, payload: serde_json::Value) -> serde_json::Value {
    json!({ "type": "response", "event": event, "payload": payload })
}

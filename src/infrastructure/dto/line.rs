//! Line protocol: pipe-delimited handshake parsing and plain-text rendering
//! of deliveries for legacy TCP clients.

use crate::domain::Delivery;

use super::{Handshake, ProtocolError};

/// Parse the one-line registration handshake:
/// `identity|displayName|intent|intentData`.
pub fn parse_handshake(line: &str) -> Result<Handshake, ProtocolError> {
    let parts: Vec<&str> = line.splitn(4, '|').collect();
    if parts.len() != 4 {
        return Err(ProtocolError::MalformedHandshake(
            "expected identity|displayName|choice|roomData".to_string(),
        ));
    }
    Ok(Handshake {
        identity: parts[0].trim().to_string(),
        display_name: parts[1].trim().to_string(),
        intent: parts[2].trim().to_string(),
        intent_data: parts[3].trim().to_string(),
    })
}

/// Render one delivery as the bytes written to a line-oriented client.
///
/// Every variant is newline-terminated except the re-prompt, which leaves
/// the cursor on the prompt line.
pub fn format_delivery(delivery: &Delivery) -> String {
    match delivery {
        Delivery::Created { room_id } => format!("Room created with ID {}.\n", room_id),
        Delivery::Joined { room_id } => format!("You have joined room {}.\n", room_id),
        Delivery::History(msg) | Delivery::Chat(msg) => {
            format!("{}: {}\n", msg.sender, msg.message)
        }
        Delivery::Notice(text) => format!("{}\n", text),
        Delivery::Prompt => "> ".to_string(),
        Delivery::Error { message, .. } => format!("{}\n", message),
    }
}

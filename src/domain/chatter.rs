//! Connected chatters and their outbound delivery channels.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;

use super::{message::Delivery, room::RoomId};

/// Channel used to enqueue deliveries for one connection.
///
/// Sends never block; the session task owning the receiving end performs the
/// actual network write.
pub type OutboundSink = mpsc::UnboundedSender<Delivery>;

/// Unique identity of a connected chatter.
///
/// Client-supplied or server-generated; unique among currently connected
/// chatters only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChatterId(String);

impl ChatterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One connected participant.
///
/// Owned exclusively by its registry entry; rooms reference chatters by id
/// only. Exists only while the connection is alive.
pub struct Chatter {
    pub id: ChatterId,
    pub display_name: String,
    /// The room this chatter is currently in, if any
    pub room: Option<RoomId>,
    /// Outbound delivery channel for this connection
    pub sink: OutboundSink,
}

impl Chatter {
    pub fn new(id: ChatterId, display_name: impl Into<String>, sink: OutboundSink) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            room: None,
            sink,
        }
    }
}

//! Domain model: chatters, rooms, messages, and the registry that owns them.

pub mod chatter;
pub mod error;
pub mod history;
pub mod message;
pub mod registry;
pub mod room;

pub use chatter::{Chatter, ChatterId, OutboundSink};
pub use error::RegistryError;
pub use history::{HistoryError, HistoryStore};
pub use message::{ChatMessage, Delivery};
pub use registry::{Registry, SharedRegistry};
pub use room::{Capacity, Room, RoomId};

#[cfg(test)]
pub use history::MockHistoryStore;

//! Error taxonomy for registry and room operations.

use thiserror::Error;

use super::room::RoomId;

/// Errors raised by the registry and room lifecycle operations.
///
/// Everything here is scoped to a single connection attempt; none of these
/// errors compromise the registry itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The requested identity is already held by a connected chatter.
    #[error("identity '{0}' is already connected")]
    DuplicateIdentity(String),

    /// Room capacity outside the allowed range, or not a number at all.
    #[error("invalid room capacity '{0}', must be 1-20")]
    InvalidCapacity(String),

    /// No live room with this id.
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    /// The room is at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Random id generation could not find a free id within the retry cap.
    #[error("id space exhausted after {0} attempts")]
    IdSpaceExhausted(u32),
}

impl RegistryError {
    /// Short machine-readable code used on the wire.
    pub fn wire_code(&self) -> &'static str {
        match self {
            RegistryError::DuplicateIdentity(_) => "duplicate-uuid",
            RegistryError::InvalidCapacity(_) => "invalid-capacity",
            RegistryError::RoomNotFound(_) => "room-not-found",
            RegistryError::RoomFull(_) => "room-full",
            RegistryError::IdSpaceExhausted(_) => "id-space-exhausted",
        }
    }
}

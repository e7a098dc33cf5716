//! Rooms: capacity-bounded groups of chatters sharing one history.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::{chatter::ChatterId, error::RegistryError};

/// Identifier of a live room.
///
/// Short numeric id in the original wire format (5 digits by default).
/// Unique among live rooms only; ids may be reused after a room is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RoomId(u32);

impl RoomId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(RoomId)
    }
}

/// Validated room capacity in `[1, 20]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity(u32);

impl Capacity {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 20;

    pub fn new(value: u32) -> Result<Self, RegistryError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RegistryError::InvalidCapacity(value.to_string()))
        }
    }

    /// Parse capacity from handshake text; unparsable input is invalid too.
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let trimmed = text.trim();
        let value: u32 = trimmed
            .parse()
            .map_err(|_| RegistryError::InvalidCapacity(trimmed.to_string()))?;
        Self::new(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// A capacity-bounded group of chatters sharing one message history.
///
/// Invariant: `occupancy() == members().len() <= capacity`. Members are
/// stored in join order.
pub struct Room {
    id: RoomId,
    capacity: Capacity,
    members: Vec<ChatterId>,
}

impl Room {
    pub fn new(id: RoomId, capacity: Capacity) -> Self {
        Self {
            id,
            capacity,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn occupancy(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity.value() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current members in join order.
    pub fn members(&self) -> &[ChatterId] {
        &self.members
    }

    /// Add a chatter to this room.
    ///
    /// Fails with `RoomFull` at capacity, leaving occupancy unchanged.
    pub fn join(&mut self, chatter_id: ChatterId) -> Result<(), RegistryError> {
        if self.is_full() {
            return Err(RegistryError::RoomFull(self.id));
        }
        self.members.push(chatter_id);
        Ok(())
    }

    /// Remove a chatter from this room. No-op if not a member.
    ///
    /// Returns `true` if the chatter was removed. The caller must retire the
    /// room when occupancy reaches zero.
    pub fn leave(&mut self, chatter_id: &ChatterId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != chatter_id);
        self.members.len() < before
    }
}

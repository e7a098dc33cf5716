//! Process-wide registry of live rooms and connected chatters.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    chatter::{Chatter, ChatterId, OutboundSink},
    error::RegistryError,
    room::{Capacity, Room, RoomId},
};

/// Cap on retry-until-unique id generation. Fail closed instead of spinning
/// when the id space is (nearly) exhausted.
const MAX_ID_ATTEMPTS: u32 = 64;

/// Default candidate span for room ids: 5-digit numbers.
pub const DEFAULT_ROOM_ID_SPAN: Range<u32> = 10_000..100_000;

/// The registry shared by every connection task, behind one coarse lock.
///
/// All operations are O(occupancy) bookkeeping at worst; the lock is never
/// held across a network send.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Authoritative map of room-id to room and chatter-id to chatter.
///
/// The single source of truth for existence and uniqueness. Chatters are
/// owned by their map entry; rooms reference members by id only, and both
/// views are kept consistent on every join/leave.
pub struct Registry {
    chatters: HashMap<ChatterId, Chatter>,
    rooms: HashMap<RoomId, Room>,
    room_id_span: Range<u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_room_id_span(DEFAULT_ROOM_ID_SPAN)
    }

    /// Create a registry drawing room ids from a custom span. Used by tests
    /// to force id collisions.
    pub fn with_room_id_span(room_id_span: Range<u32>) -> Self {
        Self {
            chatters: HashMap::new(),
            rooms: HashMap::new(),
            room_id_span,
        }
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Register a new chatter.
    ///
    /// An empty `identity` requests a server-generated one, re-checked for
    /// uniqueness against the current keys. A duplicate identity is rejected
    /// without mutating any state.
    pub fn register_chatter(
        &mut self,
        identity: &str,
        display_name: &str,
        sink: OutboundSink,
    ) -> Result<ChatterId, RegistryError> {
        let id = if identity.is_empty() {
            self.generate_chatter_id()?
        } else {
            let id = ChatterId::new(identity);
            if self.chatters.contains_key(&id) {
                return Err(RegistryError::DuplicateIdentity(identity.to_string()));
            }
            id
        };

        self.chatters
            .insert(id.clone(), Chatter::new(id.clone(), display_name, sink));
        tracing::info!("Registered chatter '{}' ({})", display_name, id);
        Ok(id)
    }

    /// Create a new room with a random id unique among live rooms.
    pub fn create_room(&mut self, capacity: Capacity) -> Result<RoomId, RegistryError> {
        let id = self.generate_room_id()?;
        self.rooms.insert(id, Room::new(id, capacity));
        tracing::info!("Room {} created (capacity {})", id, capacity.value());
        Ok(id)
    }

    pub fn lookup_room(&self, id: RoomId) -> Result<&Room, RegistryError> {
        self.rooms.get(&id).ok_or(RegistryError::RoomNotFound(id))
    }

    /// Add a chatter to a room, keeping the chatter's room reference and the
    /// room's member list consistent.
    pub fn join_room(
        &mut self,
        room_id: RoomId,
        chatter_id: &ChatterId,
    ) -> Result<(), RegistryError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RegistryError::RoomNotFound(room_id))?;
        room.join(chatter_id.clone())?;
        if let Some(chatter) = self.chatters.get_mut(chatter_id) {
            chatter.room = Some(room_id);
        }
        tracing::info!(
            "Chatter {} joined room {} ({}/{})",
            chatter_id,
            room_id,
            self.rooms[&room_id].occupancy(),
            self.rooms[&room_id].capacity().value()
        );
        Ok(())
    }

    /// Remove a chatter from its current room, if any.
    ///
    /// Returns the id of the room if the departure emptied it; the room is
    /// removed from the registry here and the caller deletes its history.
    pub fn leave_room(&mut self, chatter_id: &ChatterId) -> Option<RoomId> {
        let room_id = self.chatters.get_mut(chatter_id)?.room.take()?;
        let room = self.rooms.get_mut(&room_id)?;
        room.leave(chatter_id);
        tracing::info!("Chatter {} left room {}", chatter_id, room_id);
        if room.is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!("Room {} retired (empty)", room_id);
            return Some(room_id);
        }
        None
    }

    /// Idempotent removal from the chatter map.
    pub fn remove_chatter(&mut self, chatter_id: &ChatterId) {
        if self.chatters.remove(chatter_id).is_some() {
            tracing::info!("Chatter {} removed from registry", chatter_id);
        }
    }

    /// Idempotent removal from the room map.
    pub fn remove_room(&mut self, room_id: RoomId) {
        self.rooms.remove(&room_id);
    }

    pub fn chatter(&self, chatter_id: &ChatterId) -> Option<&Chatter> {
        self.chatters.get(chatter_id)
    }

    pub fn chatter_count(&self) -> usize {
        self.chatters.len()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Snapshot of the sinks of every member of a room except `exclude`.
    ///
    /// Taken under the registry lock so a concurrent join/leave cannot
    /// corrupt the iteration; the returned senders are used after the lock
    /// is dropped.
    pub fn broadcast_targets(
        &self,
        room_id: RoomId,
        exclude: &ChatterId,
    ) -> Vec<(ChatterId, OutboundSink)> {
        let Some(room) = self.rooms.get(&room_id) else {
            return Vec::new();
        };
        room.members()
            .iter()
            .filter(|id| *id != exclude)
            .filter_map(|id| {
                self.chatters
                    .get(id)
                    .map(|chatter| (id.clone(), chatter.sink.clone()))
            })
            .collect()
    }

    fn generate_chatter_id(&self) -> Result<ChatterId, RegistryError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = ChatterId::new(Uuid::new_v4().to_string());
            if !self.chatters.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(RegistryError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    fn generate_room_id(&self) -> Result<RoomId, RegistryError> {
        let mut rng = rand::rng();
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = RoomId::new(rng.random_range(self.room_id_span.clone()));
            if !self.rooms.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(RegistryError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::Delivery;
    use tokio::sync::mpsc;

    fn test_sink() -> OutboundSink {
        let (tx, _rx) = mpsc::unbounded_channel::<Delivery>();
        tx
    }

    #[test]
    fn test_register_duplicate_identity_is_rejected_without_mutation() {
        // given:
        let mut registry = Registry::new();
        registry
            .register_chatter("chatter-1", "Alice", test_sink())
            .unwrap();

        // when:
        let result = registry.register_chatter("chatter-1", "Mallory", test_sink());

        // then: the second registration fails and exactly one entry remains
        assert_eq!(
            result,
            Err(RegistryError::DuplicateIdentity("chatter-1".to_string()))
        );
        assert_eq!(registry.chatter_count(), 1);
        let kept = registry.chatter(&ChatterId::new("chatter-1")).unwrap();
        assert_eq!(kept.display_name, "Alice");
    }

    #[test]
    fn test_register_with_empty_identity_generates_unique_id() {
        // given:
        let mut registry = Registry::new();

        // when:
        let a = registry.register_chatter("", "Alice", test_sink()).unwrap();
        let b = registry.register_chatter("", "Bob", test_sink()).unwrap();

        // then:
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
        assert_eq!(registry.chatter_count(), 2);
    }

    #[test]
    fn test_create_room_ids_are_unique_within_a_tiny_span() {
        // given: only three candidate ids exist
        let mut registry = Registry::with_room_id_span(1..4);
        let capacity = Capacity::new(5).unwrap();

        // when:
        let mut ids = vec![
            registry.create_room(capacity).unwrap(),
            registry.create_room(capacity).unwrap(),
            registry.create_room(capacity).unwrap(),
        ];

        // then: retry-until-unique found every free id
        ids.sort_by_key(|id| id.value());
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_create_room_fails_closed_when_id_space_is_exhausted() {
        // given: a single-id span, already taken
        let mut registry = Registry::with_room_id_span(7..8);
        let capacity = Capacity::new(5).unwrap();
        registry.create_room(capacity).unwrap();

        // when:
        let result = registry.create_room(capacity);

        // then:
        assert!(matches!(result, Err(RegistryError::IdSpaceExhausted(_))));
    }

    #[test]
    fn test_room_id_may_be_reused_after_retirement() {
        // given: a single-id span
        let mut registry = Registry::with_room_id_span(7..8);
        let capacity = Capacity::new(5).unwrap();
        let alice = registry.register_chatter("a", "Alice", test_sink()).unwrap();
        let room_id = registry.create_room(capacity).unwrap();
        registry.join_room(room_id, &alice).unwrap();

        // when: the last member leaves and the room is retired
        let retired = registry.leave_room(&alice);
        assert_eq!(retired, Some(room_id));

        // then: the id is free again
        let reused = registry.create_room(capacity).unwrap();
        assert_eq!(reused, room_id);
    }

    #[test]
    fn test_join_full_room_fails_with_room_full() {
        // given:
        let mut registry = Registry::new();
        let capacity = Capacity::new(1).unwrap();
        let alice = registry.register_chatter("a", "Alice", test_sink()).unwrap();
        let bob = registry.register_chatter("b", "Bob", test_sink()).unwrap();
        let room_id = registry.create_room(capacity).unwrap();
        registry.join_room(room_id, &alice).unwrap();

        // when:
        let result = registry.join_room(room_id, &bob);

        // then:
        assert_eq!(result, Err(RegistryError::RoomFull(room_id)));
        assert_eq!(registry.lookup_room(room_id).unwrap().occupancy(), 1);
    }

    #[test]
    fn test_leave_room_keeps_room_alive_while_occupied() {
        // given:
        let mut registry = Registry::new();
        let capacity = Capacity::new(2).unwrap();
        let alice = registry.register_chatter("a", "Alice", test_sink()).unwrap();
        let bob = registry.register_chatter("b", "Bob", test_sink()).unwrap();
        let room_id = registry.create_room(capacity).unwrap();
        registry.join_room(room_id, &alice).unwrap();
        registry.join_room(room_id, &bob).unwrap();

        // when:
        let retired = registry.leave_room(&bob);

        // then:
        assert_eq!(retired, None);
        assert_eq!(registry.lookup_room(room_id).unwrap().occupancy(), 1);
    }

    #[test]
    fn test_retired_room_is_gone_from_lookup() {
        // given:
        let mut registry = Registry::new();
        let capacity = Capacity::new(2).unwrap();
        let alice = registry.register_chatter("a", "Alice", test_sink()).unwrap();
        let room_id = registry.create_room(capacity).unwrap();
        registry.join_room(room_id, &alice).unwrap();

        // when:
        let retired = registry.leave_room(&alice);

        // then:
        assert_eq!(retired, Some(room_id));
        assert!(matches!(
            registry.lookup_room(room_id),
            Err(RegistryError::RoomNotFound(_))
        ));
    }

    #[test]
    fn test_remove_chatter_is_idempotent() {
        // given:
        let mut registry = Registry::new();
        let alice = registry.register_chatter("a", "Alice", test_sink()).unwrap();

        // when/then:
        registry.remove_chatter(&alice);
        registry.remove_chatter(&alice);
        assert_eq!(registry.chatter_count(), 0);
    }

    #[test]
    fn test_broadcast_targets_exclude_the_sender() {
        // given:
        let mut registry = Registry::new();
        let capacity = Capacity::new(3).unwrap();
        let alice = registry.register_chatter("a", "Alice", test_sink()).unwrap();
        let bob = registry.register_chatter("b", "Bob", test_sink()).unwrap();
        let carol = registry.register_chatter("c", "Carol", test_sink()).unwrap();
        let room_id = registry.create_room(capacity).unwrap();
        registry.join_room(room_id, &alice).unwrap();
        registry.join_room(room_id, &bob).unwrap();
        registry.join_room(room_id, &carol).unwrap();

        // when:
        let targets = registry.broadcast_targets(room_id, &alice);

        // then:
        let ids: Vec<&str> = targets.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}

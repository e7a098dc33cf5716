//! Per-connection session state machine.
//!
//! Drives one connection through
//! `Connected → Registering → AwaitingRoomChoice → InRoom → Disconnected`,
//! calling into the usecases. The whole session is one logical task; the
//! only suspension points are network reads/writes and the registry lock,
//! never a lock held across a send.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{ChatterId, Delivery, RegistryError, RoomId};
use crate::infrastructure::dto::Handshake;

use super::{connection::Connection, state::AppState};

/// Lifecycle states of one connection, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Registering,
    AwaitingRoomChoice,
    InRoom(RoomId),
    Disconnected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connected => write!(f, "connected"),
            SessionState::Registering => write!(f, "registering"),
            SessionState::AwaitingRoomChoice => write!(f, "awaiting-room-choice"),
            SessionState::InRoom(room_id) => write!(f, "in-room({})", room_id),
            SessionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Run one session to completion.
///
/// If registration succeeds, teardown always runs on exit: the chatter
/// leaves its room (retiring it when emptied) and is removed from the
/// registry, whatever drove the session down.
pub async fn run_session<C: Connection>(mut conn: C, state: Arc<AppState>) {
    tracing::debug!("Session {}", SessionState::Connected);

    // Exactly one handshake record opens every session.
    tracing::debug!("Session {}", SessionState::Registering);
    let handshake = match conn.recv_handshake().await {
        None => return,
        Some(Err(e)) => {
            tracing::warn!("Rejecting connection, {}", e);
            let _ = conn
                .send(&Delivery::Error {
                    code: e.wire_code(),
                    message: "Invalid format. Expected: identity|displayName|choice|roomData"
                        .to_string(),
                })
                .await;
            return;
        }
        Some(Ok(handshake)) => handshake,
    };

    let (sink, mut inbox) = mpsc::unbounded_channel();
    let chatter_id = match state
        .register_chatter
        .execute(&handshake.identity, &handshake.display_name, sink)
        .await
    {
        Ok(chatter_id) => chatter_id,
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            let _ = conn.send(&error_delivery(&e)).await;
            return;
        }
    };

    // A chatter now exists; from here every exit path runs teardown.
    drive(&mut conn, &mut inbox, &state, &chatter_id, &handshake).await;

    state.disconnect_chatter.execute(&chatter_id).await;
    tracing::debug!("Session for chatter {} {}", chatter_id, SessionState::Disconnected);
}

async fn drive<C: Connection>(
    conn: &mut C,
    inbox: &mut mpsc::UnboundedReceiver<Delivery>,
    state: &Arc<AppState>,
    chatter_id: &ChatterId,
    handshake: &Handshake,
) {
    tracing::debug!(
        "Chatter {} {}: intent '{}'",
        chatter_id,
        SessionState::AwaitingRoomChoice,
        handshake.intent
    );

    let room_id = match handshake.intent.as_str() {
        "1" => {
            // Invalid capacity is fatal to the connection.
            match state.enter_room.create(chatter_id, &handshake.intent_data).await {
                Ok(room_id) => {
                    if conn.send(&Delivery::Created { room_id }).await.is_err() {
                        return;
                    }
                    room_id
                }
                Err(e) => {
                    let _ = conn.send(&error_delivery(&e)).await;
                    return;
                }
            }
        }
        "2" => match join_with_retries(conn, state, chatter_id, &handshake.intent_data).await {
            Some(room_id) => room_id,
            None => return,
        },
        other => {
            tracing::warn!("Chatter {} sent invalid choice '{}'", chatter_id, other);
            let _ = conn
                .send(&Delivery::Error {
                    code: "invalid-choice",
                    message: "Invalid choice.".to_string(),
                })
                .await;
            return;
        }
    };

    tracing::debug!("Chatter {} {}", chatter_id, SessionState::InRoom(room_id));
    chat_loop(conn, inbox, state, chatter_id).await;
}

/// Join an existing room, re-prompting for a corrected id on recoverable
/// errors (`RoomNotFound`, `RoomFull`, unparsable id) rather than
/// disconnecting.
async fn join_with_retries<C: Connection>(
    conn: &mut C,
    state: &Arc<AppState>,
    chatter_id: &ChatterId,
    intent_data: &str,
) -> Option<RoomId> {
    let mut room_data = intent_data.to_string();
    loop {
        match room_data.parse::<RoomId>() {
            Ok(room_id) => match state.enter_room.join(chatter_id, room_id).await {
                Ok(()) => {
                    if conn.send(&Delivery::Joined { room_id }).await.is_err() {
                        return None;
                    }
                    return Some(room_id);
                }
                Err(e @ (RegistryError::RoomNotFound(_) | RegistryError::RoomFull(_))) => {
                    if conn.send(&error_delivery(&e)).await.is_err() {
                        return None;
                    }
                }
                Err(e) => {
                    let _ = conn.send(&error_delivery(&e)).await;
                    return None;
                }
            },
            Err(_) => {
                let rejected = Delivery::Error {
                    code: "room-not-found",
                    message: "Invalid room ID. Please enter a number:".to_string(),
                };
                if conn.send(&rejected).await.is_err() {
                    return None;
                }
            }
        }

        // Re-prompt and wait for corrected input on the same connection.
        if conn.send(&Delivery::Prompt).await.is_err() {
            return None;
        }
        match conn.recv_text().await {
            None | Some(Err(_)) => return None,
            Some(Ok(text)) => room_data = text.trim().to_string(),
        }
    }
}

/// The InRoom loop: relay inbound text into the room, drain the inbox onto
/// the wire. Ends on end-of-stream, a protocol error, or a failed write.
async fn chat_loop<C: Connection>(
    conn: &mut C,
    inbox: &mut mpsc::UnboundedReceiver<Delivery>,
    state: &Arc<AppState>,
    chatter_id: &ChatterId,
) {
    loop {
        tokio::select! {
            inbound = conn.recv_text() => match inbound {
                None => break,
                Some(Err(e)) => {
                    tracing::warn!("Protocol error from chatter {}: {}", chatter_id, e);
                    let _ = conn
                        .send(&Delivery::Error {
                            code: e.wire_code(),
                            message: e.to_string(),
                        })
                        .await;
                    break;
                }
                Some(Ok(text)) => {
                    state.send_message.execute(chatter_id, &text).await;
                }
            },
            delivery = inbox.recv() => match delivery {
                Some(delivery) => {
                    if conn.send(&delivery).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

/// Client-facing rendering of a registry error.
fn error_delivery(error: &RegistryError) -> Delivery {
    let message = match error {
        RegistryError::DuplicateIdentity(id) => {
            format!("Identity '{}' is already connected.", id)
        }
        RegistryError::InvalidCapacity(_) => "Invalid room capacity. Must be 1-20.".to_string(),
        RegistryError::RoomNotFound(id) => format!("Room {} does not exist. Try again:", id),
        RegistryError::RoomFull(_) => "Room is full. Try another room:".to_string(),
        RegistryError::IdSpaceExhausted(_) => "No room id available. Try again later.".to_string(),
    };
    Delivery::Error {
        code: error.wire_code(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::FixedClock;
    use crate::domain::{Capacity, OutboundSink, Registry, SharedRegistry};
    use crate::infrastructure::dto::ProtocolError;
    use crate::ui::connection::ConnectionClosed;
    use crate::usecase::{
        DisconnectChatterUseCase, EnterRoomUseCase, RegisterChatterUseCase, SendMessageUseCase,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// In-memory connection fed a fixed script; records everything sent.
    struct ScriptedConnection {
        handshake: Option<Result<Handshake, ProtocolError>>,
        inbound: VecDeque<String>,
        sent: Arc<Mutex<Vec<Delivery>>>,
    }

    impl ScriptedConnection {
        fn new(
            handshake: Option<Result<Handshake, ProtocolError>>,
            inbound: Vec<&str>,
        ) -> (Self, Arc<Mutex<Vec<Delivery>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let conn = Self {
                handshake,
                inbound: inbound.into_iter().map(String::from).collect(),
                sent: sent.clone(),
            };
            (conn, sent)
        }
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn recv_handshake(&mut self) -> Option<Result<Handshake, ProtocolError>> {
            self.handshake.take()
        }

        async fn recv_text(&mut self) -> Option<Result<String, ProtocolError>> {
            self.inbound.pop_front().map(Ok)
        }

        async fn send(&mut self, delivery: &Delivery) -> Result<(), ConnectionClosed> {
            self.sent.lock().unwrap().push(delivery.clone());
            Ok(())
        }
    }

    fn handshake(identity: &str, name: &str, intent: &str, data: &str) -> Handshake {
        Handshake {
            identity: identity.to_string(),
            display_name: name.to_string(),
            intent: intent.to_string(),
            intent_data: data.to_string(),
        }
    }

    fn app_state(registry: SharedRegistry) -> Arc<AppState> {
        let history: Arc<dyn crate::domain::HistoryStore> = Arc::new({
            let mut mock = crate::domain::MockHistoryStore::new();
            mock.expect_read_all().returning(|_| Ok(Vec::new()));
            mock.expect_append().returning(|_, _| Ok(()));
            mock.expect_delete().returning(|_| Ok(()));
            mock
        });
        let clock = Arc::new(FixedClock::new("2024-05-01T12:00:00Z"));
        Arc::new(AppState {
            register_chatter: Arc::new(RegisterChatterUseCase::new(registry.clone())),
            enter_room: Arc::new(EnterRoomUseCase::new(registry.clone(), history.clone())),
            send_message: Arc::new(SendMessageUseCase::new(
                registry.clone(),
                history.clone(),
                clock,
            )),
            disconnect_chatter: Arc::new(DisconnectChatterUseCase::new(
                registry.clone(),
                history.clone(),
            )),
            registry,
            history,
        })
    }

    fn other_member_sink() -> OutboundSink {
        let (tx, rx) = mpsc::unbounded_channel();
        // Leak the receiver so the sink stays live for the whole test.
        std::mem::forget(rx);
        tx
    }

    #[tokio::test]
    async fn test_malformed_handshake_disconnects_without_registering() {
        // given:
        let registry = Registry::new().into_shared();
        let state = app_state(registry.clone());
        let (conn, sent) = ScriptedConnection::new(
            Some(Err(ProtocolError::MalformedHandshake("3 fields".into()))),
            vec![],
        );

        // when:
        run_session(conn, state).await;

        // then: a format error was reported and no chatter was created
        let sent = sent.lock().unwrap();
        assert!(
            matches!(&sent[0], Delivery::Error { code, .. } if *code == "invalid-format")
        );
        assert_eq!(registry.lock().await.chatter_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_choice_closes_after_reporting() {
        // given:
        let registry = Registry::new().into_shared();
        let state = app_state(registry.clone());
        let (conn, sent) =
            ScriptedConnection::new(Some(Ok(handshake("c1", "Alice", "3", ""))), vec![]);

        // when:
        run_session(conn, state).await;

        // then: invalid-choice reported, chatter cleaned up
        let sent = sent.lock().unwrap();
        assert!(
            matches!(&sent[0], Delivery::Error { code, .. } if *code == "invalid-choice")
        );
        assert_eq!(registry.lock().await.chatter_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_capacity_on_create_is_fatal() {
        // given:
        let registry = Registry::new().into_shared();
        let state = app_state(registry.clone());
        let (conn, sent) =
            ScriptedConnection::new(Some(Ok(handshake("c1", "Alice", "1", "50"))), vec![]);

        // when:
        run_session(conn, state).await;

        // then:
        let sent = sent.lock().unwrap();
        assert!(
            matches!(&sent[0], Delivery::Error { code, .. } if *code == "invalid-capacity")
        );
        assert_eq!(registry.lock().await.chatter_count(), 0);
    }

    #[tokio::test]
    async fn test_create_flow_reports_created_room_then_retires_it_on_disconnect() {
        // given:
        let registry = Registry::new().into_shared();
        let state = app_state(registry.clone());
        let (conn, sent) =
            ScriptedConnection::new(Some(Ok(handshake("c1", "Alice", "1", "5"))), vec![]);

        // when: the script ends right after creating, so the session
        // disconnects and the empty room is retired
        run_session(conn, state).await;

        // then:
        let sent = sent.lock().unwrap();
        assert!(matches!(&sent[0], Delivery::Created { .. }));
        let registry = registry.lock().await;
        assert_eq!(registry.chatter_count(), 0);
        assert_eq!(registry.rooms().count(), 0);
    }

    #[tokio::test]
    async fn test_join_reprompts_on_unknown_room_until_corrected() {
        // given: a live room kept occupied by another member
        let registry = Registry::new().into_shared();
        let room_id = {
            let mut reg = registry.lock().await;
            let resident = reg
                .register_chatter("resident", "Resident", other_member_sink())
                .unwrap();
            let room_id = reg.create_room(Capacity::new(5).unwrap()).unwrap();
            reg.join_room(room_id, &resident).unwrap();
            room_id
        };
        let state = app_state(registry.clone());

        // when: first attempt targets a dead id, the retry corrects it
        let (conn, sent) = ScriptedConnection::new(
            Some(Ok(handshake("c1", "Alice", "2", "1"))),
            vec![&room_id.to_string()],
        );
        run_session(conn, state).await;

        // then: error, re-prompt, then joined
        let sent = sent.lock().unwrap();
        assert!(
            matches!(&sent[0], Delivery::Error { code, .. } if *code == "room-not-found")
        );
        assert_eq!(sent[1], Delivery::Prompt);
        assert_eq!(sent[2], Delivery::Joined { room_id });
    }

    #[tokio::test]
    async fn test_join_reprompts_on_full_room() {
        // given: a capacity-1 room already occupied
        let registry = Registry::new().into_shared();
        let room_id = {
            let mut reg = registry.lock().await;
            let resident = reg
                .register_chatter("resident", "Resident", other_member_sink())
                .unwrap();
            let room_id = reg.create_room(Capacity::new(1).unwrap()).unwrap();
            reg.join_room(room_id, &resident).unwrap();
            room_id
        };
        let state = app_state(registry.clone());

        // when: the client gives up after the error (script ends)
        let (conn, sent) = ScriptedConnection::new(
            Some(Ok(handshake("c1", "Alice", "2", &room_id.to_string()))),
            vec![],
        );
        run_session(conn, state).await;

        // then:
        let sent = sent.lock().unwrap();
        assert!(matches!(&sent[0], Delivery::Error { code, .. } if *code == "room-full"));
        assert_eq!(sent[1], Delivery::Prompt);
        // The room and its resident are untouched.
        let registry = registry.lock().await;
        assert_eq!(registry.lookup_room(room_id).unwrap().occupancy(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_identity_terminates_only_the_second_session() {
        // given: an identity already registered
        let registry = Registry::new().into_shared();
        {
            let mut reg = registry.lock().await;
            reg.register_chatter("c1", "First", other_member_sink())
                .unwrap();
        }
        let state = app_state(registry.clone());

        // when:
        let (conn, sent) =
            ScriptedConnection::new(Some(Ok(handshake("c1", "Second", "1", "5"))), vec![]);
        run_session(conn, state).await;

        // then: the second was rejected, the first survives
        let sent = sent.lock().unwrap();
        assert!(
            matches!(&sent[0], Delivery::Error { code, .. } if *code == "duplicate-uuid")
        );
        let registry = registry.lock().await;
        assert_eq!(registry.chatter_count(), 1);
        assert_eq!(
            registry
                .chatter(&ChatterId::new("c1"))
                .unwrap()
                .display_name,
            "First"
        );
    }
}

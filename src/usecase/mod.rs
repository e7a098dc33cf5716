//! Application operations driven by the session state machine.
//!
//! One struct per operation, each holding shared references to its
//! collaborators (registry, history store, clock).

pub mod disconnect_chatter;
pub mod enter_room;
pub mod register_chatter;
pub mod send_message;

pub use disconnect_chatter::DisconnectChatterUseCase;
pub use enter_room::EnterRoomUseCase;
pub use register_chatter::RegisterChatterUseCase;
pub use send_message::SendMessageUseCase;

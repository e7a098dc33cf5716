//! Multi-room chat relay library.
//!
//! Chatters register over WebSocket or a plain TCP line protocol, create or
//! join capacity-bounded rooms, and exchange messages that are persisted to
//! an append-only per-room history and relayed to every other room member.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// shared library
pub mod common;

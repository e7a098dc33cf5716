//! UI layer: transports, session state machine, HTTP API, and server wiring.

pub mod connection;
pub mod http;
pub mod line;
pub mod server;
pub mod session;
pub mod signal;
pub mod state;
pub mod websocket;

pub use server::Server;

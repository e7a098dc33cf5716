//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::common::time::Clock;
use crate::domain::{HistoryStore, SharedRegistry};
use crate::usecase::{
    DisconnectChatterUseCase, EnterRoomUseCase, RegisterChatterUseCase, SendMessageUseCase,
};

use super::{
    http::{get_room_history, get_rooms, health_check},
    line::serve_line_transport,
    signal::shutdown_signal,
    state::AppState,
    websocket::websocket_handler,
};

/// Chat relay server serving both transports from one registry.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(registry, history);
/// server.run("127.0.0.1".to_string(), 8080, 9000).await?;
/// ```
pub struct Server {
    registry: SharedRegistry,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
}

impl Server {
    pub fn new(
        registry: SharedRegistry,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            history,
            clock,
        }
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// Binds the HTTP/WebSocket listener on `host:port` and the line-protocol
    /// listener on `host:tcp_port`. Both transports share the same registry,
    /// history store, and usecases.
    ///
    /// # Errors
    ///
    /// Returns an error if either listener fails to bind or the HTTP server
    /// fails while running.
    pub async fn run(
        self,
        host: String,
        port: u16,
        tcp_port: u16,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            register_chatter: Arc::new(RegisterChatterUseCase::new(self.registry.clone())),
            enter_room: Arc::new(EnterRoomUseCase::new(
                self.registry.clone(),
                self.history.clone(),
            )),
            send_message: Arc::new(SendMessageUseCase::new(
                self.registry.clone(),
                self.history.clone(),
                self.clock,
            )),
            disconnect_chatter: Arc::new(DisconnectChatterUseCase::new(
                self.registry.clone(),
                self.history.clone(),
            )),
            registry: self.registry,
            history: self.history,
        });

        // Define handlers
        let app = Router::new()
            .route("/ws", get(websocket_handler))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}/history", get(get_room_history))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        let tcp_bind_addr = format!("{}:{}", host, tcp_port);
        let tcp_listener = tokio::net::TcpListener::bind(&tcp_bind_addr).await?;

        tracing::info!("Chat relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Line protocol listening on {}", tcp_listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // The TCP accept loop runs until the process exits; in-flight line
        // sessions are dropped with it on shutdown.
        let tcp_task = tokio::spawn(serve_line_transport(tcp_listener, app_state));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tcp_task.abort();
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

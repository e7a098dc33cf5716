//! Line-oriented TCP transport.
//!
//! One newline-terminated record per inbound read; deliveries rendered as
//! plain text. The first line of every connection is the registration
//! handshake.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::domain::Delivery;
use crate::infrastructure::dto::{Handshake, ProtocolError, line};

use super::{
    connection::{Connection, ConnectionClosed},
    session::run_session,
    state::AppState,
};

/// One TCP client connection speaking the line protocol.
pub struct LineConnection {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl LineConnection {
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half).lines(),
            writer: write_half,
        }
    }

    /// Next line from the peer, or `None` on end-of-stream or a read error.
    async fn next_line(&mut self) -> Option<String> {
        match self.reader.next_line().await {
            Ok(Some(line)) => Some(line),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("TCP read failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Connection for LineConnection {
    async fn recv_handshake(&mut self) -> Option<Result<Handshake, ProtocolError>> {
        let line = self.next_line().await?;
        Some(line::parse_handshake(&line))
    }

    async fn recv_text(&mut self) -> Option<Result<String, ProtocolError>> {
        self.next_line().await.map(Ok)
    }

    async fn send(&mut self, delivery: &Delivery) -> Result<(), ConnectionClosed> {
        let rendered = line::format_delivery(delivery);
        self.writer
            .write_all(rendered.as_bytes())
            .await
            .map_err(|e| ConnectionClosed(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| ConnectionClosed(e.to_string()))
    }
}

/// Accept loop for the TCP listener: one session task per connection.
pub async fn serve_line_transport(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!("TCP client connected from {}", peer);
                let state = state.clone();
                tokio::spawn(async move {
                    run_session(LineConnection::new(stream), state).await;
                    tracing::info!("TCP client {} disconnected", peer);
                });
            }
            Err(e) => {
                tracing::warn!("TCP accept failed: {}", e);
            }
        }
    }
}

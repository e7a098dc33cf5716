//! Multi-room chat relay server.
//!
//! Serves WebSocket clients on `/ws` plus a read-only HTTP API, and a
//! line-oriented TCP protocol on a second port. Room histories are persisted
//! as JSON lines under the history directory.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroma-server
//! cargo run --bin hiroma-server -- --host 0.0.0.0 --port 3000 --tcp-port 9000
//! ```

use std::sync::Arc;

use clap::Parser;
use hiroma::{
    common::{logger::setup_logger, time::SystemClock},
    domain::Registry,
    infrastructure::history::JsonlHistoryStore,
    ui::Server,
};

#[derive(Parser, Debug)]
#[command(name = "hiroma-server")]
#[command(about = "Multi-room chat relay over WebSocket and TCP", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number for the HTTP/WebSocket listener
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Port number for the line-protocol TCP listener
    #[arg(long, default_value = "9000")]
    tcp_port: u16,

    /// Directory where room histories are persisted
    #[arg(long, default_value = "./rooms")]
    history_dir: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let registry = Registry::new().into_shared();
    let history = Arc::new(JsonlHistoryStore::new(&args.history_dir));
    tracing::info!("Persisting room histories under {}", args.history_dir);

    let server = Server::new(registry, history, Arc::new(SystemClock));
    if let Err(e) = server.run(args.host, args.port, args.tcp_port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

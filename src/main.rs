//! Relaycast - Entry Point
//!
//! A TCP broadcast relay: every message received from one client is
//! relayed to all connected clients.

use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use relaycast::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    let server = Server::new(config);

    if let Err(e) = server.start(port).await {
        error!("Failed to start server: {}", e);
        std::process::exit(1);
    }

    info!("Server started. Press Enter to stop.");
    let mut line = String::new();
    let _ = BufReader::new(tokio::io::stdin()).read_line(&mut line).await;

    if let Err(e) = server.stop().await {
        error!("Failed to stop server: {}", e);
        std::process::exit(1);
    }
}

//! Accept loop
//!
//! Waits on the listener with a bounded timeout so the stop flag is
//! observed promptly, and registers every accepted connection. Accept
//! failures are transient: logged, then the loop continues.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::client::{ClientRegistry, Connection};
use crate::config::ServerConfig;
use crate::relay::Multiplexer;

pub struct AcceptLoop {
    listener: Arc<TcpListener>,
    registry: Arc<ClientRegistry>,
    multiplexer: Multiplexer,
    running: Arc<AtomicBool>,
    config: Arc<ServerConfig>,
}

impl AcceptLoop {
    pub fn new(
        listener: Arc<TcpListener>,
        registry: Arc<ClientRegistry>,
        running: Arc<AtomicBool>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let multiplexer = Multiplexer::new(Arc::clone(&registry));
        Self {
            listener,
            registry,
            multiplexer,
            running,
            config,
        }
    }

    pub async fn run(self) {
        info!("Accepting connections");

        while self.running.load(Ordering::SeqCst) {
            let incoming = self
                .multiplexer
                .wait_incoming(&self.listener, self.config.accept_wait())
                .await;

            match incoming {
                // Timed out; re-check the running flag.
                None => continue,
                Some(Err(e)) => {
                    error!("Error accepting connection: {}", e);
                }
                Some(Ok((stream, peer))) => {
                    if self.registry.len().await >= self.config.max_clients {
                        warn!(
                            "Client limit reached ({}), rejecting {}",
                            self.config.max_clients, peer
                        );
                        drop(stream);
                        continue;
                    }

                    info!("New connection accepted: {}", peer);
                    self.registry.add(Connection::new(stream, peer)).await;
                }
            }
        }

        info!("Accept loop stopped");
    }
}

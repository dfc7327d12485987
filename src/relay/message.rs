//! Message loop
//!
//! Polls every registered client for readability, reads one bounded
//! message from each ready socket, and relays it through the broadcaster.
//! Disconnected clients are collected during the scan and removed in one
//! batch afterwards, so the collection being iterated for sends is never
//! mutated mid-broadcast.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use tokio::time;

use crate::client::ClientRegistry;
use crate::config::ServerConfig;
use crate::relay::{Broadcaster, Multiplexer};

pub struct MessageLoop {
    registry: Arc<ClientRegistry>,
    multiplexer: Multiplexer,
    broadcaster: Broadcaster,
    running: Arc<AtomicBool>,
    config: Arc<ServerConfig>,
}

impl MessageLoop {
    pub fn new(
        registry: Arc<ClientRegistry>,
        running: Arc<AtomicBool>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let multiplexer = Multiplexer::new(Arc::clone(&registry));
        Self {
            registry,
            multiplexer,
            broadcaster: Broadcaster::new(),
            running,
            config,
        }
    }

    pub async fn run(self) {
        info!("Handling client messages");
        let mut buf = vec![0u8; self.config.buffer_size];

        while self.running.load(Ordering::SeqCst) {
            let snapshot = self.registry.snapshot().await;
            let ready = self.multiplexer.wait(&snapshot, None).await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if ready.is_empty() {
                // Membership changed; rebuild the snapshot and wait again.
                continue;
            }

            let mut disconnected = Vec::new();
            for connection in snapshot.iter().filter(|c| ready.contains(&c.peer())) {
                match connection.try_read(&mut buf) {
                    Ok(0) => {
                        info!("Client disconnected: {}", connection.peer());
                        disconnected.push(connection.peer());
                    }
                    Ok(n) => {
                        debug!("Received {} bytes from {}", n, connection.peer());
                        self.broadcaster
                            .broadcast(&buf[..n], connection.peer(), &snapshot)
                            .await;
                    }
                    // Spurious readiness; nothing to do for this client.
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => {
                        warn!("Failed to read from {}: {}", connection.peer(), e);
                        disconnected.push(connection.peer());
                    }
                }
            }

            self.registry.remove_batch(&disconnected).await;

            // Bounds CPU under bursts; not required for correctness.
            time::sleep(self.config.loop_pause()).await;
        }

        info!("Message loop stopped");
    }
}

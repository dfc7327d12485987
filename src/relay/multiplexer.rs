//! Readiness multiplexer
//!
//! Both loops block here until there is work: a pending connection on the
//! listener, a readable client socket, or a registry membership change. The
//! wait set is rebuilt from a fresh registry snapshot on every call, so
//! clients added or removed between iterations are always reflected.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::select_all;
use log::warn;
use tokio::net::{TcpListener, TcpStream};
use tokio::time;

use crate::client::{ClientRegistry, Connection};

/// Waits for readability across the listener and the current client set.
pub struct Multiplexer {
    registry: Arc<ClientRegistry>,
}

impl Multiplexer {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Blocks until at least one connection in `snapshot` is ready for
    /// read, the registry membership changes, or `timeout` elapses.
    /// Returns the peers ready for read; an empty result means the caller
    /// should rebuild its snapshot and wait again.
    pub async fn wait(
        &self,
        snapshot: &[Connection],
        timeout: Option<Duration>,
    ) -> Vec<SocketAddr> {
        match timeout {
            Some(limit) => time::timeout(limit, self.wait_ready(snapshot))
                .await
                .unwrap_or_default(),
            None => self.wait_ready(snapshot).await,
        }
    }

    async fn wait_ready(&self, snapshot: &[Connection]) -> Vec<SocketAddr> {
        if snapshot.is_empty() {
            // Nothing to poll yet; sleep until a client is registered.
            self.registry.membership_changed().await;
            return Vec::new();
        }

        let waits: Vec<Pin<Box<dyn Future<Output = SocketAddr> + Send + '_>>> = snapshot
            .iter()
            .map(|connection| {
                let wait: Pin<Box<dyn Future<Output = SocketAddr> + Send + '_>> =
                    Box::pin(async move {
                        if let Err(e) = connection.readable().await {
                            // Report the socket as ready anyway; the
                            // following read surfaces the failure.
                            warn!("Readiness wait failed for {}: {}", connection.peer(), e);
                        }
                        connection.peer()
                    });
                wait
            })
            .collect();

        tokio::select! {
            (first, _, rest) = select_all(waits) => {
                let mut ready = vec![first];
                for wait in rest {
                    if let Some(peer) = wait.now_or_never() {
                        ready.push(peer);
                    }
                }
                ready
            }
            _ = self.registry.membership_changed() => Vec::new(),
        }
    }

    /// Bounded wait for a pending connection on the listener. `None` means
    /// the timeout elapsed with nothing to accept.
    pub async fn wait_incoming(
        &self,
        listener: &TcpListener,
        timeout: Duration,
    ) -> Option<io::Result<(TcpStream, SocketAddr)>> {
        time::timeout(timeout, listener.accept()).await.ok()
    }
}

//! Client registry
//!
//! Tracks every active client connection. All membership operations go
//! through one mutex so the set is never observed mid-mutation, and every
//! membership change wakes waiters so the message loop can rebuild its
//! wait set with the current clients.

use std::collections::HashMap;
use std::net::SocketAddr;

use log::debug;
use tokio::sync::{Mutex, Notify};

use crate::client::Connection;

/// Registry of active client connections, keyed by peer address.
pub struct ClientRegistry {
    connections: Mutex<HashMap<SocketAddr, Connection>>,
    changed: Notify,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            changed: Notify::new(),
        }
    }

    /// Adds a connection and wakes anyone waiting on membership changes.
    pub async fn add(&self, connection: Connection) {
        let peer = connection.peer();
        let mut connections = self.connections.lock().await;
        connections.insert(peer, connection);
        debug!("Registered client {} ({} active)", peer, connections.len());
        drop(connections);
        self.changed.notify_one();
    }

    /// Removes one connection; its socket closes once the last outstanding
    /// snapshot clone is dropped.
    pub async fn remove(&self, peer: SocketAddr) -> Option<Connection> {
        let removed = self.connections.lock().await.remove(&peer);
        if removed.is_some() {
            self.changed.notify_one();
        }
        removed
    }

    /// Removes a batch of disconnected peers under a single lock.
    pub async fn remove_batch(&self, peers: &[SocketAddr]) {
        if peers.is_empty() {
            return;
        }
        let mut connections = self.connections.lock().await;
        for peer in peers {
            if connections.remove(peer).is_some() {
                debug!("Removed disconnected client {}", peer);
            }
        }
        drop(connections);
        self.changed.notify_one();
    }

    /// Point-in-time copy of the current membership, safe to iterate while
    /// the registry keeps changing.
    pub async fn snapshot(&self) -> Vec<Connection> {
        self.connections.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Drains every connection under one lock, releasing each socket.
    pub async fn clear(&self) {
        let mut connections = self.connections.lock().await;
        connections.clear();
        drop(connections);
        self.changed.notify_one();
    }

    /// Completes the next time membership changes (or immediately, if it
    /// changed since the last wait).
    pub async fn membership_changed(&self) {
        self.changed.notified().await;
    }

    /// Wakes a pending membership wait without changing membership. Used by
    /// shutdown to unblock the message loop's unbounded wait.
    pub fn wake_waiters(&self) {
        self.changed.notify_one();
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

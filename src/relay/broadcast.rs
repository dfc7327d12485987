//! Broadcaster
//!
//! Fans a message out to every connection in the snapshot it is given.
//! The sender receives its own message back; the relay is deliberately
//! unfiltered. A failed send is logged and never aborts delivery to the
//! remaining connections; disconnect detection stays with the message loop.

use std::net::SocketAddr;

use log::{debug, warn};

use crate::client::Connection;

pub struct Broadcaster;

impl Broadcaster {
    pub fn new() -> Self {
        Self
    }

    pub async fn broadcast(
        &self,
        message: &[u8],
        sender: SocketAddr,
        recipients: &[Connection],
    ) {
        debug!(
            "Broadcasting {} bytes from {} to {} client(s)",
            message.len(),
            sender,
            recipients.len()
        );

        for connection in recipients {
            if let Err(e) = connection.send(message).await {
                warn!("Failed to send to {}: {}", connection.peer(), e);
            }
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types
//!
//! Defines domain-specific error types for the relay server.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Server lifecycle errors
#[derive(Debug)]
pub enum ServerError {
    InvalidBindAddress(String),
    Socket(io::Error),
    Bind(SocketAddr, io::Error),
    Listen(io::Error),
    AlreadyRunning,
    NotRunning,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::InvalidBindAddress(addr) => {
                write!(f, "Invalid bind address: {}", addr)
            }
            ServerError::Socket(e) => write!(f, "Failed to create socket: {}", e),
            ServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ServerError::Listen(e) => write!(f, "Failed to listen: {}", e),
            ServerError::AlreadyRunning => write!(f, "Server is already running"),
            ServerError::NotRunning => write!(f, "Server is not running"),
        }
    }
}

impl std::error::Error for ServerError {}

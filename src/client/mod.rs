//! Client connection tracking
//!
//! Connection handles for accepted sockets and the registry that owns them.

pub mod connection;
pub mod registry;

pub use connection::Connection;
pub use registry::ClientRegistry;

//! Error handling
//!
//! Centralized error definitions for the relay server.

pub mod types;

pub use types::ServerError;

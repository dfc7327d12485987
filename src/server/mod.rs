//! Server core functionality
//!
//! The lifecycle surface exposed to the CLI wrapper: start and stop.

pub mod core;

pub use core::Server;

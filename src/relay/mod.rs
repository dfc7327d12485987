//! Relay engine
//!
//! The connection-multiplexing and message-relay core: readiness waits,
//! the accept and message loops, and the broadcaster they drive.

pub mod accept;
pub mod broadcast;
pub mod message;
pub mod multiplexer;

pub use accept::AcceptLoop;
pub use broadcast::Broadcaster;
pub use message::MessageLoop;
pub use multiplexer::Multiplexer;

pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::Server;

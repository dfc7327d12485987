//! Configuration management for the relay server
//!
//! Defaults can be overridden by an optional `config.toml` and by
//! `RELAYCAST_*` environment variables. Values are validated before the
//! server uses them.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// IPv4 address to bind the listening socket
    pub bind_address: String,

    /// Port for the listening socket
    pub port: u16,

    /// Maximum concurrent clients; connections beyond this are rejected
    pub max_clients: usize,

    /// Listen backlog for bursts of simultaneous connects
    pub backlog: u32,

    /// Size of the receive buffer; one read of up to this many bytes is one
    /// relay unit
    pub buffer_size: usize,

    /// How long the accept loop waits before re-checking the running flag
    pub accept_wait_secs: u64,

    /// Pause between message loop iterations, bounding CPU under bursts
    pub loop_pause_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            max_clients: 64,
            backlog: 1024,
            buffer_size: 1024,
            accept_wait_secs: 1,
            loop_pause_ms: 25,
        }
    }
}

impl ServerConfig {
    /// Load configuration: defaults, then `config.toml` if present, then
    /// environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RELAYCAST"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.backlog == 0 {
            return Err(config::ConfigError::Message(
                "backlog must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn accept_wait(&self) -> Duration {
        Duration::from_secs(self.accept_wait_secs)
    }

    pub fn loop_pause(&self) -> Duration {
        Duration::from_millis(self.loop_pause_ms)
    }
}

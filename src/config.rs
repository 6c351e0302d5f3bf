//! Configuration for Riorita clients
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{Result, RioritaError};

/// Main configuration for a Riorita client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Retry Configuration
    // -------------------------------------------------------------------------
    /// Reconnect and retry on failure. When false, every failure is returned
    /// to the caller immediately.
    pub reconnect: bool,

    /// Upper bound on attempts per operation in retrying mode
    pub max_attempts: u32,

    /// Linear backoff step: attempt N sleeps N * step (milliseconds)
    pub backoff_step_ms: u64,

    // -------------------------------------------------------------------------
    // Request Configuration
    // -------------------------------------------------------------------------
    /// Prefix prepended to every key before encoding
    pub key_prefix: String,

    /// Seed for the request id generator (None = seed from OS entropy)
    pub request_id_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8024,
            reconnect: true,
            max_attempts: 100,
            backoff_step_ms: 100,
            key_prefix: String::new(),
            request_id_seed: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port`, used in log lines and error messages
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Backoff step as a Duration
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    /// Reject configurations the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RioritaError::Config("host must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(RioritaError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable reconnect-and-retry
    pub fn reconnect(mut self, enabled: bool) -> Self {
        self.config.reconnect = enabled;
        self
    }

    /// Set the attempt ceiling for retrying mode
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the linear backoff step (in milliseconds)
    pub fn backoff_step_ms(mut self, ms: u64) -> Self {
        self.config.backoff_step_ms = ms;
        self
    }

    /// Set the key namespace prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Seed the request id generator for reproducible ids
    pub fn request_id_seed(mut self, seed: u64) -> Self {
        self.config.request_id_seed = Some(seed);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

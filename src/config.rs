//! Controller configuration.
//!
//! Loaded from a TOML file or built in code; validated once at startup,
//! before any thread is spawned or the port is opened. Invalid
//! configuration is fatal.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registers::MAX_SLAVE_ADDRESS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("slave address {0} is reserved or out of range (1-247)")]
    SlaveAddress(u8),
    #[error("poll interval must be non-zero")]
    PollInterval,
    #[error("transaction timeout must be non-zero")]
    TransactionTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port device path.
    pub port: String,
    /// Modbus slave address of the supply. Address 0 is broadcast and is
    /// never valid here.
    pub slave_address: u8,
    /// Floor on the spacing between status polls.
    pub poll_interval_ms: u64,
    /// Read timeout applied to every transaction on the port.
    pub transaction_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".into(),
            slave_address: 1,
            poll_interval_ms: 500,
            transaction_timeout_ms: 3000,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slave_address == 0 || self.slave_address > MAX_SLAVE_ADDRESS {
            return Err(ConfigError::SlaveAddress(self.slave_address));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::PollInterval);
        }
        if self.transaction_timeout_ms == 0 {
            return Err(ConfigError::TransactionTimeout);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

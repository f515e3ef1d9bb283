//! Daemon configuration.

use std::fmt;
use std::path::PathBuf;

use mip_core::constants;

/// Configuration for one daemon instance.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// This host's identity.
    pub address: u8,
    /// Rendezvous point for local applications.
    pub channel_path: PathBuf,
    /// Verbose protocol tracing.
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The broadcast sentinel cannot be a host identity.
    ReservedAddress(u8),
    EmptyChannelPath,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReservedAddress(addr) => write!(
                f,
                "address must be in range {{{}...{}}} ({})",
                constants::MIN_ADDR,
                constants::BROADCAST_ADDR - 1,
                addr
            ),
            ConfigError::EmptyChannelPath => write!(f, "channel path must not be empty"),
        }
    }
}

impl DaemonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address == constants::BROADCAST_ADDR {
            return Err(ConfigError::ReservedAddress(self.address));
        }
        if self.channel_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyChannelPath);
        }
        Ok(())
    }
}

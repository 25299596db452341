//! Error types for the agent
//!
//! Only startup (configuration) errors are fatal. Link, wake and identity
//! errors are logged by the control loop and never reach the broker.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid target MAC address {value:?}: {source}")]
    InvalidMac {
        value: String,
        #[source]
        source: mac_address::MacParseError,
    },

    #[error("config field `{0}` must not be empty")]
    Empty(&'static str),
}

/// Broker link failures
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("broker connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("broker client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("broker refused the session: {0}")]
    Refused(String),

    #[error("no broker acknowledgement within {0:?}")]
    Timeout(std::time::Duration),

    #[error("link is not connected")]
    NotConnected,

    #[error("link driver task has stopped")]
    DriverStopped,
}

/// Magic packet emission failure (local socket only, delivery is never acknowledged)
#[derive(Debug, Error)]
pub enum WakeError {
    #[error("UDP socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local network identity lookup failure
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("cannot enumerate network interfaces: {0}")]
    Enumerate(#[from] std::io::Error),

    #[error("no IPv4 interface matching {0:?}")]
    NoInterface(Option<String>),
}

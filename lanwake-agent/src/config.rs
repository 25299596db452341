//! Configuration loading
//!
//! Handles:
//! - TOML config file (path from `LANWAKE_CONFIG`, default `lanwake.toml`)
//! - Broker credentials overridable from the environment
//! - Resolution of the single target host
//!
//! Everything is read once at startup and stays immutable afterwards.

use crate::error::ConfigError;
use mac_address::MacAddress;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_PATH_ENV: &str = "LANWAKE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "lanwake.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub network: NetworkConfig,
    pub target: TargetConfig,
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name reported in `stat_info`
    pub ssid: String,
    /// Interface to read the local address from; first non-loopback IPv4 otherwise
    #[serde(default)]
    pub interface: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub mac: String,
    pub ip: Ipv4Addr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tls")]
    pub tls: bool,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)] // Never write the password back
    pub password: Option<String>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    pub commands: String,
    pub responses: String,
    /// Prepended to every command and status token (`"/"` for slash-style bots)
    #[serde(default)]
    pub token_prefix: String,
}

fn default_port() -> u16 {
    8883
}

fn default_tls() -> bool {
    true
}

fn default_keep_alive() -> u64 {
    15
}

/// The one host this agent wakes and probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetHost {
    pub mac: MacAddress,
    pub ip: Ipv4Addr,
}

impl AgentConfig {
    /// Load from `$LANWAKE_CONFIG` (or `lanwake.toml`) and apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::load_from(&path)?;
        config.broker.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        self.topics.validate()?;
        self.target_host().map(|_| ())
    }

    pub fn target_host(&self) -> Result<TargetHost, ConfigError> {
        let mac = MacAddress::from_str(self.target.mac.trim()).map_err(|source| {
            ConfigError::InvalidMac {
                value: self.target.mac.clone(),
                source,
            }
        })?;
        Ok(TargetHost {
            mac,
            ip: self.target.ip,
        })
    }
}

impl FromStr for AgentConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl BrokerConfig {
    /// `LANWAKE_MQTT_USER` / `LANWAKE_MQTT_PASS` win over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(user) = std::env::var("LANWAKE_MQTT_USER") {
            self.username = Some(user);
        }
        if let Ok(pass) = std::env::var("LANWAKE_MQTT_PASS") {
            self.password = Some(pass);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Empty("broker.host"));
        }
        Ok(())
    }
}

impl TopicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commands.is_empty() {
            return Err(ConfigError::Empty("topics.commands"));
        }
        if self.responses.is_empty() {
            return Err(ConfigError::Empty("topics.responses"));
        }
        Ok(())
    }
}

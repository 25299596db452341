use lanwake_agent::config::BrokerConfig;
use lanwake_agent::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "LANWAKE_TRIGGER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "lanwake-trigger.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub http: HttpConfig,
    pub broker: BrokerConfig,
    pub topics: CommandTopic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Same `commands` / `token_prefix` as the agent it drives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTopic {
    pub commands: String,
    #[serde(default)]
    pub token_prefix: String,
}

impl TriggerConfig {
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
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        if self.topics.commands.is_empty() {
            return Err(ConfigError::Empty("topics.commands"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind() {
        let config = TriggerConfig::parse(
            r#"
            [broker]
            host = "broker.local"

            [topics]
            commands = "home/wol/cmd"
            token_prefix = "/"
            "#,
        )
        .unwrap();
        assert_eq!(config.http.bind.port(), 8080);
        assert_eq!(config.topics.token_prefix, "/");
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_commands_topic_rejected() {
        let config = TriggerConfig::parse(
            r#"
            [http]
            bind = "127.0.0.1:9000"

            [broker]
            host = "broker.local"

            [topics]
            commands = ""
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Empty("topics.commands"))
        ));
    }
}

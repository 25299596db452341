use lanwake_agent::config::{BrokerConfig, TopicsConfig};
use lanwake_agent::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use teloxide::types::{ChatId, UserId};

pub const CONFIG_PATH_ENV: &str = "LANWAKE_TELEGRAM_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "lanwake-telegram.toml";
pub const TOKEN_ENV: &str = "LANWAKE_TELEGRAM_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub broker: BrokerConfig,
    /// Same topics and prefix as the agent on the other side
    pub topics: TopicsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default, skip_serializing)]
    pub token: String,
    /// The only user whose commands are relayed; responses go to this chat
    pub allowed_id: u64,
}

impl TelegramConfig {
    pub fn allowed_user(&self) -> UserId {
        UserId(self.allowed_id)
    }

    /// Private chat with the allowed user
    pub fn chat(&self) -> ChatId {
        ChatId(self.allowed_id as i64)
    }
}

impl BotConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::load_from(&path)?;
        config.broker.apply_env_overrides();
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.telegram.token = token;
        }
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
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::Empty("telegram.token"));
        }
        self.broker.validate()?;
        self.topics.validate()
    }
}

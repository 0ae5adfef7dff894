//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Environment variable holding the Telegram bot token
pub const TOKEN_ENV: &str = "TELEGRAM_API_TOKEN";
/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "BOT_DATABASE";

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Who may use the bot and who may change prices
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AccessConfig {
    pub approved_users: Vec<String>,
    /// Users seeded with the special tier by `users seed`
    pub special_users: Vec<String>,
    pub admin_users: Vec<String>,
    /// When false, every approved user may add, update and delete prices
    pub admin_only_writes: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "footwear-pricebot".to_string(),
            prefix: "/".to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            poll_timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bot_database.db"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            telegram: TelegramConfig::default(),
            database: DatabaseConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file when it exists, otherwise start from defaults
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Overlay environment variables on top of file values
    pub fn apply_env(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.telegram.token = Some(token);
            }
        }

        if let Ok(path) = std::env::var(DATABASE_ENV) {
            if !path.trim().is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }

        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.poll_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("telegram.poll-timeout-secs must be positive".to_string()));
        }
        if self.access.admin_only_writes && self.access.admin_users.is_empty() {
            return Err(ConfigError::InvalidValue(
                "access.admin-only-writes is set but access.admin-users is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The bot token; startup cannot continue without it
    pub fn telegram_token(&self) -> Result<String, ConfigError> {
        self.telegram
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField("telegram.token".to_string()))
    }
}

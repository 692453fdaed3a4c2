//! # Configuration Management Module
//!
//! TOML configuration for the Squirrel Catcher bot, loaded once at startup.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - Bot identity, command prefix and Discord token
//! - [`GameConfig`] - Cooldowns, suspense delay and leaderboard size
//! - [`AutoCatchConfig`] - Background hunter tick
//! - [`StorageConfig`] - Data directory for the sled database
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use squirrel_catcher::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Prefix: {}", config.bot.command_prefix);
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "Squirrel Catcher"
//! command_prefix = "!sq "
//!
//! [game]
//! catch_cooldown_secs = 10
//! daily_cooldown_hours = 24
//!
//! [storage]
//! data_dir = "./data"
//! ```
//!
//! Every section except `[bot]` may be omitted and falls back to its defaults.
//! The Discord token is read from `DISCORD_BOT_TOKEN` first (a `.env` file is
//! honoured), then from `bot.token`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Environment variable that overrides `bot.token`.
pub const TOKEN_ENV_VAR: &str = "DISCORD_BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub auto_catch: AutoCatchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// Text every command starts with, trailing space included.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_command_prefix() -> String {
    "!sq ".to_string()
}

impl BotConfig {
    /// Token from the environment, falling back to the config file.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .or_else(|| self.token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub catch_cooldown_secs: u64,
    pub daily_cooldown_hours: u64,
    /// Delay between the "setting your trap" message and the result (ms).
    pub catch_suspense_ms: u64,
    pub leaderboard_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            catch_cooldown_secs: 10,
            daily_cooldown_hours: 24,
            catch_suspense_ms: 1500,
            leaderboard_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCatchConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
}

impl Default for AutoCatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl StorageConfig {
    /// Location of the sled database inside `data_dir`.
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("squirrels.db")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("squirrel-catcher.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot.command_prefix.trim().is_empty() {
            return Err(anyhow!("bot.command_prefix must not be empty"));
        }
        if self.auto_catch.enabled && self.auto_catch.poll_interval_secs == 0 {
            return Err(anyhow!("auto_catch.poll_interval_secs must be at least 1"));
        }
        if self.game.leaderboard_size == 0 {
            return Err(anyhow!("game.leaderboard_size must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                name: "Squirrel Catcher".to_string(),
                command_prefix: default_command_prefix(),
                token: None,
            },
            game: GameConfig::default(),
            auto_catch: AutoCatchConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bot.command_prefix, "!sq ");
        assert_eq!(config.game.catch_cooldown_secs, 10);
        assert_eq!(config.game.daily_cooldown_hours, 24);
        assert_eq!(config.game.leaderboard_size, 10);
        assert!(config.auto_catch.enabled);
        assert_eq!(config.auto_catch.poll_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_file_fills_sections() {
        let config: Config = toml::from_str(
            r#"
            [bot]
            name = "Nutty"

            [game]
            catch_cooldown_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.bot.command_prefix, "!sq ");
        assert_eq!(config.game.catch_cooldown_secs, 3);
        assert_eq!(config.game.catch_suspense_ms, 1500);
        assert_eq!(config.storage.data_dir, "./data");
    }

    #[test]
    fn test_round_trip() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.bot.name, "Squirrel Catcher");
        assert_eq!(parsed.logging.file.as_deref(), Some("squirrel-catcher.log"));
    }

    #[test]
    fn test_validation_rejects_blank_prefix() {
        let mut config = Config::default();
        config.bot.command_prefix = "  ".into();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.game.leaderboard_size, 10);
    }
}

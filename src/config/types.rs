//! Core configuration types and loading.

use super::defaults::*;
use crate::audio::SearchProvider;
use opbot_proto::UserId;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot identity and global settings.
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional SQLite storage for guild prefixes.
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// The bot's own user id, used to recognise mentions of it.
    #[serde(default = "default_bot_user_id")]
    pub user_id: UserId,
    /// Application owner; gateways without an application API use this.
    pub owner_id: Option<UserId>,
    /// Prefix for DMs and guilds without their own.
    #[serde(default = "default_prefix")]
    pub default_prefix: String,
    /// Prometheus metrics HTTP port; 0 disables the endpoint.
    #[serde(default)]
    pub metrics_port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            user_id: default_bot_user_id(),
            owner_id: None,
            default_prefix: default_prefix(),
            metrics_port: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file (`:memory:` for a throwaway store).
    pub path: String,
}

/// Audio playback configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Provider free-text searches are sent to.
    #[serde(default)]
    pub search_provider: SearchProvider,
    /// Seconds a search result waits for a reaction.
    #[serde(default = "default_selection_timeout_secs")]
    pub selection_timeout_secs: u64,
    /// Candidates offered by a search (at most 8).
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
    /// Lavalink node used to load tracks. Without one, nothing loads.
    pub lavalink: Option<LavalinkConfig>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            search_provider: SearchProvider::default(),
            selection_timeout_secs: default_selection_timeout_secs(),
            max_search_results: default_max_search_results(),
            lavalink: None,
        }
    }
}

impl AudioConfig {
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(self.selection_timeout_secs)
    }
}

/// Lavalink REST endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LavalinkConfig {
    /// Base URL, e.g. `http://127.0.0.1:2333`.
    pub url: String,
    pub password: String,
}

/// Rate limit bucket housekeeping.
///
/// Per-command token counts are declared by each command; these settings
/// only control how long idle buckets are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_user_idle_secs")]
    pub user_idle_secs: u64,
    #[serde(default = "default_guild_idle_secs")]
    pub guild_idle_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            user_idle_secs: default_user_idle_secs(),
            guild_idle_secs: default_guild_idle_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn user_idle(&self) -> Duration {
        Duration::from_secs(self.user_idle_secs)
    }

    pub fn guild_idle(&self) -> Duration {
        Duration::from_secs(self.guild_idle_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

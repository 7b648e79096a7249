//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions and loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that collect every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{
    AudioConfig, BotConfig, Config, ConfigError, DatabaseConfig, LavalinkConfig, LogFormat,
    LoggingConfig, RateLimitConfig,
};
pub use validation::{ValidationError, is_valid_prefix, validate};

//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::audio::MAX_SEARCH_RESULTS;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.default_prefix must be 1-8 characters without whitespace, got '{0}'")]
    InvalidPrefix(String),
    #[error("audio.selection_timeout_secs must be greater than zero")]
    ZeroSelectionTimeout,
    #[error("audio.max_search_results must be between 1 and 8, got {0}")]
    InvalidSearchResults(usize),
    #[error("audio.lavalink.url must start with http:// or https://, got '{0}'")]
    InvalidLavalinkUrl(String),
    #[error("rate_limits.{0} must be greater than zero")]
    ZeroRateLimitInterval(&'static str),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Check a prefix: 1-8 characters, no whitespace.
pub fn is_valid_prefix(prefix: &str) -> bool {
    let len = prefix.chars().count();
    (1..=8).contains(&len) && !prefix.contains(char::is_whitespace)
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_prefix(&config.bot.default_prefix) {
        errors.push(ValidationError::InvalidPrefix(config.bot.default_prefix.clone()));
    }

    // Audio
    if config.audio.selection_timeout_secs == 0 {
        errors.push(ValidationError::ZeroSelectionTimeout);
    }
    if !(1..=MAX_SEARCH_RESULTS).contains(&config.audio.max_search_results) {
        errors.push(ValidationError::InvalidSearchResults(config.audio.max_search_results));
    }
    if let Some(ref lavalink) = config.audio.lavalink
        && !(lavalink.url.starts_with("http://") || lavalink.url.starts_with("https://"))
    {
        errors.push(ValidationError::InvalidLavalinkUrl(lavalink.url.clone()));
    }

    // Rate limit housekeeping
    let limits = &config.rate_limits;
    for (name, value) in [
        ("user_idle_secs", limits.user_idle_secs),
        ("guild_idle_secs", limits.guild_idle_secs),
        ("sweep_interval_secs", limits.sweep_interval_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroRateLimitInterval(name));
        }
    }

    // Database path validation
    if let Some(ref db) = config.database
        && db.path != ":memory:"
    {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        let config: Config = toml::from_str("").unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_prefix_rules() {
        assert!(is_valid_prefix("!"));
        assert!(is_valid_prefix("bot."));
        assert!(!is_valid_prefix(""));
        assert!(!is_valid_prefix("a b"));
        assert!(!is_valid_prefix("123456789"));
    }

    #[test]
    fn test_collects_every_error() {
        let toml = r#"
[bot]
default_prefix = ""

[audio]
selection_timeout_secs = 0
max_search_results = 12

[audio.lavalink]
url = "localhost:2333"
password = "x"

[rate_limits]
sweep_interval_secs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPrefix(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidSearchResults(12))));
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::ZeroRateLimitInterval("sweep_interval_secs")))
        );
    }

    #[test]
    fn test_missing_database_dir_fails() {
        let toml = r#"
[database]
path = "/nonexistent/dir/opbot.db"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
    }
}

//! Per-guild command prefixes.
//!
//! The dispatcher asks for the prefix on every message, so lookups are
//! synchronous and served from memory. The SQLite store warms its cache at
//! startup and writes through on change.

use crate::config::is_valid_prefix;
use crate::db::{Database, DbError};
use async_trait::async_trait;
use dashmap::DashMap;
use opbot_proto::GuildId;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PrefixError {
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Key-value store of guild prefixes.
#[async_trait]
pub trait PrefixStore: Send + Sync {
    /// Prefix for `guild`; the default for DMs and unset guilds.
    fn prefix(&self, guild: Option<GuildId>) -> String;

    /// Change the prefix of `guild`.
    ///
    /// Returns `Ok(false)` and stores nothing when `value` is not a valid
    /// prefix.
    async fn set_prefix(&self, guild: GuildId, value: &str) -> Result<bool, PrefixError>;
}

/// Prefixes kept in memory only.
pub struct MemoryPrefixStore {
    prefixes: DashMap<GuildId, String>,
    default: String,
}

impl MemoryPrefixStore {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            prefixes: DashMap::new(),
            default: default.into(),
        }
    }
}

#[async_trait]
impl PrefixStore for MemoryPrefixStore {
    fn prefix(&self, guild: Option<GuildId>) -> String {
        guild
            .and_then(|g| self.prefixes.get(&g).map(|p| p.value().clone()))
            .unwrap_or_else(|| self.default.clone())
    }

    async fn set_prefix(&self, guild: GuildId, value: &str) -> Result<bool, PrefixError> {
        if !is_valid_prefix(value) {
            return Ok(false);
        }
        self.prefixes.insert(guild, value.to_owned());
        Ok(true)
    }
}

/// Prefixes persisted in SQLite with an in-memory cache.
pub struct SqlitePrefixStore {
    db: Database,
    cache: DashMap<GuildId, String>,
    default: String,
}

impl SqlitePrefixStore {
    /// Open the store and load every saved prefix.
    pub async fn load(db: Database, default: impl Into<String>) -> Result<Self, PrefixError> {
        let cache = DashMap::new();
        for settings in db.guilds().load_all().await? {
            cache.insert(settings.guild_id, settings.prefix);
        }
        info!(count = cache.len(), "Loaded guild prefixes");
        Ok(Self {
            db,
            cache,
            default: default.into(),
        })
    }
}

#[async_trait]
impl PrefixStore for SqlitePrefixStore {
    fn prefix(&self, guild: Option<GuildId>) -> String {
        guild
            .and_then(|g| self.cache.get(&g).map(|p| p.value().clone()))
            .unwrap_or_else(|| self.default.clone())
    }

    async fn set_prefix(&self, guild: GuildId, value: &str) -> Result<bool, PrefixError> {
        if !is_valid_prefix(value) {
            return Ok(false);
        }
        self.db.guilds().set_prefix(guild, value).await?;
        self.cache.insert(guild, value.to_owned());
        info!(guild = %guild, prefix = %value, "Guild prefix changed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_defaults_and_overrides() {
        let store = MemoryPrefixStore::new("!");
        let guild = GuildId::new(1);
        assert_eq!(store.prefix(None), "!");
        assert_eq!(store.prefix(Some(guild)), "!");

        assert!(store.set_prefix(guild, "?").await.unwrap());
        assert!(!store.set_prefix(guild, "two words").await.unwrap());
        assert_eq!(store.prefix(Some(guild)), "?");
        assert_eq!(store.prefix(Some(GuildId::new(2))), "!");
    }

    #[tokio::test]
    async fn sqlite_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefixes.db");
        let path = path.to_str().unwrap();
        let guild = GuildId::new(77);

        let db = Database::new(path).await.unwrap();
        let store = SqlitePrefixStore::load(db, "!").await.unwrap();
        assert!(store.set_prefix(guild, "%").await.unwrap());
        drop(store);

        let db = Database::new(path).await.unwrap();
        let store = SqlitePrefixStore::load(db, "!").await.unwrap();
        assert_eq!(store.prefix(Some(guild)), "%");
        assert_eq!(store.prefix(None), "!");
    }
}

//! Guild settings repository.

use super::DbError;
use opbot_proto::GuildId;
use sqlx::SqlitePool;

/// Stored settings for one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: GuildId,
    pub prefix: String,
    pub updated_at: i64,
}

/// Repository for guild settings.
pub struct GuildRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GuildRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Prefix stored for `guild_id`, if any.
    pub async fn prefix(&self, guild_id: GuildId) -> Result<Option<String>, DbError> {
        let prefix = sqlx::query_scalar::<_, String>(
            "SELECT prefix FROM guild_settings WHERE guild_id = ?",
        )
        .bind(guild_id.to_string())
        .fetch_optional(self.pool)
        .await?;
        Ok(prefix)
    }

    /// Insert or replace the prefix for `guild_id`.
    pub async fn set_prefix(&self, guild_id: GuildId, prefix: &str) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO guild_settings (guild_id, prefix, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET prefix = excluded.prefix, updated_at = excluded.updated_at
            "#,
        )
        .bind(guild_id.to_string())
        .bind(prefix)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Every stored guild, for warming caches at startup.
    pub async fn load_all(&self) -> Result<Vec<GuildSettings>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT guild_id, prefix, updated_at FROM guild_settings",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(guild, prefix, updated_at)| {
                let guild_id = guild.parse().map_err(|e: std::num::ParseIntError| {
                    DbError::CorruptRow {
                        guild: guild.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(GuildSettings {
                    guild_id,
                    prefix,
                    updated_at,
                })
            })
            .collect()
    }
}

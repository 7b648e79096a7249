//! Per-command token buckets.
//!
//! Every command gets one bucket per scope key: the guild when the command
//! limits on guild and the message came from one, otherwise the user.
//! Buckets are `governor` GCRA limiters (capacity `tokens`, one token back
//! every `period / tokens`) held in [`ExpiringMap`]s so idle buckets age
//! out: three minutes for users, five for guilds by default.

use crate::cache::ExpiringMap;
use crate::command::{NodeId, RateLimits};
use crate::config::RateLimitConfig;
use governor::{Quota, RateLimiter as GovRateLimiter};
use opbot_proto::{GuildId, UserId};
use std::num::NonZeroU32;
use tracing::debug;

type DirectRateLimiter = governor::DefaultDirectRateLimiter;

/// Which bucket an invocation draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    Guild(GuildId),
    User(UserId),
}

impl RateLimitScope {
    /// Guild scope only when the command asks for it and a guild exists.
    pub fn for_invocation(limits: &RateLimits, guild: Option<GuildId>, user: UserId) -> Self {
        match guild {
            Some(guild) if limits.on_guild => RateLimitScope::Guild(guild),
            _ => RateLimitScope::User(user),
        }
    }
}

/// Builds the governor quota for a command's limits.
///
/// Returns `None` for zero tokens or a period too small to split.
pub fn quota(limits: &RateLimits) -> Option<Quota> {
    let burst = NonZeroU32::new(limits.tokens)?;
    let replenish = limits.period / limits.tokens;
    Quota::with_period(replenish).map(|q| q.allow_burst(burst))
}

/// Lazily created buckets for every command and scope.
pub struct RateLimitManager {
    user_buckets: ExpiringMap<(NodeId, UserId), DirectRateLimiter>,
    guild_buckets: ExpiringMap<(NodeId, GuildId), DirectRateLimiter>,
}

impl RateLimitManager {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            user_buckets: ExpiringMap::new(config.user_idle()),
            guild_buckets: ExpiringMap::new(config.guild_idle()),
        }
    }

    /// Consume one token for `command` in `scope`.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    pub fn is_allowed(&self, command: NodeId, limits: &RateLimits, scope: RateLimitScope) -> bool {
        // Limits are validated at registration; a quota-less command is never limited.
        let Some(quota) = quota(limits) else {
            return true;
        };
        let init = || GovRateLimiter::direct(quota);
        let check = |limiter: &DirectRateLimiter| limiter.check().is_ok();

        let allowed = match scope {
            RateLimitScope::User(user) => self.user_buckets.with_or_insert((command, user), init, check),
            RateLimitScope::Guild(guild) => {
                self.guild_buckets.with_or_insert((command, guild), init, check)
            }
        };
        if !allowed {
            debug!(command = command.index(), scope = ?scope, "command rate limit exceeded");
        }
        allowed
    }

    /// Drop idle buckets; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.user_buckets.purge_expired() + self.guild_buckets.purge_expired()
    }

    pub fn bucket_count(&self) -> usize {
        self.user_buckets.len() + self.guild_buckets.len()
    }
}

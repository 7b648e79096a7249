//! Validator chains.
//!
//! Message validators run before the text is parsed; context validators run
//! once a command has been resolved. Every validator in a chain runs
//! concurrently and the chain passes only if all of them pass.

use crate::command::Context;
use async_trait::async_trait;
use futures_util::future::join_all;
use opbot_proto::MessageEvent;
use std::sync::Arc;
use tracing::{debug, warn};

/// Check applied to a raw inbound message.
#[async_trait]
pub trait MessageValidator: Send + Sync {
    /// Short label used in logs and abort reasons.
    fn name(&self) -> &'static str;

    async fn validate(&self, event: &MessageEvent) -> bool;
}

/// Check applied to a resolved invocation.
#[async_trait]
pub trait ContextValidator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn validate(&self, ctx: &Context) -> bool;
}

/// Non-blank content from a human author.
pub struct SourceValidator;

#[async_trait]
impl MessageValidator for SourceValidator {
    fn name(&self) -> &'static str {
        "source"
    }

    async fn validate(&self, event: &MessageEvent) -> bool {
        !event.content.trim().is_empty() && event.author.as_ref().is_some_and(|a| !a.bot)
    }
}

/// Text channels and DMs only.
pub struct ChannelValidator;

#[async_trait]
impl MessageValidator for ChannelValidator {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn validate(&self, event: &MessageEvent) -> bool {
        event.channel_kind.accepts_commands()
    }
}

/// A bot mention is present exactly when the command requires one.
pub struct MentionValidator;

#[async_trait]
impl ContextValidator for MentionValidator {
    fn name(&self) -> &'static str {
        "mention"
    }

    async fn validate(&self, ctx: &Context) -> bool {
        ctx.command.permissions.require_bot_mention == ctx.was_bot_mentioned
    }
}

pub struct DirectMessageValidator;

#[async_trait]
impl ContextValidator for DirectMessageValidator {
    fn name(&self) -> &'static str {
        "direct_message"
    }

    async fn validate(&self, ctx: &Context) -> bool {
        let policy = &ctx.command.permissions;
        if ctx.is_direct_message {
            policy.allow_direct_message
        } else {
            !policy.require_direct_message
        }
    }
}

/// Guild-owner commands never run outside a guild.
pub struct GuildOwnerValidator;

#[async_trait]
impl ContextValidator for GuildOwnerValidator {
    fn name(&self) -> &'static str {
        "guild_owner"
    }

    async fn validate(&self, ctx: &Context) -> bool {
        !ctx.command.permissions.require_guild_owner || ctx.is_guild_owner()
    }
}

pub struct BotOwnerValidator;

#[async_trait]
impl ContextValidator for BotOwnerValidator {
    fn name(&self) -> &'static str {
        "bot_owner"
    }

    async fn validate(&self, ctx: &Context) -> bool {
        !ctx.command.permissions.require_bot_owner || ctx.is_bot_owner
    }
}

/// The author's effective channel permissions cover the command's required
/// set. Only checked in guilds.
pub struct PermissionValidator;

#[async_trait]
impl ContextValidator for PermissionValidator {
    fn name(&self) -> &'static str {
        "permissions"
    }

    async fn validate(&self, ctx: &Context) -> bool {
        if ctx.guild.is_none() {
            return true;
        }
        let required = ctx.command.permissions.required;
        if required.is_empty() {
            return true;
        }
        match ctx
            .client
            .effective_permissions(ctx.channel_id(), ctx.user.id)
            .await
        {
            Ok(granted) => {
                let allowed = granted.is_superset_of(required);
                if !allowed {
                    debug!(
                        command = %ctx.command.id,
                        missing = ?required.missing_from(granted),
                        "Missing channel permissions"
                    );
                }
                allowed
            }
            Err(e) => {
                warn!(command = %ctx.command.id, error = %e, "Permission lookup failed");
                false
            }
        }
    }
}

/// The default message chain.
pub fn message_validators() -> Vec<Arc<dyn MessageValidator>> {
    vec![Arc::new(SourceValidator), Arc::new(ChannelValidator)]
}

/// The default context chain.
pub fn context_validators() -> Vec<Arc<dyn ContextValidator>> {
    vec![
        Arc::new(MentionValidator),
        Arc::new(DirectMessageValidator),
        Arc::new(GuildOwnerValidator),
        Arc::new(BotOwnerValidator),
        Arc::new(PermissionValidator),
    ]
}

/// Run every message validator; returns the first failing name.
pub async fn check_message(
    validators: &[Arc<dyn MessageValidator>],
    event: &MessageEvent,
) -> Result<(), &'static str> {
    let results = join_all(validators.iter().map(|v| v.validate(event))).await;
    first_failure(validators.iter().map(|v| v.name()), results)
}

/// Run every context validator; returns the first failing name.
pub async fn check_context(
    validators: &[Arc<dyn ContextValidator>],
    ctx: &Context,
) -> Result<(), &'static str> {
    let results = join_all(validators.iter().map(|v| v.validate(ctx))).await;
    first_failure(validators.iter().map(|v| v.name()), results)
}

fn first_failure(
    names: impl Iterator<Item = &'static str>,
    results: Vec<bool>,
) -> Result<(), &'static str> {
    match names.zip(results).find(|(_, passed)| !passed) {
        Some((name, _)) => Err(name),
        None => Ok(()),
    }
}

//! Bot housekeeping commands.

use super::format;
use crate::command::{Command, CommandMetadata, Context, PermissionPolicy};
use crate::error::{CommandError, CommandResult};
use crate::prefix::PrefixStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Ping;

#[async_trait]
impl Command for Ping {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("ping").description("Replies with 'pong!' from the bot.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        ctx.reply("pong!").await?;
        Ok(())
    }
}

pub struct Uptime {
    pub started_at: Instant,
}

#[async_trait]
impl Command for Uptime {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("uptime").description("Shows how long the bot has been running for.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let elapsed = self.started_at.elapsed();
        ctx.reply(format!("System uptime: {}", format::uptime(elapsed)))
            .await?;
        Ok(())
    }
}

pub struct Version;

#[async_trait]
impl Command for Version {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("version").description("Shows the build and version info for the bot.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        ctx.reply(format!(
            "**{}** v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .await?;
        Ok(())
    }
}

fn prefix_policy() -> PermissionPolicy {
    PermissionPolicy {
        require_guild_owner: true,
        require_bot_mention: true,
        ..PermissionPolicy::guild_only()
    }
}

/// Groups `prefix get` and `prefix set`.
pub struct Prefix;

#[async_trait]
impl Command for Prefix {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("prefix")
            .description("Shows or changes the command prefix for this guild.")
            .usage("%A get | %A set <prefix>")
            .permissions(prefix_policy())
            .sub_commands(["prefix.get", "prefix.set"])
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let usage = ctx.command.descriptor.usage_for(ctx.alias());
        ctx.reply(format!("Usage: {usage}")).await?;
        Ok(())
    }
}

pub struct PrefixGet {
    pub prefixes: Arc<dyn PrefixStore>,
}

#[async_trait]
impl Command for PrefixGet {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("prefix.get")
            .aliases(["get"])
            .description("Shows the command prefix for this guild.")
            .permissions(prefix_policy())
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = ctx.guild_id().ok_or(CommandError::GuildOnly)?;
        let prefix = self.prefixes.prefix(Some(guild));
        ctx.reply(format!("The prefix for this guild is `{prefix}`"))
            .await?;
        Ok(())
    }
}

pub struct PrefixSet {
    pub prefixes: Arc<dyn PrefixStore>,
}

#[async_trait]
impl Command for PrefixSet {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("prefix.set")
            .aliases(["set"])
            .description("Changes the command prefix for this guild.")
            .usage("%A <prefix>")
            .permissions(prefix_policy())
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = ctx.guild_id().ok_or(CommandError::GuildOnly)?;
        let Some(value) = ctx.arguments() else {
            return Err(CommandError::InvalidArgument("missing prefix".into()));
        };
        if self.prefixes.set_prefix(guild, value).await? {
            info!(guild = %guild, prefix = value, "Guild prefix changed");
            ctx.reply(format!("Prefix set to `{value}`")).await?;
        } else {
            ctx.reply("A prefix must be 1 to 8 characters with no whitespace.")
                .await?;
        }
        Ok(())
    }
}

/// Stops the process; a supervisor is expected to restart it.
pub struct Shutdown {
    pub token: CancellationToken,
}

#[async_trait]
impl Command for Shutdown {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("shutdown")
            .aliases(["shutdown", "reboot"])
            .description("Shuts down the bot, and allows the system service to restart it.")
            .permissions(PermissionPolicy::bot_owner())
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        info!(user = %ctx.user.id, "Shutdown requested");
        ctx.reply("Shutting down.").await?;
        self.token.cancel();
        Ok(())
    }
}

//! Command declarations and the command tree.
//!
//! A command is a [`Command`] implementation plus the [`CommandMetadata`] it
//! declares. At startup [`manifest::build_tree`] turns the full set of
//! declarations into an immutable [`CommandTree`]; the dispatcher only ever
//! reads it.

mod context;
pub mod manifest;
mod registry;

pub use context::{Context, GuildInfo};
pub use registry::{CommandNode, CommandTree, NodeId, Resolved};

use crate::error::CommandResult;
use async_trait::async_trait;
use opbot_proto::{Permission, PermissionSet};
use std::time::Duration;

/// Text substituted with the invoking alias in usage templates.
pub const ALIAS_PLACEHOLDER: &str = "%A";

/// Description and usage shown by `help`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub description: String,
    /// Usage template; `%A` expands to the alias used.
    pub usage: String,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            description: "No description provided.".to_owned(),
            usage: ALIAS_PLACEHOLDER.to_owned(),
        }
    }
}

impl Descriptor {
    pub fn usage_for(&self, alias: &str) -> String {
        self.usage.replace(ALIAS_PLACEHOLDER, alias)
    }
}

/// Token bucket parameters for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    /// Share the bucket across the whole guild instead of per user.
    pub on_guild: bool,
    pub tokens: u32,
    pub period: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            on_guild: false,
            tokens: 3,
            period: Duration::from_millis(1000),
        }
    }
}

impl RateLimits {
    pub const fn per_user(tokens: u32, period: Duration) -> Self {
        Self {
            on_guild: false,
            tokens,
            period,
        }
    }

    pub const fn per_guild(tokens: u32, period: Duration) -> Self {
        Self {
            on_guild: true,
            tokens,
            period,
        }
    }
}

/// Who may invoke a command and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    pub require_bot_owner: bool,
    pub require_guild_owner: bool,
    pub require_bot_mention: bool,
    pub allow_direct_message: bool,
    pub require_direct_message: bool,
    /// Delete the invoking message after a guild command runs.
    pub remove_invocation: bool,
    pub required: PermissionSet,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            require_bot_owner: false,
            require_guild_owner: false,
            require_bot_mention: false,
            allow_direct_message: true,
            require_direct_message: false,
            remove_invocation: false,
            required: PermissionSet::command_default(),
        }
    }
}

impl PermissionPolicy {
    /// Default policy for commands that only make sense inside a guild.
    pub fn guild_only() -> Self {
        Self {
            allow_direct_message: false,
            ..Self::default()
        }
    }

    pub fn bot_owner() -> Self {
        Self {
            require_bot_owner: true,
            ..Self::default()
        }
    }

    pub fn requiring(mut self, permission: Permission) -> Self {
        self.required.insert(permission);
        self
    }
}

/// Resolved properties of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProperties {
    pub id: String,
    /// Never empty; declaration order with duplicates removed.
    pub aliases: Vec<String>,
    pub descriptor: Descriptor,
    pub rate_limits: RateLimits,
    pub permissions: PermissionPolicy,
}

impl CommandProperties {
    pub fn primary_alias(&self) -> &str {
        self.aliases.first().map_or(self.id.as_str(), String::as_str)
    }
}

/// What a command declares about itself.
///
/// Built with a small builder so declarations read like a table:
///
/// ```rust
/// use opbot::command::{CommandMetadata, PermissionPolicy};
///
/// let meta = CommandMetadata::new("prefix")
///     .description("Show or change the command prefix.")
///     .permissions(PermissionPolicy {
///         require_guild_owner: true,
///         require_bot_mention: true,
///         ..PermissionPolicy::guild_only()
///     })
///     .sub_commands(["prefix.get", "prefix.set"]);
/// assert_eq!(meta.sub_commands.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandMetadata {
    pub id: String,
    /// `None` means the id doubles as the only alias.
    pub aliases: Option<Vec<String>>,
    pub descriptor: Descriptor,
    pub rate_limits: RateLimits,
    pub permissions: PermissionPolicy,
    /// Ids of commands registered beneath this one.
    pub sub_commands: Vec<String>,
}

impl CommandMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.descriptor.usage = usage.into();
        self
    }

    pub fn rate_limits(mut self, rate_limits: RateLimits) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    pub fn permissions(mut self, permissions: PermissionPolicy) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn sub_commands<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_commands = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Split into registered properties and the sub-command list.
    ///
    /// Aliases default to the id and keep their first occurrence order.
    pub(crate) fn into_properties(self) -> (CommandProperties, Vec<String>) {
        let mut aliases: Vec<String> = Vec::new();
        for alias in self.aliases.unwrap_or_else(|| vec![self.id.clone()]) {
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        if aliases.is_empty() {
            aliases.push(self.id.clone());
        }
        (
            CommandProperties {
                id: self.id,
                aliases,
                descriptor: self.descriptor,
                rate_limits: self.rate_limits,
                permissions: self.permissions,
            },
            self.sub_commands,
        )
    }
}

/// A command handler.
///
/// One instance serves every invocation, so implementations hold only
/// shared collaborators.
#[async_trait]
pub trait Command: Send + Sync {
    fn metadata(&self) -> CommandMetadata;

    async fn execute(&self, ctx: &Context) -> CommandResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_default_to_id() {
        let (props, subs) = CommandMetadata::new("ping").into_properties();
        assert_eq!(props.aliases, ["ping"]);
        assert!(subs.is_empty());
        assert_eq!(props.descriptor.usage_for("p"), "p");
        assert_eq!(props.rate_limits, RateLimits::default());
        assert!(props.permissions.allow_direct_message);
    }

    #[test]
    fn explicit_aliases_are_deduplicated() {
        let (props, _) = CommandMetadata::new("nowplaying")
            .aliases(["np", "playing", "np"])
            .into_properties();
        assert_eq!(props.aliases, ["np", "playing"]);
        assert_eq!(props.primary_alias(), "np");
    }

    #[test]
    fn empty_alias_list_falls_back_to_id() {
        let (props, _) = CommandMetadata::new("x")
            .aliases(Vec::<String>::new())
            .into_properties();
        assert_eq!(props.aliases, ["x"]);
    }
}

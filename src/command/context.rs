//! Per-invocation context handed to command handlers.

use super::{CommandProperties, CommandTree};
use crate::error::PlatformError;
use crate::platform::ChatClient;
use opbot_proto::{Arguments, ChannelId, GuildId, MessageEvent, MessageId, User, UserId};
use std::sync::Arc;

/// Guild facts needed by validators and commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: GuildId,
    pub owner_id: UserId,
}

/// Everything a handler knows about one invocation.
///
/// Built by the dispatcher after resolution and dropped when the handler
/// returns.
pub struct Context {
    pub message: MessageEvent,
    pub user: User,
    pub guild: Option<GuildInfo>,
    /// Arguments positioned at the matched alias.
    pub args: Arguments,
    /// Aliases consumed to reach the command.
    pub path: Vec<String>,
    pub command: Arc<CommandProperties>,
    pub is_bot_owner: bool,
    pub is_direct_message: bool,
    pub was_bot_mentioned: bool,
    /// Prefix in effect where the message was sent.
    pub prefix: String,
    pub client: Arc<dyn ChatClient>,
    pub tree: Arc<CommandTree>,
}

impl Context {
    pub fn channel_id(&self) -> ChannelId {
        self.message.channel_id
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.guild.map(|g| g.id)
    }

    /// Alias the user typed for this command.
    pub fn alias(&self) -> &str {
        self.args.alias()
    }

    /// Text following the alias.
    pub fn arguments(&self) -> Option<&str> {
        self.args.arguments()
    }

    pub fn is_guild_owner(&self) -> bool {
        self.guild.is_some_and(|g| g.owner_id == self.user.id)
    }

    /// Send `content` to the invoking channel.
    pub async fn reply(&self, content: impl AsRef<str>) -> Result<MessageId, PlatformError> {
        self.client.send_message(self.channel_id(), content.as_ref()).await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command.id)
            .field("user", &self.user.id)
            .field("channel", &self.message.channel_id)
            .field("guild", &self.guild)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

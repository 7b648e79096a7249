//! Outbound collaborators: the chat API and voice connections.
//!
//! The dispatcher decides what to send; implementations of these traits
//! decide how it reaches the platform.

use crate::command::GuildInfo;
use crate::error::PlatformError;
use async_trait::async_trait;
use opbot_proto::{ChannelId, GuildId, MessageId, PermissionSet, ReactionEmoji, UserId};

/// Chat operations used by the dispatcher and commands.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The bot's own user id.
    fn current_user(&self) -> UserId;

    /// Owner of the bot application.
    async fn application_owner(&self) -> Result<UserId, PlatformError>;

    async fn guild(&self, guild_id: GuildId) -> Result<GuildInfo, PlatformError>;

    /// Permissions `user_id` holds in `channel_id` after overwrites.
    async fn effective_permissions(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<PermissionSet, PlatformError>;

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError>;

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError>;

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &ReactionEmoji,
    ) -> Result<(), PlatformError>;

    async fn remove_all_reactions(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError>;
}

/// An established voice connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceConnection {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

/// Voice state lookups and connection management.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Voice channel `user_id` currently sits in, if any.
    async fn voice_channel_of(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<ChannelId>, PlatformError>;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, PlatformError>;

    async fn disconnect(&self, guild_id: GuildId) -> Result<(), PlatformError>;
}

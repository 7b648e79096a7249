//! Inbound gateway payloads.

use crate::emoji::ReactionEmoji;
use crate::id::{ChannelId, GuildId, MessageId, UserId};

/// A message author.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bot: bool,
}

/// Kind of channel a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelKind {
    Text,
    Direct,
    Voice,
    Category,
    News,
    Unknown,
}

impl ChannelKind {
    /// Only guild text channels and direct messages carry commands.
    pub const fn accepts_commands(self) -> bool {
        matches!(self, ChannelKind::Text | ChannelKind::Direct)
    }
}

/// A message-create notification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageEvent {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub channel_kind: ChannelKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub guild_id: Option<GuildId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub author: Option<User>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub content: String,
    /// Users mentioned in the message, as resolved by the platform.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mentions: Vec<UserId>,
}

impl MessageEvent {
    pub fn is_direct(&self) -> bool {
        self.channel_kind == ChannelKind::Direct
    }

    pub fn mentions_user(&self, user: UserId) -> bool {
        self.mentions.contains(&user)
    }
}

/// A reaction-add notification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionEvent {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    pub emoji: ReactionEmoji,
}

/// A member joined, moved between or left voice channels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoiceStateEvent {
    pub guild_id: GuildId,
    pub user_id: UserId,
    /// `None` when the member left voice.
    #[cfg_attr(feature = "serde", serde(default))]
    pub channel_id: Option<ChannelId>,
}

/// A guild became available.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuildEvent {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
}

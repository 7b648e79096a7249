//! In-memory chat platform that records every outbound action.

use async_trait::async_trait;
use dashmap::DashMap;
use opbot::command::GuildInfo;
use opbot::error::PlatformError;
use opbot::platform::{ChatClient, VoiceConnection, VoiceGateway};
use opbot_proto::{ChannelId, GuildId, MessageId, PermissionSet, ReactionEmoji, UserId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// One thing the bot did on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Sent {
        channel: ChannelId,
        message: MessageId,
        content: String,
    },
    Deleted {
        message: MessageId,
    },
    Reacted {
        message: MessageId,
        emoji: String,
    },
    ClearedReactions {
        message: MessageId,
    },
    Connected {
        guild: GuildId,
        channel: ChannelId,
    },
    Disconnected {
        guild: GuildId,
    },
}

pub struct RecordingClient {
    bot_id: UserId,
    owner: Option<UserId>,
    next_message_id: AtomicU64,
    guilds: DashMap<GuildId, GuildInfo>,
    voice_states: DashMap<(GuildId, UserId), ChannelId>,
    permissions: Mutex<PermissionSet>,
    actions: Mutex<Vec<Action>>,
}

impl RecordingClient {
    pub fn new(bot_id: UserId, owner: Option<UserId>) -> Self {
        Self {
            bot_id,
            owner,
            next_message_id: AtomicU64::new(10_000),
            guilds: DashMap::new(),
            voice_states: DashMap::new(),
            permissions: Mutex::new(PermissionSet::all()),
            actions: Mutex::new(Vec::new()),
        }
    }

    pub fn add_guild(&self, id: GuildId, owner_id: UserId) {
        self.guilds.insert(id, GuildInfo { id, owner_id });
    }

    pub fn put_in_voice(&self, guild: GuildId, user: UserId, channel: ChannelId) {
        self.voice_states.insert((guild, user), channel);
    }

    /// Permissions every user holds from now on.
    pub fn grant(&self, permissions: PermissionSet) {
        *self.permissions.lock() = permissions;
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    pub fn clear(&self) {
        self.actions.lock().clear();
    }

    /// Contents of every message sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .filter_map(|a| match a {
                Action::Sent { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_sent(&self) -> Option<String> {
        self.sent().pop()
    }

    /// Poll until `pred` holds for the recorded actions.
    pub async fn wait_for(&self, pred: impl Fn(&[Action]) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if pred(&self.actions.lock()) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for bot actions");
    }

    fn record(&self, action: Action) {
        self.actions.lock().push(action);
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    fn current_user(&self) -> UserId {
        self.bot_id
    }

    async fn application_owner(&self) -> Result<UserId, PlatformError> {
        self.owner
            .ok_or_else(|| PlatformError::MissingAccess("no owner".into()))
    }

    async fn guild(&self, guild_id: GuildId) -> Result<GuildInfo, PlatformError> {
        self.guilds
            .get(&guild_id)
            .map(|g| *g)
            .ok_or(PlatformError::NotFound {
                kind: "guild",
                id: guild_id.get(),
            })
    }

    async fn effective_permissions(
        &self,
        _channel_id: ChannelId,
        _user_id: UserId,
    ) -> Result<PermissionSet, PlatformError> {
        Ok(*self.permissions.lock())
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        let message = MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed));
        self.record(Action::Sent {
            channel: channel_id,
            message,
            content: content.to_owned(),
        });
        Ok(message)
    }

    async fn delete_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.record(Action::Deleted {
            message: message_id,
        });
        Ok(())
    }

    async fn add_reaction(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        emoji: &ReactionEmoji,
    ) -> Result<(), PlatformError> {
        self.record(Action::Reacted {
            message: message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn remove_all_reactions(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.record(Action::ClearedReactions {
            message: message_id,
        });
        Ok(())
    }
}

#[async_trait]
impl VoiceGateway for RecordingClient {
    async fn voice_channel_of(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<ChannelId>, PlatformError> {
        Ok(self.voice_states.get(&(guild_id, user_id)).map(|c| *c))
    }

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, PlatformError> {
        self.record(Action::Connected {
            guild: guild_id,
            channel: channel_id,
        });
        Ok(VoiceConnection {
            guild_id,
            channel_id,
        })
    }

    async fn disconnect(&self, guild_id: GuildId) -> Result<(), PlatformError> {
        self.record(Action::Disconnected { guild: guild_id });
        Ok(())
    }
}

//! Line-delimited JSON gateway over stdin/stdout.
//!
//! Each stdin line is one [`GatewayEvent`]. Outbound actions are written to
//! the output as one JSON object per line with an `action` field. Guild
//! ownership and voice states are learned from the events themselves, so a
//! scripted session can drive every command without a real platform.

use super::{EventRouter, GatewayEvent};
use crate::command::GuildInfo;
use crate::error::PlatformError;
use crate::platform::{ChatClient, VoiceConnection, VoiceGateway};
use async_trait::async_trait;
use dashmap::DashMap;
use opbot_proto::{ChannelId, GuildId, MessageId, PermissionSet, ReactionEmoji, UserId};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// First id handed out for messages the bot sends.
const FIRST_MESSAGE_ID: u64 = 1 << 32;

/// Chat and voice client backed by a JSON line stream.
pub struct ConsoleClient {
    bot_id: UserId,
    owner_id: Option<UserId>,
    next_message_id: AtomicU64,
    guilds: DashMap<GuildId, GuildInfo>,
    voice_states: DashMap<(GuildId, UserId), ChannelId>,
    connections: DashMap<GuildId, ChannelId>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleClient {
    /// Client writing actions to stdout.
    pub fn new(bot_id: UserId, owner_id: Option<UserId>) -> Self {
        Self::with_writer(bot_id, owner_id, Box::new(std::io::stdout()))
    }

    pub fn with_writer(bot_id: UserId, owner_id: Option<UserId>, out: Box<dyn Write + Send>) -> Self {
        Self {
            bot_id,
            owner_id,
            next_message_id: AtomicU64::new(FIRST_MESSAGE_ID),
            guilds: DashMap::new(),
            voice_states: DashMap::new(),
            connections: DashMap::new(),
            out: Mutex::new(out),
        }
    }

    /// Update platform state from an inbound event.
    pub fn observe(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::GuildCreate(guild) => {
                self.guilds.insert(
                    guild.id,
                    GuildInfo {
                        id: guild.id,
                        owner_id: guild.owner_id,
                    },
                );
            }
            GatewayEvent::VoiceStateUpdate(state) => {
                let key = (state.guild_id, state.user_id);
                match state.channel_id {
                    Some(channel) => {
                        self.voice_states.insert(key, channel);
                    }
                    None => {
                        self.voice_states.remove(&key);
                    }
                }
            }
            GatewayEvent::MessageCreate(_) | GatewayEvent::ReactionAdd(_) => {}
        }
    }

    fn emit(&self, action: &str, mut fields: Value) -> Result<(), PlatformError> {
        if let Value::Object(map) = &mut fields {
            map.insert("action".to_owned(), Value::String(action.to_owned()));
        }
        let line = serde_json::to_string(&fields).map_err(|e| PlatformError::Transport(e.to_string()))?;
        let mut out = self.out.lock();
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| PlatformError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ChatClient for ConsoleClient {
    fn current_user(&self) -> UserId {
        self.bot_id
    }

    async fn application_owner(&self) -> Result<UserId, PlatformError> {
        self.owner_id
            .ok_or_else(|| PlatformError::MissingAccess("no application owner configured".into()))
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

    /// The console has no permission model; everyone holds everything.
    async fn effective_permissions(
        &self,
        _channel_id: ChannelId,
        _user_id: UserId,
    ) -> Result<PermissionSet, PlatformError> {
        Ok(PermissionSet::all())
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        let id = MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed));
        self.emit(
            "send_message",
            json!({ "channel_id": channel_id, "message_id": id, "content": content }),
        )?;
        Ok(id)
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.emit(
            "delete_message",
            json!({ "channel_id": channel_id, "message_id": message_id }),
        )
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &ReactionEmoji,
    ) -> Result<(), PlatformError> {
        self.emit(
            "add_reaction",
            json!({ "channel_id": channel_id, "message_id": message_id, "emoji": emoji }),
        )
    }

    async fn remove_all_reactions(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.emit(
            "remove_all_reactions",
            json!({ "channel_id": channel_id, "message_id": message_id }),
        )
    }
}

#[async_trait]
impl VoiceGateway for ConsoleClient {
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
        self.emit(
            "voice_connect",
            json!({ "guild_id": guild_id, "channel_id": channel_id }),
        )?;
        self.connections.insert(guild_id, channel_id);
        Ok(VoiceConnection {
            guild_id,
            channel_id,
        })
    }

    async fn disconnect(&self, guild_id: GuildId) -> Result<(), PlatformError> {
        if self.connections.remove(&guild_id).is_some() {
            self.emit("voice_disconnect", json!({ "guild_id": guild_id }))?;
        }
        Ok(())
    }
}

/// Feed stdin lines to `router` until EOF or `shutdown`.
pub async fn run_stdin(router: &EventRouter, client: &ConsoleClient, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Reading gateway events from stdin");
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<GatewayEvent>(&line) {
                Ok(event) => {
                    debug!(kind = event.kind(), "Gateway event received");
                    client.observe(&event);
                    router.route(event);
                }
                Err(e) => warn!(error = %e, "Ignoring malformed gateway line"),
            },
            Ok(None) => {
                info!("Gateway input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read gateway input");
                break;
            }
        }
    }
}

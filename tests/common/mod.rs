//! Integration test common infrastructure.
//!
//! Builds a bot with every built-in command wired to in-memory fakes, and
//! helpers for composing inbound messages.

#![allow(dead_code)]

pub mod audio;
pub mod client;

#[allow(unused_imports)]
pub use audio::{ManualPlayback, ScriptedLoader, track};
#[allow(unused_imports)]
pub use client::{Action, RecordingClient};

use opbot::audio::AudioRegistry;
use opbot::command::manifest::build_tree;
use opbot::commands::{CommandDeps, builtin};
use opbot::config::{AudioConfig, RateLimitConfig};
use opbot::dispatch::{CommandProcessor, DispatchOutcome, RateLimitManager};
use opbot::gateway::EventRouter;
use opbot::prefix::{MemoryPrefixStore, PrefixStore};
use opbot_proto::{ChannelId, ChannelKind, GuildId, MessageEvent, MessageId, User, UserId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub const BOT: UserId = UserId::new(1);
pub const OWNER: UserId = UserId::new(2);
pub const GUILD_OWNER: UserId = UserId::new(3);
pub const ALICE: UserId = UserId::new(4);
pub const BOB: UserId = UserId::new(5);

pub const GUILD: GuildId = GuildId::new(100);
pub const TEXT: ChannelId = ChannelId::new(200);
pub const DM: ChannelId = ChannelId::new(201);
pub const VOICE: ChannelId = ChannelId::new(300);

static NEXT_MESSAGE: AtomicU64 = AtomicU64::new(1);

pub struct TestBot {
    pub client: Arc<RecordingClient>,
    pub loader: Arc<ScriptedLoader>,
    pub playback: Arc<ManualPlayback>,
    pub audio: Arc<AudioRegistry>,
    pub processor: Arc<CommandProcessor>,
    pub router: EventRouter,
    pub shutdown: CancellationToken,
}

impl TestBot {
    pub fn new() -> Self {
        Self::with_audio_config(AudioConfig::default())
    }

    pub fn with_audio_config(audio_config: AudioConfig) -> Self {
        let client = Arc::new(RecordingClient::new(BOT, Some(OWNER)));
        client.add_guild(GUILD, GUILD_OWNER);

        let loader = Arc::new(ScriptedLoader::default());
        let playback = Arc::new(ManualPlayback::default());
        let audio = Arc::new(AudioRegistry::new(
            &audio_config,
            client.clone(),
            playback.clone(),
            loader.clone(),
        ));

        let prefixes: Arc<dyn PrefixStore> = Arc::new(MemoryPrefixStore::new("!"));
        let shutdown = CancellationToken::new();
        let deps = CommandDeps {
            prefixes: Arc::clone(&prefixes),
            audio: Arc::clone(&audio),
            shutdown: shutdown.clone(),
            started_at: Instant::now(),
        };
        let tree = Arc::new(build_tree(builtin(&deps)).expect("built-in commands form a tree"));
        let rate_limits = Arc::new(RateLimitManager::new(&RateLimitConfig::default()));
        let processor = Arc::new(CommandProcessor::new(
            tree,
            client.clone(),
            prefixes,
            rate_limits,
        ));
        let router = EventRouter::new(Arc::clone(&processor), Arc::clone(&audio));

        Self {
            client,
            loader,
            playback,
            audio,
            processor,
            router,
            shutdown,
        }
    }

    /// Run a guild text message from `author` through the full pipeline.
    pub async fn say(&self, author: UserId, content: &str) -> DispatchOutcome {
        self.processor.process_message(guild_message(author, content)).await
    }

    /// Run a direct message from `author` through the full pipeline.
    pub async fn dm(&self, author: UserId, content: &str) -> DispatchOutcome {
        self.processor.process_message(direct_message(author, content)).await
    }
}

pub fn user(id: UserId) -> User {
    User {
        id,
        name: format!("user{id}"),
        bot: false,
    }
}

pub fn guild_message(author: UserId, content: &str) -> MessageEvent {
    MessageEvent {
        id: MessageId::new(NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed)),
        channel_id: TEXT,
        channel_kind: ChannelKind::Text,
        guild_id: Some(GUILD),
        author: Some(user(author)),
        content: content.to_owned(),
        mentions: opbot_proto::mention::mentions_in(content),
    }
}

pub fn direct_message(author: UserId, content: &str) -> MessageEvent {
    MessageEvent {
        id: MessageId::new(NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed)),
        channel_id: DM,
        channel_kind: ChannelKind::Direct,
        guild_id: None,
        author: Some(user(author)),
        content: content.to_owned(),
        mentions: opbot_proto::mention::mentions_in(content),
    }
}

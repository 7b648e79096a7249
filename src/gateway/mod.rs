//! Inbound event routing.
//!
//! A gateway turns platform traffic into [`GatewayEvent`]s and hands them to
//! the [`EventRouter`]: messages go to the command processor, reactions to
//! pending search selections.

pub mod console;

use crate::audio::AudioRegistry;
use crate::dispatch::CommandProcessor;
use opbot_proto::{GuildEvent, MessageEvent, ReactionEvent, VoiceStateEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// One inbound platform event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    MessageCreate(MessageEvent),
    ReactionAdd(ReactionEvent),
    VoiceStateUpdate(VoiceStateEvent),
    GuildCreate(GuildEvent),
}

impl GatewayEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::MessageCreate(_) => "message_create",
            GatewayEvent::ReactionAdd(_) => "reaction_add",
            GatewayEvent::VoiceStateUpdate(_) => "voice_state_update",
            GatewayEvent::GuildCreate(_) => "guild_create",
        }
    }
}

/// Fans events out to the subsystems that consume them.
pub struct EventRouter {
    processor: Arc<CommandProcessor>,
    audio: Arc<AudioRegistry>,
}

impl EventRouter {
    pub fn new(processor: Arc<CommandProcessor>, audio: Arc<AudioRegistry>) -> Self {
        Self { processor, audio }
    }

    /// Route one event. Never blocks on command execution.
    pub fn route(&self, event: GatewayEvent) {
        trace!(kind = event.kind(), "Routing gateway event");
        match event {
            GatewayEvent::MessageCreate(message) => self.processor.spawn_message(message),
            GatewayEvent::ReactionAdd(reaction) => {
                self.audio.selections().on_reaction(&reaction);
            }
            // Platform state only; gateways track these themselves.
            GatewayEvent::VoiceStateUpdate(_) | GatewayEvent::GuildCreate(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_events() {
        let line = r#"{"type":"message_create","id":1,"channel_id":2,"channel_kind":"text","guild_id":3,"author":{"id":4,"name":"ann"},"content":"!ping"}"#;
        let event: GatewayEvent = serde_json::from_str(line).unwrap();
        let GatewayEvent::MessageCreate(message) = event else {
            panic!("expected a message");
        };
        assert_eq!(message.content, "!ping");
        assert!(message.mentions.is_empty());

        let line = r#"{"type":"reaction_add","message_id":9,"channel_id":2,"user_id":4,"emoji":"1️⃣"}"#;
        let event: GatewayEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.kind(), "reaction_add");
    }
}

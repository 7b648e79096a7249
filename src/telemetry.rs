//! Telemetry utilities for command timing and event correlation.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use opbot_proto::{ChannelId, GuildId, MessageId, UserId};
    use tracing::{Span, info_span};

    /// Span covering one inbound message.
    pub fn message(message_id: MessageId, channel_id: ChannelId, guild_id: Option<GuildId>) -> Span {
        match guild_id {
            Some(guild) => info_span!("message", id = %message_id, channel = %channel_id, guild = %guild),
            None => info_span!("message", id = %message_id, channel = %channel_id),
        }
    }

    /// Span covering one command execution.
    pub fn command(id: &str, alias: &str, user: UserId) -> Span {
        info_span!("command", id = %id, alias = %alias, user = %user)
    }
}

//! Playback backends.
//!
//! A backend starts and stops tracks for a guild and reports how each track
//! ended through the [`TrackEventSink`] it was handed.

use super::session::TrackEventSink;
use super::track::AudioTrack;
use crate::error::PlatformError;
use async_trait::async_trait;
use dashmap::DashMap;
use opbot_proto::GuildId;
use tokio::task::JoinHandle;
use tracing::debug;

/// Why a track stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEndReason {
    /// Played to the end.
    Finished,
    /// The track could not be started or broke mid-stream.
    LoadFailed,
    /// Stopped by a command.
    Stopped,
    /// Another track was started in its place.
    Replaced,
    /// The player was torn down.
    Cleanup,
}

impl TrackEndReason {
    /// Whether the queue should advance on its own.
    pub const fn may_start_next(self) -> bool {
        matches!(self, TrackEndReason::Finished | TrackEndReason::LoadFailed)
    }
}

/// Something that can play tracks into a guild's voice connection.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Start `track`, replacing whatever the guild was playing.
    async fn play(
        &self,
        guild_id: GuildId,
        track: &AudioTrack,
        events: TrackEventSink,
    ) -> Result<(), PlatformError>;

    async fn stop(&self, guild_id: GuildId) -> Result<(), PlatformError>;
}

/// Backend that plays silence: each track "finishes" once its length has
/// elapsed. Streams never finish.
#[derive(Default)]
pub struct SimulatedPlayback {
    players: DashMap<GuildId, JoinHandle<()>>,
}

impl SimulatedPlayback {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaybackBackend for SimulatedPlayback {
    async fn play(
        &self,
        guild_id: GuildId,
        track: &AudioTrack,
        events: TrackEventSink,
    ) -> Result<(), PlatformError> {
        let length = track.length();
        let is_stream = track.info().is_stream;
        let title = track.title().to_owned();

        let timer = tokio::spawn(async move {
            if is_stream {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(length).await;
            debug!(guild = %guild_id, track = %title, "Simulated track finished");
            events.ended(TrackEndReason::Finished).await;
        });

        if let Some(previous) = self.players.insert(guild_id, timer) {
            previous.abort();
        }
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> Result<(), PlatformError> {
        if let Some((_, timer)) = self.players.remove(&guild_id) {
            timer.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_natural_ends_advance() {
        assert!(TrackEndReason::Finished.may_start_next());
        assert!(TrackEndReason::LoadFailed.may_start_next());
        assert!(!TrackEndReason::Stopped.may_start_next());
        assert!(!TrackEndReason::Replaced.may_start_next());
        assert!(!TrackEndReason::Cleanup.may_start_next());
    }
}

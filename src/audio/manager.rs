//! Registry of per-guild audio sessions and shared audio collaborators.

use super::loader::{TrackLoader, load_tracks};
use super::playback::PlaybackBackend;
use super::query::{AudioQuery, SearchProvider};
use super::selection::SelectionManager;
use super::session::{AudioHandle, AudioSession};
use super::track::AudioTrack;
use crate::config::AudioConfig;
use crate::platform::VoiceGateway;
use dashmap::DashMap;
use futures_util::future::join_all;
use opbot_proto::GuildId;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns one [`AudioSession`] per guild, created on first use.
pub struct AudioRegistry {
    sessions: DashMap<GuildId, AudioHandle>,
    voice: Arc<dyn VoiceGateway>,
    playback: Arc<dyn PlaybackBackend>,
    loader: Arc<dyn TrackLoader>,
    selections: SelectionManager,
    provider: SearchProvider,
    max_search_results: usize,
}

impl AudioRegistry {
    pub fn new(
        config: &AudioConfig,
        voice: Arc<dyn VoiceGateway>,
        playback: Arc<dyn PlaybackBackend>,
        loader: Arc<dyn TrackLoader>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            voice,
            playback,
            loader,
            selections: SelectionManager::new(config.selection_timeout()),
            provider: config.search_provider,
            max_search_results: config.max_search_results.min(super::MAX_SEARCH_RESULTS),
        }
    }

    /// Existing live session for `guild_id`.
    pub fn get(&self, guild_id: GuildId) -> Option<AudioHandle> {
        self.sessions
            .get(&guild_id)
            .map(|h| h.clone())
            .filter(|h| !h.is_closed())
    }

    /// Session for `guild_id`, spawning one if none is live.
    ///
    /// Concurrent first calls for one guild spawn exactly one session.
    pub fn get_or_create(&self, guild_id: GuildId) -> AudioHandle {
        let mut entry = self.sessions.entry(guild_id).or_insert_with(|| {
            AudioSession::spawn(guild_id, self.voice.clone(), self.playback.clone())
        });
        if entry.is_closed() {
            *entry = AudioSession::spawn(guild_id, self.voice.clone(), self.playback.clone());
        }
        entry.clone()
    }

    pub fn query(&self, input: &str) -> AudioQuery {
        AudioQuery::new(input, self.provider)
    }

    /// Resolve user input into tracks. Failures yield an empty list.
    pub async fn load(&self, input: &str, expand_playlist: bool) -> Vec<AudioTrack> {
        let query = self.query(input);
        load_tracks(self.loader.as_ref(), &query, expand_playlist).await
    }

    pub fn selections(&self) -> &SelectionManager {
        &self.selections
    }

    pub fn voice(&self) -> &Arc<dyn VoiceGateway> {
        &self.voice
    }

    /// Candidates offered by a search.
    pub fn max_search_results(&self) -> usize {
        self.max_search_results
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Stop, clear and disconnect every session.
    pub async fn shutdown(&self) {
        let handles: Vec<AudioHandle> = self.sessions.iter().map(|h| h.clone()).collect();
        self.sessions.clear();
        info!(sessions = handles.len(), "Shutting down audio sessions");

        let results = join_all(handles.iter().map(|h| h.shutdown())).await;
        for (handle, result) in handles.iter().zip(results) {
            if let Err(e) = result {
                warn!(guild = %handle.guild_id(), error = %e, "Audio session shutdown failed");
            }
        }
    }
}

//! Scripted track loading and hand-driven playback.

use async_trait::async_trait;
use opbot::audio::{
    AudioTrack, LoadResult, PlaybackBackend, TrackEndReason, TrackEventSink, TrackInfo,
    TrackLoader,
};
use opbot::error::PlatformError;
use opbot_proto::GuildId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub fn track(title: &str) -> AudioTrack {
    AudioTrack::new(
        TrackInfo {
            identifier: title.to_owned(),
            title: title.to_owned(),
            author: "artist".to_owned(),
            uri: Some(format!("https://example.com/{title}")),
            length: Duration::from_secs(200),
            is_stream: false,
        },
        format!("enc:{title}"),
    )
}

/// Answers loader identifiers from a fixed table; anything else is empty.
#[derive(Default)]
pub struct ScriptedLoader {
    results: Mutex<HashMap<String, LoadResult>>,
}

impl ScriptedLoader {
    pub fn script(&self, identifier: &str, result: LoadResult) {
        self.results.lock().insert(identifier.to_owned(), result);
    }

    /// Script a free-text YouTube search returning `titles`.
    pub fn search(&self, text: &str, titles: &[&str]) {
        self.script(
            &format!("ytsearch:{text}"),
            LoadResult::Playlist {
                name: format!("Search results for: {text}"),
                tracks: titles.iter().map(|t| track(t)).collect(),
                selected: None,
                is_search: true,
            },
        );
    }
}

#[async_trait]
impl TrackLoader for ScriptedLoader {
    async fn load(&self, identifier: &str) -> LoadResult {
        self.results
            .lock()
            .get(identifier)
            .cloned()
            .unwrap_or(LoadResult::NoMatches)
    }
}

/// Playback that only ends tracks when a test says so.
#[derive(Default)]
pub struct ManualPlayback {
    started: Mutex<Vec<(String, TrackEventSink)>>,
    stops: Mutex<usize>,
}

impl ManualPlayback {
    /// Titles started so far, in order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock()
    }

    /// Report that the most recently started track played to the end.
    pub async fn finish_current(&self) {
        let sink = self.started.lock().last().map(|(_, s)| s.clone());
        if let Some(sink) = sink {
            sink.ended(TrackEndReason::Finished).await;
        }
    }
}

#[async_trait]
impl PlaybackBackend for ManualPlayback {
    async fn play(
        &self,
        _guild_id: GuildId,
        track: &AudioTrack,
        events: TrackEventSink,
    ) -> Result<(), PlatformError> {
        self.started.lock().push((track.title().to_owned(), events));
        Ok(())
    }

    async fn stop(&self, _guild_id: GuildId) -> Result<(), PlatformError> {
        *self.stops.lock() += 1;
        Ok(())
    }
}

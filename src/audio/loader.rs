//! Track loading.
//!
//! Loaders report what an identifier resolved to. [`load_tracks`] turns that
//! into a plain list: every failure becomes an empty result so commands only
//! ever have to handle "nothing found".

use super::query::AudioQuery;
use super::track::AudioTrack;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Outcome of loading one identifier.
#[derive(Debug, Clone)]
pub enum LoadResult {
    Track(AudioTrack),
    /// A playlist or a list of search results.
    Playlist {
        name: String,
        tracks: Vec<AudioTrack>,
        /// Track the link pointed at inside the playlist, if any.
        selected: Option<usize>,
        is_search: bool,
    },
    NoMatches,
    Failed(String),
}

impl LoadResult {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadResult::Track(_) => "track",
            LoadResult::Playlist { is_search: true, .. } => "search",
            LoadResult::Playlist { .. } => "playlist",
            LoadResult::NoMatches => "empty",
            LoadResult::Failed(_) => "error",
        }
    }
}

/// Resolves identifiers (links or prefixed searches) into tracks.
#[async_trait]
pub trait TrackLoader: Send + Sync {
    async fn load(&self, identifier: &str) -> LoadResult;
}

/// Loader used when no audio node is configured; nothing ever matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpTrackLoader;

#[async_trait]
impl TrackLoader for NoOpTrackLoader {
    async fn load(&self, identifier: &str) -> LoadResult {
        debug!(identifier, "No track loader configured");
        LoadResult::NoMatches
    }
}

/// Load `query` and flatten the result.
///
/// With `expand_playlist` every playlist entry is returned; otherwise only
/// the selected entry (or the first).
pub async fn load_tracks(
    loader: &dyn TrackLoader,
    query: &AudioQuery,
    expand_playlist: bool,
) -> Vec<AudioTrack> {
    match loader.load(&query.identifier).await {
        LoadResult::Track(track) => vec![track],
        LoadResult::Playlist {
            name,
            mut tracks,
            selected,
            ..
        } => {
            if expand_playlist {
                debug!(playlist = %name, tracks = tracks.len(), "Loaded playlist");
                tracks
            } else {
                let pick = selected.filter(|i| *i < tracks.len()).unwrap_or(0);
                if tracks.is_empty() {
                    Vec::new()
                } else {
                    vec![tracks.swap_remove(pick)]
                }
            }
        }
        LoadResult::NoMatches => Vec::new(),
        LoadResult::Failed(reason) => {
            warn!(identifier = %query.identifier, reason = %reason, "Track load failed");
            Vec::new()
        }
    }
}

//! Loaded tracks.

use opbot_proto::UserId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Metadata reported by the track loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Provider-specific identifier.
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub uri: Option<String>,
    pub length: Duration,
    pub is_stream: bool,
}

/// A playable track.
///
/// Cheap to clone; the metadata and playback handle are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    info: Arc<TrackInfo>,
    /// Opaque handle the playback backend needs to start the track.
    encoded: Arc<str>,
    requester: Option<UserId>,
}

impl AudioTrack {
    pub fn new(info: TrackInfo, encoded: impl Into<Arc<str>>) -> Self {
        Self {
            info: Arc::new(info),
            encoded: encoded.into(),
            requester: None,
        }
    }

    /// Same track, attributed to `user`.
    pub fn requested_by(mut self, user: UserId) -> Self {
        self.requester = Some(user);
        self
    }

    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn length(&self) -> Duration {
        self.info.length
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn requester(&self) -> Option<UserId> {
        self.requester
    }
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}** by {}", self.info.title, self.info.author)
    }
}

//! Track loader backed by a Lavalink v4 node's REST API.

use super::loader::{LoadResult, TrackLoader};
use super::track::{AudioTrack, TrackInfo};
use crate::config::LavalinkConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(tag = "loadType", content = "data", rename_all = "lowercase")]
enum LoadResponse {
    Track(RawTrack),
    Playlist(RawPlaylist),
    Search(Vec<RawTrack>),
    Empty(IgnoredAny),
    Error(RawException),
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    encoded: String,
    info: RawTrackInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrackInfo {
    identifier: String,
    author: String,
    /// Milliseconds.
    length: u64,
    is_stream: bool,
    title: String,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    info: RawPlaylistInfo,
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlaylistInfo {
    name: String,
    /// -1 when no track is selected.
    selected_track: i64,
}

#[derive(Debug, Deserialize)]
struct RawException {
    message: Option<String>,
    severity: String,
}

impl From<RawTrack> for AudioTrack {
    fn from(raw: RawTrack) -> Self {
        AudioTrack::new(
            TrackInfo {
                identifier: raw.info.identifier,
                title: raw.info.title,
                author: raw.info.author,
                uri: raw.info.uri,
                length: Duration::from_millis(raw.info.length),
                is_stream: raw.info.is_stream,
            },
            raw.encoded,
        )
    }
}

impl From<LoadResponse> for LoadResult {
    fn from(response: LoadResponse) -> Self {
        match response {
            LoadResponse::Track(track) => LoadResult::Track(track.into()),
            LoadResponse::Playlist(playlist) => LoadResult::Playlist {
                name: playlist.info.name,
                selected: usize::try_from(playlist.info.selected_track).ok(),
                tracks: playlist.tracks.into_iter().map(Into::into).collect(),
                is_search: false,
            },
            LoadResponse::Search(tracks) => LoadResult::Playlist {
                name: "Search results".to_owned(),
                tracks: tracks.into_iter().map(Into::into).collect(),
                selected: None,
                is_search: true,
            },
            LoadResponse::Empty(_) => LoadResult::NoMatches,
            LoadResponse::Error(e) => LoadResult::Failed(format!(
                "{} ({})",
                e.message.unwrap_or_else(|| "unknown error".to_owned()),
                e.severity
            )),
        }
    }
}

/// Loads tracks through `GET /v4/loadtracks`.
pub struct LavalinkLoader {
    http: reqwest::Client,
    base_url: String,
    password: String,
}

impl LavalinkLoader {
    pub fn new(config: &LavalinkConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_owned(),
            password: config.password.clone(),
        })
    }

    async fn fetch(&self, identifier: &str) -> Result<LoadResponse, reqwest::Error> {
        self.http
            .get(format!("{}/v4/loadtracks", self.base_url))
            .query(&[("identifier", identifier)])
            .header(reqwest::header::AUTHORIZATION, &self.password)
            .send()
            .await?
            .error_for_status()?
            .json::<LoadResponse>()
            .await
    }
}

#[async_trait]
impl TrackLoader for LavalinkLoader {
    async fn load(&self, identifier: &str) -> LoadResult {
        match self.fetch(identifier).await {
            Ok(response) => {
                let result = LoadResult::from(response);
                debug!(identifier, result = result.kind(), "Lavalink load finished");
                result
            }
            Err(e) => LoadResult::Failed(e.to_string()),
        }
    }
}

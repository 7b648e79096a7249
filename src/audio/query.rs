//! Classifying user input into loader identifiers.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)https?://[^\s/$.?#][^\s]*$").expect("static regex")
});

static PLAYLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^https?://
        (?:
            (?:www\.|m\.|music\.)?youtube\.com/(?:playlist|watch)\?(?:.*&)?list=[\w-]+
          | (?:www\.|m\.)?soundcloud\.com/[^/\s]+/sets/[^/\s?]+
        )",
    )
    .expect("static regex")
});

/// Where free-text searches go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    YouTube,
    SoundCloud,
}

impl SearchProvider {
    /// Loader prefix that turns text into a search.
    pub const fn search_prefix(self) -> &'static str {
        match self {
            SearchProvider::YouTube => "ytsearch:",
            SearchProvider::SoundCloud => "scsearch:",
        }
    }
}

/// Shape of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    DirectLink,
    PlaylistLink,
    Search,
}

impl QueryKind {
    pub fn classify(input: &str) -> Self {
        let input = input.trim();
        if PLAYLIST.is_match(input) {
            QueryKind::PlaylistLink
        } else if URL.is_match(input) {
            QueryKind::DirectLink
        } else {
            QueryKind::Search
        }
    }
}

/// A query ready for the track loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioQuery {
    pub kind: QueryKind,
    /// Identifier passed to the loader: the link itself, or the search text
    /// with the provider prefix.
    pub identifier: String,
}

impl AudioQuery {
    pub fn new(input: &str, provider: SearchProvider) -> Self {
        let input = input.trim();
        let kind = QueryKind::classify(input);
        let identifier = match kind {
            QueryKind::Search => format!("{}{}", provider.search_prefix(), input),
            QueryKind::DirectLink | QueryKind::PlaylistLink => input.to_owned(),
        };
        Self { kind, identifier }
    }
}

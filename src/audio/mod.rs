//! Guild audio: track loading, per-guild playback sessions and search
//! selection.
//!
//! - `query`: classifying input as link, playlist or search
//! - `loader` / `lavalink`: resolving identifiers into tracks
//! - `playback`: backends that play a track into a voice connection
//! - `session`: the per-guild actor owning queue, player and connection
//! - `manager`: get-or-create registry of sessions
//! - `selection`: pending reaction-driven search selections

mod lavalink;
mod loader;
mod manager;
mod playback;
mod query;
mod selection;
mod session;
mod track;

pub use lavalink::LavalinkLoader;
pub use loader::{LoadResult, NoOpTrackLoader, TrackLoader, load_tracks};
pub use manager::AudioRegistry;
pub use playback::{PlaybackBackend, SimulatedPlayback, TrackEndReason};
pub use query::{AudioQuery, QueryKind, SearchProvider};
pub use selection::{AudioSearchSelection, SelectionManager, SelectionOutcome, SelectionWaiter};
pub use session::{
    AudioHandle, AudioSession, JoinOutcome, NowPlaying, OfferOutcome, PlayerState,
    SessionSnapshot, TrackEventSink,
};
pub use track::{AudioTrack, TrackInfo};

/// Most candidates a search offers; one per digit reaction 1-8.
pub const MAX_SEARCH_RESULTS: usize = 8;

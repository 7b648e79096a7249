//! Built-in commands.
//!
//! - `system`: ping, uptime, version, prefix, shutdown
//! - `fun`: roll, 8ball
//! - `help`: help, commands
//! - `audio`: guild voice playback

mod audio;
mod format;
mod fun;
mod help;
mod system;

use crate::audio::AudioRegistry;
use crate::command::Command;
use crate::prefix::PrefixStore;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Collaborators shared by the built-in commands.
#[derive(Clone)]
pub struct CommandDeps {
    pub prefixes: Arc<dyn PrefixStore>,
    pub audio: Arc<AudioRegistry>,
    /// Cancelled by `shutdown`.
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

/// Every built-in command, ready for [`crate::command::manifest::build_tree`].
pub fn builtin(deps: &CommandDeps) -> Vec<Arc<dyn Command>> {
    let audio = || Arc::clone(&deps.audio);
    vec![
        Arc::new(system::Ping),
        Arc::new(system::Uptime {
            started_at: deps.started_at,
        }),
        Arc::new(system::Version),
        Arc::new(system::Prefix),
        Arc::new(system::PrefixGet {
            prefixes: Arc::clone(&deps.prefixes),
        }),
        Arc::new(system::PrefixSet {
            prefixes: Arc::clone(&deps.prefixes),
        }),
        Arc::new(system::Shutdown {
            token: deps.shutdown.clone(),
        }),
        Arc::new(fun::Roll),
        Arc::new(fun::EightBall),
        Arc::new(help::Help),
        Arc::new(help::AllCommands),
        Arc::new(audio::Join { audio: audio() }),
        Arc::new(audio::Leave { audio: audio() }),
        Arc::new(audio::Youtube { audio: audio() }),
        Arc::new(audio::YoutubeSearch { audio: audio() }),
        Arc::new(audio::Next { audio: audio() }),
        Arc::new(audio::Shuffle { audio: audio() }),
        Arc::new(audio::Clear { audio: audio() }),
        Arc::new(audio::Stop { audio: audio() }),
        Arc::new(audio::NowPlaying { audio: audio() }),
        Arc::new(audio::Queue { audio: audio() }),
    ]
}

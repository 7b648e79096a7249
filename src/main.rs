//! opbot - command dispatch and guild audio for chat bots.
//!
//! Runs the built-in commands against the console gateway: one JSON event
//! per stdin line, one JSON action per stdout line.

use anyhow::Context as _;
use opbot::audio::{
    AudioRegistry, LavalinkLoader, NoOpTrackLoader, PlaybackBackend, SimulatedPlayback,
    TrackLoader,
};
use opbot::command::manifest::build_tree;
use opbot::commands::{CommandDeps, builtin};
use opbot::config::{self, Config, LogFormat};
use opbot::db::Database;
use opbot::dispatch::{CommandProcessor, RateLimitManager, spawn_bucket_sweeper};
use opbot::gateway::EventRouter;
use opbot::gateway::console::{ConsoleClient, run_stdin};
use opbot::platform::{ChatClient, VoiceGateway};
use opbot::prefix::{MemoryPrefixStore, PrefixStore, SqlitePrefixStore};
use opbot::{http, metrics};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries gateway actions; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started_at = Instant::now();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    init_tracing(config.logging.format);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        name = %config.bot.name,
        user_id = %config.bot.user_id,
        version = env!("CARGO_PKG_VERSION"),
        "Starting opbot"
    );

    let shutdown = CancellationToken::new();

    // Convention: metrics_port = 0 disables the HTTP endpoint.
    if config.bot.metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        let port = config.bot.metrics_port;
        tokio::spawn(http::run_http_server(port, shutdown.clone()));
        info!(port, "Prometheus HTTP server started");
    }

    let prefixes: Arc<dyn PrefixStore> = match &config.database {
        Some(db_config) => {
            let db = Database::new(&db_config.path)
                .await
                .with_context(|| format!("failed to open database {}", db_config.path))?;
            Arc::new(SqlitePrefixStore::load(db, config.bot.default_prefix.clone()).await?)
        }
        None => {
            info!("No database configured; prefixes are kept in memory");
            Arc::new(MemoryPrefixStore::new(config.bot.default_prefix.clone()))
        }
    };

    let loader: Arc<dyn TrackLoader> = match &config.audio.lavalink {
        Some(lavalink) => {
            info!(url = %lavalink.url, "Loading tracks through Lavalink");
            Arc::new(LavalinkLoader::new(lavalink)?)
        }
        None => {
            warn!("No Lavalink node configured; track loading is disabled");
            Arc::new(NoOpTrackLoader)
        }
    };
    let playback: Arc<dyn PlaybackBackend> = Arc::new(SimulatedPlayback::new());

    let client = Arc::new(ConsoleClient::new(config.bot.user_id, config.bot.owner_id));
    let voice: Arc<dyn VoiceGateway> = client.clone();
    let audio = Arc::new(AudioRegistry::new(&config.audio, voice, playback, loader));

    let deps = CommandDeps {
        prefixes: Arc::clone(&prefixes),
        audio: Arc::clone(&audio),
        shutdown: shutdown.clone(),
        started_at,
    };
    let tree = Arc::new(build_tree(builtin(&deps)).context("invalid command set")?);
    info!(commands = tree.len(), "Command tree built");

    let rate_limits = Arc::new(RateLimitManager::new(&config.rate_limits));
    let chat: Arc<dyn ChatClient> = client.clone();
    let processor = Arc::new(
        CommandProcessor::new(tree, chat, prefixes, Arc::clone(&rate_limits))
            .with_owner(config.bot.owner_id),
    );

    let sweeper = spawn_bucket_sweeper(
        rate_limits,
        config.rate_limits.sweep_interval(),
        shutdown.clone(),
    );

    let router = EventRouter::new(processor, Arc::clone(&audio));
    tokio::select! {
        _ = run_stdin(&router, &client, shutdown.clone()) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupt received"),
        _ = shutdown.cancelled() => info!("Shutdown requested"),
    }

    shutdown.cancel();
    audio.shutdown().await;
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Bucket sweeper ended abnormally");
    }
    info!("opbot stopped");
    Ok(())
}

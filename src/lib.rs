//! # opbot
//!
//! Command dispatch and guild audio engine for chat bots.
//!
//! A gateway turns platform traffic into events. Messages flow through the
//! [`dispatch::CommandProcessor`]: validators, prefix or mention stripping,
//! command tree resolution, per-command rate limits, then the handler. Audio
//! commands drive one [`audio::AudioSession`] actor per guild.
//!
//! - [`command`]: the command trait, metadata and the arena command tree
//! - [`commands`]: built-in commands
//! - [`dispatch`]: the message pipeline, validators and rate limiting
//! - [`audio`]: track loading, per-guild sessions and search selection
//! - [`gateway`]: event routing and the console gateway
//! - [`prefix`]: per-guild prefixes, in memory or SQLite backed

pub mod audio;
pub mod cache;
pub mod command;
pub mod commands;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod http;
pub mod metrics;
pub mod platform;
pub mod prefix;
pub mod telemetry;

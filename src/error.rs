//! Error hierarchy for the dispatcher and its collaborators.
//!
//! Configuration problems in the command tree are fatal at startup. Everything
//! raised while handling a single event is caught at the dispatcher boundary
//! and only logged, with `error_code()` used as the metrics label.

use thiserror::Error;

// ============================================================================
// Command tree configuration errors
// ============================================================================

/// Errors raised while building the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command #{index} declares no id")]
    MissingId { index: usize },

    #[error("command id `{0}` is registered more than once")]
    DuplicateId(String),

    #[error("alias `{alias}` of `{id}` is already used by `{existing}`")]
    DuplicateAlias {
        alias: String,
        id: String,
        existing: String,
    },

    #[error("alias `{alias}` of `{id}` is empty or contains whitespace")]
    InvalidAlias { alias: String, id: String },

    #[error("command `{0}` lists itself as a sub-command")]
    SelfReference(String),

    #[error("command `{parent}` lists sub-command `{child}` more than once")]
    DuplicateSubCommand { parent: String, child: String },

    #[error("command `{parent}` references unknown sub-command `{child}`")]
    UnknownSubCommand { parent: String, child: String },

    #[error("command `{child}` is a sub-command of both `{first}` and `{second}`")]
    MultipleParents {
        child: String,
        first: String,
        second: String,
    },

    #[error("sub-command cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("commands never reached from a root: {}", .0.join(", "))]
    Unreachable(Vec<String>),

    #[error("command `{0}` has a rate limit with zero tokens or a zero period")]
    InvalidRateLimit(String),
}

impl RegistryError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingId { .. } => "missing_id",
            Self::DuplicateId(_) => "duplicate_id",
            Self::DuplicateAlias { .. } => "duplicate_alias",
            Self::InvalidAlias { .. } => "invalid_alias",
            Self::SelfReference(_) => "self_reference",
            Self::DuplicateSubCommand { .. } => "duplicate_sub_command",
            Self::UnknownSubCommand { .. } => "unknown_sub_command",
            Self::MultipleParents { .. } => "multiple_parents",
            Self::Cycle(_) => "cycle",
            Self::Unreachable(_) => "unreachable",
            Self::InvalidRateLimit(_) => "invalid_rate_limit",
        }
    }
}

// ============================================================================
// Outbound platform errors
// ============================================================================

/// Failures reported by chat, voice and playback collaborators.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("missing access: {0}")]
    MissingAccess(String),

    #[error("unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

impl PlatformError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAccess(_) => "missing_access",
            Self::NotFound { .. } => "not_found",
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
        }
    }
}

// ============================================================================
// Audio errors
// ============================================================================

/// Errors from a guild audio session.
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("audio session for guild {0} has shut down")]
    SessionClosed(u64),

    #[error("voice error: {0}")]
    Voice(#[from] PlatformError),
}

impl AudioError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SessionClosed(_) => "session_closed",
            Self::Voice(e) => e.error_code(),
        }
    }
}

// ============================================================================
// Handler errors
// ============================================================================

/// Errors a command handler may return.
///
/// These are logged by the dispatcher and never sent to the user. Commands
/// that want a visible message reply before returning.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("command requires a guild")]
    GuildOnly,

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Prefix(#[from] crate::prefix::PrefixError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CommandError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::GuildOnly => "guild_only",
            Self::Platform(e) => e.error_code(),
            Self::Audio(e) => e.error_code(),
            Self::Prefix(_) => "prefix_store",
            Self::Internal(_) => "internal_error",
        }
    }
}

pub type CommandResult = Result<(), CommandError>;

// ============================================================================
// Dispatch aborts
// ============================================================================

/// Why an inbound message did not execute a command.
///
/// Aborts are silent: nothing is sent back to the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    /// A message-level validator rejected the event.
    InvalidMessage(&'static str),
    /// Neither the prefix nor a bot mention started the message.
    NoInvocation,
    /// The first alias matched no command.
    Unresolved,
    /// A context-level validator rejected the invocation.
    Rejected(&'static str),
    RateLimited,
}

impl Abort {
    #[inline]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidMessage(_) => "invalid_message",
            Self::NoInvocation => "no_invocation",
            Self::Unresolved => "unresolved",
            Self::Rejected(_) => "rejected",
            Self::RateLimited => "rate_limited",
        }
    }
}

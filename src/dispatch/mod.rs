//! Inbound message dispatch.
//!
//! - `validation`: message and context validator chains
//! - `rate_limit`: per-command token buckets
//! - `processor`: the pipeline tying them to the command tree

mod processor;
mod rate_limit;
mod validation;

pub use processor::{CommandProcessor, DispatchOutcome};
pub use rate_limit::{RateLimitManager, RateLimitScope, quota};
pub use validation::{
    BotOwnerValidator, ChannelValidator, ContextValidator, DirectMessageValidator,
    GuildOwnerValidator, MentionValidator, MessageValidator, PermissionValidator, SourceValidator,
    check_context, check_message, context_validators, message_validators,
};

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Periodically drop idle rate limit buckets until `shutdown` fires.
pub fn spawn_bucket_sweeper(
    rate_limits: Arc<RateLimitManager>,
    every: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let removed = rate_limits.purge_expired();
                    if removed > 0 {
                        debug!(removed, remaining = rate_limits.bucket_count(), "Swept idle rate limit buckets");
                    }
                }
            }
        }
    })
}

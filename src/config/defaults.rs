//! Default value functions for configuration.

use opbot_proto::UserId;

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_bot_name() -> String {
    "opbot".to_string()
}

pub fn default_bot_user_id() -> UserId {
    UserId::new(1)
}

pub fn default_prefix() -> String {
    "!".to_string()
}

// =============================================================================
// Audio Defaults
// =============================================================================

pub fn default_selection_timeout_secs() -> u64 {
    10
}

pub fn default_max_search_results() -> usize {
    8
}

// =============================================================================
// Rate Limit Defaults
// =============================================================================

pub fn default_user_idle_secs() -> u64 {
    180
}

pub fn default_guild_idle_secs() -> u64 {
    300
}

pub fn default_sweep_interval_secs() -> u64 {
    60
}

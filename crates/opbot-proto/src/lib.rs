//! # opbot-proto
//!
//! Platform-neutral value types shared by the opbot dispatcher and its
//! gateways:
//!
//! - [`Arguments`]: head/remainder splitting of command text
//! - Snowflake ids ([`GuildId`], [`UserId`], [`ChannelId`], [`MessageId`])
//! - [`Permission`] flags and [`PermissionSet`]
//! - Inbound events ([`MessageEvent`], [`ReactionEvent`], [`VoiceStateEvent`])
//! - Reaction emoji and mention helpers
//!
//! ```rust
//! use opbot_proto::Arguments;
//!
//! let args = Arguments::from("prefix set ?");
//! assert_eq!(args.alias(), "prefix");
//! assert_eq!(args.next().alias(), "set");
//! assert_eq!(args.next().arguments(), Some("?"));
//! ```

#![deny(clippy::all)]

pub mod args;
pub mod emoji;
pub mod event;
pub mod id;
pub mod mention;
pub mod permission;

pub use self::args::Arguments;
pub use self::emoji::ReactionEmoji;
pub use self::event::{ChannelKind, GuildEvent, MessageEvent, ReactionEvent, User, VoiceStateEvent};
pub use self::id::{ChannelId, GuildId, MessageId, UserId};
pub use self::permission::{Permission, PermissionSet, UnknownPermission};

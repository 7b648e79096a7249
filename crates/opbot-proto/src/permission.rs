//! Channel permission flags.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single platform permission.
///
/// Discriminants are the bit positions used by the platform's permission
/// integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Permission {
    CreateInstantInvite = 0,
    KickMembers = 1,
    BanMembers = 2,
    Administrator = 3,
    ManageChannels = 4,
    ManageGuild = 5,
    AddReactions = 6,
    ViewChannel = 10,
    SendMessages = 11,
    ManageMessages = 13,
    EmbedLinks = 14,
    AttachFiles = 15,
    ReadMessageHistory = 16,
    MentionEveryone = 17,
    UseExternalEmojis = 18,
    Connect = 20,
    Speak = 21,
    MuteMembers = 22,
    DeafenMembers = 23,
    MoveMembers = 24,
    ManageRoles = 28,
}

impl Permission {
    pub const ALL: [Permission; 21] = [
        Permission::CreateInstantInvite,
        Permission::KickMembers,
        Permission::BanMembers,
        Permission::Administrator,
        Permission::ManageChannels,
        Permission::ManageGuild,
        Permission::AddReactions,
        Permission::ViewChannel,
        Permission::SendMessages,
        Permission::ManageMessages,
        Permission::EmbedLinks,
        Permission::AttachFiles,
        Permission::ReadMessageHistory,
        Permission::MentionEveryone,
        Permission::UseExternalEmojis,
        Permission::Connect,
        Permission::Speak,
        Permission::MuteMembers,
        Permission::DeafenMembers,
        Permission::MoveMembers,
        Permission::ManageRoles,
    ];

    pub const fn bit(self) -> u64 {
        1 << (self as u64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Permission::CreateInstantInvite => "CREATE_INSTANT_INVITE",
            Permission::KickMembers => "KICK_MEMBERS",
            Permission::BanMembers => "BAN_MEMBERS",
            Permission::Administrator => "ADMINISTRATOR",
            Permission::ManageChannels => "MANAGE_CHANNELS",
            Permission::ManageGuild => "MANAGE_GUILD",
            Permission::AddReactions => "ADD_REACTIONS",
            Permission::ViewChannel => "VIEW_CHANNEL",
            Permission::SendMessages => "SEND_MESSAGES",
            Permission::ManageMessages => "MANAGE_MESSAGES",
            Permission::EmbedLinks => "EMBED_LINKS",
            Permission::AttachFiles => "ATTACH_FILES",
            Permission::ReadMessageHistory => "READ_MESSAGE_HISTORY",
            Permission::MentionEveryone => "MENTION_EVERYONE",
            Permission::UseExternalEmojis => "USE_EXTERNAL_EMOJIS",
            Permission::Connect => "CONNECT",
            Permission::Speak => "SPEAK",
            Permission::MuteMembers => "MUTE_MEMBERS",
            Permission::DeafenMembers => "DEAFEN_MEMBERS",
            Permission::MoveMembers => "MOVE_MEMBERS",
            Permission::ManageRoles => "MANAGE_ROLES",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a permission name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPermission(s.to_owned()))
    }
}

/// A set of permissions stored as the platform's bit integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PermissionSet(u64);

impl PermissionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every known permission.
    pub fn all() -> Self {
        Permission::ALL.into_iter().collect()
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// The set a command requires unless it declares otherwise.
    pub const fn command_default() -> Self {
        Self(Permission::ReadMessageHistory.bit() | Permission::SendMessages.bit())
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.bit();
    }

    pub fn with(mut self, permission: Permission) -> Self {
        self.insert(permission);
        self
    }

    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// `true` when every permission in `required` is present in `self`.
    ///
    /// `Administrator` implies every other permission.
    pub const fn is_superset_of(self, required: PermissionSet) -> bool {
        if self.contains(Permission::Administrator) {
            return true;
        }
        self.0 & required.0 == required.0
    }

    /// Permissions in `self` that are missing from `granted`.
    pub fn missing_from(self, granted: PermissionSet) -> Vec<Permission> {
        self.iter().filter(|p| !granted.contains(*p)).collect()
    }

    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = PermissionSet::empty();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSet {
    fn from(perms: [Permission; N]) -> Self {
        perms.into_iter().collect()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for p in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            f.write_str(p.name())?;
        }
        Ok(())
    }
}

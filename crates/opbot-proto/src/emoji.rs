//! Reaction emoji used by interactive replies.

use std::fmt;

/// Keycap digits one through ten, in selection order.
pub const DIGITS: [&str; 10] = [
    "1\u{20E3}",
    "2\u{20E3}",
    "3\u{20E3}",
    "4\u{20E3}",
    "5\u{20E3}",
    "6\u{20E3}",
    "7\u{20E3}",
    "8\u{20E3}",
    "9\u{20E3}",
    "\u{1F51F}",
];

/// Shown when an interactive selection expires.
pub const TIMER: &str = "\u{23F2}";
pub const ARROW_FORWARD: &str = "\u{25B6}";
pub const EIGHT_BALL: &str = "\u{1F3B1}";

/// Zero-based index of a keycap digit, if `emoji` is one.
pub fn digit_index(emoji: &str) -> Option<usize> {
    if let Some(i) = DIGITS.iter().position(|d| *d == emoji) {
        return Some(i);
    }
    // Some clients insert the emoji presentation selector.
    let stripped = emoji.replace('\u{FE0F}', "");
    DIGITS.iter().position(|d| *d == stripped)
}

/// Keycap for a zero-based index.
pub fn digit(index: usize) -> Option<&'static str> {
    DIGITS.get(index).copied()
}

/// An emoji attached to a reaction event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ReactionEmoji {
    Unicode(String),
    Custom { id: u64, name: String },
}

impl ReactionEmoji {
    pub fn unicode(value: impl Into<String>) -> Self {
        ReactionEmoji::Unicode(value.into())
    }

    /// Zero-based keycap index for unicode digit reactions.
    pub fn digit_index(&self) -> Option<usize> {
        match self {
            ReactionEmoji::Unicode(s) => digit_index(s),
            ReactionEmoji::Custom { .. } => None,
        }
    }
}

impl fmt::Display for ReactionEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionEmoji::Unicode(s) => f.write_str(s),
            ReactionEmoji::Custom { id, name } => write!(f, "<:{name}:{id}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_lookup() {
        assert_eq!(digit_index("1\u{20E3}"), Some(0));
        assert_eq!(digit_index("8\u{20E3}"), Some(7));
        assert_eq!(digit_index("\u{1F51F}"), Some(9));
        assert_eq!(digit_index("3\u{FE0F}\u{20E3}"), Some(2));
        assert_eq!(digit_index(TIMER), None);
        assert_eq!(digit(4), Some("5\u{20E3}"));
        assert_eq!(digit(10), None);
    }

    #[test]
    fn custom_emoji_is_never_a_digit() {
        let emoji = ReactionEmoji::Custom {
            id: 1,
            name: "one".into(),
        };
        assert_eq!(emoji.digit_index(), None);
        assert_eq!(emoji.to_string(), "<:one:1>");
    }
}

//! User mention tokens (`<@id>` and the nickname form `<@!id>`).

use crate::id::UserId;

/// Parse a single token as a user mention.
pub fn parse_user_mention(token: &str) -> Option<UserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// `true` if `token` mentions `user`.
pub fn is_mention_of(token: &str, user: UserId) -> bool {
    parse_user_mention(token) == Some(user)
}

pub fn format_user_mention(user: UserId) -> String {
    format!("<@{user}>")
}

/// Every user mentioned anywhere in `content`.
pub fn mentions_in(content: &str) -> Vec<UserId> {
    let mut found = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("<@") {
        let candidate = &rest[start..];
        match candidate.find('>') {
            Some(end) => {
                if let Some(id) = parse_user_mention(&candidate[..=end]) {
                    if !found.contains(&id) {
                        found.push(id);
                    }
                }
                rest = &candidate[end + 1..];
            }
            None => break,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_mention_forms() {
        assert_eq!(parse_user_mention("<@42>"), Some(UserId::new(42)));
        assert_eq!(parse_user_mention("<@!42>"), Some(UserId::new(42)));
        assert_eq!(parse_user_mention("<@&42>"), None);
        assert_eq!(parse_user_mention("<@>"), None);
        assert_eq!(parse_user_mention("@42"), None);
        assert!(is_mention_of("<@!7>", UserId::new(7)));
        assert_eq!(format_user_mention(UserId::new(7)), "<@7>");
    }

    #[test]
    fn scans_content() {
        let ids = mentions_in("hey <@1> and <@!2>, not <#3> or <@1> again <@");
        assert_eq!(ids, vec![UserId::new(1), UserId::new(2)]);
    }
}

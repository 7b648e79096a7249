//! Alias/argument splitting.
//!
//! Command text is consumed one token at a time: the head is the alias for
//! the current tree level and the remainder is handed to the next level.

use std::fmt;

/// A head token plus the unparsed remainder of an invocation.
///
/// The head is empty exactly when the parsed input was empty or blank; in
/// that case the remainder is always `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arguments {
    alias: String,
    arguments: Option<String>,
}

impl Arguments {
    /// The canonical empty value.
    pub const fn empty() -> Self {
        Self {
            alias: String::new(),
            arguments: None,
        }
    }

    /// Split `input` on its first run of whitespace.
    ///
    /// Leading whitespace is ignored. A remainder that would be empty is
    /// reported as `None`.
    pub fn parse(input: Option<&str>) -> Self {
        let Some(input) = input else {
            return Self::empty();
        };

        let input = input.trim_start();
        if input.is_empty() {
            return Self::empty();
        }

        match input.find(char::is_whitespace) {
            None => Self {
                alias: input.to_owned(),
                arguments: None,
            },
            Some(split) => {
                let (alias, rest) = input.split_at(split);
                let rest = rest.trim_start();
                Self {
                    alias: alias.to_owned(),
                    arguments: (!rest.is_empty()).then(|| rest.to_owned()),
                }
            }
        }
    }

    /// Re-parse the remainder.
    pub fn next(&self) -> Self {
        Self::parse(self.arguments.as_deref())
    }

    /// Head token; empty for blank input.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Everything after the head token.
    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.alias.is_empty()
    }

    /// Iterate over successive heads until the input is exhausted.
    pub fn tokens(&self) -> Tokens {
        Tokens {
            current: self.clone(),
        }
    }
}

impl From<&str> for Arguments {
    fn from(input: &str) -> Self {
        Self::parse(Some(input))
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arguments {
            Some(rest) => write!(f, "{} {}", self.alias, rest),
            None => f.write_str(&self.alias),
        }
    }
}

/// Iterator returned by [`Arguments::tokens`].
#[derive(Debug, Clone)]
pub struct Tokens {
    current: Arguments,
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.current.is_empty() {
            return None;
        }
        let next = self.current.next();
        let head = std::mem::replace(&mut self.current, next);
        Some(head.alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_head_and_remainder() {
        let args = Arguments::from("a b c");
        assert_eq!(args.alias(), "a");
        assert_eq!(args.arguments(), Some("b c"));

        let args = args.next();
        assert_eq!(args.alias(), "b");
        assert_eq!(args.arguments(), Some("c"));

        let args = args.next();
        assert_eq!(args.alias(), "c");
        assert_eq!(args.arguments(), None);

        assert_eq!(args.next(), Arguments::empty());
    }

    #[test]
    fn blank_inputs_are_canonical_empty() {
        assert_eq!(Arguments::parse(None), Arguments::empty());
        assert_eq!(Arguments::from(""), Arguments::empty());
        assert_eq!(Arguments::from("   "), Arguments::empty());
        assert_eq!(Arguments::from("\n\t "), Arguments::empty());
        assert_eq!(Arguments::empty().next(), Arguments::empty());
    }

    #[test]
    fn newline_runs_split_once() {
        let args = Arguments::from("d3 \n args on new-line");
        assert_eq!(args.alias(), "d3");
        assert_eq!(args.arguments(), Some("args on new-line"));
    }

    #[test]
    fn trailing_whitespace_has_no_remainder() {
        let args = Arguments::from("ping   ");
        assert_eq!(args.alias(), "ping");
        assert_eq!(args.arguments(), None);
    }

    #[test]
    fn tokens_walk_every_head() {
        let heads: Vec<String> = Arguments::from("help prefix  set").tokens().collect();
        assert_eq!(heads, ["help", "prefix", "set"]);
    }

    #[test]
    fn display_rejoins_head_and_remainder() {
        assert_eq!(Arguments::from("yt  never gonna").to_string(), "yt never gonna");
    }

    proptest! {
        #[test]
        fn repeated_next_terminates(input in "\\PC{0,64}") {
            let mut args = Arguments::from(input.as_str());
            let mut steps = 0usize;
            while !args.is_empty() {
                args = args.next();
                steps += 1;
                prop_assert!(steps <= input.len());
            }
            prop_assert_eq!(args, Arguments::empty());
        }

        #[test]
        fn head_never_contains_whitespace(input in "[a-z \\n\\t]{0,32}") {
            let args = Arguments::from(input.as_str());
            prop_assert!(!args.alias().contains(char::is_whitespace));
            prop_assert_eq!(args.is_empty(), input.trim().is_empty());
        }
    }
}

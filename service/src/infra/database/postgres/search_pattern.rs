//! [`SearchPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `ILIKE` pattern matching every whitespace-separated word of the input, in
/// order, anywhere in the scanned text.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct SearchPattern(String);

impl SearchPattern {
    /// Creates a new [`SearchPattern`] out of the given `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self(format!(
            "%{}%",
            input.split_whitespace().format_with("%", |word, f| {
                f(&format_args!(
                    "{}",
                    word.replace('\\', r"\\")
                        .replace('%', r"\%")
                        .replace('_', r"\_")
                ))
            }),
        ))
    }
}

#[cfg(test)]
mod spec {
    use super::SearchPattern;

    #[test]
    fn words_match_in_order_anywhere() {
        assert_eq!(
            SearchPattern::new("toyota corolla").to_string(),
            "%toyota%corolla%",
        );
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(
            SearchPattern::new(r"100% _new_").to_string(),
            r"%100\%%\_new\_%",
        );
    }
}

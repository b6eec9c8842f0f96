//! The compiled matcher a scan runs with.
//!
//! Scanning never compiles patterns itself. Callers compile once with
//! [`compile_pattern`] (or [`regex::Regex::new`]) and hand the result to
//! every consumer, so a bad pattern is rejected before any I/O happens.
//!
//! # Dialect
//!
//! Patterns use the `regex` crate syntax: character classes, negated
//! classes, anchors, and quantifiers behave as in PCRE. Look-around and
//! backreferences are not supported; a pattern that can never match is
//! written `\b\B` rather than `(?!)`.

use regex::Regex;

use crate::error::PatternError;

/// A compiled matcher that can count its occurrences in a text blob.
///
/// Counting follows "find all" semantics: matches are found by a greedy
/// left-to-right scan, never overlap, and capture groups are ignored.
pub trait Pattern: Sync {
    /// Returns the number of non-overlapping matches in `haystack`.
    fn count_matches(&self, haystack: &str) -> usize;

    /// Returns the source text of the pattern.
    fn as_str(&self) -> &str;
}

impl Pattern for Regex {
    #[inline]
    fn count_matches(&self, haystack: &str) -> usize {
        self.find_iter(haystack).count()
    }

    #[inline]
    fn as_str(&self) -> &str {
        Regex::as_str(self)
    }
}

/// Compiles `source` into a [`Regex`].
///
/// # Examples
///
/// ```
/// use tally_core::{Pattern, compile_pattern};
///
/// let digits = compile_pattern("[0-9]").unwrap();
/// assert_eq!(digits.count_matches("abc123"), 3);
/// ```
pub fn compile_pattern(source: &str) -> Result<Regex, PatternError> {
    Regex::new(source).map_err(|source_err| PatternError {
        pattern: source.to_owned(),
        source: source_err,
    })
}

//! The path to match-count mapping produced by a scan.
//!
//! A [`ScanResult`] is a plain key/value table: insertion order carries no
//! meaning and two results are equal when they hold the same paths with the
//! same counts. Keys are unique, so combining results is a key union and a
//! repeated path is reported as a [`MergeConflict`].

use std::collections::hash_map::Entry;
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MergeConflict;

/// Mapping from file path to the number of pattern matches in that file.
///
/// # Examples
///
/// ```
/// use tally_core::ScanResult;
/// use camino::{Utf8Path, Utf8PathBuf};
///
/// let mut top = ScanResult::new();
/// top.insert(Utf8PathBuf::from("t1/a.txt"), 3).unwrap();
///
/// let mut child = ScanResult::new();
/// child.insert(Utf8PathBuf::from("t1/d1/b.txt"), 0).unwrap();
///
/// top.merge(child).unwrap();
/// assert_eq!(top.len(), 2);
/// assert_eq!(top.get(Utf8Path::new("t1/a.txt")), Some(3));
/// ```
///
/// Deserialization goes through [`insert`](Self::insert), so a document
/// that repeats a path is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    counts: FxHashMap<Utf8PathBuf, usize>,
}

impl ScanResult {
    /// Creates an empty result.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty result with room for `capacity` paths.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Records the match count for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeConflict`] if `path` already has a count. The existing
    /// count is left untouched.
    pub fn insert(&mut self, path: Utf8PathBuf, count: usize) -> Result<(), MergeConflict> {
        match self.counts.entry(path) {
            Entry::Occupied(entry) => Err(MergeConflict {
                path: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(count);
                Ok(())
            }
        }
    }

    /// Moves every entry of `other` into `self`.
    ///
    /// Merging an empty result is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`MergeConflict`] on the first path present in both results.
    pub fn merge(&mut self, other: Self) -> Result<(), MergeConflict> {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return Ok(());
        }

        self.counts.reserve(other.counts.len());
        for (path, count) in other.counts {
            self.insert(path, count)?;
        }
        Ok(())
    }

    /// Returns the count recorded for `path`.
    #[must_use]
    pub fn get(&self, path: &Utf8Path) -> Option<usize> {
        self.counts.get(path).copied()
    }

    /// Returns `true` if `path` has a recorded count.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.counts.contains_key(path)
    }

    /// Returns the number of paths in the result.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if the result holds no paths.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over `(path, count)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8Path, usize)> {
        self.counts
            .iter()
            .map(|(path, count)| (path.as_path(), *count))
    }

    /// Iterates over the recorded paths in arbitrary order.
    pub fn paths(&self) -> impl Iterator<Item = &Utf8Path> {
        self.counts.keys().map(Utf8PathBuf::as_path)
    }

    /// Returns the sum of all counts.
    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.counts.values().sum()
    }

    /// Returns the entries ordered by path, for display.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&Utf8Path, usize)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = (&'a Utf8Path, usize);
    type IntoIter = Box<dyn Iterator<Item = (&'a Utf8Path, usize)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<'de> Deserialize<'de> for ScanResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ScanResultVisitor)
    }
}

struct ScanResultVisitor;

impl<'de> Visitor<'de> for ScanResultVisitor {
    type Value = ScanResult;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map from file path to match count")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut result = ScanResult::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some((path, count)) = map.next_entry::<Utf8PathBuf, usize>()? {
            result.insert(path, count).map_err(serde::de::Error::custom)?;
        }
        Ok(result)
    }
}

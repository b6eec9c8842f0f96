//! Flat file enumeration for completeness audits.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to list
//! every regular file under a root in one pass, and [`AuditReport`], which
//! compares that list against the keys of a recursive [`ScanResult`].
//!
//! The walker applies the same entry policy as the recursive scan: no ignore
//! files, hidden entries included, symlinked files counted, symlinked
//! directories not followed.
//!
//! # Examples
//!
//! ```ignore
//! use tally_scanner::FileWalker;
//! use camino::Utf8Path;
//!
//! let walker = FileWalker::new(Utf8Path::new("/path/to/tree"))?;
//! let paths = walker.collect_paths()?;
//!
//! for path in &paths {
//!     println!("Found: {path}");
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use rustc_hash::FxHashSet;
use serde::Serialize;
use tally_core::ScanResult;

use crate::error::ScanError;
use crate::listing::{EntryKind, classify};
use crate::validate_root;

/// A file walker that enumerates every countable file in a directory tree.
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] if the root doesn't exist and
    /// [`ScanError::NotADirectory`] if it isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        validate_root(root)?;
        Ok(Self {
            root: root.to_owned(),
        })
    }

    /// Collects all countable file paths in the directory tree.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    /// Returns [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            // The root itself is not a file of the tree
            if entry.depth() == 0 {
                continue;
            }

            let Some(file_type) = entry.file_type() else {
                continue;
            };

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;

            if classify(utf8_path, file_type) == EntryKind::File {
                paths.push(utf8_path.to_owned());
            }
        }

        Ok(paths)
    }

    /// Builds the ignore walker with every filter disabled.
    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            // Disable .gitignore, .ignore, and hidden-file filtering
            .standard_filters(false)
            // Symlinked directories are opaque
            .follow_links(false)
            .threads(1)
            .require_git(false)
            .build()
    }
}

/// The difference between a flat enumeration and a scan result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Files on disk that the result has no count for, sorted.
    pub missing: Vec<Utf8PathBuf>,
    /// Result keys that are not files on disk, sorted.
    pub unexpected: Vec<Utf8PathBuf>,
}

impl AuditReport {
    /// Compares the enumerated `expected` paths with the keys of `result`.
    #[must_use]
    pub fn compare(expected: &[Utf8PathBuf], result: &ScanResult) -> Self {
        let expected_set: FxHashSet<&Utf8Path> =
            expected.iter().map(Utf8PathBuf::as_path).collect();

        let mut missing: Vec<Utf8PathBuf> = expected
            .iter()
            .filter(|path| !result.contains(path))
            .cloned()
            .collect();
        let mut unexpected: Vec<Utf8PathBuf> = result
            .paths()
            .filter(|path| !expected_set.contains(path))
            .map(Utf8Path::to_path_buf)
            .collect();

        missing.sort_unstable();
        unexpected.sort_unstable();
        Self {
            missing,
            unexpected,
        }
    }

    /// Returns `true` if the result covers exactly the enumerated files.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

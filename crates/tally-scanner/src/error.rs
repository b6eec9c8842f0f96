//! Error types for the tally-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during directory traversal and match counting, and [`ErrorKind`] for
//! classifying them.

use camino::Utf8PathBuf;
use tally_core::MergeConflict;

/// Broad classification of a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The root exists but is not a directory.
    InvalidArgument,
    /// The root does not exist.
    NotFound,
    /// A file or directory could not be opened, listed, or decoded.
    Read,
    /// Two results contained the same path.
    MergeConflict,
    /// Configuration, encoding, or cancellation problems.
    Internal,
}

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **Root errors** ([`ScanError::NotFound`], [`ScanError::NotADirectory`]): Fatal
/// - **Listing errors** ([`ScanError::List`]): Fatal - abort the whole scan
/// - **File read errors** ([`ScanError::Read`]): Fatal by default, skipped
///   under [`ReadErrorPolicy::Skip`](crate::ReadErrorPolicy::Skip)
/// - **Merge conflicts** ([`ScanError::MergeConflict`]): Fatal - a path was
///   produced twice
///
/// # Examples
///
/// ```
/// use tally_scanner::{ErrorKind, ScanError};
/// use camino::Utf8PathBuf;
///
/// let err = ScanError::NotFound(Utf8PathBuf::from("/missing"));
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert!(err.is_fatal());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The scan root does not exist.
    #[error("root path does not exist: {0}")]
    NotFound(Utf8PathBuf),

    /// The scan root exists but is not a directory.
    #[error("root path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// Failed to list a directory.
    #[error("failed to list directory {path}: {source}")]
    List {
        /// The directory that couldn't be listed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a file as text.
    ///
    /// Covers both open failures and content that is not valid UTF-8.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The same path was produced twice while merging results.
    #[error(transparent)]
    MergeConflict(#[from] MergeConflict),

    /// The flat completeness walker failed.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Invalid scanner configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A path is not valid UTF-8.
    ///
    /// Result keys are UTF-8 paths; entries with other names cannot be
    /// recorded.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Work was abandoned because another branch of the scan failed.
    #[error("scan cancelled after an earlier failure")]
    Cancelled,
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::List`] error.
    #[inline]
    pub fn list(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::List {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) => ErrorKind::InvalidArgument,
            Self::List { .. } | Self::Read { .. } | Self::Walk(_) => ErrorKind::Read,
            Self::MergeConflict(_) => ErrorKind::MergeConflict,
            Self::Config(_) | Self::NonUtf8Path(_) | Self::Cancelled => ErrorKind::Internal,
        }
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    ///
    /// Only per-file read errors qualify; they are skipped when the scanner
    /// runs with [`ReadErrorPolicy::Skip`](crate::ReadErrorPolicy::Skip).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::NotFound(path)
            | Self::NotADirectory(path)
            | Self::List { path, .. }
            | Self::Read { path, .. } => Some(path),
            Self::MergeConflict(conflict) => Some(&conflict.path),
            Self::Walk(_) | Self::Config(_) | Self::NonUtf8Path(_) | Self::Cancelled => None,
        }
    }
}

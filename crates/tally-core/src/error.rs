//! Error types for the tally-core crate.
//!
//! This module provides the errors shared across the workspace:
//!
//! - [`ConfigError`] for configuration loading and validation
//! - [`PatternError`] for regular expressions that fail to compile
//! - [`MergeConflict`] for duplicate paths while combining scan results

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use tally_core::ConfigError;
///
/// let error = ConfigError::InvalidOption {
///     option: "scan.max_parallel_jobs".to_owned(),
///     reason: "must be at least 1".to_owned(),
/// };
/// assert!(error.to_string().contains("max_parallel_jobs"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// A regular expression failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern '{pattern}': {source}")]
pub struct PatternError {
    /// The pattern source that was rejected.
    pub pattern: String,
    /// The underlying compile error.
    #[source]
    pub source: regex::Error,
}

/// Two scan results both contained the same path.
///
/// Paths are unique on a filesystem, so a collision can only come from a
/// path-construction bug. It is reported instead of overwriting a count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate path while merging scan results: {path}")]
pub struct MergeConflict {
    /// The path present in both results.
    pub path: Utf8PathBuf,
}

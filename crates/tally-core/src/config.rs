//! Configuration structures for tally.
//!
//! This module provides configuration types for each component:
//!
//! - [`ScanConfig`] - Traversal settings (parallelism, read-error policy, order)
//! - [`ReportConfig`] - Rendering settings for the reporting sinks
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a configuration file only needs the options it
//! changes.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Order in which the entries of each directory are visited.
///
/// Scan results never depend on the order; this exists so the invariance
/// can be exercised and so sequential scans can be made reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// The order the operating system lists entries in.
    #[default]
    Listed,
    /// Lexicographic order by path.
    Sorted,
    /// A pseudo-random permutation per directory, derived from `seed`.
    Shuffled {
        /// Seed for the permutation.
        seed: u64,
    },
}

/// Output format for the reporting sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Text bar chart, one row per file.
    #[default]
    Bars,
    /// JSON document.
    Json,
}

/// Configuration for the tree scanner.
///
/// # Examples
///
/// ```
/// use tally_core::{ScanConfig, TraversalOrder};
///
/// let config = ScanConfig::default();
/// assert!(config.parallel);
/// assert!(!config.skip_unreadable);
/// assert_eq!(config.order, TraversalOrder::Listed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scan sibling directories and files concurrently.
    pub parallel: bool,

    /// Maximum number of worker threads.
    /// `None` means use all available CPU cores.
    pub max_parallel_jobs: Option<usize>,

    /// Skip files that cannot be read as text instead of aborting the scan.
    pub skip_unreadable: bool,

    /// Directory entry visitation order.
    pub order: TraversalOrder,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_parallel_jobs: None,
            skip_unreadable: false,
            order: TraversalOrder::Listed,
        }
    }
}

/// Configuration for the reporting sink.
///
/// # Examples
///
/// ```
/// use tally_core::{ReportConfig, ReportFormat};
///
/// let config = ReportConfig::default();
/// assert_eq!(config.format, ReportFormat::Bars);
/// assert_eq!(config.bar_width, 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format.
    pub format: ReportFormat,

    /// Width in characters of the longest bar in the bar chart.
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Bars,
            bar_width: 40,
        }
    }
}

/// Root configuration for tally.
///
/// # Examples
///
/// ```
/// use tally_core::Config;
///
/// let config: Config = serde_json::from_str(r#"{"scan": {"parallel": false}}"#).unwrap();
/// assert!(!config.scan.parallel);
/// assert_eq!(config.report.bar_width, 40);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner configuration.
    pub scan: ScanConfig,

    /// Reporting configuration.
    pub report: ReportConfig,
}

impl Config {
    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON for this structure, and
    /// [`ConfigError::InvalidOption`] if validation fails.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path.as_std_path()).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.max_parallel_jobs == Some(0) {
            return Err(ConfigError::invalid_option(
                "scan.max_parallel_jobs",
                "must be at least 1",
            ));
        }
        if self.report.bar_width == 0 {
            return Err(ConfigError::invalid_option(
                "report.bar_width",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

//! Recursive directory scanner that counts regex matches per file.
//!
//! This crate is the traversal-and-count engine of tally. It visits every
//! file reachable under a root directory, counts the non-overlapping matches
//! of one compiled [`Pattern`] in each file's full content, and merges the
//! per-directory results into one [`ScanResult`] for the whole tree.
//!
//! # Overview
//!
//! - [`scan`]: sequential scan with the default policies
//! - [`Scanner`]: configurable scan (parallelism, thread count, read-error
//!   policy, traversal order) returning a [`ScanReport`]
//! - [`FileWalker`]: flat enumeration used by [`Scanner::audit`] to check
//!   that a result covers every file on disk
//! - [`ScanStats`]: atomic counters reported with each scan
//!
//! # Example
//!
//! ```ignore
//! use tally_scanner::{Scanner, ScanConfig};
//! use tally_core::compile_pattern;
//! use camino::Utf8Path;
//!
//! let pattern = compile_pattern("[0-9]")?;
//! let scanner = Scanner::new(ScanConfig::new(Utf8Path::new("./data")))?;
//!
//! let report = scanner.scan(&pattern)?;
//! for (path, count) in report.result.sorted() {
//!     println!("{path}: {count}");
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Scanner (entry point)
//!     │
//!     ├── TreeWalk (recursive fork-join)
//!     │       │
//!     │       ├── list_dir (one directory level)
//!     │       └── ScanResult::merge (key union)
//!     │
//!     ├── FileWalker (flat audit walk, ignore crate)
//!     │
//!     └── ScanStats (atomic counters)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod listing;
mod stats;
mod tree;
mod walker;

pub use error::{ErrorKind, ScanError};
pub use stats::{ScanStats, StatsSnapshot};
pub use walker::{AuditReport, FileWalker};

use std::io;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use tally_core::{Pattern, ScanResult, TraversalOrder};
use tracing::{debug, info, warn};

use crate::tree::TreeWalk;

/// What to do when a file cannot be read as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReadErrorPolicy {
    /// Abort the whole scan with [`ScanError::Read`].
    #[default]
    Abort,
    /// Leave the file out of the result and record it in
    /// [`ScanReport::skipped`].
    Skip,
}

/// Configuration for the scanner.
///
/// # Examples
///
/// ```
/// use tally_scanner::{ReadErrorPolicy, ScanConfig};
/// use tally_core::TraversalOrder;
/// use camino::Utf8Path;
///
/// let config = ScanConfig::new(Utf8Path::new("./data"))
///     .with_parallel(false)
///     .with_order(TraversalOrder::Sorted)
///     .with_read_policy(ReadErrorPolicy::Skip);
/// assert!(!config.parallel);
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: Utf8PathBuf,
    /// Whether sibling directories and files are scanned concurrently.
    pub parallel: bool,
    /// Worker thread count for a dedicated pool; `None` uses the global pool.
    pub threads: Option<usize>,
    /// Handling of unreadable files.
    pub read_policy: ReadErrorPolicy,
    /// Directory entry visitation order.
    pub order: TraversalOrder,
}

impl ScanConfig {
    /// Creates a new scan configuration with the given root directory.
    ///
    /// Defaults: parallel, global thread pool, abort on read errors, entries
    /// in listing order.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            parallel: true,
            threads: None,
            read_policy: ReadErrorPolicy::Abort,
            order: TraversalOrder::Listed,
        }
    }

    /// Creates a configuration from file-level settings.
    #[must_use]
    pub fn from_settings(root: &Utf8Path, settings: &tally_core::ScanConfig) -> Self {
        let read_policy = if settings.skip_unreadable {
            ReadErrorPolicy::Skip
        } else {
            ReadErrorPolicy::Abort
        };

        Self::new(root)
            .with_parallel(settings.parallel)
            .with_threads(settings.max_parallel_jobs)
            .with_read_policy(read_policy)
            .with_order(settings.order)
    }

    /// Configures whether to scan siblings concurrently.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Configures a dedicated worker pool size.
    #[must_use]
    pub const fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Configures the handling of unreadable files.
    #[must_use]
    pub const fn with_read_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    /// Configures the directory entry visitation order.
    #[must_use]
    pub const fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }
}

/// Result of a scan operation.
#[derive(Debug)]
pub struct ScanReport {
    /// Match count per file.
    pub result: ScanResult,
    /// Statistics snapshot from the scan.
    pub stats: StatsSnapshot,
    /// Files left out under [`ReadErrorPolicy::Skip`], with the reason.
    pub skipped: Vec<(Utf8PathBuf, ScanError)>,
}

/// The main scanner.
///
/// A `Scanner` holds only its configuration. Every call to
/// [`scan`](Self::scan) builds its result, statistics, and cancellation
/// state from scratch, so scans never influence each other.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Scanner configuration.
    config: ScanConfig,
}

impl Scanner {
    /// Creates a new scanner with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] if the root doesn't exist,
    /// [`ScanError::NotADirectory`] if it isn't a directory, and
    /// [`ScanError::Config`] for a zero thread count.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        validate_root(&config.root)?;

        if config.threads == Some(0) {
            return Err(ScanError::config("thread count must be at least 1"));
        }

        debug!(
            root = %config.root,
            parallel = config.parallel,
            threads = ?config.threads,
            read_policy = ?config.read_policy,
            order = ?config.order,
            "Creating scanner"
        );

        Ok(Self { config })
    }

    /// Scans the configured tree with `pattern`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised anywhere in the tree; no partial
    /// result is returned. See [`ScanError`] for which errors are fatal.
    pub fn scan<P: Pattern + ?Sized>(&self, pattern: &P) -> Result<ScanReport, ScanError> {
        let root = &self.config.root;
        validate_root(root)?;

        debug!(root = %root, pattern = pattern.as_str(), "Starting scan");
        let started = Instant::now();

        let stats = ScanStats::new();
        let walk = TreeWalk::new(
            pattern,
            &stats,
            self.config.order,
            self.config.read_policy,
            self.config.parallel,
        );

        let outcome = match self.config.threads {
            Some(threads) if self.config.parallel => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ScanError::config(format!("failed to build thread pool: {e}")))?;
                pool.install(|| walk.run(root))
            }
            _ => walk.run(root),
        };

        let (result, skipped) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(root = %root, error = %e, "Scan failed");
                return Err(e);
            }
        };

        let stats = stats.snapshot();
        info!(
            directories = stats.directories,
            files = stats.files,
            matches = stats.matches,
            skipped = stats.skipped,
            mean_matches = stats.mean_matches(),
            elapsed = ?started.elapsed(),
            "Scan completed"
        );

        Ok(ScanReport {
            result,
            stats,
            skipped,
        })
    }

    /// Checks that `result` covers exactly the files under the root.
    ///
    /// The comparison uses a flat [`FileWalker`] enumeration, independent of
    /// the recursive traversal that produced `result`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if the flat enumeration fails.
    pub fn audit(&self, result: &ScanResult) -> Result<AuditReport, ScanError> {
        let expected = FileWalker::new(&self.config.root)?.collect_paths()?;
        let report = AuditReport::compare(&expected, result);

        if !report.is_complete() {
            warn!(
                missing = report.missing.len(),
                unexpected = report.unexpected.len(),
                "Scan result does not match the files on disk"
            );
        }

        Ok(report)
    }
}

/// Scans the tree under `root` and returns the match count of every file.
///
/// Runs sequentially, aborts on the first unreadable file, and visits
/// entries in listing order. Keys are `root` joined with each file's
/// relative path.
///
/// # Errors
///
/// - [`ScanError::NotFound`] if `root` does not exist
/// - [`ScanError::NotADirectory`] if `root` is not a directory
/// - [`ScanError::Read`] if a file cannot be read as UTF-8 text
/// - [`ScanError::List`] if a directory cannot be listed
///
/// # Examples
///
/// ```ignore
/// use tally_core::compile_pattern;
/// use camino::Utf8Path;
///
/// let digits = compile_pattern("[0-9]")?;
/// let result = tally_scanner::scan(Utf8Path::new("/t1"), &digits)?;
/// assert_eq!(result.get(Utf8Path::new("/t1/a.txt")), Some(3));
/// ```
pub fn scan<P: Pattern + ?Sized>(root: &Utf8Path, pattern: &P) -> Result<ScanResult, ScanError> {
    let scanner = Scanner::new(ScanConfig::new(root).with_parallel(false))?;
    scanner.scan(pattern).map(|report| report.result)
}

/// Checks that `root` names an existing directory.
pub(crate) fn validate_root(root: &Utf8Path) -> Result<(), ScanError> {
    match std::fs::metadata(root.as_std_path()) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(root.to_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ScanError::NotFound(root.to_owned())),
        Err(e) => Err(ScanError::list(root, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_new() {
        let config = ScanConfig::new(Utf8Path::new("./data"));
        assert_eq!(config.root.as_str(), "./data");
        assert!(config.parallel);
        assert!(config.threads.is_none());
        assert_eq!(config.read_policy, ReadErrorPolicy::Abort);
        assert_eq!(config.order, TraversalOrder::Listed);
    }

    #[test]
    fn test_scan_config_from_settings() {
        let settings = tally_core::ScanConfig {
            parallel: false,
            max_parallel_jobs: Some(2),
            skip_unreadable: true,
            order: TraversalOrder::Shuffled { seed: 3 },
        };
        let config = ScanConfig::from_settings(Utf8Path::new("./data"), &settings);

        assert!(!config.parallel);
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.read_policy, ReadErrorPolicy::Skip);
        assert_eq!(config.order, TraversalOrder::Shuffled { seed: 3 });
    }

    #[test]
    fn test_scanner_missing_root() {
        let config = ScanConfig::new(Utf8Path::new("/nonexistent/path/that/does/not/exist"));
        let err = Scanner::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_scanner_rejects_zero_threads() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let err = Scanner::new(ScanConfig::new(&root).with_threads(Some(0))).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_only_completion_is_logged_at_info() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join("a.txt"), "abc123").unwrap();

        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let digits = regex::Regex::new("[0-9]").unwrap();
        let result = tracing::subscriber::with_default(subscriber, || scan(&root, &digits)).unwrap();
        assert_eq!(result.get(&root.join("a.txt")), Some(3));

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        assert_eq!(output.lines().count(), 1, "{output}");
        assert!(output.contains("Scan completed"));
        assert!(output.contains("mean_matches=3"));
        assert!(!output.contains("Creating scanner"));
        assert!(!output.contains("Starting scan"));
    }
}

//! Scan statistics with atomic counters.
//!
//! This module provides [`ScanStats`] for counting work while a scan runs
//! and [`StatsSnapshot`] for the point-in-time view attached to a
//! [`ScanReport`](crate::ScanReport).
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. Statistics are informational and never feed back into the
//! scan result.
//!
//! # Examples
//!
//! ```
//! use tally_scanner::ScanStats;
//!
//! let stats = ScanStats::new();
//! stats.increment_directories();
//! stats.record_file(3);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.files, 1);
//! assert_eq!(snapshot.matches, 3);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for scan statistics.
///
/// A fresh instance is created for every scan, so counters never carry over
/// between calls.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Number of directories listed, including the root.
    directories: AtomicU64,
    /// Number of files read and counted.
    files: AtomicU64,
    /// Number of counted files with at least one match.
    files_with_matches: AtomicU64,
    /// Sum of match counts over all counted files.
    matches: AtomicU64,
    /// Number of files skipped after a read error.
    skipped: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the directories counter.
    #[inline]
    pub fn increment_directories(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one counted file with `matches` occurrences.
    #[inline]
    pub fn record_file(&self, matches: usize) {
        self.files.fetch_add(1, Ordering::Relaxed);
        if matches > 0 {
            self.files_with_matches.fetch_add(1, Ordering::Relaxed);
            self.matches
                .fetch_add(u64::try_from(matches).unwrap_or(u64::MAX), Ordering::Relaxed);
        }
    }

    /// Increments the skipped files counter.
    #[inline]
    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all statistics.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            directories: self.directories.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            files_with_matches: self.files_with_matches.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of scan statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Number of directories listed, including the root.
    pub directories: u64,
    /// Number of files read and counted.
    pub files: u64,
    /// Number of counted files with at least one match.
    pub files_with_matches: u64,
    /// Sum of match counts over all counted files.
    pub matches: u64,
    /// Number of files skipped after a read error.
    pub skipped: u64,
}

impl StatsSnapshot {
    /// Returns the mean number of matches per counted file.
    ///
    /// Returns 0.0 if no files were counted.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_scanner::StatsSnapshot;
    ///
    /// let snap = StatsSnapshot {
    ///     files: 4,
    ///     matches: 10,
    ///     ..Default::default()
    /// };
    /// assert!((snap.mean_matches() - 2.5).abs() < f64::EPSILON);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn mean_matches(&self) -> f64 {
        if self.files == 0 {
            return 0.0;
        }

        self.matches as f64 / self.files as f64
    }
}

//! Recursive traversal and match counting.
//!
//! [`TreeWalk`] mirrors the directory tree with plain recursion: each call
//! lists one directory, counts its files, recurses into its subdirectories,
//! and returns the key union of everything below it. A leaf directory is an
//! ordinary base case that returns its own counts, and an empty directory
//! returns an empty [`ScanResult`].
//!
//! # Parallel Mode
//!
//! With parallelism enabled the tree is scanned as a rayon fork-join:
//!
//! 1. `rayon::join` splits a directory's files from its subdirectories
//! 2. Each side reduces into thread-local results with `try_fold`/`try_reduce`
//! 3. Results are merged into the parent only after both sides finish
//!
//! No mapping is shared between workers. The first real failure is parked in
//! a mutex and raises a cancellation flag. Branches that have not started
//! listing or reading yet bail out with [`ScanError::Cancelled`], and the
//! parked error is what the caller sees.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use rayon::prelude::*;
use tally_core::{Pattern, ScanResult, TraversalOrder};
use tracing::{debug, warn};

use crate::ReadErrorPolicy;
use crate::error::ScanError;
use crate::listing::list_dir;
use crate::stats::ScanStats;

/// Files skipped under [`ReadErrorPolicy::Skip`], with the reason.
pub(crate) type Skipped = Vec<(Utf8PathBuf, ScanError)>;

/// State for one scan of one tree.
pub(crate) struct TreeWalk<'a, P: Pattern + ?Sized> {
    pattern: &'a P,
    stats: &'a ScanStats,
    order: TraversalOrder,
    policy: ReadErrorPolicy,
    parallel: bool,
    cancelled: AtomicBool,
    first_error: Mutex<Option<ScanError>>,
    skipped: Mutex<Skipped>,
}

impl<'a, P: Pattern + ?Sized> TreeWalk<'a, P> {
    pub(crate) fn new(
        pattern: &'a P,
        stats: &'a ScanStats,
        order: TraversalOrder,
        policy: ReadErrorPolicy,
        parallel: bool,
    ) -> Self {
        Self {
            pattern,
            stats,
            order,
            policy,
            parallel,
            cancelled: AtomicBool::new(false),
            first_error: Mutex::new(None),
            skipped: Mutex::new(Vec::new()),
        }
    }

    /// Scans the tree rooted at `root`.
    ///
    /// On failure no partial result is returned; the error is the first one
    /// raised anywhere in the tree.
    pub(crate) fn run(self, root: &Utf8Path) -> Result<(ScanResult, Skipped), ScanError> {
        match self.scan_dir(root) {
            Ok(result) => {
                let mut skipped = self.skipped.into_inner();
                skipped.sort_unstable_by(|a, b| a.0.cmp(&b.0));
                Ok((result, skipped))
            }
            Err(err) => Err(self.first_error.into_inner().unwrap_or(err)),
        }
    }

    fn scan_dir(&self, dir: &Utf8Path) -> Result<ScanResult, ScanError> {
        self.check_cancelled()?;

        let listing = list_dir(dir, self.order).map_err(|e| self.fail(e))?;
        self.stats.increment_directories();
        debug!(
            dir = %dir,
            dirs = listing.dirs.len(),
            files = listing.files.len(),
            "Listed directory"
        );

        let (files, children) = if self.parallel {
            let (files, children) = rayon::join(
                || self.count_files_parallel(&listing.files),
                || self.scan_dirs_parallel(&listing.dirs),
            );
            (files?, children?)
        } else {
            let files = self.count_files_sequential(&listing.files)?;
            let children = self.scan_dirs_sequential(&listing.dirs)?;
            (files, children)
        };

        let mut result = files;
        self.absorb(&mut result, children)?;
        Ok(result)
    }

    fn count_files_sequential(&self, files: &[Utf8PathBuf]) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::with_capacity(files.len());
        for path in files {
            if let Some(count) = self.count_file(path)? {
                self.record(&mut result, path, count)?;
            }
        }
        Ok(result)
    }

    fn scan_dirs_sequential(&self, dirs: &[Utf8PathBuf]) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::new();
        for dir in dirs {
            let child = self.scan_dir(dir)?;
            self.absorb(&mut result, child)?;
        }
        Ok(result)
    }

    fn count_files_parallel(&self, files: &[Utf8PathBuf]) -> Result<ScanResult, ScanError> {
        files
            .par_iter()
            .try_fold(
                ScanResult::new,
                |mut acc: ScanResult, path: &Utf8PathBuf| -> Result<ScanResult, ScanError> {
                    if let Some(count) = self.count_file(path)? {
                        self.record(&mut acc, path, count)?;
                    }
                    Ok(acc)
                },
            )
            .try_reduce(ScanResult::new, |mut a, b| {
                self.absorb(&mut a, b)?;
                Ok(a)
            })
    }

    fn scan_dirs_parallel(&self, dirs: &[Utf8PathBuf]) -> Result<ScanResult, ScanError> {
        dirs.par_iter()
            .map(|dir| self.scan_dir(dir))
            .try_reduce(ScanResult::new, |mut a, b| {
                self.absorb(&mut a, b)?;
                Ok(a)
            })
    }

    /// Reads one file and counts its matches.
    ///
    /// Returns `Ok(None)` when the file was skipped under
    /// [`ReadErrorPolicy::Skip`]. The file handle is closed before returning.
    fn count_file(&self, path: &Utf8Path) -> Result<Option<usize>, ScanError> {
        self.check_cancelled()?;

        let contents = match fs::read_to_string(path.as_std_path()) {
            Ok(contents) => contents,
            Err(e) => {
                let err = ScanError::read(path, e);
                return match self.policy {
                    ReadErrorPolicy::Abort => Err(self.fail(err)),
                    ReadErrorPolicy::Skip => {
                        warn!(path = %path, error = %err, "Skipping unreadable file");
                        self.stats.increment_skipped();
                        self.skipped.lock().push((path.to_owned(), err));
                        Ok(None)
                    }
                };
            }
        };

        let count = self.pattern.count_matches(&contents);
        self.stats.record_file(count);
        debug!(path = %path, count, "Counted file");
        Ok(Some(count))
    }

    fn record(&self, result: &mut ScanResult, path: &Utf8Path, count: usize) -> Result<(), ScanError> {
        result
            .insert(path.to_owned(), count)
            .map_err(|e| self.fail(e.into()))
    }

    fn absorb(&self, result: &mut ScanResult, other: ScanResult) -> Result<(), ScanError> {
        result.merge(other).map_err(|e| self.fail(e.into()))
    }

    fn check_cancelled(&self) -> Result<(), ScanError> {
        if self.cancelled.load(Ordering::Relaxed) {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Parks the first failure and raises the cancellation flag.
    ///
    /// The parked error is handed back by [`run`](Self::run); the value
    /// returned here only travels up the call stack.
    fn fail(&self, err: ScanError) -> ScanError {
        if matches!(err, ScanError::Cancelled) {
            return err;
        }

        self.cancelled.store(true, Ordering::Relaxed);
        let mut slot = self.first_error.lock();
        if slot.is_none() {
            *slot = Some(err);
            ScanError::Cancelled
        } else {
            err
        }
    }
}

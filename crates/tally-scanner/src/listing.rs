//! Single-level directory listing.
//!
//! [`list_dir`] reads the immediate entries of one directory and partitions
//! them into subdirectories to recurse into and files to count. Nothing
//! below the directory is touched; the recursion in [`crate::tree`] owns the
//! tree shape.
//!
//! # Entry Policy
//!
//! - Directories are traversed.
//! - Regular files are counted.
//! - Symlinks resolving to a regular file are counted under the link path.
//! - Symlinks resolving to a directory are opaque: not traversed, not counted.
//! - Dangling symlinks and special files (FIFOs, sockets, devices) are skipped.

use std::fs;
use std::hash::{Hash, Hasher};

use camino::{Utf8Path, Utf8PathBuf};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHasher;
use tally_core::TraversalOrder;
use tracing::debug;

use crate::error::ScanError;

/// How an entry takes part in a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    /// Recurse into it.
    Directory,
    /// Read and count it.
    File,
    /// Leave it out of the scan.
    Skipped,
}

/// Classifies an entry from its un-followed file type.
pub(crate) fn classify(path: &Utf8Path, file_type: fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        return EntryKind::Directory;
    }
    if file_type.is_file() {
        return EntryKind::File;
    }
    if !file_type.is_symlink() {
        debug!(path = %path, "Skipping special file");
        return EntryKind::Skipped;
    }

    match fs::metadata(path.as_std_path()) {
        Ok(meta) if meta.is_file() => EntryKind::File,
        Ok(meta) if meta.is_dir() => {
            debug!(path = %path, "Not traversing symlinked directory");
            EntryKind::Skipped
        }
        Ok(_) => {
            debug!(path = %path, "Skipping symlink to special file");
            EntryKind::Skipped
        }
        Err(e) => {
            debug!(path = %path, error = %e, "Skipping dangling symlink");
            EntryKind::Skipped
        }
    }
}

/// The immediate entries of one directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DirListing {
    /// Subdirectories, joined onto the listed directory.
    pub dirs: Vec<Utf8PathBuf>,
    /// Countable files, joined onto the listed directory.
    pub files: Vec<Utf8PathBuf>,
}

impl DirListing {
    fn apply_order(&mut self, dir: &Utf8Path, order: TraversalOrder) {
        match order {
            TraversalOrder::Listed => {}
            TraversalOrder::Sorted => {
                self.dirs.sort_unstable();
                self.files.sort_unstable();
            }
            TraversalOrder::Shuffled { seed } => {
                // Sort first so the permutation depends only on seed and names.
                self.dirs.sort_unstable();
                self.files.sort_unstable();
                let mut rng = StdRng::seed_from_u64(seed ^ hash_path(dir));
                self.dirs.shuffle(&mut rng);
                self.files.shuffle(&mut rng);
            }
        }
    }
}

/// Lists `dir` and partitions its entries.
///
/// Entry paths are built as `dir.join(name)`, so keys derived from them stay
/// consistent with the root the caller passed in.
///
/// # Errors
///
/// - [`ScanError::List`] if the directory or one of its entries cannot be read
/// - [`ScanError::NonUtf8Path`] if an entry name is not valid UTF-8
pub(crate) fn list_dir(dir: &Utf8Path, order: TraversalOrder) -> Result<DirListing, ScanError> {
    let entries = fs::read_dir(dir.as_std_path()).map_err(|e| ScanError::list(dir, e))?;
    let mut listing = DirListing::default();

    for entry in entries {
        let entry = entry.map_err(|e| ScanError::list(dir, e))?;
        let path = Utf8PathBuf::try_from(entry.path())
            .map_err(|e| ScanError::NonUtf8Path(e.into_path_buf()))?;
        let file_type = entry.file_type().map_err(|e| ScanError::list(dir, e))?;

        match classify(&path, file_type) {
            EntryKind::Directory => listing.dirs.push(path),
            EntryKind::File => listing.files.push(path),
            EntryKind::Skipped => {}
        }
    }

    listing.apply_order(dir, order);
    Ok(listing)
}

/// Computes a fast hash of a directory path using `FxHash`.
fn hash_path(path: &Utf8Path) -> u64 {
    let mut hasher = FxHasher::default();
    path.hash(&mut hasher);
    hasher.finish()
}

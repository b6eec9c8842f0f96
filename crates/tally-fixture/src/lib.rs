//! Random directory tree fixtures with creation-time ground truth.
//!
//! [`generate`] writes a small random tree of alphanumeric text files and
//! returns, alongside the tree, the match count of every file computed from
//! the in-memory content before it was written. Scanning the tree must
//! reproduce that mapping exactly.
//!
//! # Layout
//!
//! ```text
//! <tempdir>/
//!     <top>/                  4-6 char random name
//!         <name>.txt  x 3-5   100 lines of 50-100 random chars
//!         <sub>/      x 3-5
//!             <name>.txt  x 3-5
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use tally_core::compile_pattern;
//!
//! let pattern = compile_pattern("[a-z0-9]")?;
//! let fixture = tally_fixture::generate(&pattern, &mut rand::thread_rng())?;
//!
//! let result = tally_scanner::scan(fixture.root(), &pattern)?;
//! assert_eq!(&result, fixture.ground_truth());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::fs;
use std::ops::RangeInclusive;

use camino::{Utf8Path, Utf8PathBuf};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rustc_hash::FxHashSet;
use tally_core::{MergeConflict, Pattern, ScanResult};
use tempfile::TempDir;
use tracing::debug;

/// Errors that can occur while writing a fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// Creating a directory or writing a file failed.
    #[error("failed to write fixture path {path}: {source}")]
    Io {
        /// The path being created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temporary directory could not be created.
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// The temporary directory path is not valid UTF-8.
    #[error("temporary directory path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// A generated path was recorded twice.
    #[error(transparent)]
    MergeConflict(#[from] MergeConflict),
}

/// Shape of a generated fixture tree.
///
/// # Examples
///
/// ```
/// use tally_fixture::FixtureSpec;
///
/// let spec = FixtureSpec::default();
/// assert_eq!(spec.files_per_dir, 3..=5);
/// assert_eq!(spec.lines_per_file, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSpec {
    /// Number of files in the top directory and in each subdirectory.
    pub files_per_dir: RangeInclusive<usize>,
    /// Number of subdirectories under the top directory.
    pub subdirs: RangeInclusive<usize>,
    /// Lines written to each file.
    pub lines_per_file: usize,
    /// Characters per line, excluding the newline.
    pub line_len: RangeInclusive<usize>,
    /// Characters per directory or file stem.
    pub name_len: RangeInclusive<usize>,
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self {
            files_per_dir: 3..=5,
            subdirs: 3..=5,
            lines_per_file: 100,
            line_len: 50..=100,
            name_len: 4..=6,
        }
    }
}

/// A generated tree plus the match counts recorded while writing it.
///
/// The tree lives in a temporary directory that is removed on drop.
#[derive(Debug)]
pub struct Fixture {
    /// Keeps the temporary directory alive.
    _dir: TempDir,
    root: Utf8PathBuf,
    ground_truth: ScanResult,
}

impl Fixture {
    /// Returns the top directory of the tree.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the match count of every file, keyed by `root` joined with
    /// the file's relative path.
    #[must_use]
    pub fn ground_truth(&self) -> &ScanResult {
        &self.ground_truth
    }

    /// Returns every file path of the tree.
    pub fn files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.ground_truth.paths()
    }
}

/// Generates a fixture with the default [`FixtureSpec`].
pub fn generate<P, R>(pattern: &P, rng: &mut R) -> Result<Fixture, FixtureError>
where
    P: Pattern + ?Sized,
    R: Rng + ?Sized,
{
    generate_with(&FixtureSpec::default(), pattern, rng)
}

/// Generates a fixture with an explicit shape.
pub fn generate_with<P, R>(
    spec: &FixtureSpec,
    pattern: &P,
    rng: &mut R,
) -> Result<Fixture, FixtureError>
where
    P: Pattern + ?Sized,
    R: Rng + ?Sized,
{
    let dir = tempfile::tempdir().map_err(FixtureError::TempDir)?;
    let base = Utf8PathBuf::try_from(dir.path().to_path_buf())
        .map_err(|e| FixtureError::NonUtf8Path(e.into_path_buf()))?;

    let top_name = random_name(rng, &spec.name_len);
    let root = base.join(top_name);
    create_dir(&root)?;

    let mut ground_truth = write_files(spec, &root, pattern, rng)?;

    let subdir_count = rng.gen_range(spec.subdirs.clone());
    let mut used = FxHashSet::default();
    for _ in 0..subdir_count {
        let name = unique_name(rng, &spec.name_len, &mut used);
        let subdir = root.join(name);
        create_dir(&subdir)?;
        ground_truth.merge(write_files(spec, &subdir, pattern, rng)?)?;
    }

    debug!(
        root = %root,
        files = ground_truth.len(),
        matches = ground_truth.total_matches(),
        "Generated fixture"
    );

    Ok(Fixture {
        _dir: dir,
        root,
        ground_truth,
    })
}

/// Builds a random character-class pattern source.
///
/// The shape is three positive classes followed by one negated class, for
/// example `[a9Xq][Bb2z0][kk3P][^x7]`. Class contents are random
/// alphanumerics, so the pattern always compiles.
pub fn character_class_pattern<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut pattern = String::new();
    for _ in 0..3 {
        let len = rng.gen_range(4..=6);
        pattern.push('[');
        pattern.push_str(&random_id(rng, len));
        pattern.push(']');
    }
    let len = rng.gen_range(2..=4);
    pattern.push_str("[^");
    pattern.push_str(&random_id(rng, len));
    pattern.push(']');
    pattern
}

/// Returns `len` random ASCII letters and digits.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Writes the files of one directory and returns their counts.
fn write_files<P, R>(
    spec: &FixtureSpec,
    dir: &Utf8Path,
    pattern: &P,
    rng: &mut R,
) -> Result<ScanResult, FixtureError>
where
    P: Pattern + ?Sized,
    R: Rng + ?Sized,
{
    let file_count = rng.gen_range(spec.files_per_dir.clone());
    let mut counts = ScanResult::with_capacity(file_count);
    let mut used = FxHashSet::default();

    for _ in 0..file_count {
        let stem = unique_name(rng, &spec.name_len, &mut used);
        let path = dir.join(format!("{stem}.txt"));
        let contents = random_contents(spec, rng);

        // Counted from memory, before the bytes touch the disk.
        let count = pattern.count_matches(&contents);
        fs::write(path.as_std_path(), &contents).map_err(|source| FixtureError::Io {
            path: path.clone(),
            source,
        })?;
        counts.insert(path, count)?;
    }

    Ok(counts)
}

fn random_contents<R: Rng + ?Sized>(spec: &FixtureSpec, rng: &mut R) -> String {
    let mut contents = String::with_capacity(spec.lines_per_file * (spec.line_len.end() + 1));
    for _ in 0..spec.lines_per_file {
        let len = rng.gen_range(spec.line_len.clone());
        contents.push_str(&random_id(rng, len));
        contents.push('\n');
    }
    contents
}

fn random_name<R: Rng + ?Sized>(rng: &mut R, len: &RangeInclusive<usize>) -> String {
    let len = rng.gen_range(len.clone());
    random_id(rng, len)
}

/// Draws names until one is not in `used`.
///
/// Names are compared case-insensitively so trees stay distinct on
/// case-folding filesystems.
fn unique_name<R: Rng + ?Sized>(
    rng: &mut R,
    len: &RangeInclusive<usize>,
    used: &mut FxHashSet<String>,
) -> String {
    loop {
        let name = random_name(rng, len);
        if used.insert(name.to_ascii_lowercase()) {
            return name;
        }
    }
}

fn create_dir(path: &Utf8Path) -> Result<(), FixtureError> {
    fs::create_dir(path.as_std_path()).map_err(|source| FixtureError::Io {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use regex::Regex;

    fn any_char() -> Regex {
        Regex::new("[a-zA-Z0-9]").unwrap()
    }

    #[test]
    fn test_random_id_is_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = random_id(&mut rng, 64);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_character_class_pattern_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let source = character_class_pattern(&mut rng);
            assert!(Regex::new(&source).is_ok(), "{source}");
            assert_eq!(source.matches('[').count(), 4);
            assert_eq!(source.matches("[^").count(), 1);
            assert!(source.ends_with(']'));
        }
    }

    #[test]
    fn test_default_tree_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        let fixture = generate(&any_char(), &mut rng).unwrap();
        let root = fixture.root();

        let top_files = fixture
            .files()
            .filter(|path| path.parent() == Some(root))
            .count();
        assert!((3..=5).contains(&top_files));

        let subdirs: FxHashSet<&Utf8Path> = fixture
            .files()
            .filter_map(Utf8Path::parent)
            .filter(|parent| *parent != root)
            .collect();
        assert!((3..=5).contains(&subdirs.len()));

        for subdir in &subdirs {
            assert_eq!(subdir.parent(), Some(root));
            let files = fixture
                .files()
                .filter(|path| path.parent() == Some(*subdir))
                .count();
            assert!((3..=5).contains(&files));
        }
    }

    #[test]
    fn test_ground_truth_matches_written_content() {
        let mut rng = StdRng::seed_from_u64(4);
        let pattern = any_char();
        let fixture = generate(&pattern, &mut rng).unwrap();

        for (path, count) in fixture.ground_truth() {
            let contents = fs::read_to_string(path).unwrap();
            assert_eq!(contents.lines().count(), 100);
            assert!(contents.ends_with('\n'));
            assert_eq!(pattern.count_matches(&contents), count);
            assert_eq!(path.extension(), Some("txt"));
        }
    }

    #[test]
    fn test_custom_fixture_spec() {
        let spec = FixtureSpec {
            files_per_dir: 1..=1,
            subdirs: 2..=2,
            lines_per_file: 2,
            line_len: 5..=5,
            name_len: 8..=8,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let fixture = generate_with(&spec, &any_char(), &mut rng).unwrap();

        assert_eq!(fixture.ground_truth().len(), 3);
        assert!(fixture.ground_truth().iter().all(|(_, count)| count == 10));
    }

    #[test]
    fn test_tree_removed_on_drop() {
        let mut rng = StdRng::seed_from_u64(6);
        let fixture = generate(&any_char(), &mut rng).unwrap();
        let root = fixture.root().to_owned();
        assert!(root.is_dir());

        drop(fixture);
        assert!(!root.exists());
    }
}

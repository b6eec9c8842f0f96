//! End-to-end scans of small hand-built trees.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tally_scanner::{ErrorKind, ReadErrorPolicy, ScanConfig, ScanError, Scanner};
use tempfile::TempDir;

fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

fn write(path: &Utf8Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// `t1/a.txt = "abc123"`, `t1/d1/b.txt = "xyz"`.
fn digits_tree() -> (TempDir, Utf8PathBuf) {
    let (dir, base) = utf8_tempdir();
    let root = base.join("t1");
    write(&root.join("a.txt"), "abc123");
    write(&root.join("d1").join("b.txt"), "xyz");
    (dir, root)
}

#[test]
fn counts_digits_in_nested_tree() {
    let (_dir, root) = digits_tree();
    let digits = Regex::new("[0-9]").unwrap();

    let result = tally_scanner::scan(&root, &digits).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.get(&root.join("a.txt")), Some(3));
    assert_eq!(result.get(&root.join("d1/b.txt")), Some(0));
}

#[test]
fn parallel_matches_sequential_on_nested_tree() {
    let (_dir, root) = digits_tree();
    let digits = Regex::new("[0-9]").unwrap();

    let sequential = tally_scanner::scan(&root, &digits).unwrap();
    let parallel = Scanner::new(ScanConfig::new(&root).with_threads(Some(2)))
        .unwrap()
        .scan(&digits)
        .unwrap();

    assert_eq!(parallel.result, sequential);
    assert_eq!(parallel.stats.directories, 2);
    assert_eq!(parallel.stats.files, 2);
    assert_eq!(parallel.stats.matches, 3);
    assert!(parallel.skipped.is_empty());
}

#[test]
fn empty_root_gives_empty_result() {
    let (_dir, root) = utf8_tempdir();
    let any = Regex::new(".").unwrap();

    let result = tally_scanner::scan(&root, &any).unwrap();
    assert!(result.is_empty());
}

#[test]
fn empty_subdirectories_contribute_nothing() {
    let (_dir, root) = utf8_tempdir();
    fs::create_dir_all(root.join("a/b/c")).unwrap();
    fs::create_dir(root.join("d")).unwrap();
    write(&root.join("a/b/leaf.txt"), "aaa");
    let a = Regex::new("a").unwrap();

    let result = tally_scanner::scan(&root, &a).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(&root.join("a/b/leaf.txt")), Some(3));
}

#[test]
fn empty_file_counts_zero() {
    let (_dir, root) = utf8_tempdir();
    write(&root.join("empty.txt"), "");
    let any = Regex::new(".").unwrap();

    let result = tally_scanner::scan(&root, &any).unwrap();
    assert_eq!(result.get(&root.join("empty.txt")), Some(0));
}

#[test]
fn matches_are_counted_across_lines() {
    let (_dir, root) = utf8_tempdir();
    write(&root.join("lines.txt"), "a1\nb2\nc3\n");
    let digit_then_newline = Regex::new("[0-9]\n").unwrap();

    let result = tally_scanner::scan(&root, &digit_then_newline).unwrap();
    assert_eq!(result.get(&root.join("lines.txt")), Some(3));
}

#[test]
fn same_file_name_in_different_directories_is_two_keys() {
    let (_dir, root) = utf8_tempdir();
    write(&root.join("x/notes.txt"), "11");
    write(&root.join("y/notes.txt"), "1");
    let one = Regex::new("1").unwrap();

    let result = tally_scanner::scan(&root, &one).unwrap();
    assert_eq!(result.get(&root.join("x/notes.txt")), Some(2));
    assert_eq!(result.get(&root.join("y/notes.txt")), Some(1));
}

#[test]
fn missing_root_is_not_found() {
    let (_dir, base) = utf8_tempdir();
    let any = Regex::new(".").unwrap();

    let err = tally_scanner::scan(&base.join("missing"), &any).unwrap_err();
    assert!(matches!(err, ScanError::NotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn file_root_is_not_a_directory() {
    let (_dir, base) = utf8_tempdir();
    let file = base.join("plain.txt");
    write(&file, "abc");
    let any = Regex::new(".").unwrap();

    let err = tally_scanner::scan(&file, &any).unwrap_err();
    assert!(matches!(err, ScanError::NotADirectory(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn non_utf8_file_aborts_by_default() {
    let (_dir, root) = utf8_tempdir();
    write(&root.join("good.txt"), "abc");
    write(&root.join("bad.bin"), [0xff_u8, 0xfe, 0x00, 0x80]);
    let any = Regex::new(".").unwrap();

    let err = tally_scanner::scan(&root, &any).unwrap_err();
    assert!(matches!(err, ScanError::Read { .. }));
    assert_eq!(err.path(), Some(&root.join("bad.bin")));
}

#[test]
fn parallel_scan_reports_the_real_failure() {
    let (_dir, root) = utf8_tempdir();
    for dir in 0..8 {
        for file in 0..8 {
            write(&root.join(format!("d{dir}/f{file}.txt")), "abc");
        }
    }
    let bad = root.join("d5/bad.bin");
    write(&bad, [0xc3_u8, 0x28]);
    let any = Regex::new(".").unwrap();

    let err = Scanner::new(ScanConfig::new(&root).with_threads(Some(4)))
        .unwrap()
        .scan(&any)
        .unwrap_err();

    assert!(matches!(err, ScanError::Read { .. }), "{err:?}");
    assert_eq!(err.path(), Some(&bad));
}

#[test]
fn skip_policy_leaves_unreadable_files_out() {
    let (_dir, root) = utf8_tempdir();
    write(&root.join("good.txt"), "abc");
    write(&root.join("sub/bad.bin"), [0xff_u8, 0xff]);
    let any = Regex::new(".").unwrap();

    for parallel in [false, true] {
        let report = Scanner::new(
            ScanConfig::new(&root)
                .with_parallel(parallel)
                .with_read_policy(ReadErrorPolicy::Skip),
        )
        .unwrap()
        .scan(&any)
        .unwrap();

        assert_eq!(report.result.len(), 1);
        assert_eq!(report.result.get(&root.join("good.txt")), Some(3));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, root.join("sub/bad.bin"));
        assert!(report.skipped[0].1.is_recoverable());
        assert_eq!(report.stats.skipped, 1);
    }
}

#[test]
fn scanner_is_reusable_and_stateless() {
    let (_dir, root) = digits_tree();
    let scanner = Scanner::new(ScanConfig::new(&root)).unwrap();
    let digits = Regex::new("[0-9]").unwrap();
    let letters = Regex::new("[a-z]").unwrap();

    let first = scanner.scan(&digits).unwrap();
    let other = scanner.scan(&letters).unwrap();
    let again = scanner.scan(&digits).unwrap();

    assert_eq!(first.result, again.result);
    assert_eq!(first.stats, again.stats);
    assert_eq!(other.result.get(&root.join("d1/b.txt")), Some(3));
}

#[test]
fn root_deleted_after_construction_is_not_found() {
    let (_dir, base) = utf8_tempdir();
    let root = base.join("gone");
    fs::create_dir(&root).unwrap();
    let scanner = Scanner::new(ScanConfig::new(&root)).unwrap();
    fs::remove_dir(&root).unwrap();

    let err = scanner.scan(&Regex::new(".").unwrap()).unwrap_err();
    assert!(matches!(err, ScanError::NotFound(_)));
}

#[test]
fn audit_accepts_complete_result() {
    let (_dir, root) = digits_tree();
    let scanner = Scanner::new(ScanConfig::new(&root)).unwrap();
    let report = scanner.scan(&Regex::new("[0-9]").unwrap()).unwrap();

    let audit = scanner.audit(&report.result).unwrap();
    assert!(audit.is_complete(), "{audit:?}");
}

#[test]
fn audit_flags_missing_and_unexpected_paths() {
    let (_dir, root) = digits_tree();
    let scanner = Scanner::new(ScanConfig::new(&root)).unwrap();

    let mut partial = tally_core::ScanResult::new();
    partial.insert(root.join("a.txt"), 3).unwrap();
    partial.insert(root.join("ghost.txt"), 0).unwrap();

    let audit = scanner.audit(&partial).unwrap();
    assert!(!audit.is_complete());
    assert_eq!(audit.missing, vec![root.join("d1/b.txt")]);
    assert_eq!(audit.unexpected, vec![root.join("ghost.txt")]);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let (_dir, root) = utf8_tempdir();
    write(&root.join("real/a.txt"), "111");
    std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();
    std::os::unix::fs::symlink(root.join("real/a.txt"), root.join("alias.txt")).unwrap();
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling")).unwrap();
    let one = Regex::new("1").unwrap();

    let result = tally_scanner::scan(&root, &one).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.get(&root.join("real/a.txt")), Some(3));
    assert_eq!(result.get(&root.join("alias.txt")), Some(3));
    assert!(!result.contains(&root.join("link/a.txt")));
}

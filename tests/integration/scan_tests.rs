use dupscan::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// a, b = "X"; c = "Y"; d = "XX"
fn sample_tree(dir: &Path) {
    write(dir, "a.txt", b"X");
    write(dir, "b.txt", b"X");
    write(dir, "c.txt", b"Y");
    write(dir, "d.txt", b"XX");
}

fn finder(min_size: u64, workers: usize) -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default()
            .with_min_size(min_size)
            .with_workers(workers),
    )
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.candidate_files, 0);
}

#[test]
fn test_scan_minsize_zero_finds_single_pair() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());

    let (sets, summary) = finder(0, 4).find_duplicates(dir.path()).unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(
        sets[0].paths,
        vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
    );
    assert_eq!(sets[0].size, 1);
    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.eliminated_by_size, 1);
    assert_eq!(summary.candidate_files, 3);
    assert_eq!(summary.hashed_files, 3);
}

#[test]
fn test_scan_minsize_two_reports_nothing() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());

    let (sets, summary) = finder(2, 4).find_duplicates(dir.path()).unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.hashed_files, 0);
}

#[test]
fn test_minsize_boundary_is_inclusive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "at_1.bin", &[7u8; 100]);
    write(dir.path(), "at_2.bin", &[7u8; 100]);
    write(dir.path(), "below_1.bin", &[7u8; 99]);
    write(dir.path(), "below_2.bin", &[7u8; 99]);

    let (sets, _) = finder(100, 2).find_duplicates(dir.path()).unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].size, 100);

    let (sets, _) = finder(101, 2).find_duplicates(dir.path()).unwrap();
    assert!(sets.is_empty());
}

#[test]
fn test_empty_files_are_duplicates_at_minsize_zero() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let (sets, _) = finder(0, 2).find_duplicates(dir.path()).unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].size, 0);
    assert_eq!(sets[0].len(), 2);
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one", b"aaaa");
    write(dir.path(), "two", b"bbbb");
    write(dir.path(), "three", b"cccc");

    let (sets, summary) = finder(0, 3).find_duplicates(dir.path()).unwrap();
    assert!(sets.is_empty());
    assert_eq!(summary.hashed_files, 3);
}

#[test]
fn test_duplicates_across_subdirectories() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top.dat", b"shared content");
    write(dir.path(), "x/mid.dat", b"shared content");
    write(dir.path(), "x/y/z/deep.dat", b"shared content");
    write(dir.path(), "x/y/other.dat", b"other content!");

    let (sets, summary) = finder(0, 4).find_duplicates(dir.path()).unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 3);
    assert_eq!(summary.duplicate_files, 2);
    assert_eq!(summary.reclaimable_space, 2 * 14);
}

#[test]
fn test_multiple_groups_sharing_a_size() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a1", b"AAAA");
    write(dir.path(), "a2", b"AAAA");
    write(dir.path(), "b1", b"BBBB");
    write(dir.path(), "b2", b"BBBB");
    write(dir.path(), "b3", b"BBBB");

    let (sets, summary) = finder(0, 2).find_duplicates(dir.path()).unwrap();

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].paths[0], dir.path().join("a1"));
    assert_eq!(sets[1].len(), 3);
    assert_ne!(sets[0].digest, sets[1].digest);
    assert_eq!(summary.duplicate_groups, 2);
    assert_eq!(summary.duplicate_files, 3);
}

#[test]
fn test_every_path_appears_at_most_once() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        write(dir.path(), &format!("f{i:02}"), format!("{}", i % 4).as_bytes());
    }

    let (sets, _) = finder(0, 5).find_duplicates(dir.path()).unwrap();

    let mut seen: Vec<&PathBuf> = sets.iter().flat_map(|s| s.paths.iter()).collect();
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total);
    assert_eq!(total, 30);
    assert_eq!(sets.len(), 4);
}

#[test]
fn test_missing_root() {
    let dir = tempdir().unwrap();
    let result = DuplicateFinder::with_defaults().find_duplicates(&dir.path().join("missing"));
    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_fatal_by_default() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "ok1", b"same");
    write(dir.path(), "ok2", b"same");
    let locked = write(dir.path(), "locked", b"same");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not apply to root.
    if fs::read(&locked).is_ok() {
        return;
    }

    let result = finder(0, 2).find_duplicates(dir.path());
    assert!(matches!(result, Err(FinderError::Hash(_))));

    let (sets, summary) = DuplicateFinder::new(
        FinderConfig::default()
            .with_workers(2)
            .with_skip_errors(true),
    )
    .find_duplicates(dir.path())
    .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 2);
    assert!(summary.is_partial());
    assert_eq!(summary.skipped.len(), 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let target = write(dir.path(), "real.txt", b"linked");
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let (sets, summary) = finder(0, 2).find_duplicates(dir.path()).unwrap();
    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 1);

    let (sets, _) = DuplicateFinder::new(
        FinderConfig::default()
            .with_workers(2)
            .with_follow_symlinks(true),
    )
    .find_duplicates(dir.path())
    .unwrap();
    assert_eq!(sets.len(), 1);
}

use dirdupe::actions::ItemKind;
use dirdupe::session::{DirContents, RecursiveStats, Session, SessionConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn session_for(roots: Vec<PathBuf>) -> Session {
    Session::with_config(
        roots,
        SessionConfig {
            use_cache: false,
            jobs: 2,
            ..SessionConfig::default()
        },
    )
}

/// Two roots, each with one shared file and one unique file.
fn two_roots() -> (TempDir, TempDir) {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write(&first.path().join("shared.txt"), b"the same bytes");
    write(&first.path().join("unique1.txt"), b"only in the first root");
    write(&second.path().join("shared.txt"), b"the same bytes");
    write(&second.path().join("unique2.txt"), b"only in the second root");
    (first, second)
}

#[test]
fn test_scan_over_two_roots() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    let summary = session.scan(true).unwrap();
    assert_eq!(summary.total_files, 4);

    let index = session.index();
    assert_eq!(index.total_files, 4);
    assert_eq!(index.total_duplicates, 2);
    assert!(index.file_to_hash.contains_key(&first.path().join("shared.txt")));
    assert!(!index.file_to_hash.contains_key(&first.path().join("unique1.txt")));
    assert_eq!(index.dir_stats[first.path()].redundancy_score, 0.5);
    assert_eq!(index.dir_stats[second.path()].redundancy_score, 0.5);
}

#[test]
fn test_invalidate_all_caches_clears_arbitrary_entries() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    session.scan(true).unwrap();

    let caches = session.caches_mut();
    caches.recursive_stats.insert("test", RecursiveStats::default());
    caches.dir_contents.insert("test", DirContents::default());
    caches.dir_sizes.insert("test", 100);
    assert!(!session.caches().is_empty());

    let files_before = session.index().total_files;
    session.invalidate_all_caches();

    assert!(session.caches().is_empty());
    assert_eq!(session.index().total_files, files_before);
    assert_eq!(session.view_stack().len(), 1);
}

#[test]
fn test_rescan_picks_up_new_file() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    session.scan(true).unwrap();
    let before = session.index().total_files;

    write(&first.path().join("new_file.txt"), b"brand new");
    session.rescan().unwrap();

    assert_eq!(session.index().total_files, before + 1);
}

#[test]
fn test_rescan_clears_derived_caches() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    session.scan(true).unwrap();

    session.recursive_stats(first.path());
    session.dir_size(first.path());
    assert!(!session.caches().is_empty());

    session.rescan().unwrap();
    assert!(session.caches().is_empty());
}

#[test]
fn test_failed_rescan_keeps_previous_index() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    write(&root.join("a"), b"x");
    write(&root.join("b"), b"x");

    let mut session = session_for(vec![root.clone()]);
    session.scan(true).unwrap();
    assert_eq!(session.index().total_duplicates, 2);

    fs::remove_dir_all(&root).unwrap();
    assert!(session.rescan().is_err());
    assert_eq!(session.index().total_duplicates, 2);
}

#[test]
fn test_file_redundancy_counts() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    session.scan(true).unwrap();

    assert_eq!(session.get_file_redundancy_count(&first.path().join("shared.txt")), 2);
    assert_eq!(session.get_file_redundancy_count(&first.path().join("unique1.txt")), 1);

    // Not in the index: hashed on demand and matched against indexed copies.
    let outside = tempdir().unwrap();
    let copy = outside.path().join("another_copy.txt");
    write(&copy, b"the same bytes");
    assert_eq!(session.get_file_redundancy_count(&copy), 3);

    let stranger = outside.path().join("stranger.txt");
    write(&stranger, b"nothing like it anywhere");
    assert_eq!(session.get_file_redundancy_count(&stranger), 1);

    assert_eq!(session.get_file_redundancy_count(&outside.path().join("missing")), 1);
}

#[test]
fn test_new_copy_of_unique_file_counts_both() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    session.scan(true).unwrap();

    // Written after the scan, so neither copy is in a duplicate set.
    let outside = tempdir().unwrap();
    let copy = outside.path().join("unique1_copy.txt");
    write(&copy, b"only in the first root");
    assert_eq!(session.get_file_redundancy_count(&copy), 2);
    assert!(!session.needs_confirmation(&copy, ItemKind::File));

    // Same size as unique1.txt but different bytes.
    let lookalike = outside.path().join("lookalike.txt");
    write(&lookalike, b"only in the first rooT");
    assert_eq!(session.get_file_redundancy_count(&lookalike), 1);
}

#[test]
fn test_needs_confirmation() {
    let (first, second) = two_roots();
    let mut session = session_for(vec![first.path().into(), second.path().into()]);
    session.scan(true).unwrap();

    assert!(!session.needs_confirmation(&first.path().join("shared.txt"), ItemKind::File));
    assert!(session.needs_confirmation(&first.path().join("unique1.txt"), ItemKind::File));
    assert!(session.needs_confirmation(first.path(), ItemKind::Directory));
}

#[test]
fn test_session_from_single_path() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("f"), b"content");

    let mut session = Session::new(dir.path(), false);
    session.scan(true).unwrap();
    assert_eq!(session.root_paths(), &[dir.path().to_path_buf()]);
    assert_eq!(session.index().total_files, 1);
}

use dirdupe::duplicates::{
    calculate_redundancy_score, find_duplicates, DuplicateFinder, FinderConfig, FinderError,
};
use dirdupe::scanner::WalkerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn abs(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap()
}

#[test]
fn test_redundancy_score_values() {
    assert_eq!(calculate_redundancy_score(10, 10), 1.0);
    assert_eq!(calculate_redundancy_score(0, 10), 0.0);
    assert_eq!(calculate_redundancy_score(5, 10), 0.5);
    assert_eq!(calculate_redundancy_score(0, 0), 0.0);
}

#[test]
fn test_empty_roots_yield_empty_index() {
    let index = find_duplicates(&[], true, false, 1).unwrap();
    assert_eq!(index.total_files, 0);
    assert_eq!(index.total_duplicates, 0);
    assert!(index.file_to_hash.is_empty());
    assert!(index.hash_to_dirs.is_empty());
    assert!(index.dir_all_files.is_empty());
    assert!(index.dir_stats.is_empty());
}

#[test]
fn test_empty_directory_is_indexed_without_files() {
    let dir = tempdir().unwrap();
    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 1).unwrap();

    assert_eq!(index.total_files, 0);
    let root = abs(dir.path());
    assert!(index.dir_all_files[&root].is_empty());
    assert_eq!(index.dir_stats[&root].redundancy_score, 0.0);
}

#[test]
fn test_nested_directories_and_scores() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a/one.txt"), b"shared");
    write(&dir.path().join("a/two.txt"), b"only here");
    write(&dir.path().join("a/b/copy.txt"), b"shared");

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 2).unwrap();
    let root = abs(dir.path());

    assert_eq!(index.total_files, 3);
    assert_eq!(index.total_duplicates, 2);
    assert_eq!(index.dir_stats[&root.join("a")].redundancy_score, 0.5);
    assert_eq!(index.dir_stats[&root.join("a/b")].redundancy_score, 1.0);
    assert!(!index.file_to_hash.contains_key(&root.join("a/two.txt")));

    let hash = index.file_to_hash[&root.join("a/one.txt")];
    let dirs = &index.hash_to_dirs[&hash];
    assert_eq!(dirs.len(), 2);
    assert!(dirs.contains(&root.join("a/b")));
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("x.empty"), b"");
    write(&dir.path().join("y.empty"), b"");

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 1).unwrap();
    assert_eq!(index.total_files, 2);
    assert_eq!(index.total_duplicates, 2);
}

#[test]
fn test_same_size_different_content_is_not_duplicate() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"aaaa");
    write(&dir.path().join("b"), b"bbbb");

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 1).unwrap();
    assert_eq!(index.total_duplicates, 0);
    assert!(index.hash_to_dirs.is_empty());
}

#[test]
fn test_missing_root_is_fatal() {
    let result = find_duplicates(&[PathBuf::from("/definitely/not/here")], true, false, 1);
    assert!(matches!(result, Err(FinderError::NoAccessibleRoots(_))));
}

#[test]
fn test_missing_root_next_to_valid_root_is_skipped() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("f.txt"), b"content");

    let roots = vec![dir.path().to_path_buf(), dir.path().join("missing")];
    let index = find_duplicates(&roots, true, false, 1).unwrap();

    assert_eq!(index.total_files, 1);
    assert_eq!(index.summary.skipped_dirs, 1);
    assert_eq!(index.summary.errors.len(), 1);
}

#[test]
fn test_relative_root_is_made_absolute() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("f.txt"), b"content");
    let dotted = dir.path().join(".").join("sub").join("..");
    fs::create_dir_all(dir.path().join("sub")).unwrap();

    let index = find_duplicates(&[dotted], true, false, 1).unwrap();
    assert!(index.dir_all_files.contains_key(&abs(dir.path())));
}

#[test]
fn test_ignore_patterns_and_hidden_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("keep.txt"), b"same");
    write(&dir.path().join("skip.tmp"), b"same");
    write(&dir.path().join(".hidden/copy.txt"), b"same");

    let walker = WalkerConfig::new(false, true, None, None, vec!["*.tmp".to_string()]);
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let index = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(index.total_files, 1);
    assert_eq!(index.total_duplicates, 0);
}

#[test]
fn test_size_limits() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("small"), b"ab");
    write(&dir.path().join("large"), &[7u8; 100]);

    let walker = WalkerConfig::new(false, false, Some(10), None, Vec::new());
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let index = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(index.total_files, 1);
}

#[test]
fn test_job_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(&dir.path().join(format!("d{}/f{}.txt", i % 4, i)), format!("{}", i % 5).as_bytes());
    }
    let roots = vec![dir.path().to_path_buf()];

    let serial = find_duplicates(&roots, true, false, 1).unwrap();
    let parallel = find_duplicates(&roots, true, false, 4).unwrap();

    assert_eq!(serial.total_files, parallel.total_files);
    assert_eq!(serial.total_duplicates, parallel.total_duplicates);
    assert_eq!(serial.file_to_hash, parallel.file_to_hash);
    assert_eq!(serial.hash_to_dirs, parallel.hash_to_dirs);
    assert_eq!(serial.dir_all_files, parallel.dir_all_files);
    assert_eq!(serial.dir_stats, parallel.dir_stats);
}

#[test]
fn test_interrupted_scan() {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    let dir = tempdir().unwrap();
    write(&dir.path().join("f.txt"), b"content");

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]);
    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write(&outside.path().join("target.txt"), b"linked");
    write(&dir.path().join("real.txt"), b"linked");
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
    std::os::unix::fs::symlink(outside.path().join("target.txt"), dir.path().join("file_link"))
        .unwrap();

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 1).unwrap();
    assert_eq!(index.total_files, 1);
    assert_eq!(index.total_duplicates, 0);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.txt");
    write(&dir.path().join("open.txt"), b"readable");
    write(&locked, b"readable");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not bind a privileged user.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 2).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(index.summary.skipped_files, 1);
    assert_eq!(index.summary.skipped_dirs, 0);
    assert_eq!(index.total_files, 1);
    assert_eq!(index.total_duplicates, 0);
    assert!(!index.dir_all_files[&abs(dir.path())].contains(&abs(&locked)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let sealed = dir.path().join("sealed");
    write(&dir.path().join("open.txt"), b"same bytes");
    write(&sealed.join("inner.txt"), b"same bytes");
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&sealed).is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 2).unwrap();
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(index.summary.skipped_dirs, 1);
    assert_eq!(index.total_files, 1);
    assert_eq!(index.total_duplicates, 0);
    assert!(!index.dir_all_files.contains_key(&abs(&sealed)));
}

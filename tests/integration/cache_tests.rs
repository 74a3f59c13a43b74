use dirdupe::cache::HashCache;
use dirdupe::duplicates::{open_cache, DuplicateFinder, FinderConfig};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn finder_with(cache: Arc<HashCache>) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_jobs(2).with_cache(cache))
}

#[test]
fn test_second_scan_is_served_from_cache() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    write(&data.path().join("a/1.txt"), b"one");
    write(&data.path().join("b/1.txt"), b"one");
    write(&data.path().join("b/2.txt"), b"two");

    let cache = Arc::new(HashCache::open(&cache_dir.path().join("hashes.db")).unwrap());
    let roots = vec![data.path().to_path_buf()];

    let first = finder_with(Arc::clone(&cache)).find_duplicates(&roots).unwrap();
    assert_eq!(first.summary.cache_hits, 0);
    assert_eq!(first.summary.cache_misses, 3);
    assert_eq!(cache.len().unwrap(), 3);

    let second = finder_with(Arc::clone(&cache)).find_duplicates(&roots).unwrap();
    assert_eq!(second.summary.cache_hits, 3);
    assert_eq!(second.summary.cache_misses, 0);
    assert_eq!(first.file_to_hash, second.file_to_hash);
    assert_eq!(first.dir_stats, second.dir_stats);
}

#[test]
fn test_cache_survives_reopen() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("hashes.db");
    write(&data.path().join("x"), b"content");
    let roots = vec![data.path().to_path_buf()];

    {
        let cache = Arc::new(HashCache::open(&db).unwrap());
        finder_with(cache).find_duplicates(&roots).unwrap();
    }

    let cache = Arc::new(HashCache::open(&db).unwrap());
    let index = finder_with(cache).find_duplicates(&roots).unwrap();
    assert_eq!(index.summary.cache_hits, 1);
}

#[test]
fn test_changed_mtime_is_a_miss() {
    let data = tempdir().unwrap();
    let file = data.path().join("file.txt");
    write(&file, b"stable content");
    write(&data.path().join("other.txt"), b"other content");

    let cache = Arc::new(HashCache::open_in_memory().unwrap());
    let roots = vec![data.path().to_path_buf()];
    finder_with(Arc::clone(&cache)).find_duplicates(&roots).unwrap();

    filetime::set_file_mtime(&file, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let index = finder_with(cache).find_duplicates(&roots).unwrap();
    assert_eq!(index.summary.cache_hits, 1);
    assert_eq!(index.summary.cache_misses, 1);
}

#[test]
fn test_changed_content_is_rehashed() {
    let data = tempdir().unwrap();
    let a = data.path().join("a.txt");
    let b = data.path().join("b.txt");
    write(&a, b"same");
    write(&b, b"same");

    let cache = Arc::new(HashCache::open_in_memory().unwrap());
    let roots = vec![data.path().to_path_buf()];
    let before = finder_with(Arc::clone(&cache)).find_duplicates(&roots).unwrap();
    assert_eq!(before.total_duplicates, 2);

    write(&b, b"now different");

    let after = finder_with(cache).find_duplicates(&roots).unwrap();
    assert_eq!(after.total_duplicates, 0);
    assert_eq!(after.summary.cache_misses, 1);
}

#[test]
fn test_unusable_cache_file_falls_back_to_hashing() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("hashes.db");
    fs::write(&db, "this is not a sqlite database\n".repeat(64)).unwrap();
    write(&data.path().join("a"), b"dup");
    write(&data.path().join("b"), b"dup");

    assert!(open_cache(Some(&db)).is_none());

    let index = DuplicateFinder::new(FinderConfig::default())
        .find_duplicates(&[data.path().to_path_buf()])
        .unwrap();
    assert_eq!(index.total_duplicates, 2);
    assert_eq!(index.summary.cache_hits, 0);
    assert_eq!(index.summary.cache_misses, 0);
}

#[test]
fn test_prune_missing_drops_deleted_files() {
    let data = tempdir().unwrap();
    let gone: PathBuf = data.path().join("gone.txt");
    write(&gone, b"temporary");
    write(&data.path().join("kept.txt"), b"kept");

    let cache = Arc::new(HashCache::open_in_memory().unwrap());
    finder_with(Arc::clone(&cache))
        .find_duplicates(&[data.path().to_path_buf()])
        .unwrap();
    assert_eq!(cache.len().unwrap(), 2);

    fs::remove_file(&gone).unwrap();
    assert_eq!(cache.prune_missing().unwrap(), 1);
    assert_eq!(cache.len().unwrap(), 1);
}

// Linux filesystems accept arbitrary bytes in names; macOS ones do not.
#[cfg(target_os = "linux")]
#[test]
fn test_names_differing_only_in_invalid_bytes_stay_apart() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let data = tempdir().unwrap();
    let first = data.path().join(OsStr::from_bytes(b"report\xff.txt"));
    let second = data.path().join(OsStr::from_bytes(b"report\xfe.txt"));
    write(&first, b"first body");
    write(&second, b"other body");
    let stamp = FileTime::from_unix_time(1_500_000_000, 0);
    filetime::set_file_mtime(&first, stamp).unwrap();
    filetime::set_file_mtime(&second, stamp).unwrap();

    let cache = Arc::new(HashCache::open_in_memory().unwrap());
    let roots = vec![data.path().to_path_buf()];
    let finder = || DuplicateFinder::new(FinderConfig::default().with_jobs(1).with_cache(Arc::clone(&cache)));

    let cold = finder().find_duplicates(&roots).unwrap();
    assert_eq!(cold.total_duplicates, 0);
    assert_eq!(cache.len().unwrap(), 2);

    let warm = finder().find_duplicates(&roots).unwrap();
    assert_eq!(warm.total_duplicates, 0);
    assert_eq!(warm.summary.cache_hits, 2);
}

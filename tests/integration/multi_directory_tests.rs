use dirdupe::duplicates::find_duplicates;
use dirdupe::session::{Session, SessionConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_three_roots_share_one_index() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let c = tempdir().unwrap();
    write(&a.path().join("photo.jpg"), b"pixels");
    write(&b.path().join("backup/photo.jpg"), b"pixels");
    write(&c.path().join("old/2019/photo.jpg"), b"pixels");
    write(&c.path().join("old/2019/notes.txt"), b"notes");

    let roots: Vec<PathBuf> = vec![a.path().into(), b.path().into(), c.path().into()];
    let index = find_duplicates(&roots, true, false, 3).unwrap();

    assert_eq!(index.total_files, 4);
    assert_eq!(index.total_duplicates, 3);

    let hash = index.file_to_hash[&a.path().join("photo.jpg")];
    assert_eq!(index.hash_to_dirs[&hash].len(), 3);
    assert_eq!(index.occurrences(&hash), 3);
    assert_eq!(
        index.duplicates_of(&a.path().join("photo.jpg")),
        {
            let mut v = vec![
                b.path().join("backup/photo.jpg"),
                c.path().join("old/2019/photo.jpg"),
            ];
            v.sort();
            v
        }
    );
    assert_eq!(index.dir_stats[&c.path().join("old/2019")].redundancy_score, 0.5);
    assert_eq!(index.dir_stats[&c.path().join("old")].file_count, 0);
}

#[test]
fn test_overlapping_roots_count_files_once() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("inner/a.txt"), b"alpha");
    write(&dir.path().join("b.txt"), b"beta");

    let roots = vec![dir.path().to_path_buf(), dir.path().join("inner")];
    let index = find_duplicates(&roots, true, false, 2).unwrap();

    assert_eq!(index.total_files, 2);
    assert_eq!(index.total_duplicates, 0);
}

#[test]
fn test_duplicate_groups_are_sorted_largest_first() {
    let dir = tempdir().unwrap();
    for name in ["x1", "x2", "x3"] {
        write(&dir.path().join(name), b"x");
    }
    for name in ["y1", "y2"] {
        write(&dir.path().join(name), b"y");
    }

    let index = find_duplicates(&[dir.path().to_path_buf()], true, false, 1).unwrap();
    let groups = index.duplicate_groups();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].files.len(), 3);
    assert_eq!(groups[1].files.len(), 2);
    assert_eq!(groups[1].files[0], dir.path().join("y1"));
}

#[test]
fn test_recursive_stats_and_sizes() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("top.txt"), b"12345");
    write(&root.join("sub/copy.txt"), b"12345");
    write(&root.join("sub/deeper/unique.txt"), b"abc");
    write(&root.join("sub/deeper/other.txt"), b"xyz1");

    let mut session = Session::with_config(
        root,
        SessionConfig {
            use_cache: false,
            jobs: 2,
            ..SessionConfig::default()
        },
    );
    session.scan(true).unwrap();

    let stats = session.recursive_stats(root);
    assert_eq!(stats.file_count, 4);
    assert_eq!(stats.duplicate_count, 2);
    assert_eq!(stats.dir_count, 2);
    assert_eq!(stats.redundancy_score, 0.5);

    let sub = session.recursive_stats(&root.join("sub"));
    assert_eq!(sub.file_count, 3);
    assert_eq!(sub.duplicate_count, 1);
    assert_eq!(sub.dir_count, 1);

    assert_eq!(session.dir_size(root), 5 + 5 + 3 + 4);
    assert_eq!(session.dir_size(&root.join("sub/deeper")), 7);

    let contents = session.dir_contents(&root.join("sub"));
    assert_eq!(contents.subdirs, vec![root.join("sub/deeper")]);
    assert_eq!(contents.files, vec![root.join("sub/copy.txt")]);

    assert!(session.caches().recursive_stats.contains(&root.join("sub/deeper")));
    assert!(session.caches().dir_sizes.contains(root));
    assert!(session.caches().dir_contents.contains(&root.join("sub")));
}

#[test]
fn test_invalidate_path_hits_ancestors_and_descendants() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("a/b/c/file"), b"f");
    write(&root.join("other/file"), b"g");

    let mut session = Session::with_config(
        root,
        SessionConfig {
            use_cache: false,
            jobs: 1,
            ..SessionConfig::default()
        },
    );
    session.scan(true).unwrap();
    session.recursive_stats(root);
    assert!(session.caches().recursive_stats.contains(&root.join("other")));

    session.invalidate_path(&root.join("a/b"));

    let cached = &session.caches().recursive_stats;
    assert!(!cached.contains(root));
    assert!(!cached.contains(&root.join("a")));
    assert!(!cached.contains(&root.join("a/b")));
    assert!(!cached.contains(&root.join("a/b/c")));
    assert!(cached.contains(&root.join("other")));
}

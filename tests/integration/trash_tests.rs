use dirdupe::actions::{
    ActionError, ItemKind, TrashManager, UndoError, HOLDING_AREA_NAME,
};
use dirdupe::session::{Session, SessionConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_trash_and_undo_file_roundtrip() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("docs/report.txt");
    write(&file, b"quarterly numbers");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));
    let record = manager.trash_item(&file, ItemKind::File).unwrap();

    assert!(!file.exists());
    assert!(record.trashed_location.exists());
    assert!(record.trashed_location.starts_with(manager.holding_area()));
    assert_eq!(manager.len(), 1);

    let restored = manager.undo_last_trash().unwrap().unwrap();
    assert_eq!(restored.original_path, file);
    assert_eq!(fs::read(&file).unwrap(), b"quarterly numbers");
    assert!(manager.is_empty());
}

#[test]
fn test_trash_and_undo_directory_roundtrip() {
    let dir = tempdir().unwrap();
    let album = dir.path().join("album");
    write(&album.join("one.jpg"), b"first");
    write(&album.join("nested/two.jpg"), b"second");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));
    manager.trash_item(&album, ItemKind::Directory).unwrap();
    assert!(!album.exists());

    manager.undo_last_trash().unwrap();
    assert_eq!(fs::read(album.join("one.jpg")).unwrap(), b"first");
    assert_eq!(fs::read(album.join("nested/two.jpg")).unwrap(), b"second");
}

#[test]
fn test_undo_is_lifo() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write(&a, b"a");
    write(&b, b"b");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));
    manager.trash_item(&a, ItemKind::File).unwrap();
    manager.trash_item(&b, ItemKind::File).unwrap();

    let first_undo = manager.undo_last_trash().unwrap().unwrap();
    assert_eq!(first_undo.original_path, b);
    assert!(b.exists());
    assert!(!a.exists());

    let second_undo = manager.undo_last_trash().unwrap().unwrap();
    assert_eq!(second_undo.original_path, a);
    assert!(manager.undo_last_trash().unwrap().is_none());
}

#[test]
fn test_same_name_trashed_twice() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));

    write(&file, b"version one");
    let first = manager.trash_item(&file, ItemKind::File).unwrap();
    write(&file, b"version two");
    let second = manager.trash_item(&file, ItemKind::File).unwrap();

    assert_ne!(first.trashed_location, second.trashed_location);
    assert_eq!(fs::read(&first.trashed_location).unwrap(), b"version one");
    assert_eq!(fs::read(&second.trashed_location).unwrap(), b"version two");

    manager.undo_last_trash().unwrap();
    assert_eq!(fs::read(&file).unwrap(), b"version two");
}

#[test]
fn test_undo_into_occupied_path_keeps_record() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(&file, b"original");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));
    let record = manager.trash_item(&file, ItemKind::File).unwrap();
    write(&file, b"replacement");

    let err = manager.undo_last_trash().unwrap_err();
    assert!(matches!(err, UndoError::TargetOccupied { .. }));
    assert_eq!(manager.len(), 1);
    assert_eq!(fs::read(&file).unwrap(), b"replacement");
    assert!(record.trashed_location.exists());

    fs::remove_file(&file).unwrap();
    manager.undo_last_trash().unwrap();
    assert_eq!(fs::read(&file).unwrap(), b"original");
}

#[test]
fn test_undo_with_missing_trashed_item() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(&file, b"original");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));
    let record = manager.trash_item(&file, ItemKind::File).unwrap();
    fs::remove_file(&record.trashed_location).unwrap();

    let err = manager.undo_last_trash().unwrap_err();
    assert!(matches!(err, UndoError::TrashedItemMissing { .. }));
    assert_eq!(manager.len(), 1);

    assert_eq!(manager.discard_last_record(), Some(record));
    assert!(manager.is_empty());
}

#[test]
fn test_trash_errors_leave_stack_alone() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(&file, b"data");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));

    let err = manager
        .trash_item(&dir.path().join("missing.txt"), ItemKind::File)
        .unwrap_err();
    assert!(matches!(err, ActionError::NotFound(_)));

    let err = manager.trash_item(&file, ItemKind::Directory).unwrap_err();
    assert!(matches!(
        err,
        ActionError::KindMismatch {
            expected: ItemKind::Directory,
            actual: ItemKind::File,
            ..
        }
    ));

    let err = manager.trash_item(dir.path(), ItemKind::Directory).unwrap_err();
    assert!(matches!(err, ActionError::Io { .. }));

    assert!(manager.is_empty());
    assert!(file.exists());
}

#[test]
fn test_batch_trash_reports_failures() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    write(&a, b"a");

    let mut manager = TrashManager::new(dir.path().join(HOLDING_AREA_NAME));
    let result = manager.trash_batch(vec![
        (a.clone(), ItemKind::File),
        (dir.path().join("nope"), ItemKind::File),
    ]);

    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert!(!result.all_succeeded());
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_session_trash_excludes_holding_area_from_rescan() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a/copy.txt"), b"duplicate");
    write(&dir.path().join("b/copy.txt"), b"duplicate");

    let mut session = Session::with_config(
        dir.path(),
        SessionConfig {
            use_cache: false,
            jobs: 1,
            ..SessionConfig::default()
        },
    );
    session.scan(true).unwrap();
    assert_eq!(session.index().total_duplicates, 2);

    let victim = dir.path().join("b/copy.txt");
    session.trash_item(&victim, ItemKind::File).unwrap();
    assert_eq!(session.trash_stack().len(), 1);
    assert!(session.trash_manager().holding_area().exists());

    session.rescan().unwrap();
    assert_eq!(session.index().total_files, 1);
    assert_eq!(session.index().total_duplicates, 0);

    session.undo_last_trash().unwrap();
    assert!(session.trash_stack().is_empty());
    assert_eq!(fs::read(&victim).unwrap(), b"duplicate");

    session.rescan().unwrap();
    assert_eq!(session.index().total_duplicates, 2);
}

#[test]
fn test_session_trash_directory_invalidates_caches() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("keep/x"), b"x");
    write(&dir.path().join("drop/x"), b"x");

    let mut session = Session::with_config(
        dir.path(),
        SessionConfig {
            use_cache: false,
            jobs: 1,
            ..SessionConfig::default()
        },
    );
    session.scan(true).unwrap();
    let root = dir.path().to_path_buf();
    session.recursive_stats(&root);
    session.dir_size(&root);
    assert!(session.caches().recursive_stats.contains(&root.join("drop")));

    session
        .trash_item(&root.join("drop"), ItemKind::Directory)
        .unwrap();

    assert!(!session.caches().recursive_stats.contains(&root));
    assert!(!session.caches().recursive_stats.contains(&root.join("drop")));
    assert!(!session.caches().dir_sizes.contains(&root));

    // Recomputed lazily from the unchanged index.
    assert_eq!(session.recursive_stats(&root).file_count, 2);
}

#[cfg(unix)]
#[test]
fn test_trash_from_read_only_directory_is_refused() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let frozen = dir.path().join("frozen");
    let victim = frozen.join("copy.txt");
    write(&dir.path().join("a/copy.txt"), b"duplicate");
    write(&victim, b"duplicate");
    fs::set_permissions(&frozen, fs::Permissions::from_mode(0o555)).unwrap();

    // Permission bits do not bind a privileged user.
    if fs::write(frozen.join("writable"), b"").is_ok() {
        fs::set_permissions(&frozen, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let mut session = Session::with_config(
        dir.path(),
        SessionConfig {
            use_cache: false,
            jobs: 1,
            ..SessionConfig::default()
        },
    );
    session.scan(true).unwrap();
    assert_eq!(session.index().total_duplicates, 2);

    let result = session.trash_item(&victim, ItemKind::File);
    fs::set_permissions(&frozen, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(ActionError::PermissionDenied(_))));
    assert!(session.trash_stack().is_empty());
    assert_eq!(fs::read(&victim).unwrap(), b"duplicate");
    assert!(!session.trash_manager().holding_area().exists());
}

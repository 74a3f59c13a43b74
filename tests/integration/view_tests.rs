use dirdupe::session::{Session, SessionConfig, View, ViewItem};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// root/full: two files, both copied into root/mirror.
/// root/mixed: one copy and one unique file.
fn fixture() -> (TempDir, Session) {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("full/1.txt"), b"one");
    write(&root.join("full/2.txt"), b"two");
    write(&root.join("mirror/1.txt"), b"one");
    write(&root.join("mirror/2.txt"), b"two");
    write(&root.join("mixed/1.txt"), b"one");
    write(&root.join("mixed/solo.txt"), b"solo");

    let mut session = Session::with_config(
        root,
        SessionConfig {
            use_cache: false,
            jobs: 1,
            ..SessionConfig::default()
        },
    );
    session.scan(true).unwrap();
    (dir, session)
}

fn paths(items: &[ViewItem]) -> Vec<PathBuf> {
    items.iter().map(|i| i.path().to_path_buf()).collect()
}

#[test]
fn test_push_pop_restores_selection() {
    let (dir, mut session) = fixture();

    session.set_selected_index(5);
    session.set_scroll_offset(2);
    session.push_view(View::DirDetail {
        dir: dir.path().join("full"),
    });

    assert_eq!(session.view_stack().len(), 2);
    assert_eq!(session.selected_index(), 0);
    assert_eq!(session.scroll_offset(), 0);

    session.set_selected_index(1);
    session.push_view(View::FileMatches {
        file: dir.path().join("full/1.txt"),
    });
    assert_eq!(session.view_stack().len(), 3);

    session.pop_view().unwrap();
    assert_eq!(session.selected_index(), 1);

    session.pop_view().unwrap();
    assert_eq!(session.selected_index(), 5);
    assert_eq!(session.scroll_offset(), 2);
    assert_eq!(session.current_view(), &View::Overview);
}

#[test]
fn test_root_frame_is_never_popped() {
    let (_dir, mut session) = fixture();
    assert!(session.pop_view().is_none());
    assert!(session.pop_view().is_none());
    assert_eq!(session.view_stack().len(), 1);
    assert_eq!(session.current_view(), &View::Overview);
}

#[test]
fn test_overview_lists_directories_by_redundancy() {
    let (dir, mut session) = fixture();
    let items = session.view_items();

    assert_eq!(
        paths(&items),
        vec![
            dir.path().join("full"),
            dir.path().join("mirror"),
            dir.path().join("mixed"),
        ]
    );
    match &items[2] {
        ViewItem::Directory { stats, .. } => assert_eq!(stats.redundancy_score, 0.5),
        other => panic!("expected a directory, got {:?}", other),
    }
}

#[test]
fn test_dir_detail_lists_subdirs_then_files() {
    let (dir, mut session) = fixture();
    session.push_view(View::DirDetail {
        dir: dir.path().to_path_buf(),
    });
    let items = session.view_items();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(ViewItem::is_dir));

    session.push_view(View::DirDetail {
        dir: dir.path().join("mixed"),
    });
    let items = session.view_items();
    assert_eq!(
        items,
        vec![
            ViewItem::File {
                path: dir.path().join("mixed/1.txt"),
                redundancy: 3,
            },
            ViewItem::File {
                path: dir.path().join("mixed/solo.txt"),
                redundancy: 1,
            },
        ]
    );
}

#[test]
fn test_file_matches_lists_every_copy() {
    let (dir, mut session) = fixture();
    session.push_view(View::FileMatches {
        file: dir.path().join("mirror/1.txt"),
    });

    let items = session.view_items();
    assert_eq!(
        paths(&items),
        vec![
            dir.path().join("full/1.txt"),
            dir.path().join("mirror/1.txt"),
            dir.path().join("mixed/1.txt"),
        ]
    );
}

#[test]
fn test_selection_movement_and_scrolling() {
    let (_dir, mut session) = fixture();

    session.select_next(3);
    session.select_next(3);
    session.select_next(3);
    assert_eq!(session.selected_index(), 2);

    session.select_previous();
    assert_eq!(session.selected_index(), 1);

    session.select_page_down(20, 10);
    assert_eq!(session.selected_index(), 11);
    session.ensure_visible(5);
    assert_eq!(session.scroll_offset(), 7);

    session.select_page_up(10);
    assert_eq!(session.selected_index(), 1);
    session.ensure_visible(5);
    assert_eq!(session.scroll_offset(), 1);

    session.set_selected_index(9);
    session.clamp_selection(4);
    assert_eq!(session.selected_index(), 3);
    session.clamp_selection(0);
    assert_eq!(session.selected_index(), 0);
}

#[test]
fn test_rescan_drops_views_of_vanished_directories() {
    let (dir, mut session) = fixture();
    session.push_view(View::DirDetail {
        dir: dir.path().join("mixed"),
    });

    fs::remove_dir_all(dir.path().join("mixed")).unwrap();
    session.rescan().unwrap();

    assert_eq!(session.view_stack().len(), 1);
    assert_eq!(session.current_view(), &View::Overview);
}

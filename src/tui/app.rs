//! TUI application state.
//!
//! # Overview
//!
//! [`App`] wraps a scanned [`Session`] and adds what only the terminal front
//! end needs: the current mode, the rows of the visible view, a pending
//! confirmation and a status line. All navigation state (view stack,
//! selection, scroll) lives in the session.
//!
//! Trash, undo and rescan go through the session; after trash and undo the
//! app rescans so the index matches the disk again.
//!
//! # Example
//!
//! ```no_run
//! use dirdupe::session::Session;
//! use dirdupe::tui::app::{Action, App};
//!
//! let mut session = Session::new("/photos", true);
//! session.scan(true).unwrap();
//!
//! let mut app = App::new(session);
//! app.handle_action(Action::NavigateDown);
//! app.handle_action(Action::Open);
//! ```

use std::path::PathBuf;

use crate::actions::{ItemKind, UndoError};
use crate::session::{Session, View, ViewItem};

use super::theme::Theme;

/// What the app is doing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Moving through views
    #[default]
    Browsing,
    /// Waiting for y/n before trashing
    Confirming(PendingTrash),
    /// Showing the key reference
    ShowingHelp,
    /// About to exit
    Quitting,
}

/// An item waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTrash {
    /// Item to trash
    pub path: PathBuf,
    /// File or directory
    pub kind: ItemKind,
    /// Copies of the content, itself included (files only)
    pub redundancy: usize,
}

/// User intent decoded from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NavigateUp,
    NavigateDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    /// Descend into the selected row
    Open,
    /// Return to the previous view
    Back,
    /// Trash the selected row
    Trash,
    /// Restore the last trashed item
    Undo,
    /// Rescan all roots
    Rescan,
    /// Answer yes to a prompt
    Confirm,
    /// Answer no or close a dialog
    Cancel,
    ShowHelp,
    Quit,
}

/// One-line feedback shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Message text
    pub text: String,
    /// Whether it reports a failure
    pub is_error: bool,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// TUI state. Only touched from the main thread.
#[derive(Debug)]
pub struct App {
    session: Session,
    mode: AppMode,
    items: Vec<ViewItem>,
    status: Option<StatusMessage>,
    visible_rows: usize,
    theme: Theme,
}

impl App {
    /// Wrap a session, usually one that has already been scanned.
    #[must_use]
    pub fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            mode: AppMode::Browsing,
            items: Vec::new(),
            status: None,
            visible_rows: 20,
            theme: Theme::default(),
        };
        app.refresh();
        app
    }

    /// Use a different palette.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    // ==================== Accessors ====================

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Give the session back.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> &AppMode {
        &self.mode
    }

    /// Whether the main loop should stop.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.mode == AppMode::Quitting
    }

    /// Rows of the current view.
    #[must_use]
    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    /// Highlighted row.
    #[must_use]
    pub fn selected_item(&self) -> Option<&ViewItem> {
        self.items.get(self.session.selected_index())
    }

    /// Last status message.
    #[must_use]
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Palette in use.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Rows that fit in the list area.
    #[must_use]
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Update the list height after a resize.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
        self.session.ensure_visible(self.visible_rows);
    }

    /// Reload rows for the current view and keep the selection in range.
    pub fn refresh(&mut self) {
        self.items = self.session.view_items();
        self.session.clamp_selection(self.items.len());
        self.session.ensure_visible(self.visible_rows);
    }

    // ==================== Actions ====================

    /// Apply an action. Returns whether it changed anything.
    pub fn handle_action(&mut self, action: Action) -> bool {
        log::trace!("Action {:?} in mode {:?}", action, self.mode);
        match self.mode.clone() {
            AppMode::Quitting => false,
            AppMode::ShowingHelp => {
                self.mode = AppMode::Browsing;
                true
            }
            AppMode::Confirming(pending) => match action {
                Action::Confirm => {
                    self.mode = AppMode::Browsing;
                    self.perform_trash(&pending.path, pending.kind);
                    true
                }
                Action::Cancel | Action::Back => {
                    self.mode = AppMode::Browsing;
                    self.status = Some(StatusMessage::info("Cancelled"));
                    true
                }
                Action::Quit => {
                    self.mode = AppMode::Quitting;
                    true
                }
                _ => false,
            },
            AppMode::Browsing => self.handle_browsing(action),
        }
    }

    fn handle_browsing(&mut self, action: Action) -> bool {
        let len = self.items.len();
        let page = self.visible_rows;
        match action {
            Action::NavigateUp => self.session.select_previous(),
            Action::NavigateDown => self.session.select_next(len),
            Action::PageUp => self.session.select_page_up(page),
            Action::PageDown => self.session.select_page_down(len, page),
            Action::GoToTop => self.session.set_selected_index(0),
            Action::GoToBottom => self.session.set_selected_index(len.saturating_sub(1)),
            Action::Open => return self.open_selected(),
            Action::Back => {
                if self.session.pop_view().is_none() {
                    return false;
                }
                self.refresh();
                return true;
            }
            Action::Trash => return self.request_trash(),
            Action::Undo => return self.undo(),
            Action::Rescan => {
                self.rescan();
                return true;
            }
            Action::ShowHelp => {
                self.mode = AppMode::ShowingHelp;
                return true;
            }
            Action::Quit => {
                self.mode = AppMode::Quitting;
                return true;
            }
            Action::Confirm | Action::Cancel => {
                self.status = None;
                return true;
            }
        }
        self.session.ensure_visible(self.visible_rows);
        true
    }

    fn open_selected(&mut self) -> bool {
        let Some(item) = self.selected_item().cloned() else {
            return false;
        };
        let view = match (&item, self.session.current_view()) {
            (ViewItem::Directory { path, .. }, _) => View::DirDetail { dir: path.clone() },
            (ViewItem::File { path, .. }, View::FileMatches { .. }) => match path.parent() {
                Some(parent) => View::DirDetail {
                    dir: parent.to_path_buf(),
                },
                None => return false,
            },
            (ViewItem::File { path, redundancy }, _) => {
                if *redundancy <= 1 {
                    self.status = Some(StatusMessage::info(format!(
                        "{} has no other copies",
                        path.display()
                    )));
                    return true;
                }
                View::FileMatches { file: path.clone() }
            }
        };
        self.session.push_view(view);
        self.refresh();
        true
    }

    fn request_trash(&mut self) -> bool {
        let Some(item) = self.selected_item().cloned() else {
            return false;
        };
        let path = item.path().to_path_buf();
        let kind = if item.is_dir() {
            ItemKind::Directory
        } else {
            ItemKind::File
        };

        if self.session.needs_confirmation(&path, kind) {
            let redundancy = match kind {
                ItemKind::File => self.session.get_file_redundancy_count(&path),
                ItemKind::Directory => 0,
            };
            self.mode = AppMode::Confirming(PendingTrash {
                path,
                kind,
                redundancy,
            });
        } else {
            self.perform_trash(&path, kind);
        }
        true
    }

    fn perform_trash(&mut self, path: &std::path::Path, kind: ItemKind) {
        match self.session.trash_item(path, kind) {
            Ok(record) => {
                log::info!("Trashed {}", record.original_path.display());
                self.status = Some(StatusMessage::info(format!(
                    "Trashed {} (u to undo)",
                    record.original_path.display()
                )));
                self.rescan_after_change();
            }
            Err(e) => {
                log::warn!("Trash failed: {}", e);
                self.status = Some(StatusMessage::error(format!("Trash failed: {}", e)));
            }
        }
    }

    fn undo(&mut self) -> bool {
        match self.session.undo_last_trash() {
            Ok(Some(record)) => {
                log::info!("Restored {}", record.original_path.display());
                self.status = Some(StatusMessage::info(format!(
                    "Restored {}",
                    record.original_path.display()
                )));
                self.rescan_after_change();
            }
            Ok(None) => {
                self.status = Some(StatusMessage::info("Nothing to undo"));
            }
            Err(e @ UndoError::TrashedItemMissing { .. }) => {
                // Can never succeed; drop the record so older ones stay reachable.
                log::warn!("Undo failed: {}", e);
                self.session.discard_last_trash_record();
                self.status = Some(StatusMessage::error(format!(
                    "Undo failed: {} (record dropped)",
                    e
                )));
            }
            Err(e) => {
                log::warn!("Undo failed: {}", e);
                self.status = Some(StatusMessage::error(format!("Undo failed: {}", e)));
            }
        }
        true
    }

    fn rescan(&mut self) {
        match self.session.rescan() {
            Ok(summary) => {
                let text = format!(
                    "Rescanned: {} files, {} duplicated",
                    summary.total_files, summary.duplicate_files
                );
                self.status = Some(StatusMessage::info(text));
            }
            Err(e) => {
                self.status = Some(StatusMessage::error(format!("Rescan failed: {}", e)));
            }
        }
        self.refresh();
    }

    /// Rescan without replacing the status line unless the rescan fails.
    fn rescan_after_change(&mut self) {
        if let Err(e) = self.session.rescan() {
            log::warn!("Rescan after change failed: {}", e);
            self.status = Some(StatusMessage::error(format!("Rescan failed: {}", e)));
        }
        self.refresh();
    }
}

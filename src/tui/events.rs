//! Keyboard input.
//!
//! Keys map to [`Action`]s depending on the mode: while a confirmation is
//! pending only `y`, `n`, `Esc` and `q` mean anything.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

use super::app::{Action, AppMode};

/// Input failure.
#[derive(Debug, Error)]
pub enum EventError {
    /// Reading from the terminal failed.
    #[error("failed to read terminal event: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press
    Key(KeyEvent),
    /// Terminal resized to (columns, rows)
    Resize(u16, u16),
}

/// Polls crossterm for input.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for a key press or resize.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Io`] if the terminal cannot be read.
    pub fn poll(&self, timeout: Duration) -> Result<Option<InputEvent>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            // Windows reports releases too.
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(InputEvent::Key(key))),
            Event::Resize(cols, rows) => Ok(Some(InputEvent::Resize(cols, rows))),
            _ => Ok(None),
        }
    }
}

/// Translate a key press into an action for `mode`.
#[must_use]
pub fn action_for_key(mode: &AppMode, key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match mode {
        AppMode::Quitting => None,
        AppMode::ShowingHelp => Some(Action::Cancel),
        AppMode::Confirming(_) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        AppMode::Browsing => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::NavigateUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::NavigateDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::Home | KeyCode::Char('g') => Some(Action::GoToTop),
            KeyCode::End | KeyCode::Char('G') => Some(Action::GoToBottom),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => Some(Action::Open),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                Some(Action::Back)
            }
            KeyCode::Char('d') | KeyCode::Delete => Some(Action::Trash),
            KeyCode::Char('u') => Some(Action::Undo),
            KeyCode::Char('r') => Some(Action::Rescan),
            KeyCode::Char('?') => Some(Action::ShowHelp),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
    }
}

/// Key reference shown in the help dialog, as (keys, description).
pub const KEY_HELP: &[(&str, &str)] = &[
    ("Up/k  Down/j", "move"),
    ("PgUp  PgDn", "page"),
    ("g  G", "top / bottom"),
    ("Enter/l", "open directory or file copies"),
    ("Esc/h", "back"),
    ("d", "trash selected item"),
    ("u", "undo last trash"),
    ("r", "rescan"),
    ("?", "help"),
    ("q", "quit"),
];

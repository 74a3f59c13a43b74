//! TUI main loop.
//!
//! Takes over the terminal (raw mode, alternate screen, hidden cursor) and
//! restores it on exit, including after a panic.

use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;

use super::app::App;
use super::events::{action_for_key, EventHandler, InputEvent};
use super::ui::{list_rows, render};

/// About 60 frames per second.
const FRAME_DURATION: Duration = Duration::from_millis(16);

const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// TUI failure.
#[derive(Debug, Error)]
pub enum TuiError {
    /// Terminal I/O failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input could not be read.
    #[error("event error: {0}")]
    Event(#[from] super::events::EventError),
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive browser until the user quits or `shutdown_flag` is raised.
///
/// # Errors
///
/// Returns [`TuiError`] on terminal or input failures. The terminal is
/// restored either way.
pub fn run_tui(app: &mut App, shutdown_flag: Option<Arc<AtomicBool>>) -> TuiResult<()> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        original_hook(info);
    }));

    let result = setup_terminal().and_then(|mut terminal| {
        let outcome = event_loop(&mut terminal, app, shutdown_flag.as_deref());
        restore_terminal();
        outcome
    });

    let _ = panic::take_hook();
    result
}

fn event_loop(
    terminal: &mut Terminal,
    app: &mut App,
    shutdown_flag: Option<&AtomicBool>,
) -> TuiResult<()> {
    let events = EventHandler::new();
    let (_, rows) = terminal::size()?;
    app.set_visible_rows(list_rows(rows));

    let mut last_render = Instant::now();
    loop {
        if shutdown_flag.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            log::info!("Shutdown requested, leaving browser");
            break;
        }
        if app.should_quit() {
            break;
        }

        terminal.draw(|frame| render(frame, app))?;

        match events.poll(POLL_TIMEOUT)? {
            Some(InputEvent::Key(key)) => {
                if let Some(action) = action_for_key(app.mode(), &key) {
                    app.handle_action(action);
                }
            }
            Some(InputEvent::Resize(_, rows)) => app.set_visible_rows(list_rows(rows)),
            None => {}
        }

        let elapsed = last_render.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
        last_render = Instant::now();
    }

    log::debug!("Browser closed");
    Ok(())
}

fn setup_terminal() -> TuiResult<Terminal> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
}

//! Interactive terminal browser.
//!
//! - [`app`]: state on top of a [`Session`](crate::session::Session)
//! - [`events`]: key decoding
//! - [`ui`]: ratatui rendering
//! - [`run`]: terminal setup and the event loop
//!
//! Data flows one way: keys become [`Action`]s, actions update the
//! [`App`], and the screen is redrawn from the app state.

pub mod app;
pub mod events;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, AppMode, PendingTrash, StatusMessage};
pub use events::{action_for_key, EventError, EventHandler};
pub use run::{run_tui, TuiError, TuiResult};
pub use theme::Theme;
pub use ui::{format_size, render};

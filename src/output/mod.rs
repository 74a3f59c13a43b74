//! Report formatters for the `scan` subcommand.
//!
//! - [`text`]: coloured table of the most redundant directories
//! - [`json`]: machine-readable report for scripting
//!
//! ```no_run
//! use dirdupe::duplicates::find_duplicates;
//! use dirdupe::output::TextOutput;
//! use std::path::PathBuf;
//!
//! let index = find_duplicates(&[PathBuf::from(".")], true, false, 4).unwrap();
//! TextOutput::new(&index, 20).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;

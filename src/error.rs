//! Exit codes and machine-readable error reports.

use serde::Serialize;

use crate::duplicates::{DuplicateIndex, FinderError};

/// Process exit codes.
///
/// - 0: scan finished and duplicates were found
/// - 1: unexpected failure
/// - 2: scan finished with no duplicates
/// - 3: scan finished but some files or directories were skipped
/// - 130: interrupted with Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates found.
    Success = 0,
    /// Unexpected failure.
    GeneralError = 1,
    /// Nothing duplicated.
    NoDuplicates = 2,
    /// Finished with skipped entries.
    PartialSuccess = 3,
    /// Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable code shown in error messages.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::NoDuplicates => "DD002",
            Self::PartialSuccess => "DD003",
            Self::Interrupted => "DD130",
        }
    }

    /// Exit code for a completed scan.
    #[must_use]
    pub fn for_index(index: &DuplicateIndex) -> Self {
        if index.summary.has_skipped() {
            Self::PartialSuccess
        } else if index.total_duplicates == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }

    /// Exit code for a failed run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code such as `DD001`
    pub code: String,
    /// Process exit code
    pub exit_code: i32,
    /// Message including the error chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report for `err`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

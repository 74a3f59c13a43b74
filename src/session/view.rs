//! Navigation frames.

use std::path::PathBuf;

use crate::duplicates::DirStats;

/// What a frame shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// All directories, most redundant first.
    Overview,
    /// Subdirectories and files of one directory.
    DirDetail {
        /// Directory being shown
        dir: PathBuf,
    },
    /// Every copy of one file.
    FileMatches {
        /// File whose copies are listed
        file: PathBuf,
    },
}

impl View {
    /// Short title for headers.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Overview => "Directories by redundancy".to_string(),
            Self::DirDetail { dir } => dir.display().to_string(),
            Self::FileMatches { file } => format!("Copies of {}", file.display()),
        }
    }
}

/// One entry of the view stack.
///
/// `selected_index` and `scroll_offset` hold the values saved when another
/// frame was pushed on top; the live values belong to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFrame {
    /// What the frame shows
    pub view: View,
    /// Saved selection
    pub selected_index: usize,
    /// Saved scroll position
    pub scroll_offset: usize,
}

impl ViewFrame {
    /// A frame with selection at the top.
    #[must_use]
    pub fn new(view: View) -> Self {
        Self {
            view,
            selected_index: 0,
            scroll_offset: 0,
        }
    }
}

impl From<View> for ViewFrame {
    fn from(view: View) -> Self {
        Self::new(view)
    }
}

/// A row of the current view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewItem {
    /// A directory with its stats (recursive below the overview).
    Directory {
        /// Directory path
        path: PathBuf,
        /// Counts and score
        stats: DirStats,
    },
    /// A file and how many copies of its content exist, itself included.
    File {
        /// File path
        path: PathBuf,
        /// Copies of this content
        redundancy: usize,
    },
}

impl ViewItem {
    /// Path of the row.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
        }
    }

    /// Whether the row is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

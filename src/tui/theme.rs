//! TUI colour palette.

use ratatui::style::Color;

/// Colours used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub danger: Color,
    pub success: Color,
    pub dim: Color,
    pub normal: Color,
    pub inverted_fg: Color,
}

impl Theme {
    /// High-contrast dark palette.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::DarkGray,
            normal: Color::White,
            inverted_fg: Color::Black,
        }
    }

    /// No colours at all, for `--no-color` and `NO_COLOR`.
    #[must_use]
    pub fn monochrome() -> Self {
        Self {
            primary: Color::Reset,
            secondary: Color::Reset,
            danger: Color::Reset,
            success: Color::Reset,
            dim: Color::Reset,
            normal: Color::Reset,
            inverted_fg: Color::Reset,
        }
    }

    /// Colour for a redundancy score: red when fully duplicated, yellow from half.
    #[must_use]
    pub fn score_color(&self, score: f64) -> Color {
        if score >= 1.0 {
            self.danger
        } else if score >= 0.5 {
            self.secondary
        } else {
            self.normal
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

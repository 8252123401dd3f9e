//! TUI color palettes.
//!
//! Dark and light palettes, plus `auto` which guesses from the terminal
//! environment.

use ratatui::style::Color;

use crate::cli::ThemeArg;

/// Colors by role in the scanner screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Title and dialog borders.
    pub border: Color,
    /// Key hints and notices.
    pub hint: Color,
    /// Camera and file scans in progress.
    pub scanning: Color,
    /// Decoded results and the welcome dialog.
    pub success: Color,
    /// Error banner.
    pub error: Color,
    /// Labels and secondary text.
    pub muted: Color,
    /// Body text.
    pub text: Color,
    /// Text on the colored status badge.
    pub badge_fg: Color,
}

impl Theme {
    /// Palette for dark terminal backgrounds (default).
    pub fn dark() -> Self {
        Self {
            border: Color::Cyan,
            hint: Color::Yellow,
            scanning: Color::LightBlue,
            success: Color::LightGreen,
            error: Color::LightRed,
            muted: Color::DarkGray,
            text: Color::White,
            badge_fg: Color::Black,
        }
    }

    /// Palette for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            border: Color::Blue,
            hint: Color::Magenta,
            scanning: Color::Blue,
            success: Color::Green,
            error: Color::Red,
            muted: Color::Gray,
            text: Color::Black,
            badge_fg: Color::White,
        }
    }

    /// Pick a palette from the terminal background, dark when unknown.
    pub fn auto() -> Self {
        if is_light_terminal() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Palette for a configured theme choice.
    pub fn from_arg(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Auto => Self::auto(),
            ThemeArg::Dark => Self::dark(),
            ThemeArg::Light => Self::light(),
        }
    }

    /// Whether this palette targets a light background.
    pub fn is_light(&self) -> bool {
        self.text == Color::Black
    }
}

/// Guess a light background from `COLORFGBG` ("fg;bg", set by rxvt, xterm, konsole).
fn is_light_terminal() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next()?.parse::<u32>().ok())
        // 0 is black, 7 light gray, 8 dark gray, 15 white
        .is_some_and(|bg| bg >= 7 && bg != 8)
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

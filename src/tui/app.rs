//! TUI application state.
//!
//! # Overview
//!
//! [`App`] owns the [`ScanSessionController`] and the UI-only state around
//! it: which dialog is open, the path being typed for an upload, and a
//! transient notice line. The scan session itself is only ever changed
//! through the controller.
//!
//! # Architecture
//!
//! 1. Key presses arrive from [`super::events::EventHandler`]
//! 2. [`App::handle_key`] either edits the path buffer or resolves an [`Action`]
//! 3. [`App::handle_action`] drives the controller
//! 4. [`App::pump`] applies decode events from the capability threads
//! 5. [`super::ui::render`] draws the current state
//!
//! # Example
//!
//! ```
//! use qrscan::capture::{CameraOptions, FrameDirCamera, ImageFileDecoder};
//! use qrscan::session::{ScanMode, ScanSessionController};
//! use qrscan::tui::{Action, App, AppMode};
//!
//! let controller = ScanSessionController::new(
//!     FrameDirCamera::new("/nonexistent/frames"),
//!     ImageFileDecoder::new(),
//!     CameraOptions::default(),
//! );
//! let mut app = App::new(controller);
//!
//! app.handle_action(Action::UploadImage);
//! assert_eq!(app.mode(), AppMode::EnteringPath);
//!
//! app.handle_action(Action::Cancel);
//! assert_eq!(app.mode(), AppMode::Main);
//! assert_eq!(app.session().mode(), ScanMode::Idle);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::keybindings::KeyBindings;
use super::theme::Theme;
use crate::capture::{CameraDecoder, FileDecoder};
use crate::session::{ScanMode, ScanSession, ScanSessionController, ScanSource, SelectedFile};

/// Which screen or dialog the TUI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Main screen: options, live scan, results or error banner
    #[default]
    Main,
    /// Typing the path of an image to upload
    EnteringPath,
    /// "Welcome, name!" popup after choosing to use a decoded name
    Welcome,
    /// Key help overlay
    ShowingHelp,
    /// Application is quitting
    Quitting,
}

impl AppMode {
    /// Check if a dialog covers the main screen.
    #[must_use]
    pub fn is_dialog(&self) -> bool {
        matches!(self, Self::EnteringPath | Self::Welcome | Self::ShowingHelp)
    }

    /// Check if the application is done (quitting).
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Quitting)
    }
}

/// User action triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Open the camera
    OpenCamera,
    /// Start typing the path of an image to scan
    UploadImage,
    /// Retry after a failure
    Retry,
    /// Clear the result and go back to the options
    ScanAgain,
    /// Greet the decoded name
    UseName,
    /// Show key help
    ShowHelp,
    /// Confirm the open dialog
    Confirm,
    /// Close the open dialog
    Cancel,
    /// Quit the application
    Quit,
}

impl Action {
    /// Every action, in key resolution order.
    #[must_use]
    pub fn all() -> &'static [Action] {
        &[
            Self::Quit,
            Self::OpenCamera,
            Self::UploadImage,
            Self::Retry,
            Self::ScanAgain,
            Self::UseName,
            Self::ShowHelp,
            Self::Confirm,
            Self::Cancel,
        ]
    }

    /// Config name of the action (`open_camera`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenCamera => "open_camera",
            Self::UploadImage => "upload_image",
            Self::Retry => "retry",
            Self::ScanAgain => "scan_again",
            Self::UseName => "use_name",
            Self::ShowHelp => "show_help",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Quit => "quit",
        }
    }

    /// Config names of every action.
    #[must_use]
    pub fn all_names() -> Vec<&'static str> {
        Self::all().iter().map(Action::name).collect()
    }

    /// Description shown in the help overlay.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::OpenCamera => "Open camera",
            Self::UploadImage => "Upload image",
            Self::Retry => "Retry",
            Self::ScanAgain => "Scan again",
            Self::UseName => "Use this name",
            Self::ShowHelp => "Toggle help",
            Self::Confirm => "Confirm",
            Self::Cancel => "Close dialog",
            Self::Quit => "Quit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .find(|a| a.name() == normalized)
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

/// TUI application state.
///
/// Not thread-safe; lives on the thread that owns the terminal.
#[derive(Debug)]
pub struct App<C: CameraDecoder, F: FileDecoder> {
    controller: ScanSessionController<C, F>,
    mode: AppMode,
    /// Path typed in the upload dialog
    path_input: String,
    /// One-line notice for rejected actions
    notice: Option<String>,
    keybindings: KeyBindings,
    theme: Theme,
    accessible: bool,
}

impl<C: CameraDecoder, F: FileDecoder> App<C, F> {
    /// Create an app around a controller with default keys and theme.
    #[must_use]
    pub fn new(controller: ScanSessionController<C, F>) -> Self {
        Self {
            controller,
            mode: AppMode::Main,
            path_input: String::new(),
            notice: None,
            keybindings: KeyBindings::default(),
            theme: Theme::default(),
            accessible: false,
        }
    }

    /// Use custom keybindings.
    #[must_use]
    pub fn with_keybindings(mut self, keybindings: KeyBindings) -> Self {
        self.keybindings = keybindings;
        self
    }

    /// Use a color theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Draw ASCII borders.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    // ==================== Accessors ====================

    /// Current UI mode.
    #[must_use]
    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// Set the UI mode.
    pub fn set_mode(&mut self, mode: AppMode) {
        log::debug!("Mode transition: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Check if the application should quit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.mode.is_done()
    }

    /// Current scan session.
    #[must_use]
    pub fn session(&self) -> &ScanSession {
        self.controller.snapshot()
    }

    /// The session controller.
    #[must_use]
    pub fn controller(&self) -> &ScanSessionController<C, F> {
        &self.controller
    }

    /// Path typed so far in the upload dialog.
    #[must_use]
    pub fn path_input(&self) -> &str {
        &self.path_input
    }

    /// Current notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Key bindings in use.
    #[must_use]
    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    /// Color theme.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Check if ASCII borders are used.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    // ==================== Session ====================

    /// Apply pending decode events. Returns `true` if the session changed.
    pub fn pump(&mut self) -> bool {
        let changed = self.controller.pump();
        if changed {
            self.notice = None;
        }
        changed
    }

    /// Scan the file at `path`.
    pub fn scan_path(&mut self, path: impl AsRef<Path>) {
        let file = SelectedFile::from_path(path);
        if let Err(e) = self.controller.select_file(file) {
            self.set_notice(e.to_string());
        }
    }

    /// Tear down the session, releasing the camera.
    pub fn close(self) -> ScanSession {
        self.controller.close()
    }

    fn set_notice(&mut self, notice: impl Into<String>) {
        let notice = notice.into();
        log::debug!("Notice: {}", notice);
        self.notice = Some(notice);
    }

    // ==================== Input ====================

    /// Handle a key press.
    ///
    /// While the upload dialog is open, printable keys edit the path and
    /// only Enter, Esc and Ctrl+C act. Returns `true` if the key was used.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.mode == AppMode::EnteringPath {
            return self.handle_path_key(key);
        }

        match self.keybindings.resolve(&key) {
            Some(action) => self.handle_action(action),
            None => false,
        }
    }

    fn handle_path_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                return self.handle_action(Action::Quit);
            }
            return false;
        }

        match key.code {
            KeyCode::Enter => self.handle_action(Action::Confirm),
            KeyCode::Esc => self.handle_action(Action::Cancel),
            KeyCode::Backspace => self.path_input.pop().is_some(),
            KeyCode::Char(c) => {
                self.path_input.push(c);
                true
            }
            _ => false,
        }
    }

    /// Handle a user action. Returns `true` if it did anything.
    pub fn handle_action(&mut self, action: Action) -> bool {
        log::trace!("Handling action: {:?} in mode {:?}", action, self.mode);

        match action {
            Action::Quit => {
                self.set_mode(AppMode::Quitting);
                true
            }
            Action::Cancel => {
                if self.mode.is_dialog() {
                    self.path_input.clear();
                    self.set_mode(AppMode::Main);
                    true
                } else {
                    self.notice.take().is_some()
                }
            }
            Action::ShowHelp => {
                let next = if self.mode == AppMode::ShowingHelp {
                    AppMode::Main
                } else {
                    AppMode::ShowingHelp
                };
                self.set_mode(next);
                true
            }
            Action::Confirm => self.confirm(),
            _ if self.mode != AppMode::Main => false,
            Action::OpenCamera => {
                self.notice = None;
                if let Err(e) = self.controller.start_camera() {
                    self.set_notice(e.to_string());
                    return false;
                }
                true
            }
            Action::UploadImage => match self.session().mode() {
                ScanMode::FileScanning | ScanMode::Succeeded => {
                    self.set_notice(format!(
                        "Cannot upload an image while the session is {}",
                        self.session().mode()
                    ));
                    false
                }
                _ => {
                    self.notice = None;
                    self.path_input.clear();
                    self.set_mode(AppMode::EnteringPath);
                    true
                }
            },
            Action::Retry => self.retry(),
            Action::ScanAgain => {
                self.notice = None;
                self.controller.reset();
                true
            }
            Action::UseName => {
                if self.session().extracted_name().is_some() {
                    self.set_mode(AppMode::Welcome);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn confirm(&mut self) -> bool {
        match self.mode {
            AppMode::EnteringPath => {
                let path = self.path_input.trim().to_string();
                if path.is_empty() {
                    self.set_notice("Type the path of an image file");
                    return false;
                }
                self.path_input.clear();
                self.set_mode(AppMode::Main);
                self.notice = None;
                self.scan_path(&path);
                true
            }
            AppMode::Welcome | AppMode::ShowingHelp => {
                self.set_mode(AppMode::Main);
                true
            }
            AppMode::Main | AppMode::Quitting => false,
        }
    }

    /// Retry the failed attempt: a failed file scan re-runs the same file,
    /// anything else reopens the camera.
    fn retry(&mut self) -> bool {
        let source = match self.session().failure() {
            Some(failure) => failure.source,
            None => {
                self.set_notice("Nothing to retry");
                return false;
            }
        };
        self.notice = None;

        let result = match source {
            ScanSource::File => self.controller.retry_file(),
            ScanSource::Camera => self.controller.retry(),
        };
        if let Err(e) = result {
            self.set_notice(e.to_string());
            return false;
        }
        true
    }
}

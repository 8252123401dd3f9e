//! Interactive terminal UI.
//!
//! - [`app`]: UI state around the session controller
//! - [`events`]: key press polling
//! - [`keybindings`]: configurable key to action mapping
//! - [`theme`]: color palettes
//! - [`ui`]: ratatui rendering
//! - [`run`]: terminal setup and the main loop
//!
//! # Architecture
//!
//! The TUI follows a unidirectional data flow:
//! 1. Key presses are captured from the terminal (crossterm)
//! 2. Keys are translated to Actions
//! 3. Actions drive the scan session controller
//! 4. Decode events from capability threads are pumped every frame
//! 5. The UI renders the current session and dialog state

pub mod app;
pub mod events;
pub mod keybindings;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, AppMode};
pub use events::{EventError, EventHandler};
pub use keybindings::{KeyBindings, KeybindingError};
pub use run::{run_tui, TuiError, TuiResult};
pub use theme::Theme;
pub use ui::render;

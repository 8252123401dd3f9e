//! Terminal input polling.
//!
//! Reads crossterm events and yields key presses; resize and mouse events
//! only trigger a redraw, which the main loop does every frame anyway.

use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use thiserror::Error;

/// Error type for input polling.
#[derive(Debug, Error)]
pub enum EventError {
    /// Reading from the terminal failed.
    #[error("failed to read terminal input: {0}")]
    Io(#[from] std::io::Error),
}

/// Polls the terminal for key presses.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventHandler;

impl EventHandler {
    /// Create an event handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for a key press.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Io`] if the terminal cannot be read.
    pub fn poll(&self, timeout: Duration) -> Result<Option<KeyEvent>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            other => {
                log::trace!("Ignoring terminal event: {:?}", other);
                Ok(None)
            }
        }
    }
}

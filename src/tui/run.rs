//! TUI main loop.
//!
//! # Terminal Management
//!
//! The TUI takes over the terminal by:
//! - Enabling raw mode (unbuffered input, no echo)
//! - Entering the alternate screen buffer
//! - Hiding the cursor
//!
//! All these changes are reverted on exit, including on panic.
//!
//! # Event Loop
//!
//! 1. Stop if a shutdown was requested or the user quit
//! 2. Apply decode events from capability threads
//! 3. Render the current state
//! 4. Poll for a key press with a short timeout
//! 5. Limit frame rate to ~60 FPS
//!
//! The loop never releases the camera itself; the caller closes the app's
//! controller afterwards, which does.

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
use super::events::EventHandler;
use super::ui::render;
use crate::capture::{CameraDecoder, FileDecoder};

/// Frame budget for ~60 FPS.
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Key poll timeout, one frame.
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input polling error.
    #[error("event error: {0}")]
    Event(#[from] super::events::EventError),

    /// The TUI was interrupted by a shutdown signal.
    #[error("interrupted by shutdown signal")]
    Interrupted,
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive TUI until the user quits.
///
/// # Errors
///
/// Returns [`TuiError::Io`] or [`TuiError::Event`] for terminal failures and
/// [`TuiError::Interrupted`] if `shutdown_flag` was raised. The terminal is
/// restored in every case.
pub fn run_tui<C: CameraDecoder, F: FileDecoder>(
    app: &mut App<C, F>,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> TuiResult<()> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let result = setup_terminal().and_then(|mut terminal| {
        let result = run_loop(&mut terminal, app, shutdown_flag.as_deref());
        restore_terminal()?;
        result
    });

    let _ = panic::take_hook();
    result
}

fn run_loop<C: CameraDecoder, F: FileDecoder>(
    terminal: &mut Terminal,
    app: &mut App<C, F>,
    shutdown_flag: Option<&AtomicBool>,
) -> TuiResult<()> {
    let event_handler = EventHandler::new();
    let mut last_render = Instant::now();

    loop {
        if shutdown_flag.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            log::info!("Shutdown signal received, exiting TUI");
            return Err(TuiError::Interrupted);
        }

        if app.should_quit() {
            log::debug!("App requested quit");
            // One last frame so the goodbye message flashes while the camera is released
            terminal.draw(|frame| render(frame, app))?;
            return Ok(());
        }

        if app.pump() {
            log::debug!("Session is now {}", app.session().mode());
        }

        terminal.draw(|frame| render(frame, app))?;

        if let Some(key) = event_handler.poll(POLL_TIMEOUT)? {
            if !app.handle_key(key) {
                log::trace!("Key not handled: {:?}", key);
            }
        }

        let elapsed = last_render.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
        last_render = Instant::now();
    }
}

fn setup_terminal() -> TuiResult<Terminal> {
    log::debug!("Setting up terminal for TUI");

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    log::debug!("Terminal setup complete");
    Ok(terminal)
}

fn restore_terminal() -> TuiResult<()> {
    log::debug!("Restoring terminal");

    let _ = terminal::disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    Ok(())
}

//! Ctrl+C handling.
//!
//! The first Ctrl+C only raises a flag. The TUI loop and the headless wait
//! loop notice it within one polling slice, close the scan session (which
//! releases a live camera), and exit with [`EXIT_CODE_INTERRUPTED`]. A
//! second Ctrl+C before that happens exits on the spot.
//!
//! ```rust,no_run
//! use qrscan::signal::install_handler;
//!
//! let shutdown = install_handler().expect("Failed to install signal handler");
//! while !shutdown.is_shutdown_requested() {
//!     // wait for decode events
//! #   break;
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

static INSTALLED: OnceLock<ShutdownHandler> = OnceLock::new();

/// Shared shutdown state, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    presses: Arc<AtomicUsize>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a shutdown was requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Record one interrupt. Returns how many arrived since the last reset.
    pub fn request_shutdown(&self) -> usize {
        self.flag.store(true, Ordering::SeqCst);
        self.presses.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The raw flag, for loops that only poll an atomic.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Forget earlier interrupts.
    pub fn reset(&self) {
        self.presses.store(0, Ordering::SeqCst);
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Install the process-wide Ctrl+C handler.
///
/// The OS hook can only be set once per process, so later calls hand back
/// the first handler after clearing it.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS hook cannot be set.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut result = Ok(());
    let handler = INSTALLED.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let hooked = handler.clone();
        result = ctrlc::set_handler(move || on_interrupt(&hooked));
        handler
    });

    match result {
        Ok(()) => {
            handler.reset();
            Ok(handler.clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}

fn on_interrupt(handler: &ShutdownHandler) {
    let mut stderr = std::io::stderr();
    if handler.request_shutdown() > 1 {
        let _ = writeln!(stderr, "\nForced exit.");
        std::process::exit(EXIT_CODE_INTERRUPTED);
    }
    let _ = writeln!(stderr, "\nInterrupted. Releasing camera... (Ctrl+C again to force)");
    let _ = stderr.flush();
    log::info!("Shutdown signal received");
}

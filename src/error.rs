//! Structured error handling and exit codes.

use serde::Serialize;

use crate::session::{FailureKind, ScanMode, ScanSession};

/// Exit codes for the qrscan application.
///
/// - 0: Success (a payload was decoded, or the TUI exited normally)
/// - 1: General error (unexpected failure)
/// - 2: No code found (the decoder ran but found nothing)
/// - 3: Decode failed (unreadable file, camera refused, or other decoder error)
/// - 4: Timed out (no outcome before `--timeout`)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: a payload was decoded.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No code: the decoder ran but found no QR code.
    NoCodeFound = 2,
    /// Decode failed: the attempt failed for another reason.
    DecodeFailed = 3,
    /// Timed out: the attempt produced no outcome in time.
    TimedOut = 4,
    /// Interrupted: the attempt was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "QS000",
            Self::GeneralError => "QS001",
            Self::NoCodeFound => "QS002",
            Self::DecodeFailed => "QS003",
            Self::TimedOut => "QS004",
            Self::Interrupted => "QS130",
        }
    }

    /// Exit code for a session that has stopped changing.
    #[must_use]
    pub fn for_session(session: &ScanSession) -> Self {
        match session.mode() {
            ScanMode::Succeeded => Self::Success,
            ScanMode::Failed => match session.failure().map(|f| f.kind) {
                Some(FailureKind::NoCodeFound) => Self::NoCodeFound,
                _ => Self::DecodeFailed,
            },
            ScanMode::CameraActive | ScanMode::FileScanning => Self::TimedOut,
            ScanMode::Idle => Self::GeneralError,
        }
    }
}

/// The run was stopped by Ctrl+C.
///
/// Returned through `anyhow` so the binary can map it to
/// [`ExitCode::Interrupted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Interrupted by user")]
pub struct Interrupted;

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "QS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

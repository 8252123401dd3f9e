//! JSON output formatter for a finished scan session.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "mode": "succeeded",
//!   "payload": "{\"name\":\"Alice\"}",
//!   "name": "Alice",
//!   "error": null,
//!   "file": { "path": "/tmp/badge.png", "name": "badge.png", "size": 1834 },
//!   "finished_at": "2024-05-01T12:00:00Z",
//!   "exit_code": 0,
//!   "exit_code_name": "QS000"
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ExitCode;
use crate::session::{FailureKind, ScanMode, ScanSession, ScanSource};

/// A failure in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Classification (`no_code_found`, `file_unreadable`, ...)
    pub kind: FailureKind,
    /// Capability the attempt ran on
    pub source: ScanSource,
    /// Message shown to the user
    pub message: String,
    /// Raw decoder message
    pub detail: String,
}

/// The selected file in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Absolute path where possible
    pub path: String,
    /// File name
    pub name: String,
    /// Size in bytes, if known
    pub size: Option<u64>,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Session mode when output was produced
    pub mode: ScanMode,
    /// Raw decoded payload
    pub payload: Option<String>,
    /// Display name extracted from the payload
    pub name: Option<String>,
    /// Failure details
    pub error: Option<JsonFailure>,
    /// Scanned file, for file attempts
    pub file: Option<JsonFile>,
    /// When the session reached its outcome
    pub finished_at: Option<DateTime<Utc>>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "QS000")
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Create JSON output from a session and the exit code of the run.
    #[must_use]
    pub fn new(session: &ScanSession, exit_code: ExitCode) -> Self {
        Self {
            mode: session.mode(),
            payload: session.raw_payload().map(str::to_string),
            name: session.extracted_name().map(str::to_string),
            error: session.failure().map(|f| JsonFailure {
                kind: f.kind,
                source: f.source,
                message: f.message.clone(),
                detail: f.detail.clone(),
            }),
            file: session.selected_file().map(|f| JsonFile {
                path: normalize_path(&f.path),
                name: f.name.clone(),
                size: f.size,
            }),
            finished_at: session.finished_at(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Canonical path when the file still exists, display form otherwise.
fn normalize_path(path: &std::path::Path) -> String {
    match path.canonicalize() {
        Ok(canonical) => canonical.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}

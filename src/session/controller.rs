//! Scan session state machine.
//!
//! # Overview
//!
//! [`ScanSessionController`] owns the [`ScanSession`] record, the live
//! camera handle (if any), and the receiving end of the decode-event
//! channel. The UI calls the operations; capabilities report back through
//! [`EventSink`]s the controller mints per attempt.
//!
//! ```text
//!            start_camera            decode ok
//!   Idle ───────────────► CameraActive ──────► Succeeded
//!    │  ▲                    │    │                 │
//!    │  │ reset              │    │ decode error    │ reset
//!    │  └────────────────────┼────┼─────────────────┘
//!    │ select_file           │    ▼
//!    └──────► FileScanning ◄─┘  Failed ──retry──► CameraActive
//! ```
//!
//! # Resource Handling
//!
//! The camera handle lives in an `Option` and is only ever released through
//! [`ScanSessionController::release_camera`], which `take`s it. Every path
//! that leaves camera mode (decode outcome, file selection, reset, close,
//! drop) goes through that routine, so the resource is released exactly once.
//!
//! # Thread Safety
//!
//! The controller is meant to live on the UI thread. Capabilities may run
//! workers on other threads; they only ever touch their `EventSink`.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use thiserror::Error;

use super::payload::extract_name;
use super::state::{ScanFailure, ScanMode, ScanSession, ScanSource, SelectedFile};
use crate::capture::{
    AttemptId, CameraDecoder, CameraOptions, DecodeEvent, DecodeOutcome, EventSink, FileDecoder,
    CAMERA_TARGET, FILE_TARGET,
};

/// Operations rejected by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The operation is not available in the current mode.
    #[error("cannot {operation} while session is {mode}")]
    InvalidTransition {
        /// Rejected operation.
        operation: &'static str,
        /// Mode the session was in.
        mode: ScanMode,
    },

    /// Retrying a file scan needs a failed file attempt to repeat.
    #[error("no failed file scan to retry")]
    NothingToRetry,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Drives one scan session over a camera and a file capability.
pub struct ScanSessionController<C: CameraDecoder, F: FileDecoder> {
    session: ScanSession,
    camera: C,
    files: F,
    options: CameraOptions,
    camera_handle: Option<C::Handle>,
    attempt: AttemptId,
    events_tx: Sender<DecodeEvent>,
    events_rx: Receiver<DecodeEvent>,
}

impl<C: CameraDecoder, F: FileDecoder> std::fmt::Debug for ScanSessionController<C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSessionController")
            .field("session", &self.session)
            .field("options", &self.options)
            .field("camera_live", &self.camera_handle.is_some())
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

impl<C: CameraDecoder, F: FileDecoder> ScanSessionController<C, F> {
    /// Create an idle controller over the given capabilities.
    #[must_use]
    pub fn new(camera: C, files: F, options: CameraOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            session: ScanSession::new(),
            camera,
            files,
            options,
            camera_handle: None,
            attempt: AttemptId::default(),
            events_tx,
            events_rx,
        }
    }

    /// Current session state.
    #[must_use]
    pub fn snapshot(&self) -> &ScanSession {
        &self.session
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> ScanMode {
        self.session.mode()
    }

    /// Whether a camera resource is currently held.
    #[must_use]
    pub fn is_camera_live(&self) -> bool {
        self.camera_handle.is_some()
    }

    /// Camera options used for every camera start.
    #[must_use]
    pub fn camera_options(&self) -> &CameraOptions {
        &self.options
    }

    /// Id of the most recent capability start.
    #[must_use]
    pub fn current_attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Camera capability.
    #[must_use]
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// File capability.
    #[must_use]
    pub fn files(&self) -> &F {
        &self.files
    }

    /// Open the camera and start scanning.
    ///
    /// Clears any previous result or error and discards the selected file.
    /// If the camera is already live it is reused. A camera that refuses to
    /// start moves the session to [`ScanMode::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] while a file scan is
    /// running or a result is displayed.
    pub fn start_camera(&mut self) -> SessionResult<()> {
        match self.mode() {
            ScanMode::FileScanning | ScanMode::Succeeded => {
                return Err(SessionError::InvalidTransition {
                    operation: "start camera",
                    mode: self.mode(),
                });
            }
            ScanMode::Idle | ScanMode::CameraActive | ScanMode::Failed => {}
        }

        self.session.enter_camera();

        if self.camera_handle.is_some() {
            log::debug!("Camera already live, keeping attempt {}", self.attempt);
            return Ok(());
        }

        let sink = self.next_sink();
        match self.camera.start(CAMERA_TARGET, &self.options, sink) {
            Ok(handle) => {
                log::info!("Camera scan started (attempt {})", self.attempt);
                self.camera_handle = Some(handle);
            }
            Err(e) => {
                log::warn!("Camera refused to start: {}", e);
                self.on_decode_failure(&e.to_string());
            }
        }

        Ok(())
    }

    /// Scan a user-selected image file.
    ///
    /// Releases a live camera first, then hands the file to the file
    /// capability. The outcome arrives later as a decode event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] while another file scan
    /// is running or a result is displayed.
    pub fn select_file(&mut self, file: SelectedFile) -> SessionResult<()> {
        match self.mode() {
            ScanMode::FileScanning | ScanMode::Succeeded => {
                return Err(SessionError::InvalidTransition {
                    operation: "select file",
                    mode: self.mode(),
                });
            }
            ScanMode::Idle | ScanMode::CameraActive | ScanMode::Failed => {}
        }

        self.release_camera();
        log::info!("Scanning file {}", file.path.display());
        self.session.enter_file_scan(file);

        let sink = self.next_sink();
        if let Some(file) = self.session.selected_file() {
            self.files.decode(FILE_TARGET, file, sink);
        }

        Ok(())
    }

    /// Apply a decoded payload.
    ///
    /// Returns `false` (and changes nothing) unless a scan is running.
    pub fn on_decode_success(&mut self, raw_payload: &str) -> bool {
        if !self.mode().is_scanning() {
            log::debug!("Ignoring decoded payload while {}", self.mode());
            return false;
        }

        self.release_camera();
        let name = extract_name(raw_payload);
        log::info!("Decoded {} byte payload", raw_payload.len());
        self.session.succeed(raw_payload.to_string(), name);
        true
    }

    /// Apply a decoder failure, classifying its message.
    ///
    /// Returns `false` (and changes nothing) unless a scan is running.
    pub fn on_decode_failure(&mut self, message: &str) -> bool {
        let source = match self.mode() {
            ScanMode::CameraActive => ScanSource::Camera,
            ScanMode::FileScanning => ScanSource::File,
            mode => {
                log::debug!("Ignoring decoder failure while {}: {}", mode, message);
                return false;
            }
        };

        self.release_camera();
        let failure = ScanFailure::classify(source, message);
        log::warn!("Scan failed ({}): {}", failure.kind, message);
        self.session.fail(failure);
        true
    }

    /// Clear the session back to [`ScanMode::Idle`].
    ///
    /// Releases the camera and abandons an in-flight file scan; the camera
    /// is not restarted.
    pub fn reset(&mut self) {
        self.release_camera();
        if self.mode() == ScanMode::FileScanning {
            // Outcome of the abandoned decode must not land on the new session
            self.attempt = self.attempt.next();
        }
        self.session.clear();
        log::debug!("Session reset");
    }

    /// Reset, then open the camera.
    ///
    /// # Errors
    ///
    /// Never fails after the reset; the signature mirrors
    /// [`Self::start_camera`].
    pub fn retry(&mut self) -> SessionResult<()> {
        self.reset();
        self.start_camera()
    }

    /// Re-run the failed file scan on the same file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingToRetry`] unless the session failed on
    /// a file scan.
    pub fn retry_file(&mut self) -> SessionResult<()> {
        let file = match (self.session.failure(), self.session.selected_file()) {
            (Some(failure), Some(file)) if failure.source == ScanSource::File => file.clone(),
            _ => return Err(SessionError::NothingToRetry),
        };
        self.select_file(file)
    }

    /// Route one capability event, ignoring events of abandoned attempts.
    ///
    /// Returns `true` if the event changed the session.
    pub fn handle_event(&mut self, event: DecodeEvent) -> bool {
        if event.attempt != self.attempt {
            log::trace!(
                "Dropping stale event from attempt {} (current {})",
                event.attempt,
                self.attempt
            );
            return false;
        }

        match event.outcome {
            DecodeOutcome::Decoded(payload) => self.on_decode_success(&payload),
            DecodeOutcome::Failed(message) => self.on_decode_failure(&message),
        }
    }

    /// Apply every pending event without blocking.
    ///
    /// Returns `true` if any event changed the session.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            changed |= self.handle_event(event);
        }
        changed
    }

    /// Wait up to `timeout` for the next event and apply it.
    ///
    /// Returns `true` if an event arrived and changed the session.
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => self.handle_event(event),
            Err(RecvTimeoutError::Timeout) => false,
            // The controller holds a sender, so the channel cannot disconnect
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Tear the session down, releasing the camera.
    ///
    /// Dropping the controller has the same effect.
    pub fn close(mut self) -> ScanSession {
        self.release_camera();
        std::mem::take(&mut self.session)
    }

    /// Release the camera resource if one is held.
    fn release_camera(&mut self) {
        if let Some(handle) = self.camera_handle.take() {
            log::debug!("Releasing camera (attempt {})", self.attempt);
            self.camera.stop(handle);
            // Frames still in flight from the stopped stream are stale
            self.attempt = self.attempt.next();
        }
    }

    fn next_sink(&mut self) -> EventSink {
        self.attempt = self.attempt.next();
        EventSink::new(self.attempt, self.events_tx.clone())
    }
}

impl<C: CameraDecoder, F: FileDecoder> Drop for ScanSessionController<C, F> {
    fn drop(&mut self) {
        self.release_camera();
    }
}

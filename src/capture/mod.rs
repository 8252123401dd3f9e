//! Decoding capabilities consumed by the scan session.
//!
//! The session controller never touches pixels. It starts and stops
//! capabilities through two traits and learns about results through a
//! channel of [`DecodeEvent`]s:
//!
//! - [`CameraDecoder`]: a live source that keeps sampling frames until it
//!   decodes something, fails, or is stopped
//! - [`FileDecoder`]: a one-shot decode of a selected image file
//!
//! Every start is stamped with an [`AttemptId`] carried by the
//! [`EventSink`] handed to the capability, so the controller can discard
//! events from attempts it has already abandoned.
//!
//! Concrete adapters live in [`frame_camera`] and [`image_file`]; both run
//! their work on a worker thread and report through the sink.

pub mod frame_camera;
pub mod image_file;
pub mod qr;

use std::fmt;
use std::sync::mpsc::Sender;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SelectedFile;

pub use frame_camera::{FrameCameraHandle, FrameDirCamera};
pub use image_file::ImageFileDecoder;

/// Render target the camera capability binds to.
pub const CAMERA_TARGET: &str = "qr-reader";

/// Render target used for file decodes.
pub const FILE_TARGET: &str = "file-qr-reader";

/// Which camera to prefer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl FacingMode {
    /// Lowercase name, also used as the frame-source sub-directory.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options a camera capability is started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Side length in pixels of the centered square scanned in each frame.
    pub box_size: u32,
    /// Frames sampled per second.
    pub fps: u32,
    /// Preferred camera.
    pub facing: FacingMode,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            box_size: 250,
            fps: 10,
            facing: FacingMode::Environment,
        }
    }
}

impl CameraOptions {
    /// Interval between two sampled frames.
    #[must_use]
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

/// Identifier of one capability start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttemptId(pub u64);

impl AttemptId {
    /// The attempt after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a capability reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A payload was decoded.
    Decoded(String),
    /// The attempt failed with a raw decoder message.
    Failed(String),
}

/// A capability notification addressed to one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeEvent {
    /// Attempt the event belongs to.
    pub attempt: AttemptId,
    /// Reported outcome.
    pub outcome: DecodeOutcome,
}

/// Sending half handed to a capability for one attempt.
#[derive(Debug, Clone)]
pub struct EventSink {
    attempt: AttemptId,
    tx: Sender<DecodeEvent>,
}

impl EventSink {
    /// Create a sink for `attempt` that reports into `tx`.
    #[must_use]
    pub fn new(attempt: AttemptId, tx: Sender<DecodeEvent>) -> Self {
        Self { attempt, tx }
    }

    /// Attempt this sink reports for.
    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report a decoded payload. Returns `false` if the session is gone.
    pub fn decoded(&self, payload: impl Into<String>) -> bool {
        self.send(DecodeOutcome::Decoded(payload.into()))
    }

    /// Report a failure. Returns `false` if the session is gone.
    pub fn failed(&self, message: impl Into<String>) -> bool {
        self.send(DecodeOutcome::Failed(message.into()))
    }

    fn send(&self, outcome: DecodeOutcome) -> bool {
        self.tx
            .send(DecodeEvent {
                attempt: self.attempt,
                outcome,
            })
            .is_ok()
    }
}

/// Errors a camera capability may refuse to start with.
///
/// The display text follows the browser media-device error names so the
/// session can classify it like any other decoder message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Access to the camera was refused.
    #[error("NotAllowedError: {0}")]
    PermissionDenied(String),

    /// No camera matches the request.
    #[error("NotFoundError: {0}")]
    DeviceNotFound(String),

    /// The camera exists but could not be opened.
    #[error("NotReadableError: {0}")]
    NotReadable(String),
}

/// A live camera decoding capability.
///
/// `start` acquires the camera resource and returns a handle that owns it;
/// `stop` consumes the handle, so a resource can be released only once.
/// After a successful `start` the capability reports through `sink` until
/// it decodes a payload, fails, or is stopped.
pub trait CameraDecoder {
    /// Owned camera resource.
    type Handle;

    /// Start sampling frames, rendering into `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`CaptureError`] if the camera cannot be acquired.
    fn start(
        &mut self,
        target: &str,
        options: &CameraOptions,
        sink: EventSink,
    ) -> Result<Self::Handle, CaptureError>;

    /// Stop sampling and release the camera resource.
    fn stop(&mut self, handle: Self::Handle);
}

/// A one-shot file decoding capability.
///
/// `decode` returns immediately; exactly one event is later reported
/// through `sink`.
pub trait FileDecoder {
    /// Decode `file` asynchronously.
    fn decode(&mut self, target: &str, file: &SelectedFile, sink: EventSink);
}

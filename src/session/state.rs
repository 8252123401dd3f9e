//! Scan session record and failure classification.
//!
//! A [`ScanSession`] is the single piece of mutable state the UI observes.
//! Its fields are private and only [`crate::session::ScanSessionController`]
//! mutates them, which keeps the result/error invariants in one place:
//!
//! - `raw_payload` and `extracted_name` are present iff the mode is
//!   [`ScanMode::Succeeded`]
//! - `failure` is present iff the mode is [`ScanMode::Failed`]

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Decoder message emitted when a frame or image carries no readable code.
///
/// Adapters report this exact text so classification does not depend on
/// which decoding library produced the miss.
pub const NO_CODE_DETECTED: &str = "No MultiFormat Readers were able to detect the code.";

/// Current mode of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Nothing running, nothing displayed.
    #[default]
    Idle,
    /// Camera capability is live and sampling frames.
    CameraActive,
    /// File capability is decoding the selected file.
    FileScanning,
    /// A payload was decoded.
    Succeeded,
    /// The last attempt failed; an error message is displayed.
    Failed,
}

impl ScanMode {
    /// Check whether a decoding capability is expected to be running.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::CameraActive | Self::FileScanning)
    }

    /// Check whether the session shows an outcome (result or error).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CameraActive => "camera",
            Self::FileScanning => "file",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Which capability an attempt ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSource {
    /// Live camera frames.
    Camera,
    /// A user-selected image file.
    File,
}

/// Classified decoder failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The decoder ran but found no code.
    NoCodeFound,
    /// The file is missing, corrupt, or in an unsupported format.
    FileUnreadable,
    /// Camera access was refused or no camera is available.
    CameraPermissionDenied,
    /// Any other decoder failure.
    Unknown,
}

/// Substrings that mark a camera start/stream refusal.
const CAMERA_DENIED_MARKERS: &[&str] = &[
    "permission",
    "notallowederror",
    "notfounderror",
    "notreadableerror",
    "overconstrainederror",
    "denied",
    "device not found",
    "no camera",
    "camera unavailable",
];

/// Substrings that mark an unreadable input file.
const FILE_UNREADABLE_MARKERS: &[&str] = &["not found", "unreadable", "unsupported", "corrupt"];

impl FailureKind {
    /// Classify a raw decoder message.
    ///
    /// Matching is case-insensitive except for the decoder's fixed
    /// "No MultiFormat Readers" wording, which always wins.
    ///
    /// # Example
    ///
    /// ```
    /// use qrscan::session::{FailureKind, ScanSource};
    ///
    /// let kind = FailureKind::classify(
    ///     ScanSource::File,
    ///     "No MultiFormat Readers were able to detect the code.",
    /// );
    /// assert_eq!(kind, FailureKind::NoCodeFound);
    /// ```
    #[must_use]
    pub fn classify(source: ScanSource, message: &str) -> Self {
        if message.contains("No MultiFormat Readers") {
            return Self::NoCodeFound;
        }

        let lowered = message.to_lowercase();
        if lowered.contains("no qr code") {
            return Self::NoCodeFound;
        }

        if source == ScanSource::Camera
            && CAMERA_DENIED_MARKERS.iter().any(|m| lowered.contains(m))
        {
            return Self::CameraPermissionDenied;
        }

        if FILE_UNREADABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Self::FileUnreadable;
        }

        Self::Unknown
    }

    /// Human-readable message for the error banner.
    #[must_use]
    pub fn user_message(&self, source: ScanSource, detail: &str) -> String {
        match (self, source) {
            (Self::NoCodeFound, ScanSource::File) => {
                "No QR code found in the image. Please try another file.".to_string()
            }
            (Self::NoCodeFound, ScanSource::Camera) => {
                "No QR code detected. Hold the code inside the frame and try again.".to_string()
            }
            (Self::FileUnreadable, _) => "File not found or corrupted. Please try again.".to_string(),
            (Self::CameraPermissionDenied, _) => {
                "Failed to access camera. Please check permissions.".to_string()
            }
            (Self::Unknown, _) => {
                let detail = detail.trim();
                if detail.is_empty() {
                    "Failed to scan QR code.".to_string()
                } else {
                    format!("Scan error: {detail}")
                }
            }
        }
    }

    /// Short hint the UI shows next to the retry affordance.
    #[must_use]
    pub fn remedy(&self) -> &'static str {
        match self {
            Self::NoCodeFound => "Use a clear, well-lit image where the code fills most of the frame.",
            Self::FileUnreadable => "Supported formats: JPG, PNG, GIF, BMP, TIFF, WebP.",
            Self::CameraPermissionDenied => "Allow camera access or check the frame source.",
            Self::Unknown => "Retry, or pick a different input.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoCodeFound => "no code found",
            Self::FileUnreadable => "file unreadable",
            Self::CameraPermissionDenied => "camera permission denied",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A classified failure stored in a failed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    /// Classification of the decoder message.
    pub kind: FailureKind,
    /// Capability the failed attempt ran on.
    pub source: ScanSource,
    /// Message shown to the user.
    pub message: String,
    /// Raw decoder message.
    pub detail: String,
}

impl ScanFailure {
    /// Classify a raw decoder message into a displayable failure.
    #[must_use]
    pub fn classify(source: ScanSource, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let kind = FailureKind::classify(source, &detail);
        Self {
            kind,
            source,
            message: kind.user_message(source, &detail),
            detail,
        }
    }
}

/// Reference to the image file a user picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    /// Path of the file.
    pub path: PathBuf,
    /// File name for display.
    pub name: String,
    /// Size in bytes, if the file could be inspected.
    pub size: Option<u64>,
}

impl SelectedFile {
    /// Build a file reference, reading the size from the filesystem when possible.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size = std::fs::metadata(path).ok().map(|m| m.len());

        Self {
            path: path.to_path_buf(),
            name,
            size,
        }
    }
}

/// Snapshot of a single scan session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSession {
    mode: ScanMode,
    raw_payload: Option<String>,
    extracted_name: Option<String>,
    failure: Option<ScanFailure>,
    selected_file: Option<SelectedFile>,
    finished_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Decoded payload (only when succeeded).
    #[must_use]
    pub fn raw_payload(&self) -> Option<&str> {
        self.raw_payload.as_deref()
    }

    /// Display name derived from the payload (only when succeeded).
    #[must_use]
    pub fn extracted_name(&self) -> Option<&str> {
        self.extracted_name.as_deref()
    }

    /// Error banner text (only when failed).
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    /// Classified failure (only when failed).
    #[must_use]
    pub fn failure(&self) -> Option<&ScanFailure> {
        self.failure.as_ref()
    }

    /// File picked for the current or last file scan.
    #[must_use]
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    /// When the session reached its outcome.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub(crate) fn enter_camera(&mut self) {
        self.clear_outcome();
        self.selected_file = None;
        self.mode = ScanMode::CameraActive;
    }

    pub(crate) fn enter_file_scan(&mut self, file: SelectedFile) {
        self.clear_outcome();
        self.selected_file = Some(file);
        self.mode = ScanMode::FileScanning;
    }

    pub(crate) fn succeed(&mut self, raw_payload: String, extracted_name: String) {
        self.failure = None;
        self.raw_payload = Some(raw_payload);
        self.extracted_name = Some(extracted_name);
        self.finished_at = Some(Utc::now());
        self.mode = ScanMode::Succeeded;
    }

    pub(crate) fn fail(&mut self, failure: ScanFailure) {
        self.raw_payload = None;
        self.extracted_name = None;
        self.failure = Some(failure);
        self.finished_at = Some(Utc::now());
        self.mode = ScanMode::Failed;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    fn clear_outcome(&mut self) {
        self.raw_payload = None;
        self.extracted_name = None;
        self.failure = None;
        self.finished_at = None;
    }
}

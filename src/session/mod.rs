//! Scan session model and controller.
//!
//! - [`state`]: the [`ScanSession`] record and failure classification
//! - [`payload`]: display-name extraction from decoded payloads
//! - [`controller`]: the [`ScanSessionController`] state machine

pub mod controller;
pub mod payload;
pub mod state;

pub use controller::{ScanSessionController, SessionError, SessionResult};
pub use payload::extract_name;
pub use state::{
    FailureKind, ScanFailure, ScanMode, ScanSession, ScanSource, SelectedFile, NO_CODE_DETECTED,
};

//! Output formatters for headless scan results.
//!
//! - JSON for automation and scripting
//! - Plain or colored text for people
//!
//! # Example
//!
//! ```
//! use qrscan::error::ExitCode;
//! use qrscan::output::{JsonOutput, TextOutput};
//! use qrscan::session::ScanSession;
//!
//! let session = ScanSession::new();
//! let json = JsonOutput::new(&session, ExitCode::TimedOut);
//! assert!(json.to_json().unwrap().contains("\"mode\":\"idle\""));
//!
//! let text = TextOutput::new(&session);
//! assert!(text.render().contains("idle"));
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

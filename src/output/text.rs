//! Human-readable text output for a finished scan session.

use std::fmt::Write as _;
use std::io::Write;

use yansi::{Color, Paint, Style};

use crate::session::{ScanMode, ScanSession};

const OK: Style = Style::new().fg(Color::Green).bold();
const ERR: Style = Style::new().fg(Color::Red).bold();
const DIM: Style = Style::new().dim();

/// Text rendering of a session.
#[derive(Debug)]
pub struct TextOutput<'a> {
    session: &'a ScanSession,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Plain text output.
    #[must_use]
    pub fn new(session: &'a ScanSession) -> Self {
        Self {
            session,
            color: false,
        }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Render the session to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let session = self.session;

        match session.mode() {
            ScanMode::Succeeded => {
                let name = session.extracted_name().unwrap_or_default();
                let payload = session.raw_payload().unwrap_or_default();
                let _ = writeln!(out, "{} {}", self.paint("Scanned:", OK), name);
                if payload != name {
                    let _ = writeln!(out, "{} {}", self.paint("Payload:", DIM), payload);
                }
            }
            ScanMode::Failed => {
                if let Some(failure) = session.failure() {
                    let _ = writeln!(out, "{} {}", self.paint("Error:", ERR), failure.message);
                    let _ = writeln!(out, "{} {}", self.paint("Hint:", DIM), failure.kind.remedy());
                    let _ = writeln!(out, "{} {}", self.paint("Detail:", DIM), failure.detail);
                }
            }
            mode => {
                let _ = writeln!(out, "{} {}", self.paint("Status:", DIM), mode);
            }
        }

        if let Some(file) = session.selected_file() {
            let size = file
                .size
                .map(|s| format!(" ({s} bytes)"))
                .unwrap_or_default();
            let _ = writeln!(out, "{} {}{}", self.paint("File:", DIM), file.name, size);
        }

        out
    }

    /// Write the rendered text to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }

    fn paint(&self, label: &str, style: Style) -> String {
        if self.color {
            label.paint(style).to_string()
        } else {
            label.to_string()
        }
    }
}

//! File decoding capability backed by `image` and `rqrr`.
//!
//! Each [`FileDecoder::decode`] call runs on its own worker thread so the UI
//! loop stays responsive; the single outcome is reported through the
//! attempt's [`EventSink`].

use std::io;
use std::path::Path;
use std::thread;

use image::ImageError;

use super::qr::decode_image;
use super::{EventSink, FileDecoder};
use crate::session::{SelectedFile, NO_CODE_DETECTED};

/// Decodes QR codes from image files on worker threads.
#[derive(Debug, Default)]
pub struct ImageFileDecoder {
    decodes_started: usize,
}

impl ImageFileDecoder {
    /// Create a new file decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decodes started so far.
    #[must_use]
    pub fn decodes_started(&self) -> usize {
        self.decodes_started
    }
}

impl FileDecoder for ImageFileDecoder {
    fn decode(&mut self, target: &str, file: &SelectedFile, sink: EventSink) {
        self.decodes_started += 1;
        let path = file.path.clone();
        log::debug!(
            "Decoding {} into '{}' (attempt {})",
            path.display(),
            target,
            sink.attempt()
        );

        let worker_sink = sink.clone();
        let spawned = thread::Builder::new()
            .name("qrscan-file".to_string())
            .spawn(move || {
                let delivered = match decode_file(&path) {
                    Ok(payload) => worker_sink.decoded(payload),
                    Err(message) => worker_sink.failed(message),
                };
                if !delivered {
                    log::debug!("Session closed before {} finished decoding", path.display());
                }
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn file decode worker: {}", e);
            sink.failed(format!("Failed to start file scan: {e}"));
        }
    }
}

/// Decode the first QR code in the image at `path`.
///
/// # Errors
///
/// Returns the decoder message describing why no payload was produced.
pub fn decode_file(path: &Path) -> Result<String, String> {
    let image = image::open(path).map_err(|e| load_error_message(path, &e))?;
    decode_image(&image, None).ok_or_else(|| NO_CODE_DETECTED.to_string())
}

fn load_error_message(path: &Path, err: &ImageError) -> String {
    match err {
        ImageError::IoError(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            format!("File not found: {}", path.display())
        }
        ImageError::Unsupported(_) => {
            format!("Unsupported image format {}: {}", path.display(), err)
        }
        _ => format!("Unreadable image file {}: {}", path.display(), err),
    }
}

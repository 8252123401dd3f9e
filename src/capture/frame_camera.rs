//! Camera capability backed by a frame-source directory.
//!
//! A capture daemon (or a test fixture) drops still frames into a
//! directory; this adapter treats that directory as the camera stream. If a
//! sub-directory named after the requested facing mode exists
//! (`environment/` or `user/`), frames are read from there instead.
//!
//! Frames are sampled in file-name order at the configured frame rate. Each
//! frame is cropped to the centered scan box and handed to the QR decoder.
//! Sampling stops at the first decoded payload, when the handle is stopped,
//! or (unless looping) after the last frame with a "no code" failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::qr::decode_image;
use super::{CameraDecoder, CameraOptions, CaptureError, EventSink};
use crate::session::NO_CODE_DETECTED;

/// Longest stretch the sampling worker sleeps without checking the stop flag.
const STOP_POLL: Duration = Duration::from_millis(20);

/// File extensions accepted as frames.
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Camera capability reading frames from a directory.
#[derive(Debug, Clone)]
pub struct FrameDirCamera {
    root: PathBuf,
    loop_frames: bool,
}

impl FrameDirCamera {
    /// Create a camera reading frames from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loop_frames: false,
        }
    }

    /// Keep sampling after the last frame instead of reporting "no code".
    ///
    /// Use this when a live capture process keeps writing new frames.
    #[must_use]
    pub fn with_loop_frames(mut self, loop_frames: bool) -> Self {
        self.loop_frames = loop_frames;
        self
    }

    /// Frame-source root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory frames are read from for the given options.
    #[must_use]
    pub fn source_dir(&self, options: &CameraOptions) -> PathBuf {
        let facing_dir = self.root.join(options.facing.as_str());
        if facing_dir.is_dir() {
            facing_dir
        } else {
            self.root.clone()
        }
    }
}

/// Running camera stream. Dropping it stops the stream as well.
#[derive(Debug)]
pub struct FrameCameraHandle {
    target: String,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FrameCameraHandle {
    /// Render target the stream was started for.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether the sampling worker is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Frame sampling worker for '{}' panicked", self.target);
            }
        }
    }
}

impl Drop for FrameCameraHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl CameraDecoder for FrameDirCamera {
    type Handle = FrameCameraHandle;

    fn start(
        &mut self,
        target: &str,
        options: &CameraOptions,
        sink: EventSink,
    ) -> Result<Self::Handle, CaptureError> {
        let dir = self.source_dir(options);
        // Probe once so refusals surface synchronously, like a denied getUserMedia
        list_frames(&dir).map_err(|e| open_error(&dir, &e))?;

        log::info!(
            "Camera '{}' started on {} ({} fps, {}px box, facing {})",
            target,
            dir.display(),
            options.fps,
            options.box_size,
            options.facing
        );

        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let options = options.clone();
        let loop_frames = self.loop_frames;

        let worker = thread::Builder::new()
            .name("qrscan-camera".to_string())
            .spawn(move || sample_frames(&dir, &options, loop_frames, &worker_stop, &sink))
            .map_err(|e| CaptureError::NotReadable(format!("Could not start camera stream: {e}")))?;

        Ok(FrameCameraHandle {
            target: target.to_string(),
            stop,
            worker: Some(worker),
        })
    }

    fn stop(&mut self, mut handle: Self::Handle) {
        log::info!("Camera '{}' stopped", handle.target);
        handle.shutdown();
    }
}

fn open_error(dir: &Path, err: &io::Error) -> CaptureError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            CaptureError::DeviceNotFound(format!("Requested device not found: {}", dir.display()))
        }
        io::ErrorKind::PermissionDenied => {
            CaptureError::PermissionDenied(format!("Permission denied: {}", dir.display()))
        }
        _ => CaptureError::NotReadable(format!("Could not read {}: {}", dir.display(), err)),
    }
}

/// List frame files in `dir`, sorted by file name.
fn list_frames(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_frame(path))
        .collect();
    frames.sort();
    Ok(frames)
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sample_frames(
    dir: &Path,
    options: &CameraOptions,
    loop_frames: bool,
    stop: &AtomicBool,
    sink: &EventSink,
) {
    let interval = options.frame_interval();

    loop {
        let frames = match list_frames(dir) {
            Ok(frames) => frames,
            Err(e) => {
                if !stop.load(Ordering::SeqCst) {
                    sink.failed(open_error(dir, &e).to_string());
                }
                return;
            }
        };

        for frame in &frames {
            if stop.load(Ordering::SeqCst) {
                return;
            }

            match image::open(frame) {
                Ok(image) => {
                    let decoded = decode_image(&image, Some(options.box_size));
                    if stop.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Some(payload) = decoded {
                        log::debug!("Decoded code in frame {}", frame.display());
                        sink.decoded(payload);
                        return;
                    }
                }
                Err(e) => log::debug!("Skipping unreadable frame {}: {}", frame.display(), e),
            }

            if pause(interval, stop) {
                return;
            }
        }

        if stop.load(Ordering::SeqCst) {
            return;
        }

        if !loop_frames {
            log::debug!("Frame source {} exhausted without a code", dir.display());
            sink.failed(NO_CODE_DETECTED);
            return;
        }

        if frames.is_empty() && pause(interval, stop) {
            return;
        }
    }
}

/// Sleep for `interval` in short slices. Returns `true` once stop is requested.
fn pause(interval: Duration, stop: &AtomicBool) -> bool {
    let until = Instant::now() + interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return true;
        }
        let now = Instant::now();
        if now >= until {
            return false;
        }
        thread::sleep((until - now).min(STOP_POLL));
    }
}

//! Scriptable capabilities for driving a controller from tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};

use qrscan::capture::{CameraDecoder, CameraOptions, CaptureError, EventSink, FileDecoder};
use qrscan::session::{ScanSessionController, SelectedFile};

/// What the fake camera has been asked to do.
#[derive(Debug, Default)]
pub struct CameraLog {
    pub started: Vec<u32>,
    pub stopped: Vec<u32>,
    pub sinks: Vec<EventSink>,
    pub targets: Vec<String>,
}

impl CameraLog {
    /// Handles started but not yet stopped.
    pub fn live(&self) -> usize {
        self.started.len() - self.stopped.len()
    }

    pub fn last_sink(&self) -> EventSink {
        self.sinks.last().cloned().expect("camera was never started")
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeCamera {
    pub log: Rc<RefCell<CameraLog>>,
    pub refuse: Option<CaptureError>,
}

impl CameraDecoder for FakeCamera {
    type Handle = u32;

    fn start(
        &mut self,
        target: &str,
        _options: &CameraOptions,
        sink: EventSink,
    ) -> Result<u32, CaptureError> {
        if let Some(err) = &self.refuse {
            return Err(err.clone());
        }
        let mut log = self.log.borrow_mut();
        let id = log.started.len() as u32 + 1;
        log.started.push(id);
        log.sinks.push(sink);
        log.targets.push(target.to_string());
        Ok(id)
    }

    fn stop(&mut self, handle: u32) {
        let mut log = self.log.borrow_mut();
        assert!(
            !log.stopped.contains(&handle),
            "camera handle {handle} stopped twice"
        );
        log.stopped.push(handle);
    }
}

/// What the fake file decoder has been asked to do.
#[derive(Debug, Default)]
pub struct FileLog {
    pub decoded: Vec<PathBuf>,
    pub sinks: Vec<EventSink>,
}

impl FileLog {
    pub fn last_sink(&self) -> EventSink {
        self.sinks.last().cloned().expect("no file decode was started")
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeFiles {
    pub log: Rc<RefCell<FileLog>>,
}

impl FileDecoder for FakeFiles {
    fn decode(&mut self, _target: &str, file: &SelectedFile, sink: EventSink) {
        let mut log = self.log.borrow_mut();
        log.decoded.push(file.path.clone());
        log.sinks.push(sink);
    }
}

pub type FakeController = ScanSessionController<FakeCamera, FakeFiles>;

pub struct Harness {
    pub controller: FakeController,
    pub camera: Rc<RefCell<CameraLog>>,
    pub files: Rc<RefCell<FileLog>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_camera(FakeCamera::default())
    }

    pub fn with_camera(camera: FakeCamera) -> Self {
        let files = FakeFiles::default();
        let camera_log = Rc::clone(&camera.log);
        let file_log = Rc::clone(&files.log);
        Self {
            controller: ScanSessionController::new(camera, files, CameraOptions::default()),
            camera: camera_log,
            files: file_log,
        }
    }

    /// Camera reports a payload, then the controller drains its queue.
    pub fn camera_decodes(&mut self, payload: &str) -> bool {
        self.camera.borrow().last_sink().decoded(payload);
        self.controller.pump()
    }

    pub fn camera_fails(&mut self, message: &str) -> bool {
        self.camera.borrow().last_sink().failed(message);
        self.controller.pump()
    }

    pub fn file_decodes(&mut self, payload: &str) -> bool {
        self.files.borrow().last_sink().decoded(payload);
        self.controller.pump()
    }

    pub fn file_fails(&mut self, message: &str) -> bool {
        self.files.borrow().last_sink().failed(message);
        self.controller.pump()
    }
}

pub fn file(path: &str) -> SelectedFile {
    SelectedFile::from_path(path)
}

/// Render `payload` as a black-on-white QR code, `module_px` pixels per
/// module, with the standard four-module quiet zone.
pub fn qr_image(payload: &str, module_px: u32) -> GrayImage {
    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let dark: Vec<bool> = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
    let side = (modules + 8) * module_px;

    GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / module_px, y / module_px);
        let inside = (4..modules + 4).contains(&mx) && (4..modules + 4).contains(&my);
        if inside && dark[((my - 4) * modules + (mx - 4)) as usize] {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// A white frame with the code for `payload` pasted in its center.
pub fn frame_with_qr(payload: &str, width: u32, height: u32) -> GrayImage {
    let code = qr_image(payload, 6);
    let mut frame = GrayImage::from_pixel(width, height, Luma([255]));
    let x = i64::from((width - code.width()) / 2);
    let y = i64::from((height - code.height()) / 2);
    image::imageops::overlay(&mut frame, &code, x, y);
    frame
}

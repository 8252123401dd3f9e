//! The real frame-directory camera and image-file decoder driven through
//! the session controller.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use image::{GrayImage, Luma};
use tempfile::TempDir;

use qrscan::capture::{CameraOptions, FrameDirCamera, ImageFileDecoder};
use qrscan::config::Config;
use qrscan::session::{
    FailureKind, ScanMode, ScanSessionController, ScanSource, SelectedFile, NO_CODE_DETECTED,
};
use qrscan::{build_controller, DefaultController};

use super::support::{frame_with_qr, qr_image};

fn controller_for(frames: &Path, loop_frames: bool) -> DefaultController {
    let options = CameraOptions {
        fps: 100,
        ..CameraOptions::default()
    };
    ScanSessionController::new(
        FrameDirCamera::new(frames).with_loop_frames(loop_frames),
        ImageFileDecoder::new(),
        options,
    )
}

/// Apply events until the session leaves its scanning mode.
fn settle(controller: &mut DefaultController) -> ScanMode {
    let deadline = Instant::now() + Duration::from_secs(10);
    while controller.mode().is_scanning() && Instant::now() < deadline {
        controller.wait_event(Duration::from_millis(50));
    }
    controller.mode()
}

fn write_blank(path: &Path) {
    GrayImage::from_pixel(64, 64, Luma([255])).save(path).unwrap();
}

#[test]
fn test_blank_image_file_has_no_code() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("blank.png");
    write_blank(&image);

    let mut controller = controller_for(dir.path(), false);
    controller.select_file(SelectedFile::from_path(&image)).unwrap();
    assert_eq!(controller.files().decodes_started(), 1);

    assert_eq!(settle(&mut controller), ScanMode::Failed);
    let failure = controller.snapshot().failure().unwrap();
    assert_eq!(failure.kind, FailureKind::NoCodeFound);
    assert_eq!(failure.source, ScanSource::File);
    assert_eq!(failure.detail, NO_CODE_DETECTED);

    let selected = controller.snapshot().selected_file().unwrap();
    assert_eq!(selected.name, "blank.png");
    assert!(selected.size.unwrap() > 0);
}

#[test]
fn test_image_file_with_code_succeeds() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("badge.png");
    qr_image(r#"{"name":"Alice","seat":"12B"}"#, 6).save(&image).unwrap();

    let mut controller = controller_for(dir.path(), false);
    controller.select_file(SelectedFile::from_path(&image)).unwrap();

    assert_eq!(settle(&mut controller), ScanMode::Succeeded);
    let session = controller.snapshot();
    assert_eq!(session.extracted_name(), Some("Alice"));
    assert_eq!(session.raw_payload(), Some(r#"{"name":"Alice","seat":"12B"}"#));
    assert_eq!(session.selected_file().unwrap().name, "badge.png");
}

#[test]
fn test_camera_frame_with_centered_code_succeeds() {
    let dir = TempDir::new().unwrap();
    write_blank(&dir.path().join("0001.png"));
    frame_with_qr("hello", 640, 480)
        .save(dir.path().join("0002.png"))
        .unwrap();

    let mut controller = controller_for(dir.path(), false);
    controller.start_camera().unwrap();
    assert!(controller.is_camera_live());

    assert_eq!(settle(&mut controller), ScanMode::Succeeded);
    assert_eq!(controller.snapshot().raw_payload(), Some("hello"));
    assert_eq!(controller.snapshot().extracted_name(), Some("hello"));
    assert!(!controller.is_camera_live());
}

#[test]
fn test_missing_image_file_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let mut controller = controller_for(dir.path(), false);
    controller
        .select_file(SelectedFile::from_path(dir.path().join("gone.png")))
        .unwrap();

    assert_eq!(settle(&mut controller), ScanMode::Failed);
    assert_eq!(
        controller.snapshot().error_message(),
        Some("File not found or corrupted. Please try again.")
    );
}

#[test]
fn test_garbage_image_file_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.jpg");
    fs::write(&path, b"\xff\xd8 this is not really a jpeg").unwrap();

    let mut controller = controller_for(dir.path(), false);
    controller.select_file(SelectedFile::from_path(&path)).unwrap();

    assert_eq!(settle(&mut controller), ScanMode::Failed);
    assert_eq!(
        controller.snapshot().failure().unwrap().kind,
        FailureKind::FileUnreadable
    );
}

#[test]
fn test_missing_frame_source_is_refused() {
    let dir = TempDir::new().unwrap();
    let mut controller = controller_for(&dir.path().join("no-camera"), false);
    controller.start_camera().unwrap();

    // Refusal is synchronous; nothing to wait for
    assert_eq!(controller.mode(), ScanMode::Failed);
    assert!(!controller.is_camera_live());
    let failure = controller.snapshot().failure().unwrap();
    assert_eq!(failure.kind, FailureKind::CameraPermissionDenied);
    assert!(failure.detail.starts_with("NotFoundError"));
}

#[test]
fn test_exhausted_frame_source_has_no_code() {
    let dir = TempDir::new().unwrap();
    write_blank(&dir.path().join("0001.png"));
    write_blank(&dir.path().join("0002.png"));

    let mut controller = controller_for(dir.path(), false);
    controller.start_camera().unwrap();
    assert!(controller.is_camera_live());

    assert_eq!(settle(&mut controller), ScanMode::Failed);
    assert!(!controller.is_camera_live());
    let failure = controller.snapshot().failure().unwrap();
    assert_eq!(failure.kind, FailureKind::NoCodeFound);
    assert_eq!(failure.source, ScanSource::Camera);
}

#[test]
fn test_file_selection_stops_looping_camera() {
    let dir = TempDir::new().unwrap();
    write_blank(&dir.path().join("0001.png"));
    let image = dir.path().join("upload.png");
    write_blank(&image);

    let mut controller = controller_for(dir.path(), true);
    controller.start_camera().unwrap();
    assert!(controller.is_camera_live());

    controller.select_file(SelectedFile::from_path(&image)).unwrap();
    assert!(!controller.is_camera_live());

    // Only the file's outcome can land now
    assert_eq!(settle(&mut controller), ScanMode::Failed);
    assert_eq!(
        controller.snapshot().failure().unwrap().source,
        ScanSource::File
    );
}

#[test]
fn test_reset_and_close_stop_looping_camera() {
    let dir = TempDir::new().unwrap();
    write_blank(&dir.path().join("0001.png"));

    let mut controller = controller_for(dir.path(), true);
    controller.start_camera().unwrap();
    controller.reset();
    assert_eq!(controller.mode(), ScanMode::Idle);
    assert!(!controller.is_camera_live());

    controller.retry().unwrap();
    assert!(controller.is_camera_live());
    let session = controller.close();
    assert_eq!(session.mode(), ScanMode::CameraActive);
}

#[test]
fn test_build_controller_uses_config() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.camera.frames_dir = Some(dir.path().to_path_buf());
    config.camera.box_size = 120;
    config.camera.fps = 0;

    let controller = build_controller(&config);
    assert_eq!(controller.camera().root(), dir.path());
    assert_eq!(controller.camera_options().box_size, 120);
    assert_eq!(controller.camera_options().fps, 1);
    assert_eq!(controller.mode(), ScanMode::Idle);
}

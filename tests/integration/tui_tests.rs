use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use qrscan::session::{ScanMode, NO_CODE_DETECTED};
use qrscan::tui::app::{Action, App, AppMode};
use qrscan::tui::ui::render;

use super::support::{CameraLog, FakeCamera, FakeFiles, FileLog, Harness};

type FakeApp = App<FakeCamera, FakeFiles>;

fn setup_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn fake_app() -> (FakeApp, Rc<RefCell<CameraLog>>, Rc<RefCell<FileLog>>) {
    let h = Harness::new();
    (App::new(h.controller), h.camera, h.files)
}

fn draw(app: &FakeApp) -> String {
    let mut terminal = setup_terminal(80, 24);
    terminal
        .draw(|f| {
            render(f, app);
        })
        .unwrap();
    format!("{:?}", terminal.backend().buffer())
}

fn press(app: &mut FakeApp, code: KeyCode) -> bool {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &mut FakeApp, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

#[test]
fn test_render_idle_options() {
    let (app, _, _) = fake_app();
    let content = draw(&app);

    assert!(content.contains("QR Code Scanner"));
    assert!(content.contains("[Ready]"));
    assert!(content.contains("Open Camera"));
    assert!(content.contains("Upload Image"));
    assert!(content.contains("For best results:"));
}

#[test]
fn test_render_camera_active() {
    let (mut app, camera, _) = fake_app();
    assert!(press(&mut app, KeyCode::Char('c')));
    assert_eq!(camera.borrow().live(), 1);

    let content = draw(&app);
    assert!(content.contains("[Scanning...]"));
    assert!(content.contains("Hold the QR code inside the scan box"));
    assert!(content.contains("environment camera, 250x250 box, 10 fps"));
}

#[test]
fn test_render_results_and_use_name() {
    let (mut app, camera, _) = fake_app();
    app.handle_action(Action::OpenCamera);
    camera.borrow().last_sink().decoded(r#"{"name":"Alice","id":7}"#);
    assert!(app.pump());

    let content = draw(&app);
    assert!(content.contains("[Scanned]"));
    assert!(content.contains("Scanned Content:"));
    assert!(content.contains("Extracted Name:"));
    assert!(content.contains("Alice"));
    assert!(content.contains("Use this name"));
    assert_eq!(camera.borrow().live(), 0);

    assert!(press(&mut app, KeyCode::Char('u')));
    assert_eq!(app.mode(), AppMode::Welcome);
    assert!(draw(&app).contains("Welcome, Alice!"));

    assert!(press(&mut app, KeyCode::Enter));
    assert_eq!(app.mode(), AppMode::Main);
}

#[test]
fn test_use_name_without_result_does_nothing() {
    let (mut app, _, _) = fake_app();
    assert!(!press(&mut app, KeyCode::Char('u')));
    assert_eq!(app.mode(), AppMode::Main);
}

#[test]
fn test_path_entry_scans_file() {
    let (mut app, _, files) = fake_app();
    assert!(press(&mut app, KeyCode::Char('o')));
    assert_eq!(app.mode(), AppMode::EnteringPath);

    // Bound keys are plain text inside the dialog
    type_text(&mut app, "/tmp/qrx.png");
    assert_eq!(app.path_input(), "/tmp/qrx.png");
    assert!(draw(&app).contains("Path of an image to scan:"));

    press(&mut app, KeyCode::Backspace);
    type_text(&mut app, "g");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), AppMode::Main);
    assert_eq!(app.session().mode(), ScanMode::FileScanning);
    assert_eq!(
        files.borrow().decoded,
        vec![std::path::PathBuf::from("/tmp/qrx.png")]
    );
    assert!(draw(&app).contains("Scanning file..."));
}

#[test]
fn test_empty_path_keeps_dialog_open() {
    let (mut app, _, files) = fake_app();
    press(&mut app, KeyCode::Char('o'));
    type_text(&mut app, "   ");
    assert!(!press(&mut app, KeyCode::Enter));

    assert_eq!(app.mode(), AppMode::EnteringPath);
    assert_eq!(app.notice(), Some("Type the path of an image file"));
    assert!(files.borrow().decoded.is_empty());
}

#[test]
fn test_escape_cancels_path_entry() {
    let (mut app, _, files) = fake_app();
    press(&mut app, KeyCode::Char('o'));
    type_text(&mut app, "abc");
    assert!(press(&mut app, KeyCode::Esc));

    assert_eq!(app.mode(), AppMode::Main);
    assert_eq!(app.path_input(), "");
    assert!(files.borrow().decoded.is_empty());
}

#[test]
fn test_upload_while_camera_releases_camera() {
    let (mut app, camera, files) = fake_app();
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Char('o'));
    assert_eq!(app.mode(), AppMode::EnteringPath);
    // Camera keeps running until a file is actually chosen
    assert_eq!(camera.borrow().live(), 1);

    type_text(&mut app, "badge.png");
    press(&mut app, KeyCode::Enter);

    assert_eq!(camera.borrow().live(), 0);
    assert_eq!(camera.borrow().stopped.len(), 1);
    assert_eq!(files.borrow().decoded.len(), 1);
}

#[test]
fn test_upload_rejected_while_file_scanning() {
    let (mut app, _, _) = fake_app();
    app.scan_path("/tmp/one.png");
    assert!(!press(&mut app, KeyCode::Char('o')));

    assert_eq!(app.mode(), AppMode::Main);
    assert_eq!(
        app.notice(),
        Some("Cannot upload an image while the session is file")
    );
}

#[test]
fn test_render_error_and_retry_file() {
    let (mut app, camera, files) = fake_app();
    app.scan_path("/tmp/blank.png");
    files.borrow().last_sink().failed(NO_CODE_DETECTED);
    app.pump();

    let content = draw(&app);
    assert!(content.contains("[Failed]"));
    assert!(content.contains("No QR code found in the image."));
    assert!(content.contains("Retry"));

    assert!(press(&mut app, KeyCode::Char('r')));
    assert_eq!(app.session().mode(), ScanMode::FileScanning);
    assert_eq!(files.borrow().decoded.len(), 2);
    assert!(camera.borrow().started.is_empty());
}

#[test]
fn test_retry_after_camera_failure_reopens_camera() {
    let (mut app, camera, _) = fake_app();
    press(&mut app, KeyCode::Char('c'));
    camera.borrow().last_sink().failed(NO_CODE_DETECTED);
    app.pump();
    assert_eq!(app.session().mode(), ScanMode::Failed);

    assert!(press(&mut app, KeyCode::Char('r')));
    assert_eq!(app.session().mode(), ScanMode::CameraActive);
    assert_eq!(camera.borrow().started.len(), 2);
    assert_eq!(camera.borrow().live(), 1);
}

#[test]
fn test_retry_without_failure_sets_notice() {
    let (mut app, _, _) = fake_app();
    assert!(!press(&mut app, KeyCode::Char('r')));
    assert_eq!(app.notice(), Some("Nothing to retry"));

    // Esc clears the notice
    assert!(press(&mut app, KeyCode::Esc));
    assert!(app.notice().is_none());
}

#[test]
fn test_scan_again_resets_session() {
    let (mut app, camera, _) = fake_app();
    press(&mut app, KeyCode::Char('c'));
    camera.borrow().last_sink().decoded("hello");
    app.pump();

    assert!(press(&mut app, KeyCode::Char('s')));
    assert_eq!(app.session().mode(), ScanMode::Idle);
    assert!(app.session().raw_payload().is_none());
    assert!(draw(&app).contains("[Ready]"));
}

#[test]
fn test_scan_again_stops_live_camera() {
    let (mut app, camera, _) = fake_app();
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Backspace);

    assert_eq!(app.session().mode(), ScanMode::Idle);
    assert_eq!(camera.borrow().live(), 0);
}

#[test]
fn test_help_toggle() {
    let (mut app, _, _) = fake_app();
    assert!(press(&mut app, KeyCode::Char('?')));
    assert_eq!(app.mode(), AppMode::ShowingHelp);
    assert!(draw(&app).contains("Keys"));

    // Main-screen actions are ignored under the help overlay
    assert!(!press(&mut app, KeyCode::Char('c')));

    assert!(press(&mut app, KeyCode::Char('?')));
    assert_eq!(app.mode(), AppMode::Main);
}

#[test]
fn test_quit_then_close_releases_camera() {
    let (mut app, camera, _) = fake_app();
    press(&mut app, KeyCode::Char('c'));
    assert!(press(&mut app, KeyCode::Char('q')));
    assert!(app.should_quit());
    assert!(draw(&app).contains("Releasing camera. Goodbye!"));

    let session = app.close();
    assert_eq!(session.mode(), ScanMode::CameraActive);
    assert_eq!(camera.borrow().stopped.len(), 1);
}

#[test]
fn test_ctrl_c_quits_from_path_dialog() {
    let (mut app, _, _) = fake_app();
    press(&mut app, KeyCode::Char('o'));
    assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    assert!(app.should_quit());
}

#[test]
fn test_ascii_borders() {
    let h = Harness::new();
    let app = App::new(h.controller).with_accessible(true);
    let content = draw(&app);
    assert!(content.contains("+---"));
}

#[test]
fn test_notice_cleared_when_session_changes() {
    let (mut app, camera, _) = fake_app();
    press(&mut app, KeyCode::Char('c'));
    app.handle_action(Action::UploadImage);
    press(&mut app, KeyCode::Esc);
    app.handle_action(Action::Retry);
    assert_eq!(app.notice(), Some("Nothing to retry"));

    camera.borrow().last_sink().decoded("x");
    assert!(app.pump());
    assert!(app.notice().is_none());
}

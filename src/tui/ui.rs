//! Ratatui rendering.
//!
//! The screen is a header, a content area that follows the scan session
//! mode, and a footer of key hints. Dialogs for the upload path, the
//! welcome popup and help are drawn on top.
//!
//! # Example
//!
//! ```no_run
//! use qrscan::tui::{ui::render, App};
//! # fn draw<C: qrscan::capture::CameraDecoder, F: qrscan::capture::FileDecoder>(
//! #     terminal: &mut ratatui::Terminal<ratatui::backend::TestBackend>,
//! #     app: &App<C, F>,
//! # ) {
//! terminal.draw(|frame| render(frame, app)).unwrap();
//! # }
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::{Action, App, AppMode};
use crate::capture::{CameraDecoder, FileDecoder};
use crate::session::{ScanMode, ScanSession};

/// ASCII border set for screen readers and limited terminals.
const ASCII_BORDER_SET: border::Set = border::Set {
    top_left: "+",
    top_right: "+",
    bottom_left: "+",
    bottom_right: "+",
    vertical_left: "|",
    vertical_right: "|",
    horizontal_top: "-",
    horizontal_bottom: "-",
};

fn get_border_set(accessible: bool) -> border::Set {
    if accessible {
        ASCII_BORDER_SET
    } else {
        border::ROUNDED
    }
}

fn create_block(accessible: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(get_border_set(accessible))
}

fn create_block_with_title<'a>(accessible: bool, title: impl Into<Line<'a>>) -> Block<'a> {
    create_block(accessible).title(title)
}

/// Render the whole screen.
pub fn render<C: CameraDecoder, F: FileDecoder>(frame: &mut Frame, app: &App<C, F>) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    if app.mode() == AppMode::Quitting {
        render_quitting_content(frame, app, chunks[1]);
    } else {
        render_content(frame, app, chunks[1]);
    }
    render_footer(frame, app, chunks[2]);

    match app.mode() {
        AppMode::EnteringPath => render_path_dialog(frame, app, area),
        AppMode::Welcome => render_welcome_dialog(frame, app, area),
        AppMode::ShowingHelp => render_help_dialog(frame, app, area),
        AppMode::Main | AppMode::Quitting => {}
    }
}

fn render_header<C: CameraDecoder, F: FileDecoder>(frame: &mut Frame, app: &App<C, F>, area: Rect) {
    let theme = app.theme();
    let (status, color) = match app.session().mode() {
        ScanMode::Idle => ("Ready", theme.muted),
        ScanMode::CameraActive => ("Scanning...", theme.scanning),
        ScanMode::FileScanning => ("Scanning file...", theme.scanning),
        ScanMode::Succeeded => ("Scanned", theme.success),
        ScanMode::Failed => ("Failed", theme.error),
    };

    let title = Line::from(vec![
        Span::styled(
            "QR Code Scanner",
            Style::default()
                .fg(theme.border)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", Style::default()),
        Span::styled(
            format!("[{status}]"),
            Style::default().fg(theme.badge_fg).bg(color),
        ),
    ]);

    let header = Paragraph::new(title)
        .alignment(Alignment::Center)
        .block(create_block(app.is_accessible()).border_style(Style::default().fg(theme.border)));
    frame.render_widget(header, area);
}

fn render_content<C: CameraDecoder, F: FileDecoder>(frame: &mut Frame, app: &App<C, F>, area: Rect) {
    let session = app.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match session.mode() {
        ScanMode::Idle => render_options(frame, app, chunks[0]),
        ScanMode::CameraActive => render_camera(frame, app, chunks[0]),
        ScanMode::FileScanning => render_file_scan(frame, app, session, chunks[0]),
        ScanMode::Succeeded => render_results(frame, app, session, chunks[0]),
        ScanMode::Failed => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(6), Constraint::Min(0)])
                .split(chunks[0]);
            render_error_banner(frame, app, session, split[0]);
            render_options(frame, app, split[1]);
        }
    }

    if let Some(notice) = app.notice() {
        let line = Paragraph::new(notice.to_string())
            .style(Style::default().fg(app.theme().hint))
            .alignment(Alignment::Center);
        frame.render_widget(line, chunks[1]);
    }
}

fn key_span<'a, C: CameraDecoder, F: FileDecoder>(app: &App<C, F>, action: Action) -> Span<'a> {
    Span::styled(
        format!("[{}]", app.keybindings().key_hint(&action)),
        Style::default()
            .fg(app.theme().hint)
            .add_modifier(Modifier::BOLD),
    )
}

/// Scanner options: open camera, upload image, tips.
fn render_options<C: CameraDecoder, F: FileDecoder>(frame: &mut Frame, app: &App<C, F>, area: Rect) {
    let theme = app.theme();
    let normal = Style::default().fg(theme.text);
    let dim = Style::default().fg(theme.muted);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            key_span(app, Action::OpenCamera),
            Span::styled(" Open Camera     ", normal),
            key_span(app, Action::UploadImage),
            Span::styled(" Upload Image", normal),
        ]),
        Line::from(""),
        Line::from(Span::styled("For best results:", normal)),
        Line::from(Span::styled("- Use clear, well-lit images", dim)),
        Line::from(Span::styled("- Ensure QR code fills most of the image", dim)),
        Line::from(Span::styled(
            "- Supported formats: JPG, PNG, GIF, BMP, TIFF, WebP",
            dim,
        )),
    ];

    let options = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(create_block_with_title(app.is_accessible(), " Scan "));
    frame.render_widget(options, area);
}

fn render_camera<C: CameraDecoder, F: FileDecoder>(frame: &mut Frame, app: &App<C, F>, area: Rect) {
    let theme = app.theme();
    let options = app.controller().camera_options();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Scanning...",
            Style::default()
                .fg(theme.scanning)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Hold the QR code inside the scan box",
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            format!(
                "{} camera, {}x{} box, {} fps",
                options.facing, options.box_size, options.box_size, options.fps
            ),
            Style::default().fg(theme.muted),
        )),
    ];

    let camera = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            create_block_with_title(app.is_accessible(), " Camera ")
                .border_style(Style::default().fg(theme.scanning)),
        );
    frame.render_widget(camera, area);
}

fn render_file_scan<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    session: &ScanSession,
    area: Rect,
) {
    let theme = app.theme();
    let name = session
        .selected_file()
        .map(|f| f.name.clone())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            truncate_string(&name, area.width.saturating_sub(4) as usize),
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Scanning file...",
            Style::default().fg(theme.scanning),
        )),
    ];

    let file = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(create_block_with_title(app.is_accessible(), " Upload "));
    frame.render_widget(file, area);
}

fn render_results<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    session: &ScanSession,
    area: Rect,
) {
    let theme = app.theme();
    let label = Style::default().fg(theme.muted);
    let payload = session.raw_payload().unwrap_or_default();
    let name = session.extracted_name().unwrap_or_default();

    let mut lines = vec![
        Line::from(Span::styled("Scanned Content:", label)),
        Line::from(Span::styled(
            payload.to_string(),
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled("Extracted Name:", label)),
        Line::from(Span::styled(
            name.to_string(),
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            key_span(app, Action::UseName),
            Span::styled(" Use this name     ", Style::default().fg(theme.text)),
            key_span(app, Action::ScanAgain),
            Span::styled(" Scan Again", Style::default().fg(theme.text)),
        ]),
    ];

    if let Some(file) = session.selected_file() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("From {}", file.name), label)));
    }

    let results = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            create_block_with_title(app.is_accessible(), " Scan Results ")
                .border_style(Style::default().fg(theme.success)),
        );
    frame.render_widget(results, area);
}

fn render_error_banner<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    session: &ScanSession,
    area: Rect,
) {
    let theme = app.theme();
    let Some(failure) = session.failure() else {
        return;
    };

    let lines = vec![
        Line::from(Span::styled(
            failure.message.clone(),
            Style::default()
                .fg(theme.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            failure.kind.remedy(),
            Style::default().fg(theme.muted),
        )),
        Line::from(""),
        Line::from(vec![
            key_span(app, Action::Retry),
            Span::styled(" Retry", Style::default().fg(theme.text)),
        ]),
    ];

    let banner = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            create_block_with_title(app.is_accessible(), " Error ")
                .border_style(Style::default().fg(theme.error)),
        );
    frame.render_widget(banner, area);
}

fn render_quitting_content<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    area: Rect,
) {
    let message = Paragraph::new("Releasing camera. Goodbye!")
        .style(Style::default().fg(app.theme().success))
        .alignment(Alignment::Center)
        .block(create_block(app.is_accessible()));
    frame.render_widget(message, area);
}

fn render_footer<C: CameraDecoder, F: FileDecoder>(frame: &mut Frame, app: &App<C, F>, area: Rect) {
    let theme = app.theme();
    let spans: Vec<Span> = footer_actions(app)
        .into_iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!("[{key}]"),
                    Style::default()
                        .fg(theme.hint)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{desc} "), Style::default().fg(theme.text)),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(create_block(app.is_accessible()).border_style(Style::default().fg(theme.muted)));
    frame.render_widget(footer, area);
}

/// Key hints that apply in the current state.
fn footer_actions<C: CameraDecoder, F: FileDecoder>(app: &App<C, F>) -> Vec<(String, &'static str)> {
    let keys = app.keybindings();
    let hint = |action: Action, desc: &'static str| (keys.key_hint(&action), desc);

    let mut actions = match app.mode() {
        AppMode::EnteringPath => {
            return vec![("Enter".to_string(), "Scan"), ("Esc".to_string(), "Cancel")];
        }
        AppMode::Welcome | AppMode::ShowingHelp => {
            return vec![hint(Action::Confirm, "Close"), hint(Action::Quit, "Quit")];
        }
        AppMode::Quitting => return Vec::new(),
        AppMode::Main => Vec::new(),
    };

    match app.session().mode() {
        ScanMode::Idle => {
            actions.push(hint(Action::OpenCamera, "Camera"));
            actions.push(hint(Action::UploadImage, "Upload"));
        }
        ScanMode::CameraActive => {
            actions.push(hint(Action::UploadImage, "Upload"));
            actions.push(hint(Action::ScanAgain, "Stop"));
        }
        ScanMode::FileScanning => {
            actions.push(hint(Action::ScanAgain, "Cancel scan"));
        }
        ScanMode::Succeeded => {
            actions.push(hint(Action::UseName, "Use name"));
            actions.push(hint(Action::ScanAgain, "Scan again"));
        }
        ScanMode::Failed => {
            actions.push(hint(Action::Retry, "Retry"));
            actions.push(hint(Action::OpenCamera, "Camera"));
            actions.push(hint(Action::UploadImage, "Upload"));
        }
    }
    actions.push(hint(Action::ShowHelp, "Help"));
    actions.push(hint(Action::Quit, "Quit"));
    actions
}

fn render_path_dialog<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    area: Rect,
) {
    let dialog_area = centered_rect(70, 30, area);
    frame.render_widget(Clear, dialog_area);
    let theme = app.theme();

    let width = dialog_area.width.saturating_sub(6) as usize;
    let input = format!("{}_", tail_string(app.path_input(), width.saturating_sub(1)));

    let lines = vec![
        Line::from(Span::styled(
            "Path of an image to scan:",
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            input,
            Style::default()
                .fg(theme.hint)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to scan, Esc to cancel",
            Style::default().fg(theme.muted),
        )),
    ];

    let dialog = Paragraph::new(lines).block(
        create_block_with_title(app.is_accessible(), " Upload Image ")
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(dialog, dialog_area);
}

fn render_welcome_dialog<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    area: Rect,
) {
    let dialog_area = centered_rect(50, 25, area);
    frame.render_widget(Clear, dialog_area);
    let theme = app.theme();
    let name = app.session().extracted_name().unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Welcome, {name}!"),
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Press {} to close", app.keybindings().key_hint(&Action::Confirm)),
            Style::default().fg(theme.muted),
        )),
    ];

    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(create_block(app.is_accessible()).border_style(Style::default().fg(theme.success)));
    frame.render_widget(dialog, dialog_area);
}

fn render_help_dialog<C: CameraDecoder, F: FileDecoder>(
    frame: &mut Frame,
    app: &App<C, F>,
    area: Rect,
) {
    let dialog_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, dialog_area);
    let theme = app.theme();
    let keys = app.keybindings();

    let lines: Vec<Line> = Action::all()
        .iter()
        .filter(|action| !keys.keys_for_action(action).is_empty())
        .map(|action| {
            Line::from(vec![
                Span::styled(
                    format!("{:>14}  ", keys.key_hints(action)),
                    Style::default()
                        .fg(theme.hint)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(action.description(), Style::default().fg(theme.text)),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(
        create_block_with_title(app.is_accessible(), " Keys ")
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(help, dialog_area);
}

// ==================== Helper Functions ====================

/// Truncate a string with ellipsis if it exceeds `max_len` characters.
///
/// ```
/// use qrscan::tui::ui::truncate_string;
///
/// assert_eq!(truncate_string("hello", 10), "hello");
/// assert_eq!(truncate_string("hello world", 8), "hello...");
/// ```
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Keep the last `max_len` characters, so the end of a long typed path stays visible.
fn tail_string(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        s.chars().skip(count - max_len).collect()
    }
}

/// Centered rectangle taking the given percentages of `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

//! qrscan - QR scan sessions from a camera frame source or an uploaded image.
//!
//! The core is [`session::ScanSessionController`], a state machine that
//! runs one decoding capability at a time, classifies decoder failures, and
//! extracts a display name from decoded payloads. The [`tui`] drives it
//! interactively; `qrscan decode` runs a single headless attempt.

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod session;
pub mod signal;
pub mod tui;

use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::capture::{FrameDirCamera, ImageFileDecoder};
use crate::cli::{Cli, Commands, DecodeArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::error::{ExitCode, Interrupted};
use crate::logging::LogTarget;
use crate::output::{JsonOutput, TextOutput};
use crate::session::{ScanSessionController, SelectedFile};
use crate::signal::ShutdownHandler;
use crate::tui::{run_tui, Action, App, KeyBindings, Theme, TuiError};

/// Upper bound on one wait in the headless loop, so Ctrl+C is noticed promptly.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Controller wired to the built-in capabilities.
pub type DefaultController = ScanSessionController<FrameDirCamera, ImageFileDecoder>;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for invalid configuration, terminal failures, or
/// [`Interrupted`] when Ctrl+C stopped the run. Scan failures are not
/// errors; they are reported through the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let log_target = match cli.command {
        Commands::Scan(_) => LogTarget::File(Config::log_file_path()),
        Commands::Decode(_) => LogTarget::Stderr,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_target);
    log::debug!(
        "qrscan {} (log level {})",
        env!("CARGO_PKG_VERSION"),
        logging::current_level_name()
    );

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let shutdown = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    match cli.command {
        Commands::Scan(args) => run_scan(&args, config, &shutdown),
        Commands::Decode(args) => run_decode(&args, config, &shutdown, !cli.no_color),
    }
}

/// Build a controller from the merged configuration.
#[must_use]
pub fn build_controller(config: &Config) -> DefaultController {
    let camera = FrameDirCamera::new(config.frames_dir()).with_loop_frames(config.camera.loop_frames);
    ScanSessionController::new(camera, ImageFileDecoder::new(), config.camera_options())
}

fn run_scan(args: &ScanArgs, mut config: Config, shutdown: &ShutdownHandler) -> anyhow::Result<ExitCode> {
    config.apply_camera_args(&args.camera_args);
    if args.ascii {
        config.tui.ascii_borders = true;
    }
    if let Some(theme) = args.theme {
        config.tui.theme = theme;
    }

    let keybindings = KeyBindings::default()
        .with_custom_overrides(&config.custom_keybindings)
        .context("Invalid custom_keybindings in configuration")?;

    let mut app = App::new(build_controller(&config))
        .with_keybindings(keybindings)
        .with_theme(Theme::from_arg(config.tui.theme))
        .with_accessible(config.tui.ascii_borders);

    if args.camera {
        app.handle_action(Action::OpenCamera);
    } else if let Some(path) = &args.file {
        app.scan_path(path);
    }

    let result = run_tui(&mut app, Some(shutdown.get_flag()));
    let session = app.close();
    log::info!("Session closed while {}", session.mode());

    match result {
        Ok(()) => Ok(ExitCode::Success),
        Err(TuiError::Interrupted) => Err(Interrupted.into()),
        Err(e) => Err(e).context("Terminal UI failed"),
    }
}

fn run_decode(
    args: &DecodeArgs,
    mut config: Config,
    shutdown: &ShutdownHandler,
    color: bool,
) -> anyhow::Result<ExitCode> {
    config.apply_camera_args(&args.camera_args);
    let mut controller = build_controller(&config);

    match &args.file {
        Some(path) => controller.select_file(SelectedFile::from_path(path))?,
        None => {
            log::info!("Sampling frames from {}", config.frames_dir().display());
            controller.start_camera()?;
        }
    }

    // A timeout too large to represent never expires
    let deadline = Instant::now().checked_add(Duration::from_secs(args.timeout));
    while controller.mode().is_scanning() {
        if shutdown.is_shutdown_requested() {
            controller.close();
            return Err(Interrupted.into());
        }
        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    log::warn!("No outcome after {}s, giving up", args.timeout);
                    break;
                }
                (deadline - now).min(WAIT_SLICE)
            }
            None => WAIT_SLICE,
        };
        controller.wait_event(wait);
    }

    let session = controller.close();
    let exit_code = ExitCode::for_session(&session);
    log::debug!("Session finished as {} ({})", session.mode(), exit_code.code_prefix());

    let mut stdout = std::io::stdout().lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&session, exit_code)
            .write_to(&mut stdout, true)
            .context("Failed to write JSON output")?,
        OutputFormat::Text => {
            let color = color && std::io::stdout().is_terminal();
            TextOutput::new(&session)
                .with_color(color)
                .write_to(&mut stdout)
                .context("Failed to write output")?;
        }
    }
    stdout.flush().context("Failed to write output")?;

    Ok(exit_code)
}

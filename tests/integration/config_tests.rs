//! Configuration layering: defaults, TOML file, environment, CLI flags.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use qrscan::capture::FacingMode;
use qrscan::cli::{Cli, Commands, ThemeArg};
use qrscan::config::{Config, ConfigError};
use qrscan::tui::app::Action;
use qrscan::tui::KeyBindings;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all QRSCAN_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("QRSCAN_") {
            std::env::remove_var(key);
        }
    }
}

fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

#[test]
fn test_config_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let config: Config = Config::figment(None).extract().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.camera.box_size, 250);
    assert_eq!(config.camera.fps, 10);
    assert_eq!(config.camera.facing, FacingMode::Environment);
    assert!(!config.camera.loop_frames);
    assert_eq!(config.tui.theme, ThemeArg::Auto);
    assert!(config.custom_keybindings.is_empty());
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config(
        r#"
[camera]
box_size = 300
fps = 5
facing = "user"
frames_dir = "/srv/frames"
loop_frames = true

[tui]
ascii_borders = true
theme = "light"
"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.camera.box_size, 300);
    assert_eq!(config.camera.fps, 5);
    assert_eq!(config.camera.facing, FacingMode::User);
    assert_eq!(config.frames_dir(), PathBuf::from("/srv/frames"));
    assert!(config.camera.loop_frames);
    assert!(config.tui.ascii_borders);
    assert_eq!(config.tui.theme, ThemeArg::Light);

    let options = config.camera_options();
    assert_eq!(options.box_size, 300);
    assert_eq!(options.fps, 5);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config("[camera]\nfps = 2\n");

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.camera.fps, 2);
    assert_eq!(config.camera.box_size, 250);
    assert_eq!(config.tui, Default::default());
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config("[camera]\nfps = 2\n\n[tui]\ntheme = \"light\"\n");

    std::env::set_var("QRSCAN_CAMERA__FPS", "7");
    std::env::set_var("QRSCAN_TUI__THEME", "dark");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.camera.fps, 7);
    assert_eq!(config.tui.theme, ThemeArg::Dark);
}

#[test]
fn test_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    std::env::set_var("QRSCAN_CAMERA__BOX_SIZE", "100");
    let config = Config::load(None);
    clear_env();
    let mut config = config.unwrap();
    assert_eq!(config.camera.box_size, 100);

    let cli = Cli::try_parse_from([
        "qrscan",
        "decode",
        "--camera",
        "--box-size",
        "320",
        "--facing",
        "user",
        "--frames",
        "/tmp/frames",
    ])
    .unwrap();
    let Commands::Decode(args) = &cli.command else {
        panic!("expected decode command");
    };
    config.apply_camera_args(&args.camera_args);

    assert_eq!(config.camera.box_size, 320);
    assert_eq!(config.camera.facing, FacingMode::User);
    assert_eq!(config.frames_dir(), PathBuf::from("/tmp/frames"));
    // Untouched by the flags
    assert_eq!(config.camera.fps, 10);
}

#[test]
fn test_invalid_toml_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config("[camera\nfps = ");

    let result = Config::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_wrong_type_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config("[camera]\nfps = \"fast\"\n");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration"));
}

#[test]
fn test_unknown_facing_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config("[camera]\nfacing = \"sideways\"\n");

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_missing_explicit_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref p) if *p == path));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_custom_keybindings_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config(
        r#"
[custom_keybindings]
retry = ["F5", "Ctrl+r"]
open_camera = ["Space"]
"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.custom_keybindings.len(), 2);

    let keys = KeyBindings::default()
        .with_custom_overrides(&config.custom_keybindings)
        .unwrap();
    assert_eq!(
        keys.resolve(&KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE)),
        Some(Action::Retry)
    );
    assert_eq!(
        keys.resolve(&KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
        Some(Action::Retry)
    );
    assert_eq!(
        keys.resolve(&KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)),
        Some(Action::OpenCamera)
    );
    // Defaults stay bound
    assert_eq!(
        keys.resolve(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)),
        Some(Action::OpenCamera)
    );
}

#[test]
fn test_invalid_custom_keybinding_action() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let (_dir, path) = write_config("[custom_keybindings]\nlaunch_rockets = [\"x\"]\n");

    let config = Config::load(Some(&path)).unwrap();
    let err = KeyBindings::default()
        .with_custom_overrides(&config.custom_keybindings)
        .unwrap_err();
    assert!(err.to_string().contains("launch_rockets"));
}

#[test]
fn test_config_serializes_to_toml() {
    let mut config = Config::default();
    config.camera.fps = 3;
    config.tui.theme = ThemeArg::Dark;

    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("fps = 3"));
    assert!(text.contains("theme = \"dark\""));

    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

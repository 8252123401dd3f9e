//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `QRSCAN_`, `__` separating nested
//!    keys (`QRSCAN_CAMERA__FPS=5`)
//!
//! Command-line flags are applied on top by [`Config::apply_camera_args`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::capture::{CameraOptions, FacingMode};
use crate::cli::{CameraArgs, ThemeArg};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "QRSCAN_";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or had the wrong shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Camera settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Side of the centered scan box in pixels.
    pub box_size: u32,
    /// Frames sampled per second.
    pub fps: u32,
    /// Preferred camera.
    pub facing: FacingMode,
    /// Frame-source directory. Unset means `frames` under the data dir.
    pub frames_dir: Option<PathBuf>,
    /// Keep sampling after the last frame.
    pub loop_frames: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let options = CameraOptions::default();
        Self {
            box_size: options.box_size,
            fps: options.fps,
            facing: options.facing,
            frames_dir: None,
            loop_frames: false,
        }
    }
}

/// Terminal UI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Draw borders with plain ASCII characters.
    pub ascii_borders: bool,
    /// Color theme.
    pub theme: ThemeArg,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera settings.
    pub camera: CameraConfig,
    /// Terminal UI settings.
    pub tui: TuiConfig,
    /// Extra key bindings: action name to key specs (`"Ctrl+r"`, `"F5"`).
    pub custom_keybindings: HashMap<String, Vec<String>>,
}

impl Config {
    /// Load configuration from every layer.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// config file is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or a layer
    /// fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().filter(|p| p.is_file()),
        };

        if let Some(path) = &file {
            log::debug!("Loading config from {}", path.display());
        }

        let config = Self::figment(file.as_deref())
            .extract()
            .map_err(Box::new)?;
        Ok(config)
    }

    /// Build the figment for the given file (if any) plus the environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Default frame-source directory.
    #[must_use]
    pub fn default_frames_dir() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.data_local_dir().join("frames"))
            .unwrap_or_else(|| PathBuf::from("frames"))
    }

    /// Log file used while the TUI owns the terminal.
    #[must_use]
    pub fn log_file_path() -> PathBuf {
        match project_dirs() {
            Some(dirs) => {
                let dir = dirs.data_local_dir();
                if let Err(e) = std::fs::create_dir_all(dir) {
                    log::debug!("Cannot create {}: {}", dir.display(), e);
                }
                dir.join("qrscan.log")
            }
            None => std::env::temp_dir().join("qrscan.log"),
        }
    }

    /// Override camera settings with the flags given on the command line.
    pub fn apply_camera_args(&mut self, args: &CameraArgs) {
        if let Some(frames) = &args.frames {
            self.camera.frames_dir = Some(frames.clone());
        }
        if let Some(fps) = args.fps {
            self.camera.fps = fps;
        }
        if let Some(box_size) = args.box_size {
            self.camera.box_size = box_size;
        }
        if let Some(facing) = args.facing {
            self.camera.facing = facing;
        }
        if args.loop_frames {
            self.camera.loop_frames = true;
        }
    }

    /// Options handed to the camera capability.
    #[must_use]
    pub fn camera_options(&self) -> CameraOptions {
        CameraOptions {
            box_size: self.camera.box_size,
            fps: self.camera.fps.max(1),
            facing: self.camera.facing,
        }
    }

    /// Frame-source directory after defaults are applied.
    #[must_use]
    pub fn frames_dir(&self) -> PathBuf {
        self.camera
            .frames_dir
            .clone()
            .unwrap_or_else(Self::default_frames_dir)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "qrscan", "qrscan")
}

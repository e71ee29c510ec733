use gbahost_core::paths::{CaptureFormat, StorageRoots};
use gbahost_core::session::{SaveKeyMode, SessionOptions};
use gbahost_core::status::ShowSpeed;
use log::warn;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotFormat {
    #[default]
    Png,
    Bmp,
}

impl From<ScreenshotFormat> for CaptureFormat {
    fn from(format: ScreenshotFormat) -> Self {
        match format {
            ScreenshotFormat::Png => Self::Png,
            ScreenshotFormat::Bmp => Self::Bmp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedDisplay {
    #[default]
    Off,
    Percent,
    Detailed,
}

impl From<SpeedDisplay> for ShowSpeed {
    fn from(display: SpeedDisplay) -> Self {
        match display {
            SpeedDisplay::Off => Self::Off,
            SpeedDisplay::Percent => Self::Percent,
            SpeedDisplay::Detailed => Self::Detailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindowSize {
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "2x")]
    #[default]
    X2,
    #[serde(rename = "3x")]
    X3,
    #[serde(rename = "4x")]
    X4,
    #[serde(rename = "fullscreen")]
    Fullscreen,
    #[serde(rename = "fullscreen-stretched")]
    FullscreenStretched,
}

impl WindowSize {
    pub fn scale_factor_px(&self) -> Option<u32> {
        match self {
            Self::X1 => Some(1),
            Self::X2 => Some(2),
            Self::X3 => Some(3),
            Self::X4 => Some(4),
            Self::Fullscreen | Self::FullscreenStretched => None,
        }
    }

    pub fn is_fullscreen(self) -> bool {
        matches!(self, Self::Fullscreen | Self::FullscreenStretched)
    }

    pub fn use_integer_scaling(self) -> bool {
        !matches!(self, Self::FullscreenStretched)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostConfig {
    /// 0: Shift+F*n* saves, 1: F*n* saves, 2: F5/F6 pick a slot, F7/F8 save/load it.
    pub save_key_mode: u8,
    pub auto_frame_skip: bool,
    pub frame_skip: u8,
    /// Percent of real time to pace at; 0 runs unthrottled.
    pub throttle: u32,
    pub frame_rate: u32,
    pub state_dir: Option<PathBuf>,
    pub battery_dir: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub capture_format: ScreenshotFormat,
    pub show_speed: SpeedDisplay,
    pub status_messages: bool,
    pub status_duration_ms: u64,
    pub window_size: WindowSize,
    pub fullscreen_resolution: [u32; 2],
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            save_key_mode: 0,
            auto_frame_skip: true,
            frame_skip: 0,
            throttle: 100,
            frame_rate: 60,
            state_dir: None,
            battery_dir: None,
            screenshot_dir: None,
            home_dir: None,
            capture_format: ScreenshotFormat::default(),
            show_speed: SpeedDisplay::default(),
            status_messages: true,
            status_duration_ms: 3000,
            window_size: WindowSize::default(),
            fullscreen_resolution: [1280, 720],
        }
    }
}

impl HostConfig {
    pub fn save_key_mode(&self) -> SaveKeyMode {
        SaveKeyMode::from_index(self.save_key_mode).unwrap_or_else(|| {
            warn!(
                "Unknown save-key-mode {}; using {}",
                self.save_key_mode,
                SaveKeyMode::default().index()
            );
            SaveKeyMode::default()
        })
    }

    /// Roots for per-game files. Without an explicit `home-dir` the user's
    /// home directory is used as the fallback root.
    pub fn storage_roots(&self) -> StorageRoots {
        StorageRoots {
            state_dir: self.state_dir.clone(),
            battery_dir: self.battery_dir.clone(),
            screenshot_dir: self.screenshot_dir.clone(),
            home_dir: self
                .home_dir
                .clone()
                .or_else(|| std::env::var_os("HOME").map(PathBuf::from)),
        }
    }

    pub fn session_options(&self, title: &str) -> SessionOptions {
        SessionOptions {
            save_key_mode: self.save_key_mode(),
            auto_frame_skip: self.auto_frame_skip,
            frame_skip: self.frame_skip,
            show_speed: self.show_speed.into(),
            fullscreen: self.window_size.is_fullscreen(),
            title: title.to_string(),
        }
    }

    pub fn status_duration(&self) -> Duration {
        Duration::from_millis(self.status_duration_ms)
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("gbahost").join("gbahost.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("gbahost").join("gbahost.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("gbahost")
            .join("gbahost.toml");
    }

    PathBuf::from("gbahost.toml")
}

pub fn try_load(path: &Path) -> Result<HostConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// A missing file yields the defaults quietly; an unreadable or malformed
/// one yields them with a warning.
pub fn load_from_file(path: &Path) -> HostConfig {
    match try_load(path) {
        Ok(cfg) => cfg,
        Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            HostConfig::default()
        }
        Err(e) => {
            warn!("{e}; using defaults");
            HostConfig::default()
        }
    }
}

pub fn save_to_file(path: &Path, cfg: &HostConfig) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(cfg)?;
    let write = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write)?;
    }
    std::fs::write(path, text).map_err(write)
}

use std::io;
use std::path::{Path, PathBuf};

use crate::slot::Slot;

/// Directory created under the home root when no dedicated root is set.
pub const HOME_SUBDIR: &str = ".gbahost";

pub const STATE_EXT: &str = "sgm";
pub const BATTERY_EXT: &str = "sav";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CaptureFormat {
    #[default]
    Png,
    Bmp,
}

impl CaptureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }
}

/// Drop everything up to and including the last `/` or `\`.
pub fn strip_directory(name: &str) -> &str {
    match name.rfind(['/', '\\']) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Drop the extension of the last path component, if it has one.
pub fn strip_extension(name: &str) -> &str {
    let file_start = name.len() - strip_directory(name).len();
    match name[file_start..].rfind('.') {
        Some(dot) => &name[..file_start + dot],
        None => name,
    }
}

/// Build the path of a per-game file.
///
/// A dedicated `root` wins and receives `{file}{suffix}.{ext}` where `file`
/// is `base_name` without its directory. Otherwise the file goes to
/// `{secondary_root}/HOME_SUBDIR/`. With neither configured, the file lands
/// next to `base_name` itself (directory kept).
pub fn resolve(
    root: Option<&Path>,
    secondary_root: Option<&Path>,
    base_name: &str,
    suffix: &str,
    ext: &str,
) -> PathBuf {
    if let Some(root) = root {
        root.join(format!("{}{suffix}.{ext}", strip_directory(base_name)))
    } else if let Some(home) = secondary_root {
        home.join(HOME_SUBDIR)
            .join(format!("{}{suffix}.{ext}", strip_directory(base_name)))
    } else {
        PathBuf::from(format!("{base_name}{suffix}.{ext}"))
    }
}

/// Directories per-game files are written to. Unset entries fall back to
/// `home_dir`, then to the directory of the ROM.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageRoots {
    pub state_dir: Option<PathBuf>,
    pub battery_dir: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
}

/// File naming for one loaded game.
#[derive(Clone, Debug)]
pub struct SlotPaths {
    base_name: String,
    roots: StorageRoots,
}

impl SlotPaths {
    /// `base_name` is used verbatim (no extension stripping).
    pub fn new(base_name: impl Into<String>, roots: StorageRoots) -> Self {
        Self {
            base_name: base_name.into(),
            roots,
        }
    }

    /// Derive the base name from a ROM path by dropping its extension.
    pub fn for_rom(rom: &Path, roots: StorageRoots) -> Self {
        let rom = rom.to_string_lossy();
        Self::new(strip_extension(&rom), roots)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn roots(&self) -> &StorageRoots {
        &self.roots
    }

    /// `{home}/HOME_SUBDIR` when at least one file kind falls back to it.
    pub fn home_subdir(&self) -> Option<PathBuf> {
        let roots = &self.roots;
        let falls_back = roots.state_dir.is_none()
            || roots.battery_dir.is_none()
            || roots.screenshot_dir.is_none();
        match &roots.home_dir {
            Some(home) if falls_back => Some(home.join(HOME_SUBDIR)),
            _ => None,
        }
    }

    /// Create the home fallback directory if files will be written there.
    pub fn create_home_subdir(&self) -> io::Result<()> {
        match self.home_subdir() {
            Some(dir) => std::fs::create_dir_all(dir),
            None => Ok(()),
        }
    }

    /// `<base><N>.sgm`, `N` being the slot's 1-based file number.
    pub fn state(&self, slot: Slot) -> PathBuf {
        resolve(
            self.roots.state_dir.as_deref(),
            self.roots.home_dir.as_deref(),
            &self.base_name,
            &slot.file_number().to_string(),
            STATE_EXT,
        )
    }

    pub fn battery(&self) -> PathBuf {
        resolve(
            self.roots.battery_dir.as_deref(),
            self.roots.home_dir.as_deref(),
            &self.base_name,
            "",
            BATTERY_EXT,
        )
    }

    /// `<base><NN>.png` or `.bmp`.
    pub fn screenshot(&self, index: u32, format: CaptureFormat) -> PathBuf {
        resolve(
            self.roots.screenshot_dir.as_deref(),
            self.roots.home_dir.as_deref(),
            &self.base_name,
            &format!("{index:02}"),
            format.extension(),
        )
    }
}

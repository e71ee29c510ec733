#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gbahost_core::engine::{Engine, Presentation};
use gbahost_core::paths::{CaptureFormat, SlotPaths, StorageRoots};
use gbahost_core::scaler::Raster;
use gbahost_core::store::SnapshotStore;

/// Engine whose whole state is a byte string written verbatim to disk.
#[derive(Default)]
pub struct BlobEngine {
    pub state: Vec<u8>,
    pub battery: Vec<u8>,
    pub resets: u32,
    pub fail_writes: bool,
    frame: Vec<u16>,
}

impl BlobEngine {
    pub fn with_state(state: &[u8]) -> Self {
        Self {
            state: state.to_vec(),
            frame: vec![0; 4],
            ..Self::default()
        }
    }
}

impl Engine for BlobEngine {
    fn reset(&mut self) {
        self.resets += 1;
        self.state.clear();
    }

    fn run_frame(&mut self, _render: bool) {}

    fn frame(&self) -> Raster<'_> {
        Raster::packed(&self.frame, 2, 2).expect("2x2 frame")
    }

    fn write_state(&mut self, path: &Path) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::other("disk full"));
        }
        fs::write(path, &self.state)
    }

    fn read_state(&mut self, path: &Path) -> io::Result<()> {
        self.state = fs::read(path)?;
        Ok(())
    }

    fn write_battery(&mut self, path: &Path) -> io::Result<()> {
        fs::write(path, &self.battery)
    }

    fn read_battery(&mut self, path: &Path) -> io::Result<()> {
        self.battery = fs::read(path)?;
        Ok(())
    }

    fn write_screenshot(&mut self, path: &Path, _format: CaptureFormat) -> io::Result<()> {
        fs::write(path, b"shot")
    }
}

#[derive(Default)]
pub struct RecordingUi {
    pub messages: Vec<String>,
    pub titles: Vec<String>,
    pub draws: u32,
}

impl Presentation for RecordingUi {
    fn draw_screen(&mut self) {
        self.draws += 1;
    }

    fn set_status_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn set_title(&mut self, text: &str) {
        self.titles.push(text.to_string());
    }
}

pub fn store_in(dir: &Path) -> SnapshotStore {
    let roots = StorageRoots {
        state_dir: Some(dir.to_path_buf()),
        battery_dir: Some(dir.to_path_buf()),
        screenshot_dir: Some(dir.to_path_buf()),
        home_dir: None,
    };
    SnapshotStore::new(
        SlotPaths::for_rom(Path::new("roms/game.gba"), roots),
        CaptureFormat::Png,
    )
}

pub fn read(path: PathBuf) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

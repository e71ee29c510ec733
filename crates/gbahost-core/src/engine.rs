use std::io;
use std::path::Path;

use crate::paths::CaptureFormat;
use crate::scaler::Raster;

/// Emulation engine driven by the host.
///
/// Snapshot, battery and screenshot files are opaque to the core: it only
/// picks their paths and moves them around.
pub trait Engine {
    fn reset(&mut self);

    /// Advance one emulated frame. `render` is false for frames the cadence
    /// controller decided to skip.
    fn run_frame(&mut self, render: bool);

    /// Most recently rendered picture.
    fn frame(&self) -> Raster<'_>;

    fn write_state(&mut self, path: &Path) -> io::Result<()>;

    fn read_state(&mut self, path: &Path) -> io::Result<()>;

    fn write_battery(&mut self, path: &Path) -> io::Result<()>;

    fn read_battery(&mut self, path: &Path) -> io::Result<()>;

    fn write_screenshot(&mut self, path: &Path, format: CaptureFormat) -> io::Result<()>;
}

/// Whatever owns the display surface.
pub trait Presentation {
    fn draw_screen(&mut self);

    /// Transient status line; the presentation decides how long it stays up.
    fn set_status_message(&mut self, text: &str);

    fn set_title(&mut self, text: &str);
}

use std::io;
use std::path::Path;

use gbahost_core::engine::Engine;
use gbahost_core::paths::CaptureFormat;
use gbahost_core::scaler::Raster;
use image::{ImageFormat, Rgb, RgbImage};
use log::debug;

pub const LCD_WIDTH: usize = 240;
pub const LCD_HEIGHT: usize = 160;

const STATE_MAGIC: &[u8; 4] = b"GBHS";
const BATTERY_MAGIC: &[u8; 4] = b"GBHB";

/// Stand-in engine that scrolls a colour gradient.
///
/// Its whole machine state is the frame counter, which makes savestates,
/// battery files and screenshots easy to check from the outside.
pub struct PatternEngine {
    pixels: Vec<u16>,
    frame: u64,
    battery_frame: u64,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            pixels: vec![0; LCD_WIDTH * LCD_HEIGHT],
            frame: 0,
            battery_frame: 0,
        };
        engine.redraw();
        engine
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame
    }

    /// Frame counter recorded in the last battery file read or written.
    pub fn battery_frame(&self) -> u64 {
        self.battery_frame
    }

    fn redraw(&mut self) {
        let shift = self.frame as usize;
        for y in 0..LCD_HEIGHT {
            for x in 0..LCD_WIDTH {
                let r = ((x + shift) & 0x1F) as u16;
                let g = ((y + shift / 2) & 0x3F) as u16;
                let b = ((x ^ y) & 0x1F) as u16;
                self.pixels[y * LCD_WIDTH + x] = (r << 11) | (g << 5) | b;
            }
        }
    }

    fn encode(magic: &[u8; 4], frame: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(magic);
        data.extend_from_slice(&frame.to_le_bytes());
        data
    }

    fn decode(magic: &[u8; 4], data: &[u8]) -> io::Result<u64> {
        match data {
            [m0, m1, m2, m3, rest @ ..] if [*m0, *m1, *m2, *m3] == *magic && rest.len() == 8 => {
                let mut counter = [0u8; 8];
                counter.copy_from_slice(rest);
                Ok(u64::from_le_bytes(counter))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a gbahost pattern file",
            )),
        }
    }
}

/// Expand a 5:6:5 pixel to 8 bits per channel.
pub fn rgb565_to_rgb8(px: u16) -> Rgb<u8> {
    let r = ((px >> 11) & 0x1F) as u8;
    let g = ((px >> 5) & 0x3F) as u8;
    let b = (px & 0x1F) as u8;
    Rgb([(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)])
}

impl Engine for PatternEngine {
    fn reset(&mut self) {
        self.frame = 0;
        self.redraw();
    }

    fn run_frame(&mut self, render: bool) {
        self.frame += 1;
        if render {
            self.redraw();
        }
    }

    fn frame(&self) -> Raster<'_> {
        Raster::packed(&self.pixels, LCD_WIDTH, LCD_HEIGHT)
            .unwrap_or_else(|| unreachable!("pattern buffer matches LCD size"))
    }

    fn write_state(&mut self, path: &Path) -> io::Result<()> {
        std::fs::write(path, Self::encode(STATE_MAGIC, self.frame))
    }

    fn read_state(&mut self, path: &Path) -> io::Result<()> {
        let data = std::fs::read(path)?;
        self.frame = Self::decode(STATE_MAGIC, &data)?;
        debug!("pattern state restored at frame {}", self.frame);
        self.redraw();
        Ok(())
    }

    fn write_battery(&mut self, path: &Path) -> io::Result<()> {
        std::fs::write(path, Self::encode(BATTERY_MAGIC, self.frame))?;
        self.battery_frame = self.frame;
        Ok(())
    }

    fn read_battery(&mut self, path: &Path) -> io::Result<()> {
        let data = std::fs::read(path)?;
        self.battery_frame = Self::decode(BATTERY_MAGIC, &data)?;
        Ok(())
    }

    fn write_screenshot(&mut self, path: &Path, format: CaptureFormat) -> io::Result<()> {
        let image = RgbImage::from_fn(LCD_WIDTH as u32, LCD_HEIGHT as u32, |x, y| {
            rgb565_to_rgb8(self.pixels[y as usize * LCD_WIDTH + x as usize])
        });
        let format = match format {
            CaptureFormat::Png => ImageFormat::Png,
            CaptureFormat::Bmp => ImageFormat::Bmp,
        };
        image
            .save_with_format(path, format)
            .map_err(io::Error::other)
    }
}

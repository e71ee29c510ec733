use std::time::{Duration, Instant};

use gbahost_core::engine::Presentation;
use gbahost_core::scaler::{Raster, RasterMut, scale_nearest};
use gbahost_core::status::StatusBoard;
use log::debug;

/// Where the scaled picture lands on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Centre a `buffer_w`x`buffer_h` picture below `top_padding` rows.
///
/// With `integer_scaling` the picture is enlarged by the largest whole factor
/// that fits (at least 1, clipped to the surface); otherwise it is stretched
/// over the whole area.
pub fn layout(
    surface_w: usize,
    surface_h: usize,
    buffer_w: usize,
    buffer_h: usize,
    top_padding: usize,
    integer_scaling: bool,
) -> Viewport {
    let avail_h = surface_h.saturating_sub(top_padding).max(1);
    if !integer_scaling {
        return Viewport {
            x: 0,
            y: top_padding.min(surface_h.saturating_sub(1)),
            width: surface_w,
            height: avail_h.min(surface_h),
        };
    }

    let scale_x = (surface_w / buffer_w.max(1)).max(1);
    let scale_y = (avail_h / buffer_h.max(1)).max(1);
    let scale = scale_x.min(scale_y);

    let scaled_w = buffer_w.saturating_mul(scale).min(surface_w);
    let scaled_h = buffer_h.saturating_mul(scale).min(avail_h);

    Viewport {
        x: (surface_w - scaled_w) / 2,
        y: (top_padding + (avail_h - scaled_h) / 2).min(surface_h.saturating_sub(scaled_h)),
        width: scaled_w,
        height: scaled_h,
    }
}

/// In-memory 16-bit display surface.
///
/// Stands in for a window: it keeps the scaled picture, the title and the
/// status line so headless runs and tests can inspect them.
pub struct Surface {
    pixels: Vec<u16>,
    width: usize,
    height: usize,
    top_padding: usize,
    integer_scaling: bool,
    status: StatusBoard,
    title: String,
    redraw_requested: bool,
    presented: u64,
    last_viewport: Option<Viewport>,
}

impl Surface {
    pub fn new(width: usize, height: usize, status_duration: Duration, status_enabled: bool) -> Self {
        Self {
            pixels: vec![0; width * height],
            width,
            height,
            top_padding: 0,
            integer_scaling: true,
            status: StatusBoard::new(status_duration, status_enabled),
            title: String::new(),
            redraw_requested: false,
            presented: 0,
            last_viewport: None,
        }
    }

    pub fn with_top_padding(mut self, rows: usize) -> Self {
        self.top_padding = rows;
        self
    }

    pub fn with_integer_scaling(mut self, integer_scaling: bool) -> Self {
        self.integer_scaling = integer_scaling;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    pub fn status_line(&mut self, now: Instant) -> Option<&str> {
        self.status.visible(now)
    }

    /// Clears a pending [`Presentation::draw_screen`] request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Clear the surface and blit `frame` into the laid-out viewport.
    pub fn present(&mut self, frame: &Raster<'_>) {
        let viewport = layout(
            self.width,
            self.height,
            frame.width(),
            frame.height(),
            self.top_padding,
            self.integer_scaling,
        );

        let Some(mut target) = RasterMut::packed(&mut self.pixels, self.width, self.height) else {
            return;
        };
        target.fill(0);
        if let Some(mut view) =
            target.sub_rect(viewport.x, viewport.y, viewport.width, viewport.height)
        {
            scale_nearest(frame, &mut view);
        }

        self.presented += 1;
        self.redraw_requested = false;
        self.last_viewport = Some(viewport);
    }
}

impl Presentation for Surface {
    fn draw_screen(&mut self) {
        self.redraw_requested = true;
    }

    fn set_status_message(&mut self, text: &str) {
        self.status.post(text, Instant::now());
    }

    fn set_title(&mut self, text: &str) {
        if self.title != text {
            debug!("title: {text}");
            self.title.clear();
            self.title.push_str(text);
        }
    }
}

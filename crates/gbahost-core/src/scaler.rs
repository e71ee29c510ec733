/// Fractional bits of the fixed-point sampling position.
///
/// The step is rounded up, which keeps `pos >> FRAC_BITS` equal to
/// `floor(i * src / dst)` for every destination dimension below 65536.
const FRAC_BITS: u32 = 32;

fn required_len(width: usize, height: usize, stride: usize) -> usize {
    if width == 0 || height == 0 {
        0
    } else {
        stride * (height - 1) + width
    }
}

/// Read-only view over a 16-bit packed pixel raster.
///
/// `stride` is the distance in pixels between the starts of two rows and may
/// be larger than `width`.
#[derive(Clone, Copy, Debug)]
pub struct Raster<'a> {
    pixels: &'a [u16],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> Raster<'a> {
    /// Returns `None` when the stride is narrower than a row or the slice
    /// does not cover the last row.
    pub fn new(pixels: &'a [u16], width: usize, height: usize, stride: usize) -> Option<Self> {
        if stride < width || pixels.len() < required_len(width, height, stride) {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    /// Tightly packed raster (`stride == width`).
    pub fn packed(pixels: &'a [u16], width: usize, height: usize) -> Option<Self> {
        Self::new(pixels, width, height, width)
    }

    /// Visible window of this raster starting at `(x, y)`.
    pub fn window(&self, x: usize, y: usize, width: usize, height: usize) -> Option<Raster<'a>> {
        if x + width > self.width || y + height > self.height {
            return None;
        }
        let start = y * self.stride + x;
        let end = start + required_len(width, height, self.stride);
        Some(Raster {
            pixels: &self.pixels[start..end],
            width,
            height,
            stride: self.stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [u16] {
        let start = y * self.stride;
        &self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.pixels[y * self.stride + x]
    }
}

/// Mutable view over a 16-bit packed pixel raster.
#[derive(Debug)]
pub struct RasterMut<'a> {
    pixels: &'a mut [u16],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> RasterMut<'a> {
    pub fn new(pixels: &'a mut [u16], width: usize, height: usize, stride: usize) -> Option<Self> {
        if stride < width || pixels.len() < required_len(width, height, stride) {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    pub fn packed(pixels: &'a mut [u16], width: usize, height: usize) -> Option<Self> {
        Self::new(pixels, width, height, width)
    }

    /// Sub-rectangle of this raster; pixels outside it are left untouched by
    /// writes through the returned view.
    pub fn sub_rect(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Option<RasterMut<'_>> {
        if x + width > self.width || y + height > self.height {
            return None;
        }
        let start = y * self.stride + x;
        let end = start + required_len(width, height, self.stride);
        Some(RasterMut {
            pixels: &mut self.pixels[start..end],
            width,
            height,
            stride: self.stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u16] {
        let start = y * self.stride;
        &mut self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.pixels[y * self.stride + x]
    }

    pub fn fill(&mut self, value: u16) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    pub fn as_raster(&self) -> Raster<'_> {
        Raster {
            pixels: &*self.pixels,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}

#[inline]
fn fixed_step(src: usize, dst: usize) -> u64 {
    ((src as u64) << FRAC_BITS).div_ceil(dst as u64)
}

/// Stretch `src` over the whole of `dst` with nearest-neighbor sampling.
///
/// Destination pixel `(x, y)` takes source pixel
/// `(floor(x * src_w / dst_w), floor(y * src_h / dst_h))`. Sampling positions
/// advance by a fixed-point step, so there is no division inside the loop.
/// An empty source or destination leaves `dst` untouched.
pub fn scale_nearest(src: &Raster<'_>, dst: &mut RasterMut<'_>) {
    if src.width == 0 || src.height == 0 || dst.width == 0 || dst.height == 0 {
        return;
    }

    let step_x = fixed_step(src.width, dst.width);
    let step_y = fixed_step(src.height, dst.height);

    let mut pos_y = 0u64;
    for y in 0..dst.height {
        let src_row = src.row((pos_y >> FRAC_BITS) as usize);
        let mut pos_x = 0u64;
        for out in dst.row_mut(y) {
            *out = src_row[(pos_x >> FRAC_BITS) as usize];
            pos_x += step_x;
        }
        pos_y += step_y;
    }
}

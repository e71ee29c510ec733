use gbahost_core::scaler::{Raster, RasterMut, scale_nearest};
use proptest::prelude::*;

/// Handheld LCD dimensions, the usual source raster.
const LCD_W: usize = 240;
const LCD_H: usize = 160;

fn pattern(width: usize, height: usize, stride: usize) -> Vec<u16> {
    let mut px = vec![0xDEADu16; stride * height];
    for y in 0..height {
        for x in 0..width {
            px[y * stride + x] = ((y << 8) | x) as u16;
        }
    }
    px
}

#[test]
fn identity_at_native_size() {
    let src_px = pattern(LCD_W, LCD_H, LCD_W + 2);
    let src = Raster::new(&src_px, LCD_W, LCD_H, LCD_W + 2).unwrap();
    let mut out = vec![0u16; LCD_W * LCD_H];
    let mut dst = RasterMut::packed(&mut out, LCD_W, LCD_H).unwrap();
    scale_nearest(&src, &mut dst);

    for y in 0..LCD_H {
        assert_eq!(&out[y * LCD_W..(y + 1) * LCD_W], src.row(y));
    }
}

#[test]
fn blit_into_centered_sub_rectangle() {
    let src_px = pattern(2, 2, 2);
    let src = Raster::packed(&src_px, 2, 2).unwrap();
    let mut out = vec![0u16; 6 * 4];
    let mut surface = RasterMut::packed(&mut out, 6, 4).unwrap();
    let mut view = surface.sub_rect(1, 0, 4, 4).unwrap();
    scale_nearest(&src, &mut view);

    for y in 0..4 {
        assert_eq!(out[y * 6], 0);
        assert_eq!(out[y * 6 + 5], 0);
    }
    assert_eq!(out[1], src.pixel(0, 0));
    assert_eq!(out[3 * 6 + 4], src.pixel(1, 1));
}

proptest! {
    #[test]
    fn every_pixel_samples_floor_position(
        src_w in 1usize..300,
        src_h in 1usize..200,
        pad in 0usize..4,
        dst_w in 1usize..700,
        dst_h in 1usize..500,
        dst_pad in 0usize..3,
    ) {
        let stride = src_w + pad;
        let src_px = pattern(src_w, src_h, stride);
        let src = Raster::new(&src_px, src_w, src_h, stride).unwrap();

        let dst_stride = dst_w + dst_pad;
        let mut out = vec![0u16; dst_stride * dst_h];
        let mut dst = RasterMut::new(&mut out, dst_w, dst_h, dst_stride).unwrap();
        scale_nearest(&src, &mut dst);

        for y in 0..dst_h {
            let sy = y * src_h / dst_h;
            for x in 0..dst_w {
                let sx = x * src_w / dst_w;
                prop_assert_eq!(dst.pixel(x, y), src.pixel(sx, sy));
            }
        }
    }

    #[test]
    fn windowed_source_maps_relative_to_origin(
        x0 in 0usize..20,
        y0 in 0usize..20,
        w in 1usize..40,
        h in 1usize..40,
        dst_w in 1usize..90,
        dst_h in 1usize..90,
    ) {
        let full_px = pattern(64, 64, 64);
        let full = Raster::packed(&full_px, 64, 64).unwrap();
        let win = full.window(x0, y0, w, h).unwrap();

        let mut out = vec![0u16; dst_w * dst_h];
        let mut dst = RasterMut::packed(&mut out, dst_w, dst_h).unwrap();
        scale_nearest(&win, &mut dst);

        for y in 0..dst_h {
            for x in 0..dst_w {
                let expected = full.pixel(x0 + x * w / dst_w, y0 + y * h / dst_h);
                prop_assert_eq!(dst.pixel(x, y), expected);
            }
        }
    }
}

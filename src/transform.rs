// ============================================================================
// TRANSFORM PRIMITIVES — destructive re-rasters for pan and rotate
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// Translate the buffer by whole pixels.  Content shifted past the canvas
/// edge is lost; the newly exposed area is fully transparent.
pub fn translate(src: &RgbaImage, dx: i32, dy: i32) -> RgbaImage {
    let (w, h) = src.dimensions();
    if dx == 0 && dy == 0 {
        return src.clone();
    }

    let stride = (w as usize) * 4;
    let raw = src.as_raw();
    let mut out = vec![0u8; stride * h as usize];

    out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let sy = y as i64 - dy as i64;
        if sy < 0 || sy >= h as i64 {
            return;
        }
        // Destination x range whose source column (x - dx) is in bounds.
        let x_start = dx.max(0) as i64;
        let x_end = (w as i64 + (dx as i64).min(0)).max(x_start);
        if x_start >= x_end {
            return;
        }
        let count = (x_end - x_start) as usize;
        let src_off = (sy as usize) * stride + ((x_start - dx as i64) as usize) * 4;
        let dst_off = (x_start as usize) * 4;
        row[dst_off..dst_off + count * 4].copy_from_slice(&raw[src_off..src_off + count * 4]);
    });

    RgbaImage::from_raw(w, h, out).expect("translate output buffer matches dimensions")
}

/// Rotate the buffer by `degrees` (positive = counter-clockwise), expanding
/// the canvas so no content is clipped.  Bilinear sampling; area outside the
/// source maps to fully transparent pixels.
pub fn rotate_expand(src: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = src.dimensions();
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();

    let new_w = ((w as f32 * cos.abs() + h as f32 * sin.abs()).round().max(1.0)) as u32;
    let new_h = ((w as f32 * sin.abs() + h as f32 * cos.abs()).round().max(1.0)) as u32;

    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let ncx = new_w as f32 / 2.0;
    let ncy = new_h as f32 / 2.0;

    let stride = (new_w as usize) * 4;
    let mut out = vec![0u8; stride * new_h as usize];

    out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for x in 0..new_w as usize {
            // Inverse-map the destination pixel center into source space.
            let ox = x as f32 + 0.5 - ncx;
            let oy = y as f32 + 0.5 - ncy;
            let sx = ox * cos - oy * sin + cx;
            let sy = ox * sin + oy * cos + cy;
            let pixel = sample_bilinear(src, sx - 0.5, sy - 0.5);
            row[x * 4..x * 4 + 4].copy_from_slice(&pixel);
        }
    });

    RgbaImage::from_raw(new_w, new_h, out).expect("rotate output buffer matches dimensions")
}

/// Bilinear sample at a fractional pixel position; neighbours outside the
/// image contribute transparent black.
fn sample_bilinear(src: &RgbaImage, fx: f32, fy: f32) -> [u8; 4] {
    let x0 = fx.floor() as i64;
    let y0 = fy.floor() as i64;
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let fetch = |x: i64, y: i64| -> [f32; 4] {
        if x < 0 || y < 0 || x >= src.width() as i64 || y >= src.height() as i64 {
            [0.0; 4]
        } else {
            let p = src.get_pixel(x as u32, y as u32).0;
            [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
        }
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut result = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] * (1.0 - tx) + p10[c] * tx;
        let bottom = p01[c] * (1.0 - tx) + p11[c] * tx;
        result[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn translate_shifts_and_exposes_transparency() {
        let mut src = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        src.put_pixel(0, 0, Rgba([99, 99, 99, 255]));

        let out = translate(&src, 2, 1);
        assert_eq!(out.dimensions(), (4, 4));
        // Marker moved from (0,0) to (2,1).
        assert_eq!(out.get_pixel(2, 1).0, [99, 99, 99, 255]);
        // Exposed band is fully transparent.
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(1, 3).0, [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(3, 0).0, [0, 0, 0, 0]);
        // Surviving content is intact.
        assert_eq!(out.get_pixel(3, 3).0, [10, 20, 30, 255]);
    }

    #[test]
    fn translate_negative_offsets() {
        let mut src = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        src.put_pixel(3, 3, Rgba([99, 99, 99, 255]));

        let out = translate(&src, -1, -2);
        assert_eq!(out.get_pixel(2, 1).0, [99, 99, 99, 255]);
        assert_eq!(out.get_pixel(3, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn translate_past_canvas_loses_everything() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let out = translate(&src, 10, 0);
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn rotate_90_swaps_dimensions_and_content() {
        // 2×1 image: A on the left, B on the right.
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([1, 0, 0, 255])); // A
        src.put_pixel(1, 0, Rgba([2, 0, 0, 255])); // B

        let out = rotate_expand(&src, 90.0);
        assert_eq!(out.dimensions(), (1, 2));
        // Counter-clockwise: the right-hand pixel ends up on top.
        assert_eq!(out.get_pixel(0, 0).0, [2, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 1).0, [1, 0, 0, 255]);
    }

    #[test]
    fn rotate_45_expands_canvas_with_transparent_corners() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([50, 50, 50, 255]));
        let out = rotate_expand(&src, 45.0);
        // Expanded to the rotated bounding box (10·cos45 + 10·sin45 ≈ 14).
        assert_eq!(out.dimensions(), (14, 14));
        // Corners fall outside the rotated square.
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert_eq!(out.get_pixel(13, 13).0[3], 0);
        // The center survives.
        assert_eq!(out.get_pixel(7, 7).0[3], 255);
    }

    #[test]
    fn rotate_360_is_identity_sized() {
        let src = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]));
        let out = rotate_expand(&src, 360.0);
        assert_eq!(out.dimensions(), (6, 4));
        assert_eq!(out.get_pixel(3, 2).0, [10, 20, 30, 255]);
    }
}

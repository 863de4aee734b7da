//! Brush engine — rasterizes erase strokes against the alpha channel.
//!
//! A stroke segment clears alpha in a band of width `2 × radius` along the
//! segment plus a filled disc of radius `radius` at the new endpoint, which
//! together form the capsule of all pixels within `radius` of the segment.
//! The RGB channels are left untouched; only transparency changes.

use image::RgbaImage;

/// Erase one segment of an interactive stroke.  `from` and `to` are raster
/// coordinates (already clamped by the coordinate mapper).  Returns `true`
/// when at least one pixel actually changed, so a stroke that only touches
/// already-transparent area produces no journal entry.
pub fn erase_segment(img: &mut RgbaImage, from: (i32, i32), to: (i32, i32), radius: u32) -> bool {
    let radius = radius.max(1) as f32;
    let (w, h) = img.dimensions();

    let (x0, y0) = (from.0 as f32, from.1 as f32);
    let (x1, y1) = (to.0 as f32, to.1 as f32);

    // Bounding box of the capsule, clamped to the image.
    let min_x = (x0.min(x1) - radius).floor().max(0.0) as u32;
    let max_x = ((x0.max(x1) + radius).ceil() as i64).min(w as i64 - 1).max(0) as u32;
    let min_y = (y0.min(y1) - radius).floor().max(0.0) as u32;
    let max_y = ((y0.max(y1) + radius).ceil() as i64).min(h as i64 - 1).max(0) as u32;

    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    let radius_sq = radius * radius;

    let mut changed = false;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32;
            let py = y as f32;

            // Distance from the pixel to the segment (projection clamped to
            // the endpoints, so the band gets round caps).
            let t = if len_sq > 0.0 {
                ((px - x0) * dx + (py - y0) * dy) / len_sq
            } else {
                0.0
            }
            .clamp(0.0, 1.0);
            let cx = x0 + t * dx;
            let cy = y0 + t * dy;
            let dist_sq = (px - cx) * (px - cx) + (py - cy) * (py - cy);

            if dist_sq <= radius_sq {
                let pixel = img.get_pixel_mut(x, y);
                if pixel.0[3] != 0 {
                    pixel.0[3] = 0;
                    changed = true;
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn opaque(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 150, 100, 255]))
    }

    #[test]
    fn horizontal_segment_erases_a_band() {
        let mut img = opaque(300, 300);
        let changed = erase_segment(&mut img, (50, 50), (80, 50), 5);
        assert!(changed);

        // Alpha is gone along the band, RGB untouched.
        for x in 50..=80 {
            let p = img.get_pixel(x, 50);
            assert_eq!(p.0[3], 0);
            assert_eq!(&p.0[..3], &[200, 150, 100]);
        }
        // Band is roughly 2 × radius tall around the stroke line.
        assert_eq!(img.get_pixel(65, 45).0[3], 0);
        assert_eq!(img.get_pixel(65, 55).0[3], 0);
        assert_eq!(img.get_pixel(65, 56).0[3], 255);
        assert_eq!(img.get_pixel(65, 44).0[3], 255);
        // Far away pixels are untouched.
        assert_eq!(img.get_pixel(150, 150).0[3], 255);
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn zero_length_segment_erases_a_disc() {
        let mut img = opaque(40, 40);
        assert!(erase_segment(&mut img, (20, 20), (20, 20), 4));
        assert_eq!(img.get_pixel(20, 20).0[3], 0);
        assert_eq!(img.get_pixel(24, 20).0[3], 0);
        assert_eq!(img.get_pixel(25, 20).0[3], 255);
    }

    #[test]
    fn erasing_transparent_area_reports_no_change() {
        let mut img = opaque(40, 40);
        assert!(erase_segment(&mut img, (10, 10), (20, 10), 3));
        // Second pass over the same area touches nothing new.
        assert!(!erase_segment(&mut img, (10, 10), (20, 10), 3));
    }

    #[test]
    fn segment_near_edge_is_clamped_not_rejected() {
        let mut img = opaque(30, 30);
        assert!(erase_segment(&mut img, (0, 0), (29, 0), 6));
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(29, 5).0[3], 0);
    }
}

//! Image file I/O — decoding, format-preserving encoding and the
//! replace-original archive copy.

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{DynamicImage, ImageError, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// JPEG re-encode quality.  The workflow's files are print intermediates, so
/// a high fixed quality beats configurability here.
const JPEG_QUALITY: u8 = 92;

/// Archival root for the replace-original side channel.  Saved files are
/// mirrored here preserving their FULL/PARTIAL relative path.
pub const ARCHIVE_ROOT: &str = r"\\pixartnas\home\INTERNAL_PROCESSING\ALL_PHOTOS\ORIGNAL";

// ============================================================================
// ERRORS
// ============================================================================

/// Errors that can occur while writing an image back to disk.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Image(ImageError),
    UnsupportedFormat(String),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {}", e),
            SaveError::Image(e) => write!(f, "Image encoding error: {}", e),
            SaveError::UnsupportedFormat(ext) => write!(f, "Unsupported format: .{}", ext),
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<ImageError> for SaveError {
    fn from(e: ImageError) -> Self {
        SaveError::Image(e)
    }
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// The backing file's modification time, if it can be read at all.
pub fn modification_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decode an image file to RGBA together with its current modification time.
pub fn load_image(path: &Path) -> Result<(RgbaImage, Option<SystemTime>), String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?
        .into_rgba8();
    Ok((img, modification_time(path)))
}

/// Encode the raster back to `path` in the format its extension names.
/// JPEG has no alpha channel, so the mask flattens on a JPEG save; the
/// other workflow formats round-trip RGBA.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), SaveError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff") {
        // Reject before File::create truncates the target.
        return Err(SaveError::UnsupportedFormat(ext));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match ext.as_str() {
        "png" => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        "jpg" | "jpeg" => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        "bmp" => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        "tif" | "tiff" => {
            let encoder = TiffEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        _ => unreachable!("extension validated above"),
    }

    Ok(())
}

// ============================================================================
// REPLACE ORIGINAL
// ============================================================================

/// Copy the saved file at `src` into the fixed archival root, preserving its
/// path relative to the input folder (`FULL/...` or `PARTIAL/...`).
pub fn replace_original(src: &Path, input_root: &Path) -> Result<PathBuf, String> {
    mirror_into(src, input_root, Path::new(ARCHIVE_ROOT))
}

/// Mirror `src` under `archive_root`, creating missing directories.
/// Falls back to the bare file name when `src` is not under `input_root`.
pub fn mirror_into(src: &Path, input_root: &Path, archive_root: &Path) -> Result<PathBuf, String> {
    let rel = src
        .strip_prefix(input_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| {
            src.file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("unnamed"))
        });

    let dest = archive_root.join(&rel);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Could not access original folder {}: {}", parent.display(), e))?;
    }
    std::fs::copy(src, &dest)
        .map_err(|e| format!("Failed to replace original at {}: {}", dest.display(), e))?;
    log_info!("Replaced original: {} -> {}", src.display(), dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample(w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        img.put_pixel(0, 0, Rgba([200, 100, 50, 0]));
        img
    }

    #[test]
    fn png_round_trips_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = sample(8, 6);

        save_image(&img, &path).unwrap();
        let (loaded, mtime) = load_image(&path).unwrap();
        assert_eq!(loaded, img);
        assert!(mtime.is_some());
    }

    #[test]
    fn jpeg_save_flattens_but_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        save_image(&sample(8, 6), &path).unwrap();

        let (loaded, _) = load_image(&path).unwrap();
        assert_eq!(loaded.dimensions(), (8, 6));
        assert!(loaded.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webp");
        match save_image(&sample(4, 4), &path) {
            Err(SaveError::UnsupportedFormat(ext)) => assert_eq!(ext, "webp"),
            other => panic!("expected UnsupportedFormat, got {:?}", other.map_err(|e| e.to_string())),
        }
    }

    #[test]
    fn mirror_preserves_full_partial_relative_path() {
        let input = tempfile::tempdir().unwrap();
        let archive = tempfile::tempdir().unwrap();
        let full = input.path().join("FULL");
        std::fs::create_dir(&full).unwrap();
        let src = full.join("photo.png");
        save_image(&sample(4, 4), &src).unwrap();

        let dest = mirror_into(&src, input.path(), archive.path()).unwrap();
        assert_eq!(dest, archive.path().join("FULL").join("photo.png"));
        assert!(dest.is_file());
    }

    #[test]
    fn mirror_outside_root_falls_back_to_file_name() {
        let elsewhere = tempfile::tempdir().unwrap();
        let archive = tempfile::tempdir().unwrap();
        let src = elsewhere.path().join("stray.png");
        save_image(&sample(4, 4), &src).unwrap();

        let dest = mirror_into(&src, Path::new("/nonexistent/root"), archive.path()).unwrap();
        assert_eq!(dest, archive.path().join("stray.png"));
        assert!(dest.is_file());
    }

    #[test]
    fn mirror_missing_source_reports_failure() {
        let archive = tempfile::tempdir().unwrap();
        let err = mirror_into(
            Path::new("/nonexistent/FULL/x.png"),
            Path::new("/nonexistent"),
            archive.path(),
        )
        .unwrap_err();
        assert!(err.contains("Failed to replace original"));
    }
}

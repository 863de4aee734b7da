//! Pair discovery — matches FULL and PARTIAL variants of each photo.
//!
//! The input folder must contain `FULL` and `PARTIAL` subfolders.  Files are
//! paired by filename stem; a stem present in only one side is skipped.
//! Extensions are matched case-insensitively against the fixed set of
//! formats the print workflow uses.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Image extensions accepted by the workflow (compared lowercased).
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// One FULL/PARTIAL pair, matched by stem.
#[derive(Clone, Debug)]
pub struct ImagePair {
    pub stem: String,
    pub full: PathBuf,
    pub partial: PathBuf,
}

/// Scan `input_folder` and return the matched pairs ordered by stem.
///
/// Fails with a user-facing message when either subfolder is missing or
/// unreadable; an empty result (no common stems) is not an error here, the
/// caller decides how to report it.
pub fn list_image_pairs(input_folder: &Path) -> Result<Vec<ImagePair>, String> {
    let full_dir = input_folder.join("FULL");
    let partial_dir = input_folder.join("PARTIAL");

    if !full_dir.is_dir() || !partial_dir.is_dir() {
        return Err("Input folder must contain FULL and PARTIAL subfolders.".to_string());
    }

    let full_files = list_images(&full_dir)?;
    let partial_files = list_images(&partial_dir)?;

    let pairs = full_files
        .into_iter()
        .filter_map(|(stem, full)| {
            partial_files.get(&stem).map(|partial| ImagePair {
                stem: stem.clone(),
                full,
                partial: partial.clone(),
            })
        })
        .collect();
    Ok(pairs)
}

/// Map of stem → path for every image file directly inside `dir`.
/// A BTreeMap keeps the eventual pair order stable and sorted.
fn list_images(dir: &Path) -> Result<BTreeMap<String, PathBuf>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read {}: {}", dir.display(), e))?;

    let mut files = BTreeMap::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !has_image_extension(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            files.insert(stem.to_string_lossy().to_string(), path);
        }
    }
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| IMAGE_EXTS.contains(&ext.to_string_lossy().to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn pairs_matched_by_stem_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("FULL");
        let partial = dir.path().join("PARTIAL");
        fs::create_dir(&full).unwrap();
        fs::create_dir(&partial).unwrap();

        touch(&full.join("b.jpg"));
        touch(&full.join("a.png"));
        touch(&full.join("only_full.jpg"));
        touch(&full.join("notes.txt"));
        touch(&partial.join("a.jpg")); // different extension, same stem
        touch(&partial.join("b.jpg"));
        touch(&partial.join("only_partial.png"));

        let pairs = list_image_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].stem, "a");
        assert_eq!(pairs[1].stem, "b");
        assert_eq!(pairs[0].full, full.join("a.png"));
        assert_eq!(pairs[0].partial, partial.join("a.jpg"));
    }

    #[test]
    fn uppercase_extensions_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("FULL");
        let partial = dir.path().join("PARTIAL");
        fs::create_dir(&full).unwrap();
        fs::create_dir(&partial).unwrap();
        touch(&full.join("photo.JPG"));
        touch(&partial.join("photo.TIFF"));

        let pairs = list_image_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].stem, "photo");
    }

    #[test]
    fn missing_subfolder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("FULL")).unwrap();
        let err = list_image_pairs(dir.path()).unwrap_err();
        assert!(err.contains("FULL and PARTIAL"));
    }

    #[test]
    fn disjoint_folders_yield_no_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("FULL");
        let partial = dir.path().join("PARTIAL");
        fs::create_dir(&full).unwrap();
        fs::create_dir(&partial).unwrap();
        touch(&full.join("x.jpg"));
        touch(&partial.join("y.jpg"));

        assert!(list_image_pairs(dir.path()).unwrap().is_empty());
    }
}

//! Persisted preference: the external editor executable path.
//!
//! Stored as plain text in a fixed file name under the platform config
//! directory, read once at startup and rewritten whenever the user locates
//! the executable.

use std::path::{Path, PathBuf};

/// Editor used when no preference has been saved yet.
pub const DEFAULT_EDITOR: &str = r"C:\Program Files\Adobe\Adobe Photoshop 2025\Photoshop.exe";

const EDITOR_PATH_FILE: &str = "editor_path.txt";

/// Path to the preference file.
/// On Linux:   ~/.config/pairprep/editor_path.txt  (XDG_CONFIG_HOME respected)
/// On Windows: %APPDATA%\PairPrep\editor_path.txt
/// On macOS:   ~/Library/Application Support/PairPrep/editor_path.txt
pub fn editor_path_file() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                PathBuf::from(home).join(".config")
            })
            .join("pairprep");
        let _ = std::fs::create_dir_all(&config_dir);
        return Some(config_dir.join(EDITOR_PATH_FILE));
    }
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()?;
        let config_dir = PathBuf::from(appdata).join("PairPrep");
        let _ = std::fs::create_dir_all(&config_dir);
        return Some(config_dir.join(EDITOR_PATH_FILE));
    }
    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").ok()?;
        let config_dir = PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join("PairPrep");
        let _ = std::fs::create_dir_all(&config_dir);
        return Some(config_dir.join(EDITOR_PATH_FILE));
    }
    #[allow(unreachable_code)]
    None
}

/// Load the saved editor path, falling back to the stock install location.
pub fn load_editor_path() -> PathBuf {
    if let Some(file) = editor_path_file()
        && let Ok(contents) = std::fs::read_to_string(&file)
    {
        let trimmed = contents.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_EDITOR)
}

/// Persist the editor path for future sessions.
pub fn save_editor_path(path: &Path) -> std::io::Result<()> {
    let Some(file) = editor_path_file() else {
        return Err(std::io::Error::other("No config directory available"));
    };
    std::fs::write(file, path.to_string_lossy().as_bytes())
}

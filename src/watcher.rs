//! External editor integration — launches the configured editor on an image
//! and watches the file for the edit coming back.
//!
//! The watch is a fire-and-forget thread that polls the file's modification
//! time once per second and sends the image identity over the channel once a
//! change is observed, then exits.  It holds no image data and touches no
//! session state; the main thread performs the actual reload when it drains
//! the channel.  A notification for an image that is no longer in view is
//! simply ignored there, so the thread is never cancelled.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::io;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the external editor on `image` and start watching the file.
pub fn launch_editor(exe: &Path, image: &Path, notify: Sender<PathBuf>) -> Result<(), String> {
    if !exe.exists() {
        return Err(format!(
            "External editor not found:\n{}\nLocate it first.",
            exe.display()
        ));
    }
    std::process::Command::new(exe)
        .arg(image)
        .spawn()
        .map_err(|e| format!("Failed to launch {}: {}", exe.display(), e))?;
    log_info!("Launched {} on {}", exe.display(), image.display());

    watch_for_change(image.to_path_buf(), notify);
    Ok(())
}

/// Watch `path` until its modification time changes, then notify once.
/// Best-effort: any polling failure ends the watch silently.
pub fn watch_for_change(path: PathBuf, notify: Sender<PathBuf>) {
    std::thread::spawn(move || {
        let Some(initial) = io::modification_time(&path) else {
            log_warn!("File watch not started, {} unreadable", path.display());
            return;
        };
        loop {
            std::thread::sleep(POLL_INTERVAL);
            match io::modification_time(&path) {
                Some(current) if current != initial => {
                    log_info!("File watch: {} changed", path.display());
                    let _ = notify.send(path);
                    return;
                }
                Some(_) => {}
                None => {
                    log_warn!("File watch ended, {} unreadable", path.display());
                    return;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn missing_executable_is_reported() {
        let (tx, _rx) = mpsc::channel();
        let err = launch_editor(
            Path::new("/nonexistent/editor.exe"),
            Path::new("/tmp/x.png"),
            tx,
        )
        .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn watch_notifies_once_on_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("watched.png");
        std::fs::write(&file, b"v1").unwrap();

        let (tx, rx) = mpsc::channel();
        watch_for_change(file.clone(), tx);

        // Rewrite after the watcher has read the initial mtime.  Filesystem
        // timestamps can be coarse, so nudge the mtime explicitly.
        std::thread::sleep(Duration::from_millis(1200));
        std::fs::write(&file, b"v2 -- rather longer contents").unwrap();

        let notified = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(notified, file);
        // The watcher exits after one notification.
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_err());
    }
}

//! Cross-navigation session cache.
//!
//! When the user navigates away from a pair, each session is exported and
//! parked here keyed by its canonical image path; navigating back restores
//! the parked state (raster, view, brush, full undo history) instead of
//! reopening the file from scratch.  An entry is dropped when the backing
//! file is reloaded after an external modification (the cached journal no
//! longer corresponds to the file) and when the user discards unsaved edits
//! on navigation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::session::SessionSnapshot;

#[derive(Default)]
pub struct SessionCache {
    entries: HashMap<PathBuf, SessionSnapshot>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a snapshot under its own identity, replacing any older one.
    pub fn insert(&mut self, snapshot: SessionSnapshot) {
        self.entries.insert(snapshot.identity.clone(), snapshot);
    }

    /// Remove and return the snapshot for `identity`, if any.
    pub fn take(&mut self, identity: &Path) -> Option<SessionSnapshot> {
        self.entries.remove(identity)
    }

    /// Drop the snapshot for `identity` (external reload, discarded edits).
    pub fn remove(&mut self, identity: &Path) {
        if self.entries.remove(identity).is_some() {
            log_info!("Dropped cached session for {}", identity.display());
        }
    }

    pub fn contains(&self, identity: &Path) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Pair navigator — drives the FULL and PARTIAL edit sessions as one unit.
//!
//! Owns the ordered pair list, the two live sessions, the input focus and
//! the session cache.  Navigation runs the save-or-discard-or-cancel
//! protocol: a dirty pair cannot be left silently.  On a completed move both
//! outgoing sessions are parked in the cache under their image identity and
//! the incoming pair is restored from cache when snapshots exist.

use std::path::{Path, PathBuf};

use crate::cache::SessionCache;
use crate::pairs::ImagePair;
use crate::session::EditSession;

/// Which pane currently receives undo/redo/transform/brush commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    Full,
    Partial,
}

/// What the user chose in the unsaved-changes prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveDecision {
    Save,
    Discard,
    Cancel,
}

/// Result of an attempted navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The new pair is loaded and focused.
    Moved,
    /// Unsaved edits exist; the caller must prompt and call
    /// [`PairNavigator::resolve`] with the decision.
    NeedsDecision,
    /// Already at the first pair; nothing happened.
    AtStart,
    /// Advanced past the last pair; the run is complete.
    Finished,
    /// Navigation was cancelled or there was nothing pending.
    Stayed,
}

pub struct PairNavigator {
    root: PathBuf,
    pairs: Vec<ImagePair>,
    index: usize,
    pub full: EditSession,
    pub partial: EditSession,
    pub focus: Pane,
    cache: SessionCache,
    pending_direction: Option<i32>,
    finished: bool,
}

impl PairNavigator {
    /// Open the first pair.  `pairs` must be non-empty.
    pub fn new(root: PathBuf, pairs: Vec<ImagePair>) -> Result<Self, String> {
        let first = pairs
            .first()
            .ok_or_else(|| "No matching image pairs.".to_string())?;
        let full = EditSession::open(&first.full)?;
        let partial = EditSession::open(&first.partial)?;
        Ok(Self {
            root,
            pairs,
            index: 0,
            full,
            partial,
            focus: Pane::Full,
            cache: SessionCache::new(),
            pending_direction: None,
            finished: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn current_stem(&self) -> &str {
        &self.pairs[self.index].stem
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn focused_session_mut(&mut self) -> &mut EditSession {
        match self.focus {
            Pane::Full => &mut self.full,
            Pane::Partial => &mut self.partial,
        }
    }

    /// Try to move by `direction` (+1 next, -1 previous).
    pub fn advance(&mut self, direction: i32) -> Result<AdvanceOutcome, String> {
        if direction < 0 && self.index == 0 {
            return Ok(AdvanceOutcome::AtStart);
        }
        if self.full.is_dirty() || self.partial.is_dirty() {
            self.pending_direction = Some(direction);
            return Ok(AdvanceOutcome::NeedsDecision);
        }
        self.complete(direction, true)
    }

    /// Apply the user's answer to the unsaved-changes prompt.
    pub fn resolve(&mut self, decision: SaveDecision) -> Result<AdvanceOutcome, String> {
        let Some(direction) = self.pending_direction.take() else {
            return Ok(AdvanceOutcome::Stayed);
        };
        match decision {
            SaveDecision::Cancel => Ok(AdvanceOutcome::Stayed),
            SaveDecision::Save => {
                // Both saves must succeed before we move; a failure aborts
                // the navigation with both sessions untouched in memory.
                self.save_both()?;
                self.complete(direction, true)
            }
            SaveDecision::Discard => self.complete(direction, false),
        }
    }

    /// Save both sessions in sequence (also used by the Save button).
    pub fn save_both(&mut self) -> Result<(), String> {
        self.full
            .save()
            .map_err(|e| format!("Failed to save {}:\n{}", self.full.identity().display(), e))?;
        self.partial.save().map_err(|e| {
            format!(
                "Failed to save {}:\n{}",
                self.partial.identity().display(),
                e
            )
        })?;
        Ok(())
    }

    /// Sweep both visible sessions for out-of-band file modifications and
    /// invalidate cache entries for any identity that got reloaded.
    pub fn check_external_changes(&mut self) {
        if self.full.detect_external_change() {
            self.cache.remove(&self.full.identity().to_path_buf());
        }
        if self.partial.detect_external_change() {
            self.cache.remove(&self.partial.identity().to_path_buf());
        }
    }

    /// Handle a file-watch notification.  Keyed by identity: a late
    /// notification for an image no longer in view is ignored.
    pub fn handle_external_notice(&mut self, path: &Path) {
        if self.full.identity() == path || self.partial.identity() == path {
            self.check_external_changes();
        } else {
            log_info!("Ignoring stale file notification for {}", path.display());
        }
    }

    fn complete(&mut self, direction: i32, keep_edits: bool) -> Result<AdvanceOutcome, String> {
        let target = self.index as i64 + direction as i64;
        if target < 0 {
            return Ok(AdvanceOutcome::AtStart);
        }
        if target as usize >= self.pairs.len() {
            self.finished = true;
            return Ok(AdvanceOutcome::Finished);
        }

        // Construct the incoming sessions before touching anything, so a
        // load failure aborts the move with the current pair intact.
        let pair = self.pairs[target as usize].clone();
        let new_full = Self::open_or_restore(&pair.full, &mut self.cache)?;
        let new_partial = Self::open_or_restore(&pair.partial, &mut self.cache)?;

        if keep_edits {
            self.cache.insert(self.full.export());
            self.cache.insert(self.partial.export());
        } else {
            // Discarded edits must not resurface on a revisit.
            self.cache.remove(&self.full.identity().to_path_buf());
            self.cache.remove(&self.partial.identity().to_path_buf());
        }

        self.full = new_full;
        self.partial = new_partial;
        self.index = target as usize;
        self.focus = Pane::Full;
        log_info!(
            "Moved to pair {}/{} ({})",
            self.index + 1,
            self.pairs.len(),
            self.current_stem()
        );
        Ok(AdvanceOutcome::Moved)
    }

    fn open_or_restore(path: &Path, cache: &mut SessionCache) -> Result<EditSession, String> {
        let identity = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(snapshot) = cache.take(&identity) {
            return Ok(EditSession::from_snapshot(snapshot));
        }
        EditSession::open(path)
    }

    #[cfg(test)]
    pub(crate) fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }
}

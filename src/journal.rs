//! Undo/redo journal for a single edit session.
//!
//! The journal is a linear sequence of recorded states with a cursor.  Pixel
//! snapshots are stored sparsely: a view-only action (zoom) records just the
//! view parameters, and the raster for any position is reconstructed by
//! scanning backward to the nearest entry that carries one.  A saved-position
//! watermark tracks whether the session differs from what is on disk.

use image::RgbaImage;

use crate::session::ViewState;

/// One recorded point in the history.
///
/// `raster: None` means "pixels unchanged since the nearest earlier entry
/// that has a snapshot", the sparse-snapshot optimization that keeps
/// view-only actions from duplicating the full pixel buffer.
#[derive(Clone)]
pub struct JournalEntry {
    pub raster: Option<RgbaImage>,
    pub view: ViewState,
}

impl JournalEntry {
    /// Full snapshot entry for a pixel-mutating action.
    pub fn snapshot(raster: RgbaImage, view: ViewState) -> Self {
        Self {
            raster: Some(raster),
            view,
        }
    }

    /// Sparse entry for a view-only action.
    pub fn view_only(view: ViewState) -> Self {
        Self { raster: None, view }
    }
}

/// Linear undo/redo history with a dirty watermark.
///
/// Invariants: the journal always holds at least one entry, entry 0 always
/// carries a raster snapshot, and `0 <= position < entries.len()`.
#[derive(Clone)]
pub struct EditJournal {
    entries: Vec<JournalEntry>,
    position: usize,
    saved_position: usize,
}

impl EditJournal {
    /// Create a journal holding the freshly opened image as its single,
    /// already-saved state.
    pub fn new(initial_raster: RgbaImage) -> Self {
        Self {
            entries: vec![JournalEntry::snapshot(initial_raster, ViewState::default())],
            position: 0,
            saved_position: 0,
        }
    }

    /// Record a new state after the cursor, discarding any redo tail.
    ///
    /// A non-dirtying push (zoom) carries the saved watermark along only when
    /// the journal was clean beforehand, so a view adjustment never clears an
    /// existing dirty state, and never sets one.
    pub fn push(&mut self, entry: JournalEntry, dirtying: bool) {
        let was_clean = self.position == self.saved_position;
        self.entries.truncate(self.position + 1);
        self.entries.push(entry);
        self.position = self.entries.len() - 1;
        if !dirtying && was_clean {
            self.saved_position = self.position;
        }
    }

    /// Step back one state.  Returns the reconstructed raster and the view at
    /// the new position, or `None` at the start of history.
    pub fn undo(&mut self, current: &RgbaImage) -> Option<(RgbaImage, ViewState)> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(self.reconstruct(current))
    }

    /// Step forward one state.  Returns the reconstructed raster and the view
    /// at the new position, or `None` at the end of history.
    pub fn redo(&mut self, current: &RgbaImage) -> Option<(RgbaImage, ViewState)> {
        if self.position + 1 >= self.entries.len() {
            return None;
        }
        self.position += 1;
        Some(self.reconstruct(current))
    }

    /// Move the saved watermark to the cursor (called after a successful save).
    pub fn mark_saved(&mut self) {
        self.saved_position = self.position;
    }

    /// True when the cursor has moved away from the last-saved state.
    pub fn is_dirty(&self) -> bool {
        self.position != self.saved_position
    }

    /// Clear all history and start over from `initial_raster`, clean.
    /// Used when the backing file was replaced by an external editor: the
    /// old history no longer corresponds to anything on disk.
    pub fn reset(&mut self, initial_raster: RgbaImage) {
        self.entries = vec![JournalEntry::snapshot(initial_raster, ViewState::default())];
        self.position = 0;
        self.saved_position = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Rebuild the raster for the current position by scanning backward to
    /// the nearest snapshot, and pair it with the entry's view state.
    ///
    /// The push/reset contracts guarantee entry 0 holds a snapshot, so the
    /// scan always terminates.  If that invariant is ever violated the
    /// journal falls back to a single consistent entry built from the live
    /// raster rather than leaving undefined state.
    fn reconstruct(&mut self, current: &RgbaImage) -> (RgbaImage, ViewState) {
        let view = self.entries[self.position].view;
        for entry in self.entries[..=self.position].iter().rev() {
            if let Some(raster) = &entry.raster {
                return (raster.clone(), view);
            }
        }
        log_err!(
            "journal: no snapshot found scanning back from position {}, resetting",
            self.position
        );
        self.reset(current.clone());
        (current.clone(), ViewState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(fill: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, image::Rgba([fill, fill, fill, 255]))
    }

    fn zoomed(zoom: f32) -> ViewState {
        ViewState {
            zoom,
            ..ViewState::default()
        }
    }

    #[test]
    fn fresh_journal_is_clean_and_terminal() {
        let mut journal = EditJournal::new(raster(0));
        assert!(!journal.is_dirty());
        assert!(!journal.can_undo());
        assert!(!journal.can_redo());
        assert!(journal.undo(&raster(0)).is_none());
        assert!(journal.redo(&raster(0)).is_none());
    }

    #[test]
    fn n_pushes_then_n_undos_returns_to_initial() {
        let initial = raster(0);
        let mut journal = EditJournal::new(initial.clone());
        for i in 1..=3u8 {
            journal.push(
                JournalEntry::snapshot(raster(i * 10), ViewState::default()),
                true,
            );
        }
        let mut live = raster(30);
        for _ in 0..3 {
            let (restored, _) = journal.undo(&live).expect("undo available");
            live = restored;
        }
        assert_eq!(live, initial);
        // Terminal boundary: one more undo is a no-op.
        assert!(journal.undo(&live).is_none());
        assert_eq!(journal.position(), 0);
    }

    #[test]
    fn sparse_entry_reconstructs_from_earlier_snapshot() {
        let mut journal = EditJournal::new(raster(0));
        journal.push(JournalEntry::snapshot(raster(10), ViewState::default()), true);
        journal.push(JournalEntry::view_only(zoomed(2.0)), false);

        // Undo the zoom: raster comes from the stroke snapshot, view from the
        // stroke entry.
        let (restored, view) = journal.undo(&raster(10)).unwrap();
        assert_eq!(restored, raster(10));
        assert_eq!(view.zoom, 1.0);

        // Redo the zoom: raster still the stroke snapshot, zoomed view back.
        let (restored, view) = journal.redo(&raster(10)).unwrap();
        assert_eq!(restored, raster(10));
        assert_eq!(view.zoom, 2.0);
    }

    #[test]
    fn undo_redo_round_trip_is_stable() {
        let mut journal = EditJournal::new(raster(0));
        journal.push(JournalEntry::snapshot(raster(1), ViewState::default()), true);
        journal.push(JournalEntry::view_only(zoomed(1.5)), false);
        journal.push(JournalEntry::snapshot(raster(2), zoomed(1.5)), true);

        let live = raster(2);
        for _ in 0..4 {
            let (a, va) = journal.undo(&live).unwrap();
            let (b, vb) = journal.redo(&live).unwrap();
            assert_eq!(a, raster(1)); // position 2 reconstructs the stroke below the zoom
            assert_eq!(va.zoom, 1.5);
            assert_eq!(b, raster(2));
            assert_eq!(vb.zoom, 1.5);
        }
    }

    #[test]
    fn push_after_undo_truncates_redo_tail() {
        let mut journal = EditJournal::new(raster(0));
        journal.push(JournalEntry::snapshot(raster(1), ViewState::default()), true);
        journal.undo(&raster(1)).unwrap();
        journal.push(JournalEntry::snapshot(raster(2), ViewState::default()), true);

        assert_eq!(journal.len(), 2);
        assert!(journal.redo(&raster(2)).is_none());
    }

    #[test]
    fn dirty_tracks_watermark() {
        let mut journal = EditJournal::new(raster(0));
        journal.push(JournalEntry::snapshot(raster(1), ViewState::default()), true);
        assert!(journal.is_dirty());
        journal.mark_saved();
        assert!(!journal.is_dirty());
        // Undoing below the watermark is dirty again.
        journal.undo(&raster(1)).unwrap();
        assert!(journal.is_dirty());
    }

    #[test]
    fn non_dirtying_push_never_flips_dirty_state() {
        // Clean journal stays clean across a zoom.
        let mut journal = EditJournal::new(raster(0));
        journal.push(JournalEntry::view_only(zoomed(2.0)), false);
        assert!(!journal.is_dirty());

        // Dirty journal stays dirty across a zoom.
        journal.push(JournalEntry::snapshot(raster(1), zoomed(2.0)), true);
        assert!(journal.is_dirty());
        journal.push(JournalEntry::view_only(zoomed(4.0)), false);
        assert!(journal.is_dirty());
    }

    #[test]
    fn reset_collapses_history() {
        let mut journal = EditJournal::new(raster(0));
        for i in 1..=3u8 {
            journal.push(JournalEntry::snapshot(raster(i), ViewState::default()), true);
        }
        journal.reset(raster(42));
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.position(), 0);
        assert!(!journal.is_dirty());
        assert!(journal.undo(&raster(42)).is_none());
    }
}

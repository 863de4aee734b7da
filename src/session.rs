//! Per-image edit session: the raster buffer, view parameters, brush
//! settings and undo/redo journal for one open image, plus reconciliation
//! with edits made to the backing file by an external editor.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::RgbaImage;

use crate::brush;
use crate::io::{self, SaveError};
use crate::journal::{EditJournal, JournalEntry};
use crate::transform;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 8.0;

/// Non-destructive view parameters.
///
/// Rotation is folded destructively into the buffer the moment it is
/// requested (see [`EditSession::rotate_by`]), and pan re-rasters the buffer
/// likewise, so `rotation_degrees` and the pan offsets always read 0 between
/// operations.  They remain part of the coordinate-mapper contract: the
/// renderer applies `(pan_x, pan_y)` after centering the scaled image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub zoom: f32,
    pub pan_x: i32,
    pub pan_y: i32,
    pub rotation_degrees: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0,
            pan_y: 0,
            rotation_degrees: 0.0,
        }
    }
}

/// An immutable deep copy of a session, produced by [`EditSession::export`]
/// and held by the session cache while the pair is off screen.
#[derive(Clone)]
pub struct SessionSnapshot {
    pub identity: PathBuf,
    raster: RgbaImage,
    view: ViewState,
    brush_radius: u32,
    journal: EditJournal,
    last_known_modification_time: Option<SystemTime>,
}

/// One image's live editing state.
pub struct EditSession {
    /// Canonical path of the backing file; doubles as the cache key.
    identity: PathBuf,
    pub raster: RgbaImage,
    pub view: ViewState,
    pub brush_radius: u32,
    journal: EditJournal,
    last_known_modification_time: Option<SystemTime>,
    /// Bumped on every buffer replacement so the renderer knows when to
    /// re-upload its texture.  Not journaled.
    revision: u64,
    drawing: bool,
    stroke_changed: bool,
}

impl EditSession {
    /// Open the image at `path` as a fresh, clean session.
    pub fn open(path: &Path) -> Result<Self, String> {
        let identity = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let (raster, mtime) = io::load_image(&identity)?;
        log_info!(
            "Opened {} ({}x{})",
            identity.display(),
            raster.width(),
            raster.height()
        );
        Ok(Self::from_parts(identity, raster, mtime))
    }

    fn from_parts(identity: PathBuf, raster: RgbaImage, mtime: Option<SystemTime>) -> Self {
        let journal = EditJournal::new(raster.clone());
        Self {
            identity,
            raster,
            view: ViewState::default(),
            brush_radius: 20,
            journal,
            last_known_modification_time: mtime,
            revision: 0,
            drawing: false,
            stroke_changed: false,
        }
    }

    /// Rebuild a session from a cached snapshot (revisiting a pair).
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            identity: snapshot.identity,
            raster: snapshot.raster,
            view: snapshot.view,
            brush_radius: snapshot.brush_radius,
            journal: snapshot.journal,
            last_known_modification_time: snapshot.last_known_modification_time,
            revision: 0,
            drawing: false,
            stroke_changed: false,
        }
    }

    /// Export a deep copy of the full session state for the cache.
    pub fn export(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            raster: self.raster.clone(),
            view: self.view,
            brush_radius: self.brush_radius,
            journal: self.journal.clone(),
            last_known_modification_time: self.last_known_modification_time,
        }
    }

    /// Replace all in-memory state with a cached snapshot.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        let revision = self.revision + 1;
        *self = Self::from_snapshot(snapshot);
        self.revision = revision;
    }

    pub fn identity(&self) -> &Path {
        &self.identity
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.journal.is_dirty()
    }

    pub fn can_undo(&self) -> bool {
        self.journal.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.journal.can_redo()
    }

    // -- Brush strokes ------------------------------------------------------

    /// Pointer down: start a stroke.  Nothing is journaled yet.
    pub fn begin_stroke(&mut self) {
        self.drawing = true;
        self.stroke_changed = false;
    }

    /// Pointer move: erase along one segment of the live stroke.  The buffer
    /// mutates immediately for visual feedback; the journal entry waits for
    /// [`commit_stroke`](Self::commit_stroke).
    pub fn apply_stroke_segment(&mut self, from: (i32, i32), to: (i32, i32)) {
        if !self.drawing {
            return;
        }
        if brush::erase_segment(&mut self.raster, from, to, self.brush_radius) {
            self.stroke_changed = true;
            self.revision += 1;
        }
    }

    /// Pointer up: record the whole stroke as a single undo unit, but only
    /// if it actually changed pixels: a click without movement (or a stroke
    /// over already-transparent area) leaves the journal untouched.
    pub fn commit_stroke(&mut self) {
        if self.drawing && self.stroke_changed {
            self.journal
                .push(JournalEntry::snapshot(self.raster.clone(), self.view), true);
        }
        self.drawing = false;
        self.stroke_changed = false;
    }

    // -- View transforms ----------------------------------------------------

    /// Pan by a screen-space delta.  The displacement is converted to whole
    /// buffer pixels at the current render scale (at least one pixel for a
    /// non-zero request) and the buffer is re-rastered with the
    /// shifted content.  Content pushed past the canvas is lost and the
    /// exposed area is transparent.
    pub fn pan(&mut self, screen_dx: f32, screen_dy: f32, scale: f32) {
        if screen_dx == 0.0 && screen_dy == 0.0 {
            return;
        }
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let step = |d: f32| -> i32 {
            if d == 0.0 {
                return 0;
            }
            let px = (d / scale).round() as i32;
            if px == 0 { d.signum() as i32 } else { px }
        };
        let (dx, dy) = (step(screen_dx), step(screen_dy));
        self.raster = transform::translate(&self.raster, dx, dy);
        self.revision += 1;
        self.journal
            .push(JournalEntry::snapshot(self.raster.clone(), self.view), true);
    }

    /// Multiply the zoom factor, clamped to `[0.1, 8.0]`.  View-only: the
    /// raster is untouched and the session stays clean, but the change is
    /// journaled (sparsely) so undo/redo walks through it.
    pub fn zoom_by(&mut self, factor: f32) {
        if factor == 1.0 {
            return;
        }
        let target = (self.view.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (target - self.view.zoom).abs() < 1e-6 {
            return;
        }
        self.view.zoom = target;
        self.journal.push(JournalEntry::view_only(self.view), false);
    }

    /// Rotate by `degrees` and immediately fold the rotation into the buffer
    /// (destructive re-raster with canvas expansion), resetting pan and
    /// rotation to zero.  Keeping the fold immediate keeps the pan/zoom math
    /// flat at the cost of resample loss on repeated rotation.
    pub fn rotate_by(&mut self, degrees: f32) {
        if degrees == 0.0 {
            return;
        }
        self.view.rotation_degrees += degrees;
        self.raster = transform::rotate_expand(&self.raster, self.view.rotation_degrees);
        self.view.pan_x = 0;
        self.view.pan_y = 0;
        self.view.rotation_degrees = 0.0;
        self.revision += 1;
        self.journal
            .push(JournalEntry::snapshot(self.raster.clone(), self.view), true);
    }

    // -- History ------------------------------------------------------------

    pub fn undo(&mut self) {
        if let Some((raster, view)) = self.journal.undo(&self.raster) {
            self.raster = raster;
            self.view = view;
            self.revision += 1;
        }
    }

    pub fn redo(&mut self) {
        if let Some((raster, view)) = self.journal.redo(&self.raster) {
            self.raster = raster;
            self.view = view;
            self.revision += 1;
        }
    }

    pub fn set_brush_radius(&mut self, radius: i32) {
        self.brush_radius = radius.max(1) as u32;
    }

    // -- Persistence --------------------------------------------------------

    /// Write the raster back to the backing file in its original format and
    /// advance the saved watermark.  On failure nothing in memory changes,
    /// so the user can retry.
    pub fn save(&mut self) -> Result<(), SaveError> {
        io::save_image(&self.raster, &self.identity)?;
        self.journal.mark_saved();
        self.last_known_modification_time = io::modification_time(&self.identity);
        log_info!("Saved {}", self.identity.display());
        Ok(())
    }

    /// Compare the backing file's modification time against the last one we
    /// observed; on mismatch reload the file as a brand-new base image and
    /// reset the journal (external edits invalidate all prior history).
    ///
    /// Returns `true` when a reload happened, so the caller can drop any
    /// stale cached snapshot for this identity.  A failed reload leaves the
    /// previous image visible and only logs.
    pub fn detect_external_change(&mut self) -> bool {
        let Some(current) = io::modification_time(&self.identity) else {
            return false;
        };
        if self.last_known_modification_time == Some(current) {
            return false;
        }
        match io::load_image(&self.identity) {
            Ok((raster, mtime)) => {
                log_info!(
                    "External modification detected, reloading {}",
                    self.identity.display()
                );
                self.raster = raster;
                self.view = ViewState::default();
                self.journal.reset(self.raster.clone());
                self.last_known_modification_time = mtime;
                self.revision += 1;
                self.drawing = false;
                self.stroke_changed = false;
                true
            }
            Err(e) => {
                log_err!("Failed to reload {}: {}", self.identity.display(), e);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn journal_len(&self) -> usize {
        self.journal.len()
    }

    #[cfg(test)]
    pub(crate) fn journal_position(&self) -> usize {
        self.journal.position()
    }
}

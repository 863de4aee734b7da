//! The eframe application: dual panes, toolbar, keyboard shortcuts, modal
//! dialogs and the once-per-second external-change sweep.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use eframe::egui;

use crate::canvas::PaneView;
use crate::navigator::{AdvanceOutcome, Pane, PairNavigator, SaveDecision};
use crate::{io, prefs, watcher};

/// How often the visible sessions are swept for out-of-band file changes.
const EXTERNAL_CHECK_INTERVAL: Duration = Duration::from_secs(1);

pub struct PairPrepApp {
    navigator: PairNavigator,
    full_view: PaneView,
    partial_view: PaneView,

    /// External editor executable (persisted preference).
    editor_path: PathBuf,

    /// File-watch notifications from editor launches.
    watch_sender: Sender<PathBuf>,
    watch_receiver: Receiver<PathBuf>,
    last_external_check: Instant,

    /// True while the unsaved-changes prompt is up (navigation pending).
    show_save_prompt: bool,
    error_message: Option<String>,
    info_message: Option<String>,
}

impl PairPrepApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        navigator: PairNavigator,
        editor_path: PathBuf,
    ) -> Self {
        let (watch_sender, watch_receiver) = mpsc::channel();
        Self {
            navigator,
            // Pane sizes match the print templates the operators mask against.
            full_view: PaneView::new(300.0, 300.0, false),
            partial_view: PaneView::new(613.0, 713.0, true),
            editor_path,
            watch_sender,
            watch_receiver,
            last_external_check: Instant::now(),
            show_save_prompt: false,
            error_message: None,
            info_message: None,
        }
    }

    fn modal_open(&self) -> bool {
        self.show_save_prompt || self.error_message.is_some() || self.info_message.is_some()
    }

    // -- Navigation ---------------------------------------------------------

    fn try_advance(&mut self, direction: i32) {
        let result = self.navigator.advance(direction);
        self.apply_advance(result);
    }

    fn apply_advance(&mut self, result: Result<AdvanceOutcome, String>) {
        match result {
            Ok(AdvanceOutcome::Moved) => {
                self.full_view.reset();
                self.partial_view.reset();
                // Catch anything edited while the pair was off screen.
                self.navigator.check_external_changes();
            }
            Ok(AdvanceOutcome::NeedsDecision) => self.show_save_prompt = true,
            Ok(AdvanceOutcome::AtStart) => {
                self.info_message = Some("You are already at the first image pair.".to_string());
            }
            Ok(AdvanceOutcome::Finished) => {
                log_info!("All pairs processed");
            }
            Ok(AdvanceOutcome::Stayed) => {}
            Err(e) => {
                log_err!("Navigation failed: {}", e);
                self.error_message = Some(e);
            }
        }
    }

    // -- Toolbar actions ----------------------------------------------------

    fn handle_save(&mut self) {
        match self.navigator.save_both() {
            Ok(()) => self.info_message = Some("Images saved successfully!".to_string()),
            Err(e) => {
                log_err!("{}", e);
                self.error_message = Some(e);
            }
        }
    }

    fn handle_replace_original(&mut self) {
        // The file on disk must be current before it is archived.
        if let Err(e) = self.navigator.focused_session_mut().save() {
            self.error_message = Some(format!("Failed to save image before replacing original:\n{}", e));
            return;
        }
        let src = self.navigator.focused_session_mut().identity().to_path_buf();
        let root = self.navigator.root().to_path_buf();
        match io::replace_original(&src, &root) {
            Ok(dest) => self.info_message = Some(format!("Copied to:\n{}", dest.display())),
            Err(e) => {
                log_err!("{}", e);
                self.error_message = Some(e);
            }
        }
    }

    fn handle_open_in_editor(&mut self) {
        let image = self.navigator.focused_session_mut().identity().to_path_buf();
        if let Err(e) = watcher::launch_editor(&self.editor_path, &image, self.watch_sender.clone())
        {
            log_err!("{}", e);
            self.error_message = Some(e);
        }
    }

    fn handle_locate_editor(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Locate External Editor")
            .add_filter("Executable", &["exe"])
            .add_filter("All Files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            match prefs::save_editor_path(&path) {
                Ok(()) => {
                    self.info_message = Some(format!("Editor path saved:\n{}", path.display()));
                    self.editor_path = path;
                }
                Err(e) => self.error_message = Some(format!("Failed to save editor path: {}", e)),
            }
        }
    }

    // -- Keyboard -----------------------------------------------------------

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let ctrl = ctx.input(|i| i.modifiers.command);
        let shift = ctx.input(|i| i.modifiers.shift);

        if ctrl && ctx.input(|i| i.key_pressed(egui::Key::Z)) {
            let session = self.navigator.focused_session_mut();
            if shift {
                session.redo();
            } else {
                session.undo();
            }
        }
        if ctrl && ctx.input(|i| i.key_pressed(egui::Key::Y)) {
            self.navigator.focused_session_mut().redo();
        }

        // Brush size
        if text_typed(ctx, "[") {
            let session = self.navigator.focused_session_mut();
            session.set_brush_radius(session.brush_radius as i32 - 2);
        }
        if text_typed(ctx, "]") {
            let session = self.navigator.focused_session_mut();
            session.set_brush_radius(session.brush_radius as i32 + 2);
        }

        // Zoom / rotate
        if text_typed(ctx, "+") {
            self.navigator.focused_session_mut().zoom_by(1.02);
        }
        if text_typed(ctx, "-") {
            self.navigator.focused_session_mut().zoom_by(0.98);
        }
        if text_typed(ctx, "/") {
            self.navigator.focused_session_mut().rotate_by(-5.0);
        }
        if text_typed(ctx, "*") {
            self.navigator.focused_session_mut().rotate_by(5.0);
        }

        // Pan: arrow keys nudge by 2 screen px at the focused pane's scale.
        let scale = match self.navigator.focus {
            Pane::Full => self.full_view.last_scale(),
            Pane::Partial => self.partial_view.last_scale(),
        };
        for (key, dx, dy) in [
            (egui::Key::ArrowLeft, -2.0, 0.0),
            (egui::Key::ArrowRight, 2.0, 0.0),
            (egui::Key::ArrowUp, 0.0, -2.0),
            (egui::Key::ArrowDown, 0.0, 2.0),
        ] {
            if ctx.input(|i| i.key_pressed(key)) {
                self.navigator.focused_session_mut().pan(dx, dy, scale);
            }
        }

        // Pair navigation
        if ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.try_advance(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Backspace)) {
            self.try_advance(-1);
        }
    }

    // -- UI sections --------------------------------------------------------

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("\u{2190} Prev").clicked() {
                    self.try_advance(-1);
                }
                if ui.button("Undo (Ctrl+Z)").clicked() {
                    self.navigator.focused_session_mut().undo();
                }
                if ui.button("Redo (Ctrl+Shift+Z)").clicked() {
                    self.navigator.focused_session_mut().redo();
                }
                if ui.button("Open in Editor").clicked() {
                    self.handle_open_in_editor();
                }
                if ui.button("Locate Editor").clicked() {
                    self.handle_locate_editor();
                }

                let radius = match self.navigator.focus {
                    Pane::Full => self.navigator.full.brush_radius,
                    Pane::Partial => self.navigator.partial.brush_radius,
                };
                ui.label(format!("Brush: {}", radius));

                if ui.button("Save").clicked() {
                    self.handle_save();
                }
                if ui.button("Replace Original").clicked() {
                    self.handle_replace_original();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Next \u{2192}").clicked() {
                        self.try_advance(1);
                    }
                    ui.label(format!(
                        "{} ({}/{})",
                        self.navigator.current_stem(),
                        self.navigator.index() + 1,
                        self.navigator.pair_count()
                    ));
                });
            });
        });
    }

    fn show_panes(&mut self, ctx: &egui::Context) {
        let full_focused = self.navigator.focus == Pane::Full;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.add_space(20.0);
                let focus_full = self
                    .full_view
                    .show(ui, &mut self.navigator.full, full_focused);
                ui.add_space(40.0);
                let focus_partial =
                    self.partial_view
                        .show(ui, &mut self.navigator.partial, !full_focused);
                if focus_full {
                    self.navigator.focus = Pane::Full;
                }
                if focus_partial {
                    self.navigator.focus = Pane::Partial;
                }
            });
        });
    }

    fn show_unsaved_dialog(&mut self, ctx: &egui::Context) {
        let mut do_save = false;
        let mut do_discard = false;
        let mut do_cancel = false;
        egui::Window::new("Unsaved Changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "\"{}\" has unsaved changes.",
                    self.navigator.current_stem()
                ));
                ui.label("Do you want to save before continuing?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        do_save = true;
                    }
                    if ui.button("Don't Save").clicked() {
                        do_discard = true;
                    }
                    if ui.button("Cancel").clicked() {
                        do_cancel = true;
                    }
                });
            });
        if do_save {
            self.show_save_prompt = false;
            let result = self.navigator.resolve(SaveDecision::Save);
            self.apply_advance(result);
        }
        if do_discard {
            self.show_save_prompt = false;
            let result = self.navigator.resolve(SaveDecision::Discard);
            self.apply_advance(result);
        }
        if do_cancel {
            self.show_save_prompt = false;
            let _ = self.navigator.resolve(SaveDecision::Cancel);
        }
    }

    fn show_message_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.error_message.clone() {
            let mut close = false;
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            if close {
                self.error_message = None;
            }
        }
        if let Some(message) = self.info_message.clone() {
            let mut close = false;
            egui::Window::new("PairPrep")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            if close {
                self.info_message = None;
            }
        }
    }
}

impl eframe::App for PairPrepApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // File-watch notifications from "Open in Editor" launches.
        while let Ok(path) = self.watch_receiver.try_recv() {
            self.navigator.handle_external_notice(&path);
        }
        // Periodic sweep for edits made while the watcher wasn't running.
        if self.last_external_check.elapsed() >= EXTERNAL_CHECK_INTERVAL {
            self.navigator.check_external_changes();
            self.last_external_check = Instant::now();
        }

        if !self.modal_open() {
            self.handle_shortcuts(ctx);
        }

        self.show_toolbar(ctx);
        self.show_panes(ctx);

        if self.show_save_prompt {
            self.show_unsaved_dialog(ctx);
        }
        self.show_message_dialogs(ctx);

        if self.navigator.is_finished() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // Keep the external-change sweep ticking even without input events.
        ctx.request_repaint_after(EXTERNAL_CHECK_INTERVAL);
    }
}

/// True when the frame's input contains the given typed character.
/// Punctuation shortcuts ([, ], +, -, /, *) arrive as text events, not keys.
fn text_typed(ctx: &egui::Context, ch: &str) -> bool {
    ctx.input(|i| {
        i.events
            .iter()
            .any(|e| matches!(e, egui::Event::Text(t) if t == ch))
    })
}

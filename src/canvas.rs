//! Pane rendering and screen↔raster coordinate mapping.
//!
//! Each visible session gets a [`PaneView`]: it uploads the raster to an
//! egui texture when the session's revision changes, lays the image out
//! according to the view state (uniform fit × zoom, centered, panned),
//! draws the print guides and brush cursor, and feeds pointer drags to the
//! session's brush engine through the frame's [`ViewMapping`].

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, Stroke, TextureOptions, Vec2};

use crate::session::{EditSession, ViewState};

/// Guide line color (print-safe band markers).
const GUIDE_COLOR: Color32 = Color32::from_rgb(50, 205, 50);

/// Screen-space → raster-space mapping for one rendered frame.
///
/// Recomputed every frame because the scale depends on the pane geometry;
/// pointer events arriving between frames use the last computed mapping.
#[derive(Clone, Copy, Debug)]
pub struct ViewMapping {
    pub scale: f32,
    pub origin: Pos2,
}

impl ViewMapping {
    /// Map a screen position to raster coordinates, clamped to the buffer.
    /// Out-of-bounds input is clamped, never rejected, so strokes can run
    /// off the edge of the image.
    pub fn to_image(&self, pos: Pos2, width: u32, height: u32) -> (i32, i32) {
        let ix = ((pos.x - self.origin.x) / self.scale).floor() as i32;
        let iy = ((pos.y - self.origin.y) / self.scale).floor() as i32;
        (
            ix.clamp(0, width.saturating_sub(1) as i32),
            iy.clamp(0, height.saturating_sub(1) as i32),
        )
    }
}

/// Compute the frame's mapping and displayed image size for a buffer shown
/// inside `surface`: uniform fit scale × zoom, centered, offset by the view
/// pan.
pub fn compute_mapping(surface: Rect, buf_w: u32, buf_h: u32, view: &ViewState) -> (ViewMapping, Vec2) {
    let base_scale = (surface.width() / buf_w.max(1) as f32)
        .min(surface.height() / buf_h.max(1) as f32);
    let scale = base_scale * view.zoom;
    let display = Vec2::new(
        (buf_w as f32 * scale).max(1.0),
        (buf_h as f32 * scale).max(1.0),
    );
    let origin = Pos2::new(
        surface.min.x + (surface.width() - display.x) / 2.0 + view.pan_x as f32,
        surface.min.y + (surface.height() - display.y) / 2.0 + view.pan_y as f32,
    );
    (ViewMapping { scale, origin }, display)
}

/// Renderer + input handler for one pane.
pub struct PaneView {
    /// Fixed pane size in points (the print layout the operators work to).
    size: Vec2,
    /// PARTIAL panes draw the alternate guide layout.
    is_partial: bool,
    texture: Option<egui::TextureHandle>,
    texture_revision: u64,
    mapping: Option<ViewMapping>,
    last_pointer: Option<Pos2>,
}

impl PaneView {
    pub fn new(width: f32, height: f32, is_partial: bool) -> Self {
        Self {
            size: Vec2::new(width, height),
            is_partial,
            texture: None,
            texture_revision: 0,
            mapping: None,
            last_pointer: None,
        }
    }

    /// Drop cached texture/mapping state (after navigation swaps sessions).
    pub fn reset(&mut self) {
        self.texture = None;
        self.mapping = None;
        self.last_pointer = None;
    }

    /// Scale of the last rendered frame (used to convert pan deltas).
    pub fn last_scale(&self) -> f32 {
        self.mapping.map(|m| m.scale).unwrap_or(1.0)
    }

    /// Render the session into this pane and route pointer input to it.
    /// Returns `true` when the user clicked the pane (focus request).
    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut EditSession, focused: bool) -> bool {
        let (rect, response) = ui.allocate_exact_size(self.size, Sense::click_and_drag());
        let focus_requested = response.clicked() || response.drag_started();

        // -- Pointer input (uses the previous frame's mapping) -----------
        if response.drag_started() {
            session.begin_stroke();
            self.last_pointer = response.interact_pointer_pos();
        }
        if response.dragged()
            && let Some(mapping) = self.mapping
            && let Some(pos) = response.interact_pointer_pos()
        {
            let (w, h) = session.raster.dimensions();
            let from = self
                .last_pointer
                .map(|p| mapping.to_image(p, w, h))
                .unwrap_or_else(|| mapping.to_image(pos, w, h));
            let to = mapping.to_image(pos, w, h);
            session.apply_stroke_segment(from, to);
            self.last_pointer = Some(pos);
        }
        if ui.input(|i| i.pointer.primary_released()) {
            session.commit_stroke();
            self.last_pointer = None;
        }

        // -- Texture upload ----------------------------------------------
        if self.texture.is_none() || self.texture_revision != session.revision() {
            let (w, h) = session.raster.dimensions();
            let color_image = ColorImage::from_rgba_unmultiplied(
                [w as usize, h as usize],
                session.raster.as_raw(),
            );
            let name = if self.is_partial { "pane_partial" } else { "pane_full" };
            self.texture = Some(ui.ctx().load_texture(name, color_image, TextureOptions::LINEAR));
            self.texture_revision = session.revision();
        }

        // -- Layout + paint ----------------------------------------------
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(221));

        let (w, h) = session.raster.dimensions();
        let (mapping, display) = compute_mapping(rect, w, h, &session.view);
        self.mapping = Some(mapping);

        if let Some(texture) = &self.texture {
            let image_rect = Rect::from_min_size(mapping.origin, display);
            let uv = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0));
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }

        self.draw_guides(&painter, rect);

        // Brush cursor: circle at the pointer, brush radius in screen space.
        if let Some(hover) = response.hover_pos() {
            let r = session.brush_radius as f32 * mapping.scale;
            painter.circle_stroke(hover, r, Stroke::new(1.0, Color32::WHITE));
        }

        // Focus frame around the pane.
        let frame_color = if focused {
            Color32::from_rgb(30, 144, 255)
        } else {
            Color32::from_rgb(43, 43, 43)
        };
        ui.painter()
            .rect_stroke(rect.expand(2.0), 0.0, Stroke::new(4.0, frame_color));

        focus_requested
    }

    /// Dashed print guides: two horizontal band markers plus the vertical
    /// center line.  The PARTIAL layout uses the fixed band positions of the
    /// print template; the FULL layout scales its bands with the pane.
    fn draw_guides(&self, painter: &egui::Painter, rect: Rect) {
        let stroke = Stroke::new(1.0, GUIDE_COLOR);
        let (y1, y2) = if self.is_partial {
            (rect.min.y + 76.0, rect.min.y + 210.0)
        } else {
            (
                rect.min.y + rect.height() * 56.0 / 300.0,
                rect.min.y + rect.height() * 272.0 / 300.0,
            )
        };
        for y in [y1, y2] {
            painter.extend(egui::Shape::dashed_line(
                &[Pos2::new(rect.min.x, y), Pos2::new(rect.max.x, y)],
                stroke,
                3.0,
                2.0,
            ));
        }
        let x_mid = rect.center().x;
        painter.extend(egui::Shape::dashed_line(
            &[Pos2::new(x_mid, rect.min.y), Pos2::new(x_mid, rect.max.y)],
            stroke,
            3.0,
            2.0,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(zoom: f32, pan_x: i32, pan_y: i32) -> ViewState {
        ViewState {
            zoom,
            pan_x,
            pan_y,
            rotation_degrees: 0.0,
        }
    }

    #[test]
    fn square_image_fills_square_surface_at_zoom_one() {
        let surface = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(300.0, 300.0));
        let (mapping, display) = compute_mapping(surface, 300, 300, &view(1.0, 0, 0));
        assert_eq!(mapping.scale, 1.0);
        assert_eq!(display, Vec2::new(300.0, 300.0));
        assert_eq!(mapping.origin, Pos2::new(0.0, 0.0));
        assert_eq!(mapping.to_image(Pos2::new(150.0, 10.0), 300, 300), (150, 10));
    }

    #[test]
    fn uniform_fit_uses_the_limiting_axis() {
        // 600×300 buffer in a 300×300 surface: base scale 0.5, centered
        // vertically with 75 px of margin above and below.
        let surface = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(300.0, 300.0));
        let (mapping, display) = compute_mapping(surface, 600, 300, &view(1.0, 0, 0));
        assert_eq!(mapping.scale, 0.5);
        assert_eq!(display, Vec2::new(300.0, 150.0));
        assert_eq!(mapping.origin, Pos2::new(0.0, 75.0));
    }

    #[test]
    fn zoom_and_pan_shift_the_mapping() {
        let surface = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(300.0, 300.0));
        let (mapping, display) = compute_mapping(surface, 300, 300, &view(2.0, 10, -4));
        assert_eq!(mapping.scale, 2.0);
        assert_eq!(display, Vec2::new(600.0, 600.0));
        // Centered: (300 - 600) / 2 = -150, plus the pan offsets.
        assert_eq!(mapping.origin, Pos2::new(-140.0, -154.0));
    }

    #[test]
    fn out_of_bounds_points_clamp_to_the_buffer() {
        let mapping = ViewMapping {
            scale: 1.0,
            origin: Pos2::new(0.0, 0.0),
        };
        assert_eq!(mapping.to_image(Pos2::new(-50.0, -50.0), 100, 80), (0, 0));
        assert_eq!(mapping.to_image(Pos2::new(500.0, 500.0), 100, 80), (99, 79));
    }

    #[test]
    fn surface_offset_is_respected() {
        let surface = Rect::from_min_size(Pos2::new(40.0, 20.0), Vec2::new(100.0, 100.0));
        let (mapping, _) = compute_mapping(surface, 100, 100, &view(1.0, 0, 0));
        assert_eq!(mapping.to_image(Pos2::new(40.0, 20.0), 100, 100), (0, 0));
        assert_eq!(mapping.to_image(Pos2::new(139.0, 119.0), 100, 100), (99, 99));
    }
}

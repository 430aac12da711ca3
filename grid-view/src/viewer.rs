//! Interactive layered-grid viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`SimulationSession`] and
//! implements [`eframe::App`] to render it and route pointer and keyboard
//! input into camera and navigation calls.

use eframe::App;
use glam::{Vec2, Vec3};
use grid_core::{
    catalog::ContentUnit,
    config::{Config, TransitionStyle},
    sampler::sample_cell,
    session::{FrameStatus, SimulationSession},
    types::OwnerId,
};
use tracing::debug;

/// Animated style offered by the top-panel toggle when the config has none.
const DEFAULT_ANIMATION: TransitionStyle = TransitionStyle::Animated {
    duration: 1.2,
    swap_ratio: 0.45,
};

/// Captured frame of a running transition, uploaded once per transition.
struct OverlayImage {
    /// Start time of the transition the texture belongs to.
    start: f64,
    texture: egui::TextureHandle,
    /// Where the captured grid sat on screen when it was captured.
    grid_rect: egui::Rect,
}

/// Main application state for the interactive viewer.
///
/// The per-frame update is:
/// 1. Size the session to the central panel and build the root layer once.
/// 2. Handle pointer and keyboard input.
/// 3. Tick the session, then draw the live layer and any transition overlay.
///
/// ### Fields
/// - `session` - All simulation, camera and navigation state.
/// - `status` - Snapshot returned by the last tick.
/// - `selected` - Owner picked with a click, shown in the side panel.
/// - `hovered` - Title of the unit under the pointer.
/// - `overlay` - Texture of the captured frame while a transition runs.
/// - `animation` - Animated style restored by the toggle.
pub struct Viewer {
    session: SimulationSession,
    status: FrameStatus,
    selected: Option<OwnerId>,
    hovered: Option<String>,
    overlay: Option<OverlayImage>,
    animation: TransitionStyle,
}

fn to_glam(v: egui::Vec2) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Screen position relative to the top left of `rect`.
fn to_local(p: egui::Pos2, rect: egui::Rect) -> Vec2 {
    Vec2::new(p.x - rect.min.x, p.y - rect.min.y)
}

fn to_screen(p: Vec2, rect: egui::Rect) -> egui::Pos2 {
    rect.min + egui::vec2(p.x, p.y)
}

fn color32(c: Vec3, alpha: f32) -> egui::Color32 {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(byte(c.x), byte(c.y), byte(c.z), byte(alpha))
}

fn scale_about(r: egui::Rect, center: egui::Pos2, s: f32) -> egui::Rect {
    egui::Rect::from_min_max(center + (r.min - center) * s, center + (r.max - center) * s)
}

/// On-screen rectangle covered by the current layer's grid.
fn grid_rect(session: &SimulationSession, rect: egui::Rect) -> Option<egui::Rect> {
    let engine = &session.layer()?.engine;
    let size = Vec2::new(engine.width() as f32, engine.height() as f32);
    Some(egui::Rect::from_min_max(
        to_screen(session.camera.cell_to_screen(Vec2::ZERO), rect),
        to_screen(session.camera.cell_to_screen(size), rect),
    ))
}

impl Viewer {
    /// Creates a viewer around a session that has no layer yet.
    ///
    /// The root layer is built on the first frame, once the size of the
    /// drawing area is known.
    pub fn new(config: Config, catalog: Vec<ContentUnit>, date_seed: u32) -> Self {
        let animation = match config.navigation.transition {
            style @ TransitionStyle::Animated { .. } => style,
            TransitionStyle::Instant => DEFAULT_ANIMATION,
        };
        Self {
            session: SimulationSession::new(config, catalog, date_seed, Vec2::ZERO),
            status: FrameStatus::default(),
            selected: None,
            hovered: None,
            overlay: None,
            animation,
        }
    }

    /// Stores a tick result; a new layer invalidates the selection.
    fn apply_status(&mut self, status: FrameStatus) {
        if status.layer != self.status.layer {
            self.selected = None;
        }
        self.status = status;
    }

    fn selected_unit(&self) -> Option<&ContentUnit> {
        self.session.layer()?.unit(self.selected?)
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32<T: egui::emath::Numeric>(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut T,
        range: std::ops::RangeInclusive<T>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, navigation).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let running = self.session.running;
                if ui
                    .button(if running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.session.running = !running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.session.config.engine.generation_interval)
                        .prefix("interval = ")
                        .suffix(" s")
                        .range(0.05..=5.0)
                        .speed(0.01),
                );

                if ui
                    .add_enabled(!self.status.transitioning, egui::Button::new("Step"))
                    .clicked()
                {
                    self.session.advance_generation(now);
                }

                ui.separator();

                // Refusals are surfaced as session notices.
                if ui.button("Enter child").clicked() {
                    let centre = self.session.camera.viewport * 0.5;
                    let _ = self.session.enter_child(centre, now);
                }
                if ui.button("Enter parent").clicked() {
                    let _ = self.session.enter_parent(now);
                }
                if self.status.transitioning && ui.button("Cancel").clicked() {
                    self.session.cancel_transition();
                }

                ui.separator();

                let nav = &mut self.session.config.navigation;
                let mut animated = matches!(nav.transition, TransitionStyle::Animated { .. });
                if ui.checkbox(&mut animated, "Animated").changed() {
                    nav.transition = if animated {
                        self.animation
                    } else {
                        TransitionStyle::Instant
                    };
                }
            });
        });
    }

    /// Builds the bottom status bar (layer, generation, population, notices).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(id) = self.status.layer {
                    ui.label(format!("layer {}#{}", id.slot, id.cycle));
                }
                ui.label(format!("depth = {}", self.status.depth));
                ui.label(format!("gen = {}", self.status.generation));
                ui.label(format!("progress = {:.2}", self.status.progress));
                ui.separator();
                ui.label(format!("alive = {}", self.status.alive));
                ui.label(format!("owners = {}", self.status.owners));
                if let Some(title) = &self.hovered {
                    ui.separator();
                    ui.label(title);
                }
                if let Some(message) = self.session.notice(now) {
                    ui.separator();
                    ui.colored_label(egui::Color32::YELLOW, message);
                }
            });
        });
    }

    /// Builds the right-hand panel: selected unit and render tuning.
    fn ui_unit_panel(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        egui::SidePanel::right("unit_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Unit");
                ui.separator();

                match self.selected_unit().cloned() {
                    Some(unit) => {
                        ui.strong(&unit.title);
                        if !unit.summary.is_empty() {
                            ui.label(&unit.summary);
                        }
                        ui.label(format!("scene: {}", unit.scene));
                        if !unit.mechanisms.is_empty() {
                            ui.label(format!("mechanisms: {}", unit.mechanisms.join(", ")));
                        }
                        if ui.button("Focus").clicked()
                            && let Some(owner) = self.selected
                            && !self.session.focus_owner(owner)
                        {
                            self.session
                                .notify(format!("{} has no live cells", unit.title), now);
                        }
                    }
                    None => {
                        ui.label("Click a cluster to inspect it.");
                    }
                }

                ui.separator();
                ui.collapsing("Tuning", |ui| {
                    let cfg = &mut self.session.config;
                    Self::labeled_drag_f32(
                        ui,
                        "breathing_depth:",
                        &mut cfg.render.breathing_depth,
                        0.0..=1.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "breathing_speed:",
                        &mut cfg.render.breathing_speed,
                        0.0..=10.0,
                        0.05,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "background_alpha:",
                        &mut cfg.render.background_alpha,
                        0.0..=1.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "revive_probability:",
                        &mut cfg.disturbance.revive_probability,
                        0.0..=1.0,
                        0.01,
                    );
                    ui.label("Seeding applies to the next layer.");
                    Self::labeled_drag_f32(
                        ui,
                        "base_density:",
                        &mut cfg.seeding.base_density,
                        0.0..=0.5,
                        0.001,
                    );

                    if ui.button("Reset tuning").clicked() {
                        let transition = cfg.navigation.transition;
                        *cfg = Config::default();
                        cfg.navigation.transition = transition;
                    }
                });
            });
    }

    /// Pan, zoom, double-click to enter a child layer, click to select.
    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, now: f64) {
        let rect = response.rect;

        if response.dragged() {
            self.session.pan(to_glam(response.drag_delta()));
        }

        let hover = response.hover_pos().map(|p| to_local(p, rect));
        self.hovered = hover
            .and_then(|p| self.session.owner_at(p, now))
            .map(|(_, unit)| unit.title.clone());

        if let Some(p) = response.interact_pointer_pos().map(|p| to_local(p, rect)) {
            if response.double_clicked() {
                // Refusals are surfaced as session notices.
                let _ = self.session.enter_child(p, now);
            } else if response.clicked() {
                self.selected = self.session.owner_at(p, now).map(|(owner, _)| owner);
            }
        }

        if !response.hovered() {
            return;
        }
        let (scroll, pinch) = ctx.input(|i| (i.raw_scroll_delta.y, i.zoom_delta()));
        if scroll != 0.0 || pinch != 1.0 {
            let anchor = hover.unwrap_or(self.session.camera.viewport * 0.5);
            let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0) * pinch;
            if let Ok(Some(direction)) = self.session.zoom_at(anchor, factor, now) {
                debug!(?direction, "zoom crossed a layer threshold");
            }
        }
    }

    /// Keyboard shortcuts, ignored while a text field has focus.
    fn handle_keys(&mut self, ctx: &egui::Context, response: &egui::Response, now: f64) {
        if ctx.wants_keyboard_input() {
            return;
        }
        use egui::Key;
        let (child, parent, toggle, step, cancel) = ctx.input(|i| {
            (
                i.key_pressed(Key::Enter) || i.key_pressed(Key::Plus),
                i.key_pressed(Key::Backspace) || i.key_pressed(Key::Minus),
                i.key_pressed(Key::Space),
                i.key_pressed(Key::S),
                i.key_pressed(Key::Escape),
            )
        });

        // Refusals are surfaced as session notices.
        if child {
            let anchor = response
                .hover_pos()
                .map(|p| to_local(p, response.rect))
                .unwrap_or(self.session.camera.viewport * 0.5);
            let _ = self.session.enter_child(anchor, now);
        }
        if parent {
            let _ = self.session.enter_parent(now);
        }
        if toggle {
            self.session.running = !self.session.running;
        }
        if step && !self.status.transitioning {
            self.session.advance_generation(now);
        }
        if cancel && !self.session.cancel_transition() {
            self.selected = None;
        }
    }

    /// Uploads the captured frame of a newly started transition.
    fn sync_overlay(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let Some(t) = self.session.transition() else {
            self.overlay = None;
            return;
        };
        if self.overlay.as_ref().is_some_and(|o| o.start == t.start) {
            return;
        }
        let frame = &t.captured_frame;
        let image =
            egui::ColorImage::from_rgba_unmultiplied([frame.width, frame.height], &frame.rgba);
        let texture = ctx.load_texture("transition-capture", image, egui::TextureOptions::NEAREST);
        self.overlay = Some(OverlayImage {
            start: t.start,
            texture,
            grid_rect: grid_rect(&self.session, rect).unwrap_or(rect),
        });
    }

    /// Draws the visible cells of the live layer over its tint.
    fn draw_layer(&self, painter: &egui::Painter, rect: egui::Rect, now: f64) {
        let Some(layer) = self.session.layer() else {
            return;
        };
        painter.rect_filled(rect, 0.0, color32(layer.tint, 1.0));

        let camera = &self.session.camera;
        let progress = self.session.progress(now);
        let render = &self.session.config.render;
        let (xs, ys) = camera.visible_cells(layer.engine.width(), layer.engine.height());
        let px = camera.cell_px();
        let size = if px > 6.0 { px - 1.0 } else { px };

        for y in ys {
            for x in xs.clone() {
                let s = sample_cell(layer, x, y, progress, now, render);
                let min = to_screen(camera.cell_to_screen(Vec2::new(x as f32, y as f32)), rect);
                let cell = egui::Rect::from_min_size(min, egui::vec2(size, size));
                painter.rect_filled(cell, 0.0, color32(s.color, s.alpha));
            }
        }

        if let Some(owner) = self.selected
            && let Some(c) = layer.centroids.get(owner)
        {
            let centre = to_screen(camera.cell_to_screen(c.pos + Vec2::splat(0.5)), rect);
            let radius = (px * (c.count as f32).sqrt() * 0.6).max(8.0);
            painter.circle_stroke(centre, radius, egui::Stroke::new(1.5, egui::Color32::WHITE));
        }
    }

    /// Draws the captured frame of a running transition on top.
    fn draw_overlay(&self, painter: &egui::Painter, rect: egui::Rect, now: f64) {
        let (Some(t), Some(image)) = (self.session.transition(), self.overlay.as_ref()) else {
            return;
        };
        let Some(o) = t.overlay(now) else {
            return;
        };
        let target = scale_about(image.grid_rect, rect.center(), o.scale);
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(
            image.texture.id(),
            target,
            uv,
            egui::Color32::WHITE.gamma_multiply(o.alpha),
        );
    }

    /// Builds the central panel where the layer is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let response =
                    ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                let now = ctx.input(|i| i.time);

                self.session.set_viewport(to_glam(rect.size()));
                self.session.start(now);

                self.handle_pointer(ctx, &response, now);
                self.handle_keys(ctx, &response, now);
                self.sync_overlay(ctx, rect);

                let status = self.session.tick(now);
                self.apply_status(status);

                let painter = ui.painter_at(rect);
                self.draw_layer(&painter, rect, now);
                self.draw_overlay(&painter, rect, now);

                // Cells interpolate continuously, so every frame differs.
                ctx.request_repaint();
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_unit_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::sample_catalog;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(20.0, 40.0), egui::vec2(400.0, 300.0))
    }

    fn started_viewer() -> Viewer {
        let mut viewer = Viewer::new(Config::default(), sample_catalog(), 20261016);
        viewer.session.set_viewport(to_glam(test_rect().size()));
        viewer.session.start(0.0);
        viewer
    }

    #[test]
    fn local_and_screen_positions_roundtrip() {
        let rect = test_rect();
        let p = egui::pos2(123.5, 77.25);
        assert_eq!(to_screen(to_local(p, rect), rect), p);
        assert_eq!(to_local(rect.min, rect), Vec2::ZERO);
    }

    #[test]
    fn scale_about_keeps_centre_fixed() {
        let r = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 50.0));
        let scaled = scale_about(r, r.center(), 2.0);
        assert_eq!(scaled.center(), r.center());
        assert_eq!(scaled.size(), egui::vec2(200.0, 100.0));
    }

    #[test]
    fn color32_clamps_channels() {
        let c = color32(Vec3::new(2.0, -1.0, 1.0), 1.0);
        assert_eq!(c, egui::Color32::from_rgb(255, 0, 255));
    }

    #[test]
    fn new_viewer_has_no_layer_until_started() {
        let viewer = Viewer::new(Config::default(), sample_catalog(), 20261016);
        assert!(viewer.session.layer().is_none());
        assert_eq!(viewer.status, FrameStatus::default());
        assert_eq!(viewer.animation, DEFAULT_ANIMATION);
    }

    #[test]
    fn grid_fills_the_drawing_area_at_default_zoom() {
        let viewer = started_viewer();
        let rect = test_rect();
        let grid = grid_rect(&viewer.session, rect).unwrap();
        assert_eq!(grid, rect);
    }

    #[test]
    fn layer_change_clears_selection() {
        let mut viewer = started_viewer();
        let status = viewer.session.tick(0.0);
        viewer.apply_status(status);
        viewer.selected = Some(0);

        // Same layer keeps the selection.
        let status = viewer.session.tick(0.1);
        viewer.apply_status(status);
        assert_eq!(viewer.selected, Some(0));

        let centre = viewer.session.camera.viewport * 0.5;
        viewer.session.enter_child(centre, 0.2).unwrap();
        let status = viewer.session.tick(0.2);
        viewer.apply_status(status);
        assert_eq!(viewer.selected, None);
        assert_eq!(status.depth, 1);
    }

    #[test]
    fn selected_unit_resolves_through_layer() {
        let mut viewer = started_viewer();
        viewer.selected = Some(0);
        let expected = viewer.session.layer().unwrap().units[0].title.clone();
        assert_eq!(viewer.selected_unit().map(|u| u.title.clone()), Some(expected));
        viewer.selected = Some(10_000);
        assert!(viewer.selected_unit().is_none());
    }
}

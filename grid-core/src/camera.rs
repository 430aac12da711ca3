use crate::types::CellCoord;
use glam::Vec2;
use std::ops::Range;

/// Viewport-local mapping between screen pixels and grid cells.
///
/// Screen coordinates have their origin at the top left of the drawing area;
/// cell coordinates are continuous, with cell `(x, y)` covering
/// `[x, x + 1) × [y, y + 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Cell-space point shown at the viewport centre.
    pub center: Vec2,
    /// Multiplier on `base_cell_px`.
    pub zoom: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
    /// Cell size in pixels at zoom 1.0.
    pub base_cell_px: f32,
}

impl Camera {
    const ZOOM_LIMITS: (f32, f32) = (0.05, 64.0);

    /// Default view: zoom 1.0, centred on a grid of `grid` cells.
    pub fn new(viewport: Vec2, base_cell_px: f32, grid: (usize, usize)) -> Self {
        Self {
            center: Vec2::new(grid.0 as f32, grid.1 as f32) * 0.5,
            zoom: 1.0,
            viewport,
            base_cell_px,
        }
    }

    /// Rendered size of one cell in pixels.
    pub fn cell_px(&self) -> f32 {
        self.base_cell_px * self.zoom
    }

    /// Converts a cell-space position to viewport-local screen space.
    pub fn cell_to_screen(&self, p: Vec2) -> Vec2 {
        self.viewport * 0.5 + (p - self.center) * self.cell_px()
    }

    /// Converts a viewport-local screen position back to cell space.
    ///
    /// This is the inverse of [`Camera::cell_to_screen`] (up to floating
    /// point rounding).
    pub fn screen_to_cell(&self, p: Vec2) -> Vec2 {
        self.center + (p - self.viewport * 0.5) / self.cell_px()
    }

    /// Integer cell under a screen position, if inside a `width × height` grid.
    pub fn cell_at(&self, p: Vec2, width: usize, height: usize) -> Option<CellCoord> {
        let c = self.screen_to_cell(p).floor();
        if c.x < 0.0 || c.y < 0.0 {
            return None;
        }
        let (x, y) = (c.x as usize, c.y as usize);
        (x < width && y < height).then_some((x, y))
    }

    /// Moves the view by a screen-space drag delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.center -= delta / self.cell_px();
    }

    /// Multiplies the zoom by `factor` while keeping `anchor` fixed on screen.
    pub fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        let before = self.screen_to_cell(anchor);
        self.zoom = (self.zoom * factor).clamp(Self::ZOOM_LIMITS.0, Self::ZOOM_LIMITS.1);
        self.center = before - (anchor - self.viewport * 0.5) / self.cell_px();
    }

    /// Centres the view on a cell-space position.
    pub fn center_on(&mut self, p: Vec2) {
        self.center = p;
    }

    /// Ranges of cells at least partly visible, clipped to the grid.
    pub fn visible_cells(&self, width: usize, height: usize) -> (Range<usize>, Range<usize>) {
        let min = self.screen_to_cell(Vec2::ZERO).floor().max(Vec2::ZERO);
        let max = self.screen_to_cell(self.viewport).ceil().max(Vec2::ZERO);
        let xs = (min.x as usize).min(width)..(max.x as usize).min(width);
        let ys = (min.y as usize).min(height)..(max.y as usize).min(height);
        (xs, ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(Vec2::new(800.0, 600.0), 10.0, (80, 60))
    }

    #[test]
    fn default_view_shows_whole_grid() {
        let cam = camera();
        assert_eq!(cam.cell_to_screen(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(cam.cell_to_screen(Vec2::new(80.0, 60.0)), Vec2::new(800.0, 600.0));
        assert_eq!(cam.visible_cells(80, 60), (0..80, 0..60));
    }

    #[test]
    fn cell_to_screen_and_back_is_roundtrip() {
        let mut cam = camera();
        cam.zoom = 2.5;
        cam.center = Vec2::new(12.25, 40.0);
        let eps = 1e-3;
        for p in [Vec2::ZERO, Vec2::new(10.0, -5.0), Vec2::new(63.5, 8.25)] {
            let back = cam.screen_to_cell(cam.cell_to_screen(p));
            assert!((back - p).length() < eps, "p={p:?}, back={back:?}");
        }
    }

    #[test]
    fn cell_at_rejects_outside_points() {
        let cam = camera();
        assert_eq!(cam.cell_at(Vec2::new(5.0, 5.0), 80, 60), Some((0, 0)));
        assert_eq!(cam.cell_at(Vec2::new(799.0, 599.0), 80, 60), Some((79, 59)));
        assert_eq!(cam.cell_at(Vec2::new(-1.0, 5.0), 80, 60), None);
        assert_eq!(cam.cell_at(Vec2::new(805.0, 5.0), 80, 60), None);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut cam = camera();
        let anchor = Vec2::new(200.0, 150.0);
        let before = cam.screen_to_cell(anchor);
        cam.zoom_about(anchor, 3.0);
        let after = cam.screen_to_cell(anchor);
        assert!((before - after).length() < 1e-4);
        assert_eq!(cam.zoom, 3.0);
        assert_eq!(cam.cell_px(), 30.0);
    }

    #[test]
    fn pan_moves_content_with_pointer() {
        let mut cam = camera();
        let p = Vec2::new(10.0, 10.0);
        let before = cam.cell_to_screen(p);
        cam.pan_by(Vec2::new(30.0, -20.0));
        assert_eq!(cam.cell_to_screen(p), before + Vec2::new(30.0, -20.0));
    }

    #[test]
    fn visible_cells_shrink_when_zoomed_in() {
        let mut cam = camera();
        cam.zoom = 4.0;
        let (xs, ys) = cam.visible_cells(80, 60);
        assert_eq!(xs, 30..50);
        assert_eq!(ys, 22..38);
    }
}

//! Per-cell colour and opacity for the renderer.
//!
//! Everything here is read-only over a [`Layer`]; sampling never mutates
//! simulation state.

use crate::{
    catalog::ContentUnit,
    config::RenderConfig,
    layer::{Layer, LayerId},
    seeder::splitmix64,
    types::OwnerId,
};
use glam::Vec3;

/// Colour assigned to each owner of a layer, RGB in `[0, 1]`.
#[derive(Clone, Debug, Default)]
pub struct Palette {
    colors: Vec<Vec3>,
}

impl Palette {
    pub fn for_units(units: &[ContentUnit]) -> Self {
        Self {
            colors: units.iter().map(|u| unit_color(&u.id)).collect(),
        }
    }

    pub fn get(&self, owner: OwnerId) -> Option<Vec3> {
        self.colors.get(owner).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Stable colour of a content unit, derived from its id.
pub fn unit_color(id: &str) -> Vec3 {
    let h = fnv1a(id);
    let hue = (h % 3600) as f32 / 3600.0;
    let sat = 0.55 + ((h >> 16) % 100) as f32 / 500.0;
    hsl_to_rgb(hue, sat, 0.58)
}

/// Dim colour for cells without a resolvable owner.
///
/// Keyed on the layer and the coordinates only, so unclaimed areas keep the
/// same texture from frame to frame.
pub fn hash_color(layer: LayerId, x: usize, y: usize) -> Vec3 {
    let h = cell_hash(layer, x, y);
    let hue = (h % 1000) as f32 / 1000.0;
    let light = 0.22 + ((h >> 20) % 100) as f32 / 800.0;
    hsl_to_rgb(hue, 0.25, light)
}

fn cell_hash(layer: LayerId, x: usize, y: usize) -> u64 {
    let key = ((layer.cycle << 1) | layer.slot as u64)
        ^ (x as u64).wrapping_mul(0x9E37_79B1)
        ^ ((y as u64).wrapping_mul(0x85EB_CA77) << 20);
    splitmix64(key)
}

/// HSL to RGB, all components in `[0, 1]`.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(1.0)) * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Vec3::new(r + m, g + m, b + m)
}

/// Resolved appearance of one cell in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSample {
    pub color: Vec3,
    pub alpha: f32,
    pub owner: Option<OwnerId>,
}

/// Samples a cell of `layer` at `progress` through the generation interval.
///
/// ### Parameters
/// - `layer` - Layer to read from.
/// - `x`, `y` - Cell coordinates; out of bounds samples as an empty cell.
/// - `progress` - Elapsed fraction of the current generation interval.
/// - `time` - Seconds since an arbitrary epoch, for breathing.
/// - `cfg` - Render tuning.
pub fn sample_cell(
    layer: &Layer,
    x: usize,
    y: usize,
    progress: f32,
    time: f64,
    cfg: &RenderConfig,
) -> CellSample {
    let alpha = layer.engine.visible_alpha(x, y, progress);
    let owner = layer.engine.visible_owner(x, y, progress);
    let color = owner
        .and_then(|o| layer.palette.get(o))
        .unwrap_or_else(|| hash_color(layer.id, x, y));

    let phase = owner
        .and_then(|o| layer.centroids.get(o))
        .map(|c| c.pos.distance(glam::Vec2::new(x as f32, y as f32)) * cfg.ripple_per_cell)
        .unwrap_or_else(|| (cell_hash(layer.id, x, y) % 628) as f32 / 100.0);
    let wave = 0.5 + 0.5 * ((time as f32) * cfg.breathing_speed - phase).sin();
    let breath = 1.0 - cfg.breathing_depth + cfg.breathing_depth * wave;

    CellSample {
        color,
        alpha: (alpha * breath).max(cfg.background_alpha),
        owner,
    }
}

/// RGBA bitmap of a whole layer, one pixel per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameCapture {
    pub width: usize,
    pub height: usize,
    /// Unpremultiplied RGBA, row-major.
    pub rgba: Vec<u8>,
}

impl FrameCapture {
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Renders every cell of `layer` over its tint into an opaque bitmap.
pub fn capture_frame(layer: &Layer, progress: f32, time: f64, cfg: &RenderConfig) -> FrameCapture {
    let (width, height) = (layer.engine.width(), layer.engine.height());
    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let s = sample_cell(layer, x, y, progress, time, cfg);
            let c = layer.tint.lerp(s.color, s.alpha);
            rgba.extend_from_slice(&[to_byte(c.x), to_byte(c.y), to_byte(c.z), 255]);
        }
    }
    FrameCapture {
        width,
        height,
        rgba,
    }
}

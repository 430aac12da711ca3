//! Tunable parameters for the simulation, seeding, navigation and rendering.
//!
//! Every value here is a visual tuning knob rather than a correctness
//! requirement. All sections deserialize with `#[serde(default)]`, so a
//! partial JSON document only overrides the fields it names.

use serde::{Deserialize, Serialize};

/// Top-level configuration for a [`crate::session::SimulationSession`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub seeding: SeedingConfig,
    pub disturbance: DisturbanceConfig,
    pub navigation: NavigationConfig,
    pub render: RenderConfig,
}

/// Smallest ratio between the child and parent zoom thresholds.
///
/// Parent framing clamps its zoom to `[min_zoom * 1.1, max_zoom * 0.8]`,
/// which needs `max_zoom >= min_zoom * 1.375`.
const MIN_THRESHOLD_RATIO: f32 = 1.5;

/// Clamps a probability into `[0, 1]`; NaN counts as never.
pub fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

impl Config {
    /// Copy with every value moved into the range the simulation accepts.
    ///
    /// Values loaded from a file are not trusted: probabilities are clamped
    /// to `[0, 1]` and the zoom thresholds are kept ordered.
    pub fn sanitized(mut self) -> Self {
        let s = &mut self.seeding;
        s.blob_right = probability(s.blob_right);
        s.blob_down = probability(s.blob_down);
        s.blob_left = probability(s.blob_left);
        s.max_density = probability(s.max_density as f64) as f32;
        s.hint_max_weight = probability(s.hint_max_weight as f64) as f32;
        s.cells_per_unit = s.cells_per_unit.max(1);

        let d = &mut self.disturbance;
        d.revive_probability = probability(d.revive_probability);
        d.jitter = d.jitter.max(0);

        self.navigation = self.navigation.sanitized();
        self
    }
}

/// Generation timing and centroid sampling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds between two committed generations.
    pub generation_interval: f64,
    /// Progress at which centroids sample the interpolated grid.
    pub centroid_snapshot_progress: f32,
    /// Minimum interpolated alpha for a cell to count towards a centroid.
    pub centroid_alpha_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation_interval: 0.9,
            centroid_snapshot_progress: 0.5,
            centroid_alpha_threshold: 0.15,
        }
    }
}

/// Initial population of a freshly built layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    /// Fraction of the grid area scattered with live cells at depth 0.
    pub base_density: f32,
    /// Extra density per level of navigation depth.
    pub depth_density_step: f32,
    /// Upper bound on the scatter density.
    pub max_density: f32,
    /// Probability of lighting the right neighbour of a scattered seed.
    pub blob_right: f64,
    /// Probability of lighting the neighbour below a scattered seed.
    pub blob_down: f64,
    /// Probability of lighting the left neighbour of a scattered seed.
    pub blob_left: f64,
    /// Density bias contributed by an alive focus cell.
    pub hint_alive_density: f32,
    /// Density bias contributed per live neighbour of the focus cell.
    pub hint_neighbor_density: f32,
    /// Owner weight of a hint before the focus-cell terms are added.
    pub hint_base_weight: f32,
    /// Owner weight contributed by an alive focus cell.
    pub hint_alive_weight: f32,
    /// Owner weight contributed per live neighbour of the focus cell.
    pub hint_neighbor_weight: f32,
    /// Upper bound on a hint's owner weight.
    pub hint_max_weight: f32,
    /// Grid cells reserved per active unit when sizing the unit list.
    pub cells_per_unit: usize,
    /// Hard upper bound on the active-unit list of one layer.
    pub max_units: usize,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            base_density: 0.042,
            depth_density_step: 0.002,
            max_density: 0.09,
            blob_right: 0.28,
            blob_down: 0.22,
            blob_left: 0.15,
            hint_alive_density: 0.008,
            hint_neighbor_density: 0.006,
            hint_base_weight: 0.35,
            hint_alive_weight: 0.2,
            hint_neighbor_weight: 0.04,
            hint_max_weight: 0.85,
            cells_per_unit: 90,
            max_units: 96,
        }
    }
}

/// Periodic perturbation that keeps the automaton from settling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceConfig {
    /// Disturb after every committed generation divisible by this value.
    pub every_generations: u64,
    /// Lower bound on perturbations per pass.
    pub min_events: usize,
    /// Perturbations per pass as a fraction of the centroid count.
    pub centroid_fraction: f32,
    /// Maximum offset, in cells, from the chosen centroid.
    pub jitter: i32,
    /// Probability that a perturbation revives rather than kills.
    pub revive_probability: f64,
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self {
            every_generations: 4,
            min_events: 4,
            centroid_fraction: 0.06,
            jitter: 6,
            revive_probability: 0.62,
        }
    }
}

/// How a layer change is presented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionStyle {
    /// Swap synchronously in the same frame.
    #[default]
    Instant,
    /// Fade a captured frame around a swap point.
    Animated {
        /// Total length in seconds.
        duration: f64,
        /// Fraction of `duration` at which the new layer is built.
        swap_ratio: f64,
    },
}

impl TransitionStyle {
    /// Non-negative duration and a swap ratio inside `[0, 1]`.
    pub fn sanitized(self) -> Self {
        match self {
            Self::Instant => Self::Instant,
            Self::Animated {
                duration,
                swap_ratio,
            } => Self::Animated {
                duration: if duration.is_nan() { 0.0 } else { duration.max(0.0) },
                swap_ratio: probability(swap_ratio),
            },
        }
    }
}

/// Camera limits and zoom thresholds for layer navigation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Cell size in pixels at zoom 1.0; also sizes the grid to the viewport.
    pub base_cell_px: f32,
    /// Rendered cell size that triggers entering a child layer.
    pub child_cell_px: f32,
    /// Zoom below which the parent layer is entered.
    pub min_zoom: f32,
    /// Smallest grid side, whatever the viewport.
    pub min_grid_side: usize,
    pub transition: TransitionStyle,
}

impl NavigationConfig {
    /// Zoom factor at which the child threshold is reached.
    pub fn max_zoom(&self) -> f32 {
        self.child_cell_px / self.base_cell_px
    }

    /// Positive cell size and zoom floor, with the child threshold far
    /// enough above the parent one.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.base_cell_px.is_finite() && self.base_cell_px > 0.0) {
            self.base_cell_px = defaults.base_cell_px;
        }
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            self.min_zoom = defaults.min_zoom;
        }
        let floor = self.base_cell_px * self.min_zoom * MIN_THRESHOLD_RATIO;
        if self.child_cell_px.is_nan() || self.child_cell_px < floor {
            self.child_cell_px = floor;
        }
        self.min_grid_side = self.min_grid_side.max(1);
        self.transition = self.transition.sanitized();
        self
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            base_cell_px: 10.0,
            child_cell_px: 72.0,
            min_zoom: 0.6,
            min_grid_side: 8,
            transition: TransitionStyle::Instant,
        }
    }
}

/// Purely visual parameters of the render sampler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fraction of alpha that the breathing modulation may remove.
    pub breathing_depth: f32,
    /// Angular speed of the breathing modulation, radians per second.
    pub breathing_speed: f32,
    /// Phase offset per cell of distance from the owner's centroid.
    pub ripple_per_cell: f32,
    /// Alpha given to dead cells so unclaimed areas keep a faint texture.
    pub background_alpha: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            breathing_depth: 0.18,
            breathing_speed: 1.7,
            ripple_per_cell: 0.35,
            background_alpha: 0.06,
        }
    }
}

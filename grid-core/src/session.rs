//! The one value that owns all mutable simulation and navigation state.
//!
//! The platform loop calls [`SimulationSession::tick`] once per frame with a
//! monotonic timestamp; input handlers call the camera and navigation methods
//! between frames. Nothing here blocks or spawns.

use crate::{
    camera::Camera,
    catalog::{ContentUnit, select_active_units, unit_capacity},
    config::Config,
    engine::GridEngine,
    layer::{Layer, LayerId, SeedHint},
    seeder::{disturb, is_disturbance_generation, layer_seed, populate},
    transition::TransitionState,
    types::OwnerId,
};
use glam::Vec2;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

/// Seconds a notice stays visible.
const NOTICE_SECS: f64 = 3.0;

/// Timing of the generation interval.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationClock {
    /// Timestamp of the last commit (or layer build).
    pub last_commit: f64,
}

impl GenerationClock {
    /// Elapsed fraction of an interval of `interval` seconds, in `[0, 1]`.
    pub fn progress(&self, now: f64, interval: f64) -> f32 {
        if interval <= 0.0 {
            return 1.0;
        }
        ((now - self.last_commit) / interval).clamp(0.0, 1.0) as f32
    }

    pub fn restart(&mut self, now: f64) {
        self.last_commit = now;
    }
}

/// Short user-visible message, e.g. a refused navigation request.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
    pub at: f64,
}

/// Summary of the session after a tick, for status display.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStatus {
    pub layer: Option<LayerId>,
    pub depth: u32,
    pub generation: u64,
    pub progress: f32,
    pub alive: usize,
    /// Owners with a centroid in the last committed generation.
    pub owners: usize,
    pub transitioning: bool,
}

/// Simulation, camera and navigation state shared by the render loop, the
/// input handler and the navigator.
#[derive(Debug)]
pub struct SimulationSession {
    pub config: Config,
    pub camera: Camera,
    /// Whether generations advance on their own.
    pub running: bool,
    pub(crate) catalog: Vec<ContentUnit>,
    pub(crate) date_seed: u32,
    pub(crate) layer: Option<Layer>,
    pub(crate) next_hint: Option<SeedHint>,
    pub(crate) clock: GenerationClock,
    pub(crate) transition: Option<TransitionState>,
    pub(crate) notice: Option<Notice>,
}

impl SimulationSession {
    /// Creates a session without a layer; call [`SimulationSession::start`]
    /// once the viewport size is known.
    ///
    /// ### Parameters
    /// - `config` - Tuning parameters.
    /// - `catalog` - Content units that may own cells.
    /// - `date_seed` - Calendar day key, e.g. `20261016`.
    /// - `viewport` - Drawing area in pixels; sizes the grid.
    pub fn new(config: Config, catalog: Vec<ContentUnit>, date_seed: u32, viewport: Vec2) -> Self {
        let config = config.sanitized();
        let camera = Camera::new(viewport, config.navigation.base_cell_px, (0, 0));
        Self {
            config,
            camera,
            running: true,
            catalog,
            date_seed,
            layer: None,
            next_hint: None,
            clock: GenerationClock::default(),
            transition: None,
            notice: None,
        }
    }

    /// Builds the root layer if none exists yet.
    pub fn start(&mut self, now: f64) {
        if self.layer.is_none() {
            self.build_layer(LayerId::default(), 0, None, now);
        }
    }

    pub fn layer(&self) -> Option<&Layer> {
        self.layer.as_ref()
    }

    pub fn transition(&self) -> Option<&TransitionState> {
        self.transition.as_ref()
    }

    pub fn catalog(&self) -> &[ContentUnit] {
        &self.catalog
    }

    /// Updates the viewport size; the grid size follows at the next build.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.camera.viewport = viewport;
    }

    /// Grid dimensions a layer built now would get.
    pub fn grid_size(&self) -> (usize, usize) {
        let nav = &self.config.navigation;
        let side = |px: f32| ((px / nav.base_cell_px).ceil().max(0.0) as usize).max(nav.min_grid_side);
        (side(self.camera.viewport.x), side(self.camera.viewport.y))
    }

    /// Interpolation progress through the current generation interval.
    pub fn progress(&self, now: f64) -> f32 {
        self.clock
            .progress(now, self.config.engine.generation_interval)
    }

    /// Advances time by one frame.
    ///
    /// Drives an animated transition if one is running; otherwise commits a
    /// generation once the interval has elapsed and the session is running.
    pub fn tick(&mut self, now: f64) -> FrameStatus {
        self.advance_transition(now);
        if self.running && self.transition.is_none() && self.progress(now) >= 1.0 {
            self.advance_generation(now);
        }
        self.status(now)
    }

    /// Commits the pending generation and prepares the next one.
    ///
    /// Order per generation: commit, centroids, optional disturbance, step.
    pub fn advance_generation(&mut self, now: f64) {
        let cfg = &self.config;
        let Some(layer) = self.layer.as_mut() else {
            return;
        };
        layer.engine.commit();
        layer.refresh_centroids(cfg);
        let generation = layer.engine.generation();
        if is_disturbance_generation(generation, &cfg.disturbance) {
            let events = disturb(
                &mut layer.engine,
                &layer.centroids,
                &cfg.disturbance,
                &mut layer.rng,
            );
            debug!(generation, events, "disturbance pass");
        }
        layer.engine.step();
        self.clock.restart(now);
    }

    /// Replaces the current layer with a freshly seeded one.
    ///
    /// Consumes the pending seed hint. The previous engine is dropped in the
    /// same call, so no half-built state is ever observable.
    pub(crate) fn build_layer(
        &mut self,
        id: LayerId,
        depth: u32,
        anchor: Option<ContentUnit>,
        now: f64,
    ) {
        let (width, height) = self.grid_size();
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(layer_seed(self.date_seed, id.slot, id.cycle));
        let capacity = unit_capacity(
            width * height,
            cfg.seeding.cells_per_unit,
            cfg.seeding.max_units,
        );
        let units = select_active_units(&self.catalog, capacity, anchor.as_ref(), &mut rng);
        let hint = self.next_hint.take();

        let mut engine = GridEngine::new(width, height);
        let report = populate(
            &mut engine,
            units.len(),
            depth,
            hint.as_ref(),
            &cfg.seeding,
            &mut rng,
        );
        engine.step();

        info!(
            slot = id.slot,
            cycle = id.cycle,
            depth,
            width,
            height,
            units = units.len(),
            seeded = report.coverage + report.scattered + report.blob_cells,
            hinted = hint.is_some(),
            "built layer"
        );

        self.layer = Some(Layer::new(id, depth, engine, units, rng, cfg));
        self.camera = Camera::new(self.camera.viewport, cfg.navigation.base_cell_px, (width, height));
        self.clock.restart(now);
    }

    /// Status snapshot for display.
    pub fn status(&self, now: f64) -> FrameStatus {
        let Some(layer) = self.layer.as_ref() else {
            return FrameStatus {
                transitioning: self.transition.is_some(),
                ..FrameStatus::default()
            };
        };
        FrameStatus {
            layer: Some(layer.id),
            depth: layer.depth,
            generation: layer.engine.generation(),
            progress: self.progress(now),
            alive: layer.engine.alive_count(),
            owners: layer.centroids.len(),
            transitioning: self.transition.is_some(),
        }
    }

    /// Owner shown under a viewport-local screen position right now.
    pub fn owner_at(&self, screen: Vec2, now: f64) -> Option<(OwnerId, &ContentUnit)> {
        let layer = self.layer.as_ref()?;
        let (x, y) = self
            .camera
            .cell_at(screen, layer.engine.width(), layer.engine.height())?;
        let owner = layer.engine.visible_owner(x, y, self.progress(now))?;
        layer.unit(owner).map(|u| (owner, u))
    }

    /// Centres the camera on an owner's centroid; `false` if it has none.
    pub fn focus_owner(&mut self, owner: OwnerId) -> bool {
        let Some(c) = self.layer.as_ref().and_then(|l| l.centroids.get(owner)) else {
            return false;
        };
        // Cell (x, y) covers [x, x + 1), so its centre is offset by half a cell.
        self.camera.center_on(c.pos + Vec2::splat(0.5));
        true
    }

    /// Drag-pans the camera by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan_by(delta);
    }

    pub fn notify(&mut self, message: impl Into<String>, now: f64) {
        self.notice = Some(Notice {
            message: message.into(),
            at: now,
        });
    }

    /// Most recent notice, while it is still fresh.
    pub fn notice(&self, now: f64) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| now - n.at < NOTICE_SECS)
            .map(|n| n.message.as_str())
    }
}

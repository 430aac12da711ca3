//! Recursive zoom: entering child and parent layers.
//!
//! A transition reads the focus cell of the current layer, turns it into a
//! [`SeedHint`] plus an anchor unit, then rebuilds the session's layer in the
//! other slot. With [`TransitionStyle::Animated`] the rebuild is deferred to
//! the swap point of a [`TransitionState`].

use crate::{
    catalog::ContentUnit,
    config::TransitionStyle,
    error::{NavResult, NavigationError},
    layer::SeedHint,
    sampler::capture_frame,
    session::SimulationSession,
    transition::{Direction, TransitionState},
    types::{CellCoord, OwnerId},
};
use glam::Vec2;
use tracing::{info, warn};

/// The cell a transition grows from.
#[derive(Clone, Debug, PartialEq)]
pub struct Focus {
    pub cell: CellCoord,
    pub alive: bool,
    pub live_neighbors: u8,
    /// Live owner of the cell, else the owner with the nearest centroid.
    pub owner: Option<OwnerId>,
}

/// Where the camera goes once the new layer exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum CameraPlan {
    Default,
    /// Frame the anchor's cluster at the exited layer's on-screen size.
    Continuity { footprint_px: f32 },
}

/// Everything needed to build the next layer, computed before any mutation.
#[derive(Clone, Debug)]
pub struct LayerPlan {
    pub direction: Direction,
    pub anchor: Option<ContentUnit>,
    pub hint: SeedHint,
    pub(crate) camera: CameraPlan,
}

impl SimulationSession {
    /// Resolves the focus cell under a viewport-local screen position.
    ///
    /// Points outside the grid are clamped to its nearest edge cell.
    pub fn focus_at(&self, screen: Vec2) -> Option<Focus> {
        let layer = self.layer.as_ref()?;
        let engine = &layer.engine;
        if engine.area() == 0 {
            return None;
        }
        let p = self.camera.screen_to_cell(screen).floor();
        let x = (p.x.max(0.0) as usize).min(engine.width() - 1);
        let y = (p.y.max(0.0) as usize).min(engine.height() - 1);

        let cell = engine.cell(x, y);
        let tally = engine.neighbor_counts(x, y);
        let centre = Vec2::new(x as f32, y as f32);
        let owner = cell
            .owner
            .filter(|_| cell.alive)
            .or_else(|| layer.centroids.nearest_owner(centre).map(|(o, _)| o));

        Some(Focus {
            cell: (x, y),
            alive: cell.alive,
            live_neighbors: tally.alive,
            owner,
        })
    }

    fn plan(&self, direction: Direction, anchor: Vec2) -> NavResult<LayerPlan> {
        if self.transition.is_some() {
            return Err(NavigationError::TransitionInProgress);
        }
        let layer = self.layer.as_ref().ok_or(NavigationError::NoActiveLayer)?;
        let screen = match direction {
            Direction::Child => anchor,
            Direction::Parent => self.camera.viewport * 0.5,
        };
        let focus = self.focus_at(screen).ok_or(NavigationError::NoActiveLayer)?;

        let unit = focus.owner.and_then(|o| layer.unit(o)).cloned();
        // The anchor unit is always first in the next active list.
        let hint = SeedHint::from_focus(
            unit.as_ref().map(|_| 0),
            focus.alive,
            focus.live_neighbors,
            &self.config.seeding,
        );
        let camera = match direction {
            Direction::Child => CameraPlan::Default,
            Direction::Parent => CameraPlan::Continuity {
                footprint_px: layer.engine.width() as f32 * self.camera.cell_px(),
            },
        };
        Ok(LayerPlan {
            direction,
            anchor: unit,
            hint,
            camera,
        })
    }

    /// Enters a child layer grown from the cell under `anchor`.
    ///
    /// `anchor` is a viewport-local screen position, usually the pointer or
    /// the zoom anchor.
    pub fn enter_child(&mut self, anchor: Vec2, now: f64) -> NavResult<()> {
        self.request(Direction::Child, anchor, now)
    }

    /// Enters a parent layer grown from the cell at the viewport centre.
    pub fn enter_parent(&mut self, now: f64) -> NavResult<()> {
        let centre = self.camera.viewport * 0.5;
        self.request(Direction::Parent, centre, now)
    }

    fn request(&mut self, direction: Direction, anchor: Vec2, now: f64) -> NavResult<()> {
        let plan = match self.plan(direction, anchor) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(?direction, error = %e, "layer transition refused");
                self.notify(format!("Cannot change layer: {e}"), now);
                return Err(e);
            }
        };

        match self.config.navigation.transition.sanitized() {
            TransitionStyle::Instant => self.perform(plan, now),
            TransitionStyle::Animated {
                duration,
                swap_ratio,
            } => {
                let layer = self.layer.as_ref().ok_or(NavigationError::NoActiveLayer)?;
                let captured_frame =
                    capture_frame(layer, self.progress(now), now, &self.config.render);
                self.transition = Some(TransitionState {
                    direction,
                    start: now,
                    duration,
                    swap_ratio,
                    swapped: false,
                    captured_frame,
                    resume_running: self.running,
                    plan: Some(plan),
                });
                self.running = false;
            }
        }
        Ok(())
    }

    /// Builds the planned layer and places the camera.
    pub(crate) fn perform(&mut self, plan: LayerPlan, now: f64) {
        let Some(current) = self.layer.as_ref() else {
            return;
        };
        let id = current.id.next();
        let depth = match plan.direction {
            Direction::Child => current.depth + 1,
            Direction::Parent => current.depth.saturating_sub(1),
        };
        let anchor_owner = plan.anchor.as_ref().map(|_| 0);

        self.next_hint = Some(plan.hint);
        self.build_layer(id, depth, plan.anchor, now);

        if let CameraPlan::Continuity { footprint_px } = plan.camera {
            self.frame_cluster(anchor_owner, footprint_px);
        }
        info!(
            direction = ?plan.direction,
            slot = id.slot,
            cycle = id.cycle,
            depth,
            "entered layer"
        );
    }

    /// Zooms so `owner`'s cluster spans `footprint_px`, centred on it.
    ///
    /// Falls back to the centroid nearest the grid centre, then to the grid
    /// centre itself.
    fn frame_cluster(&mut self, owner: Option<OwnerId>, footprint_px: f32) {
        let Some(layer) = self.layer.as_ref() else {
            return;
        };
        let grid_centre = Vec2::new(layer.engine.width() as f32, layer.engine.height() as f32) * 0.5;
        let target = owner
            .and_then(|o| layer.centroids.get(o))
            .or_else(|| {
                layer
                    .centroids
                    .nearest_owner(grid_centre)
                    .and_then(|(o, _)| layer.centroids.get(o))
            });

        let nav = self.config.navigation.sanitized();
        let (centre, extent) = match target {
            // Cluster side, assuming a loosely packed square blob.
            Some(c) => (c.pos + Vec2::splat(0.5), (c.count as f32).sqrt().max(1.0) * 3.0),
            None => (grid_centre, layer.engine.width() as f32),
        };
        let zoom = footprint_px / (extent * nav.base_cell_px);
        self.camera.zoom = zoom.clamp(nav.min_zoom * 1.1, nav.max_zoom() * 0.8);
        self.camera.center_on(centre);
    }

    /// Zooms about `anchor` and enters a layer when a threshold is crossed.
    ///
    /// ### Returns
    /// The direction of the layer change that was triggered, if any.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32, now: f64) -> NavResult<Option<Direction>> {
        if self.transition.is_some() {
            return Ok(None);
        }
        self.camera.zoom_about(anchor, factor);

        let nav = self.config.navigation;
        if self.camera.cell_px() >= nav.child_cell_px {
            let result = self.enter_child(anchor, now);
            if result.is_err() {
                self.camera.zoom = nav.max_zoom() * 0.95;
            }
            return result.map(|_| Some(Direction::Child));
        }
        if self.camera.zoom < nav.min_zoom {
            let result = self.enter_parent(now);
            if result.is_err() {
                self.camera.zoom = nav.min_zoom;
            }
            return result.map(|_| Some(Direction::Parent));
        }
        Ok(None)
    }

    /// Drives an animated transition: swap at the swap point, then finish.
    pub(crate) fn advance_transition(&mut self, now: f64) {
        let Some(t) = self.transition.as_mut() else {
            return;
        };
        let p = t.progress(now);
        if !t.swapped && p >= t.swap_ratio {
            t.swapped = true;
            if let Some(plan) = t.plan.take() {
                self.perform(plan, now);
            }
        }
        if p >= 1.0
            && let Some(mut t) = self.transition.take()
        {
            // A swap point at the very end still swaps.
            if let Some(plan) = t.plan.take() {
                self.perform(plan, now);
            }
            self.running = t.resume_running;
        }
    }

    /// Abandons an animated transition that has not reached its swap point.
    ///
    /// ### Returns
    /// `true` if a transition was cancelled.
    pub fn cancel_transition(&mut self) -> bool {
        match self.transition.as_ref() {
            Some(t) if !t.swapped => {
                let resume = t.resume_running;
                self.transition = None;
                self.running = resume;
                true
            }
            _ => false,
        }
    }
}

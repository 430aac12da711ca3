//! Timed, two-phase presentation of an animated layer change.
//!
//! The outgoing frame is captured as a bitmap. Before the swap point it is
//! zoomed and slightly faded; at the swap point the new layer is built and
//! starts rendering live; afterwards the stale capture fades out on top.

use crate::{navigator::LayerPlan, sampler::FrameCapture};

/// Which way a layer change goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Child,
    Parent,
}

/// Where an animated transition is at a given instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionPhase {
    /// Before the swap; local progress in `[0, 1)`.
    PreSwap(f32),
    /// After the swap; local progress in `[0, 1)`.
    PostSwap(f32),
    Finished,
}

/// How to draw the captured frame on top of the live layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlay {
    pub alpha: f32,
    /// Scale about the viewport centre.
    pub scale: f32,
}

/// An animated transition in flight.
#[derive(Debug)]
pub struct TransitionState {
    pub direction: Direction,
    pub start: f64,
    pub duration: f64,
    pub swap_ratio: f64,
    pub swapped: bool,
    pub captured_frame: FrameCapture,
    /// Running flag to restore once the transition ends or is cancelled.
    pub resume_running: bool,
    pub(crate) plan: Option<LayerPlan>,
}

/// Alpha the capture has reached when the swap happens.
const SWAP_ALPHA: f32 = 0.85;

fn ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

impl TransitionState {
    /// Elapsed fraction of the whole transition, clamped to `[0, 1]`.
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    pub fn phase(&self, now: f64) -> TransitionPhase {
        let p = self.progress(now);
        let swap = self.swap_ratio.clamp(0.0, 1.0);
        if p >= 1.0 {
            TransitionPhase::Finished
        } else if p < swap {
            TransitionPhase::PreSwap((p / swap) as f32)
        } else {
            TransitionPhase::PostSwap(((p - swap) / (1.0 - swap)) as f32)
        }
    }

    /// Presentation of the captured frame at `now`, `None` once finished.
    pub fn overlay(&self, now: f64) -> Option<Overlay> {
        let (alpha, scale_t) = match self.phase(now) {
            TransitionPhase::PreSwap(t) => (1.0 - (1.0 - SWAP_ALPHA) * ease(t), ease(t)),
            TransitionPhase::PostSwap(t) => (SWAP_ALPHA * (1.0 - ease(t)), 1.0 + 0.5 * t),
            TransitionPhase::Finished => return None,
        };
        let scale = match self.direction {
            Direction::Child => 1.0 + 0.8 * scale_t,
            Direction::Parent => 1.0 - 0.4 * scale_t,
        };
        Some(Overlay { alpha, scale })
    }
}

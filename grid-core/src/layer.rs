use crate::{
    catalog::ContentUnit,
    centroid::CentroidTracker,
    config::{Config, SeedingConfig},
    engine::GridEngine,
    sampler::{Palette, hash_color},
    types::OwnerId,
};
use glam::Vec3;
use rand::rngs::StdRng;

/// Identity of a layer: one of two alternating slots plus a visible counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerId {
    pub slot: u8,
    pub cycle: u64,
}

impl LayerId {
    /// Identity of the layer that replaces this one.
    pub fn next(self) -> Self {
        Self {
            slot: self.slot ^ 1,
            cycle: self.cycle + 1,
        }
    }
}

/// Context handed from an exited layer to the seeding of the next one.
///
/// `owner` is expressed in the new layer's owner space: the focus unit is
/// always placed first in the next active-unit list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedHint {
    pub owner: Option<OwnerId>,
    pub density_bias: f32,
    pub owner_weight: f32,
}

impl SeedHint {
    /// Derives a hint from the focus cell's liveness and live-neighbour count.
    pub fn from_focus(
        owner: Option<OwnerId>,
        alive: bool,
        live_neighbors: u8,
        cfg: &SeedingConfig,
    ) -> Self {
        let n = live_neighbors as f32;
        let alive_term = if alive { 1.0 } else { 0.0 };
        Self {
            owner,
            density_bias: alive_term * cfg.hint_alive_density + n * cfg.hint_neighbor_density,
            owner_weight: (cfg.hint_base_weight
                + alive_term * cfg.hint_alive_weight
                + n * cfg.hint_neighbor_weight)
                .clamp(0.0, cfg.hint_max_weight.max(0.0)),
        }
    }
}

/// Everything that lives and dies with one layer.
#[derive(Debug)]
pub struct Layer {
    pub id: LayerId,
    /// Navigation depth; 0 is the root layer.
    pub depth: u32,
    pub engine: GridEngine,
    pub units: Vec<ContentUnit>,
    pub palette: Palette,
    pub centroids: CentroidTracker,
    /// Background colour, RGB in `[0, 1]`.
    pub tint: Vec3,
    /// Continues the build RNG so disturbances reproduce with the layer.
    pub(crate) rng: StdRng,
}

impl Layer {
    /// Wraps a freshly seeded engine and computes its first centroids.
    pub fn new(
        id: LayerId,
        depth: u32,
        engine: GridEngine,
        units: Vec<ContentUnit>,
        rng: StdRng,
        cfg: &Config,
    ) -> Self {
        let palette = Palette::for_units(&units);
        let tint = match palette.get(0) {
            Some(c) => c * 0.12 + Vec3::splat(0.02),
            None => hash_color(id, 0, 0) * 0.1,
        };
        let mut centroids = CentroidTracker::with_len(units.len());
        centroids.recompute(
            &engine,
            cfg.engine.centroid_snapshot_progress,
            cfg.engine.centroid_alpha_threshold,
        );
        Self {
            id,
            depth,
            engine,
            units,
            palette,
            centroids,
            tint,
            rng,
        }
    }

    pub fn unit(&self, owner: OwnerId) -> Option<&ContentUnit> {
        self.units.get(owner)
    }

    /// Recomputes centroids from the engine's current interpolation state.
    pub fn refresh_centroids(&mut self, cfg: &Config) {
        self.centroids.recompute(
            &self.engine,
            cfg.engine.centroid_snapshot_progress,
            cfg.engine.centroid_alpha_threshold,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_alternates_slot_and_counts_cycles() {
        let id = LayerId::default();
        let a = id.next();
        let b = a.next();
        assert_eq!((a.slot, a.cycle), (1, 1));
        assert_eq!((b.slot, b.cycle), (0, 2));
    }

    #[test]
    fn hint_grows_with_alive_focus_and_neighbours() {
        let cfg = SeedingConfig::default();
        let dead = SeedHint::from_focus(Some(0), false, 0, &cfg);
        let alive = SeedHint::from_focus(Some(0), true, 3, &cfg);

        assert_eq!(dead.density_bias, 0.0);
        assert!((dead.owner_weight - cfg.hint_base_weight).abs() < 1e-6);
        assert!(alive.density_bias > dead.density_bias);
        assert!(alive.owner_weight > dead.owner_weight);
    }

    #[test]
    fn hint_weight_is_capped() {
        let cfg = SeedingConfig::default();
        let hint = SeedHint::from_focus(None, true, 8, &cfg);
        assert!(hint.owner_weight <= cfg.hint_max_weight);
    }

    #[test]
    fn negative_weight_cap_gives_zero_weight() {
        let cfg = SeedingConfig {
            hint_max_weight: -0.5,
            ..SeedingConfig::default()
        };
        let hint = SeedHint::from_focus(Some(0), true, 3, &cfg);
        assert_eq!(hint.owner_weight, 0.0);
    }
}

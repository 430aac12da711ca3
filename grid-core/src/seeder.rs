//! Procedural population of new layers and periodic disturbance.
//!
//! Every random choice of a layer build flows from one [`StdRng`] seeded by
//! [`layer_seed`], so a layer reproduces exactly within a calendar day.
//!
//! [`StdRng`]: rand::rngs::StdRng

use crate::{
    centroid::{Centroid, CentroidTracker},
    config::{DisturbanceConfig, SeedingConfig, probability},
    engine::GridEngine,
    layer::SeedHint,
    types::OwnerId,
};
use rand::Rng;

/// Mixes the composite layer key into a 64-bit RNG seed.
///
/// ### Parameters
/// - `date_seed` - Calendar day, e.g. `20261016`.
/// - `slot` - Layer slot, `0` or `1`.
/// - `cycle` - Layer cycle counter.
pub fn layer_seed(date_seed: u32, slot: u8, cycle: u64) -> u64 {
    let mut h = ((date_seed as u64) << 32) | ((slot as u64) << 24);
    h ^= cycle.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    splitmix64(h)
}

/// Finalizer of the SplitMix64 generator; a cheap, well-mixed 64-bit hash.
pub(crate) fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// What a [`populate`] call placed on the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// One guaranteed cell per active unit.
    pub coverage: usize,
    /// Scattered seeds, not counting blob neighbours.
    pub scattered: usize,
    /// Neighbours lit next to scattered seeds.
    pub blob_cells: usize,
}

/// Scatter density for a layer at `depth` with an optional hint.
pub fn seed_density(depth: u32, hint: Option<&SeedHint>, cfg: &SeedingConfig) -> f32 {
    let bias = hint.map_or(0.0, |h| h.density_bias);
    (cfg.base_density + depth as f32 * cfg.depth_density_step + bias).min(cfg.max_density)
}

/// Seeds the initial population of a freshly built layer.
///
/// 1. Coverage: every unit gets one live cell at a uniform position.
/// 2. Scatter: `round(area * density)` live cells; each takes the hint owner
///    when a flip at the hint's `owner_weight` succeeds, else a uniform owner.
/// 3. Blobs: each scattered seed may also light its right, lower and left
///    neighbour under the same owner.
///
/// With no units nothing is placed and the grid stays empty.
///
/// ### Parameters
/// - `engine` - Freshly created grid; cells are written with
///   [`GridEngine::set_cell`].
/// - `unit_count` - Number of active units (owner ids `0..unit_count`).
/// - `depth` - Navigation depth of the layer.
/// - `hint` - Context from the exited layer, if any.
/// - `cfg` - Density and blob parameters.
/// - `rng` - Layer RNG.
///
/// ### Returns
/// A [`SeedReport`] with the number of cells placed by each pass.
pub fn populate(
    engine: &mut GridEngine,
    unit_count: usize,
    depth: u32,
    hint: Option<&SeedHint>,
    cfg: &SeedingConfig,
    rng: &mut impl Rng,
) -> SeedReport {
    let mut report = SeedReport::default();
    let (w, h) = (engine.width(), engine.height());
    if unit_count == 0 || w == 0 || h == 0 {
        return report;
    }

    for owner in 0..unit_count {
        let x = rng.random_range(0..w);
        let y = rng.random_range(0..h);
        engine.set_cell(x, y, true, Some(owner));
        report.coverage += 1;
    }

    let preferred = hint.and_then(|hint| {
        hint.owner
            .filter(|&o| o < unit_count)
            .map(|o| (o, probability(hint.owner_weight as f64)))
    });
    let density = seed_density(depth, hint, cfg);
    let seeds = (engine.area() as f32 * density).round() as usize;

    for _ in 0..seeds {
        let x = rng.random_range(0..w);
        let y = rng.random_range(0..h);
        let owner = match preferred {
            Some((o, weight)) if rng.random_bool(weight) => o,
            _ => rng.random_range(0..unit_count),
        };
        engine.set_cell(x, y, true, Some(owner));
        report.scattered += 1;

        if rng.random_bool(probability(cfg.blob_right)) && x + 1 < w {
            engine.set_cell(x + 1, y, true, Some(owner));
            report.blob_cells += 1;
        }
        if rng.random_bool(probability(cfg.blob_down)) && y + 1 < h {
            engine.set_cell(x, y + 1, true, Some(owner));
            report.blob_cells += 1;
        }
        if rng.random_bool(probability(cfg.blob_left)) && x > 0 {
            engine.set_cell(x - 1, y, true, Some(owner));
            report.blob_cells += 1;
        }
    }

    report
}

/// Whether the generation just committed should be disturbed.
pub fn is_disturbance_generation(generation: u64, cfg: &DisturbanceConfig) -> bool {
    cfg.every_generations > 0 && generation > 0 && generation % cfg.every_generations == 0
}

/// Injects perturbations near existing clusters.
///
/// Runs `max(min_events, ceil(centroid_fraction * centroids))` times: pick a
/// random owner centroid, jitter a target cell around it, then revive it
/// under that owner or kill it. Without centroids nothing happens.
///
/// ### Returns
/// The number of perturbations applied.
pub fn disturb(
    engine: &mut GridEngine,
    centroids: &CentroidTracker,
    cfg: &DisturbanceConfig,
    rng: &mut impl Rng,
) -> usize {
    let targets: Vec<(OwnerId, Centroid)> = centroids.iter().collect();
    if targets.is_empty() || engine.area() == 0 {
        return 0;
    }

    let scaled = (targets.len() as f32 * cfg.centroid_fraction).ceil() as usize;
    let events = scaled.max(cfg.min_events);
    let max_x = engine.width() as i32 - 1;
    let max_y = engine.height() as i32 - 1;
    let j = cfg.jitter.max(0);

    for _ in 0..events {
        let (owner, c) = targets[rng.random_range(0..targets.len())];
        let x = (c.pos.x.round() as i32 + rng.random_range(-j..=j)).clamp(0, max_x) as usize;
        let y = (c.pos.y.round() as i32 + rng.random_range(-j..=j)).clamp(0, max_y) as usize;
        if rng.random_bool(probability(cfg.revive_probability)) {
            engine.set_cell(x, y, true, Some(owner));
        } else {
            engine.set_cell(x, y, false, None);
        }
    }

    tracing::debug!(events, owners = targets.len(), "disturbed grid");
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{centroid::CentroidTracker, engine::GridEngine};
    use rand::{SeedableRng, rngs::StdRng};

    fn snapshot(engine: &GridEngine) -> Vec<(bool, Option<OwnerId>)> {
        (0..engine.height())
            .flat_map(|y| (0..engine.width()).map(move |x| (x, y)))
            .map(|(x, y)| {
                let c = engine.cell(x, y);
                (c.alive, c.owner)
            })
            .collect()
    }

    fn seeded(date: u32, slot: u8, cycle: u64, units: usize) -> GridEngine {
        let mut engine = GridEngine::new(40, 30);
        let mut rng = StdRng::seed_from_u64(layer_seed(date, slot, cycle));
        populate(&mut engine, units, 0, None, &SeedingConfig::default(), &mut rng);
        engine
    }

    #[test]
    fn layer_seed_depends_on_every_key_part() {
        let base = layer_seed(20261016, 0, 3);
        assert_eq!(base, layer_seed(20261016, 0, 3));
        assert_ne!(base, layer_seed(20261017, 0, 3));
        assert_ne!(base, layer_seed(20261016, 1, 3));
        assert_ne!(base, layer_seed(20261016, 0, 4));
    }

    #[test]
    fn same_key_reproduces_identical_population() {
        let a = seeded(20261016, 1, 5, 12);
        let b = seeded(20261016, 1, 5, 12);
        assert_eq!(snapshot(&a), snapshot(&b));
        assert!(a.alive_count() > 0);
    }

    #[test]
    fn different_cycle_gives_different_population() {
        let a = seeded(20261016, 0, 0, 12);
        let b = seeded(20261016, 0, 2, 12);
        assert_ne!(snapshot(&a), snapshot(&b));
    }

    #[test]
    fn every_unit_is_covered() {
        let cfg = SeedingConfig {
            base_density: 0.0,
            max_density: 0.0,
            ..SeedingConfig::default()
        };
        let units = 10;
        let mut engine = GridEngine::new(200, 200);
        let mut rng = StdRng::seed_from_u64(layer_seed(1, 0, 0));
        let report = populate(&mut engine, units, 0, None, &cfg, &mut rng);
        assert_eq!(report.coverage, units);
        assert_eq!(report.scattered, 0);

        let mut owners: Vec<OwnerId> = snapshot(&engine)
            .into_iter()
            .filter_map(|(_, o)| o)
            .collect();
        owners.sort_unstable();
        owners.dedup();
        assert_eq!(owners, (0..units).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_owners_are_in_range() {
        let units = 25;
        for (alive, owner) in snapshot(&seeded(1, 0, 0, units)) {
            if let Some(o) = owner {
                assert!(alive);
                assert!(o < units);
            }
        }
    }

    #[test]
    fn population_roughly_matches_density() {
        let engine = seeded(9, 0, 0, 10);
        let area = engine.area() as f32;
        let alive = engine.alive_count() as f32;
        // 4.2% scattered plus blobs, minus collisions.
        assert!(alive > area * 0.03, "alive = {alive}");
        assert!(alive < area * 0.12, "alive = {alive}");
    }

    #[test]
    fn zero_units_seed_an_empty_grid() {
        let mut engine = seeded(1, 0, 0, 0);
        assert_eq!(engine.alive_count(), 0);
        engine.step();
        engine.commit();
        assert_eq!(engine.alive_count(), 0);

        let mut tracker = CentroidTracker::default();
        tracker.recompute(&engine, 0.5, 0.15);
        assert!(tracker.is_empty());
    }

    #[test]
    fn density_grows_with_depth_and_hint_but_is_capped() {
        let cfg = SeedingConfig::default();
        let hint = SeedHint {
            owner: Some(0),
            density_bias: 0.01,
            owner_weight: 0.5,
        };
        let d0 = seed_density(0, None, &cfg);
        let d3 = seed_density(3, None, &cfg);
        let dh = seed_density(3, Some(&hint), &cfg);
        assert_eq!(d0, cfg.base_density);
        assert!(d3 > d0 && dh > d3);
        assert_eq!(seed_density(1000, Some(&hint), &cfg), cfg.max_density);
    }

    #[test]
    fn strong_hint_dominates_ownership() {
        let cfg = SeedingConfig::default();
        let hint = SeedHint {
            owner: Some(2),
            density_bias: 0.0,
            owner_weight: 1.0,
        };
        let mut engine = GridEngine::new(40, 30);
        let mut rng = StdRng::seed_from_u64(11);
        populate(&mut engine, 8, 0, Some(&hint), &cfg, &mut rng);

        let owned_by_hint = snapshot(&engine)
            .iter()
            .filter(|(_, o)| *o == Some(2))
            .count();
        assert!(owned_by_hint * 2 > engine.alive_count());
    }

    #[test]
    fn disturbance_schedule() {
        let cfg = DisturbanceConfig::default();
        assert!(!is_disturbance_generation(0, &cfg));
        assert!(!is_disturbance_generation(3, &cfg));
        assert!(is_disturbance_generation(4, &cfg));
        assert!(is_disturbance_generation(8, &cfg));
    }

    #[test]
    fn disturb_stays_near_clusters() {
        let cfg = DisturbanceConfig::default();
        let mut engine = GridEngine::new(60, 60);
        engine.set_cell(30, 30, true, Some(0));
        let mut tracker = CentroidTracker::default();
        tracker.recompute(&engine, 0.5, 0.15);

        let mut rng = StdRng::seed_from_u64(5);
        let events = disturb(&mut engine, &tracker, &cfg, &mut rng);
        assert_eq!(events, cfg.min_events);

        for y in 0..60 {
            for x in 0..60 {
                let c = engine.cell(x, y);
                if c.alive {
                    assert_eq!(c.owner, Some(0));
                    assert!(x.abs_diff(30) <= 6 && y.abs_diff(30) <= 6);
                }
            }
        }
    }

    #[test]
    fn disturb_without_centroids_is_a_no_op() {
        let mut engine = GridEngine::new(10, 10);
        let tracker = CentroidTracker::default();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            disturb(&mut engine, &tracker, &DisturbanceConfig::default(), &mut rng),
            0
        );
        assert_eq!(engine.alive_count(), 0);
    }

    #[test]
    fn out_of_range_blob_probabilities_are_clamped() {
        let cfg = SeedingConfig {
            blob_right: 1.5,
            blob_down: f64::NAN,
            blob_left: -1.0,
            ..SeedingConfig::default()
        };
        let hint = SeedHint {
            owner: Some(0),
            density_bias: 0.0,
            owner_weight: f32::NAN,
        };
        let mut engine = GridEngine::new(40, 30);
        let mut rng = StdRng::seed_from_u64(3);
        let report = populate(&mut engine, 6, 0, Some(&hint), &cfg, &mut rng);

        // Only the right neighbour is ever lit.
        assert!(report.blob_cells > 0);
        assert!(report.blob_cells <= report.scattered);
    }

    #[test]
    fn out_of_range_revive_probability_is_clamped() {
        let mut engine = GridEngine::new(20, 20);
        engine.set_cell(10, 10, true, Some(0));
        let mut tracker = CentroidTracker::default();
        tracker.recompute(&engine, 0.5, 0.15);
        let mut rng = StdRng::seed_from_u64(5);

        let always = DisturbanceConfig {
            jitter: 0,
            revive_probability: 1.2,
            ..DisturbanceConfig::default()
        };
        disturb(&mut engine, &tracker, &always, &mut rng);
        assert_eq!(engine.cell(10, 10).owner, Some(0));
        assert_eq!(engine.alive_count(), 1);

        let never = DisturbanceConfig {
            revive_probability: -0.5,
            ..always
        };
        disturb(&mut engine, &tracker, &never, &mut rng);
        assert_eq!(engine.alive_count(), 0);
    }
}

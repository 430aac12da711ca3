use crate::{engine::GridEngine, types::OwnerId};
use glam::Vec2;

/// Mean position of one owner's visible cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centroid {
    /// Unweighted mean of contributing cell coordinates.
    pub pos: Vec2,
    /// Number of cells that contributed.
    pub count: u32,
}

/// Per-owner spatial centres derived from the grid once per generation.
///
/// For each `OwnerId`, this tracker stores:
///
/// - The sum of contributing cell positions.
/// - The number of contributing cells.
///
/// Internally, `sum[i]` and `count[i]` correspond to owner `i`. Owner ids
/// are dense, so plain vectors replace a map; they grow on demand when an
/// owner beyond the current length shows up.
#[derive(Debug, Default)]
pub struct CentroidTracker {
    sum: Vec<Vec2>,
    count: Vec<u32>,
}

impl CentroidTracker {
    /// Creates a tracker pre-sized for `len` owners.
    pub fn with_len(len: usize) -> Self {
        Self {
            sum: vec![Vec2::ZERO; len],
            count: vec![0; len],
        }
    }

    /// Clears all accumulated positions without changing the length.
    pub fn clear(&mut self) {
        for v in &mut self.sum {
            *v = Vec2::ZERO;
        }
        for c in &mut self.count {
            *c = 0;
        }
    }

    #[inline]
    fn add(&mut self, owner: OwnerId, pos: Vec2) {
        if owner >= self.sum.len() {
            self.sum.resize(owner + 1, Vec2::ZERO);
            self.count.resize(owner + 1, 0);
        }
        self.sum[owner] += pos;
        self.count[owner] += 1;
    }

    /// Rebuilds every centroid from `engine`.
    ///
    /// A cell contributes when its interpolated alpha at `snapshot_progress`
    /// is at least `alpha_threshold`; it is bucketed under its interpolated
    /// owner at that same progress. Unowned cells never contribute.
    ///
    /// ### Parameters
    /// - `engine` - Grid to sample; only read access is required.
    /// - `snapshot_progress` - Interpolation progress to sample at.
    /// - `alpha_threshold` - Minimum visible alpha of a contributing cell.
    pub fn recompute(&mut self, engine: &GridEngine, snapshot_progress: f32, alpha_threshold: f32) {
        self.clear();
        for y in 0..engine.height() {
            for x in 0..engine.width() {
                if engine.visible_alpha(x, y, snapshot_progress) < alpha_threshold {
                    continue;
                }
                if let Some(owner) = engine.visible_owner(x, y, snapshot_progress) {
                    self.add(owner, Vec2::new(x as f32, y as f32));
                }
            }
        }
    }

    /// Centroid of `owner`, or `None` if it has no contributing cells.
    pub fn get(&self, owner: OwnerId) -> Option<Centroid> {
        let count = *self.count.get(owner)?;
        (count > 0).then(|| Centroid {
            pos: self.sum[owner] / count as f32,
            count,
        })
    }

    /// Iterates over owners that have at least one contributing cell.
    pub fn iter(&self) -> impl Iterator<Item = (OwnerId, Centroid)> + '_ {
        (0..self.count.len()).filter_map(|owner| self.get(owner).map(|c| (owner, c)))
    }

    /// Number of owners with at least one contributing cell.
    pub fn len(&self) -> usize {
        self.count.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owner whose centroid is closest to `pos`, with the squared distance.
    pub fn nearest_owner(&self, pos: Vec2) -> Option<(OwnerId, f32)> {
        let mut best = None;
        let mut best_d2 = f32::MAX;
        for (owner, c) in self.iter() {
            let d2 = (c.pos - pos).length_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best = Some(owner);
            }
        }
        best.map(|owner| (owner, best_d2))
    }
}

//! Content units that own cells, and selection of a layer's active list.
//!
//! The engine only ever sees an [`crate::types::OwnerId`]; the unit behind
//! it is opaque payload for the renderer and the inspector.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Publication state of a catalog entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Live,
    Draft,
    Retired,
}

/// One entry of the external content catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub mechanisms: Vec<String>,
    #[serde(default)]
    pub status: UnitStatus,
}

impl ContentUnit {
    /// How closely `other` relates to this unit: shared scene counts twice,
    /// each shared mechanism once.
    pub fn relatedness(&self, other: &ContentUnit) -> usize {
        let scene = if !self.scene.is_empty() && self.scene == other.scene {
            2
        } else {
            0
        };
        let shared = self
            .mechanisms
            .iter()
            .filter(|m| other.mechanisms.contains(m))
            .count();
        scene + shared
    }
}

/// Number of active units a grid of `area` cells should carry.
pub fn unit_capacity(area: usize, cells_per_unit: usize, max_units: usize) -> usize {
    (area / cells_per_unit.max(1)).clamp(1, max_units.max(1))
}

/// Picks the active units for a new layer.
///
/// Only [`UnitStatus::Live`] entries are eligible. The pool is shuffled,
/// then, when an `anchor` is given, stably ordered by relatedness to it with
/// the anchor itself first. The result is truncated to `capacity`.
///
/// ### Parameters
/// - `catalog` - Full catalog supplied by the content provider.
/// - `capacity` - Maximum number of units to return.
/// - `anchor` - Unit the layer grows from, if any.
/// - `rng` - Layer RNG, so the selection reproduces with the layer.
pub fn select_active_units(
    catalog: &[ContentUnit],
    capacity: usize,
    anchor: Option<&ContentUnit>,
    rng: &mut impl Rng,
) -> Vec<ContentUnit> {
    let mut pool: Vec<&ContentUnit> = catalog
        .iter()
        .filter(|u| u.status == UnitStatus::Live)
        .collect();
    pool.shuffle(rng);

    if let Some(anchor) = anchor {
        pool.retain(|u| u.id != anchor.id);
        pool.sort_by_key(|u| std::cmp::Reverse(anchor.relatedness(u)));
        pool.insert(0, anchor);
    }

    pool.into_iter().take(capacity).cloned().collect()
}

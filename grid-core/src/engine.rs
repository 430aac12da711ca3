//! Double-buffered, ownership-tracked cellular automaton.
//!
//! The rule is Conway's B3/S23 with one addition: a birth inherits the owner
//! held by the plurality of its live neighbours. [`GridEngine::step`] reads the
//! `current` buffer and writes the `pending` one; [`GridEngine::commit`] makes
//! `pending` authoritative. Between the two, renderers cross-fade each cell
//! with [`GridEngine::visible_alpha`] and [`GridEngine::visible_owner`].

use crate::types::OwnerId;

/// Row-major offsets of the Moore neighbourhood, centre excluded.
///
/// The order matters: birth ownership ties resolve to the owner seen first.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// State of a single cell in one buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub alive: bool,
    pub owner: Option<OwnerId>,
}

impl Cell {
    pub const DEAD: Cell = Cell {
        alive: false,
        owner: None,
    };

    pub fn live(owner: Option<OwnerId>) -> Self {
        Self { alive: true, owner }
    }
}

/// One flat generation buffer, indexed `y * width + x`.
#[derive(Clone, Debug)]
struct CellBuffer {
    alive: Vec<bool>,
    owner: Vec<Option<OwnerId>>,
}

impl CellBuffer {
    fn with_len(len: usize) -> Self {
        Self {
            alive: vec![false; len],
            owner: vec![None; len],
        }
    }

    #[inline]
    fn get(&self, i: usize) -> Cell {
        Cell {
            alive: self.alive[i],
            owner: self.owner[i],
        }
    }

    #[inline]
    fn set(&mut self, i: usize, cell: Cell) {
        self.alive[i] = cell.alive;
        self.owner[i] = if cell.alive { cell.owner } else { None };
    }

    fn copy_from(&mut self, other: &CellBuffer) {
        self.alive.copy_from_slice(&other.alive);
        self.owner.copy_from_slice(&other.owner);
    }
}

/// Live-neighbour summary of one cell.
///
/// Owners are kept in first-encounter order of the row-major scan, which is
/// what [`NeighborTally::plurality_owner`] relies on for tie breaking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborTally {
    /// Number of live neighbours, owned or not.
    pub alive: u8,
    owners: [(OwnerId, u8); 8],
    distinct: u8,
}

impl NeighborTally {
    fn record(&mut self, owner: Option<OwnerId>) {
        self.alive += 1;
        let Some(owner) = owner else {
            return;
        };
        let n = self.distinct as usize;
        if let Some(slot) = self.owners[..n].iter_mut().find(|(o, _)| *o == owner) {
            slot.1 += 1;
        } else {
            self.owners[n] = (owner, 1);
            self.distinct += 1;
        }
    }

    /// Distinct owners with their live-neighbour counts, in scan order.
    pub fn owners(&self) -> &[(OwnerId, u8)] {
        &self.owners[..self.distinct as usize]
    }

    /// Owner with the most live neighbours; ties keep the earliest scanned.
    pub fn plurality_owner(&self) -> Option<OwnerId> {
        let mut best: Option<(OwnerId, u8)> = None;
        for &(owner, count) in self.owners() {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((owner, count)),
            }
        }
        best.map(|(owner, _)| owner)
    }
}

/// How a cell changes between the current and pending generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellPhase {
    Steady,
    Dying,
    Born,
    Empty,
}

/// Fixed-size grid with a current and a pending generation.
#[derive(Clone, Debug)]
pub struct GridEngine {
    width: usize,
    height: usize,
    current: CellBuffer,
    pending: CellBuffer,
    generation: u64,
}

impl GridEngine {
    /// Creates an all-dead grid of `width × height` cells.
    pub fn new(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            current: CellBuffer::with_len(len),
            pending: CellBuffer::with_len(len),
            generation: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Number of generations committed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    #[inline]
    fn index_signed(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        self.index(x as usize, y as usize)
    }

    /// Current (committed) state of a cell; dead when out of bounds.
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.index(x, y).map_or(Cell::DEAD, |i| self.current.get(i))
    }

    /// Pending (next) state of a cell; dead when out of bounds.
    pub fn pending_cell(&self, x: usize, y: usize) -> Cell {
        self.index(x, y).map_or(Cell::DEAD, |i| self.pending.get(i))
    }

    /// Number of live cells in the current generation.
    pub fn alive_count(&self) -> usize {
        self.current.alive.iter().filter(|&&a| a).count()
    }

    /// Writes a cell of the current generation directly.
    ///
    /// Used by seeding and disturbance only, never mid-interpolation. The
    /// pending buffer is mirrored so the cell reads as steady until the next
    /// [`GridEngine::step`]. A dead cell never keeps an owner. Out-of-bounds
    /// writes are ignored.
    pub fn set_cell(&mut self, x: usize, y: usize, alive: bool, owner: Option<OwnerId>) {
        if let Some(i) = self.index(x, y) {
            let cell = Cell { alive, owner };
            self.current.set(i, cell);
            self.pending.set(i, cell);
        }
    }

    /// Live-neighbour count and owner tally over the Moore neighbourhood.
    ///
    /// Neighbours outside the grid are absent; there is no wraparound.
    pub fn neighbor_counts(&self, x: usize, y: usize) -> NeighborTally {
        let mut tally = NeighborTally::default();
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let Some(i) = self.index_signed(x as isize + dx, y as isize + dy) else {
                continue;
            };
            if self.current.alive[i] {
                tally.record(self.current.owner[i]);
            }
        }
        tally
    }

    /// Computes the pending generation from the current one.
    ///
    /// The current buffer is not touched.
    pub fn step(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                let tally = self.neighbor_counts(x, y);
                let next = if self.current.alive[i] {
                    match tally.alive {
                        2 | 3 => Cell::live(self.current.owner[i]),
                        _ => Cell::DEAD,
                    }
                } else if tally.alive == 3 {
                    Cell::live(tally.plurality_owner())
                } else {
                    Cell::DEAD
                };
                self.pending.set(i, next);
            }
        }
    }

    /// Makes the pending generation authoritative.
    ///
    /// Afterwards the pending buffer mirrors the new current one, so
    /// interpolation queries are steady until the next [`GridEngine::step`].
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.current, &mut self.pending);
        self.pending.copy_from(&self.current);
        self.generation += 1;
    }

    /// Classifies how a cell changes from current to pending.
    pub fn phase(&self, x: usize, y: usize) -> CellPhase {
        let Some(i) = self.index(x, y) else {
            return CellPhase::Empty;
        };
        match (self.current.alive[i], self.pending.alive[i]) {
            (true, true) => CellPhase::Steady,
            (true, false) => CellPhase::Dying,
            (false, true) => CellPhase::Born,
            (false, false) => CellPhase::Empty,
        }
    }

    /// Opacity of a cell at `progress` through the current interval.
    ///
    /// Dying cells fade out linearly and born cells fade in linearly.
    /// Out-of-bounds cells report `0.0`.
    pub fn visible_alpha(&self, x: usize, y: usize, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match self.phase(x, y) {
            CellPhase::Steady => 1.0,
            CellPhase::Dying => 1.0 - p,
            CellPhase::Born => p,
            CellPhase::Empty => 0.0,
        }
    }

    /// Owner shown for a cell at `progress` through the current interval.
    ///
    /// Ownership never blends: a dying cell loses its owner at the midpoint
    /// and a born cell gains its new owner at the midpoint.
    pub fn visible_owner(&self, x: usize, y: usize, progress: f32) -> Option<OwnerId> {
        let p = progress.clamp(0.0, 1.0);
        let i = self.index(x, y)?;
        match self.phase(x, y) {
            CellPhase::Steady => self.current.owner[i],
            CellPhase::Dying if p < 0.5 => self.current.owner[i],
            CellPhase::Born if p >= 0.5 => self.pending.owner[i],
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(width: usize, height: usize, cells: &[(usize, usize, OwnerId)]) -> GridEngine {
        let mut engine = GridEngine::new(width, height);
        for &(x, y, owner) in cells {
            engine.set_cell(x, y, true, Some(owner));
        }
        engine
    }

    #[test]
    fn new_grid_is_all_dead() {
        let engine = GridEngine::new(6, 4);
        assert_eq!(engine.area(), 24);
        assert_eq!(engine.alive_count(), 0);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn set_cell_dead_clears_owner_and_ignores_out_of_bounds() {
        let mut engine = GridEngine::new(4, 4);
        engine.set_cell(1, 1, false, Some(3));
        assert_eq!(engine.cell(1, 1), Cell::DEAD);

        engine.set_cell(9, 1, true, Some(3));
        assert_eq!(engine.alive_count(), 0);
    }

    #[test]
    fn set_cell_reads_steady_until_step() {
        let mut engine = GridEngine::new(4, 4);
        engine.set_cell(2, 2, true, Some(1));
        assert_eq!(engine.phase(2, 2), CellPhase::Steady);
        assert_eq!(engine.visible_owner(2, 2, 0.9), Some(1));

        engine.step();
        assert_eq!(engine.phase(2, 2), CellPhase::Dying);
    }

    #[test]
    fn neighbor_counts_skip_outside_cells() {
        let engine = engine_with(3, 3, &[(1, 0, 0), (0, 1, 1), (1, 1, 2)]);
        let corner = engine.neighbor_counts(0, 0);
        assert_eq!(corner.alive, 3);
        assert_eq!(corner.owners(), &[(0, 1), (1, 1), (2, 1)]);

        let far = engine.neighbor_counts(2, 2);
        assert_eq!(far.alive, 1);
        assert_eq!(far.owners(), &[(2, 1)]);
    }

    #[test]
    fn survivors_keep_owner_and_others_die() {
        // Horizontal blinker owned by three different units.
        let mut engine = engine_with(5, 5, &[(1, 2, 4), (2, 2, 5), (3, 2, 6)]);
        engine.step();

        // The middle cell has 2 neighbours and keeps its owner.
        assert_eq!(engine.pending_cell(2, 2), Cell::live(Some(5)));
        // The ends have 1 neighbour and die, clearing their owners.
        assert_eq!(engine.pending_cell(1, 2), Cell::DEAD);
        assert_eq!(engine.pending_cell(3, 2), Cell::DEAD);
        // Current buffer is untouched by step.
        assert_eq!(engine.cell(1, 2), Cell::live(Some(4)));
    }

    #[test]
    fn birth_takes_plurality_owner() {
        // (2,1) is born from (1,2)=7, (2,2)=9 and (3,2)=9.
        let mut engine = engine_with(5, 5, &[(1, 2, 7), (2, 2, 9), (3, 2, 9)]);
        engine.step();
        assert_eq!(engine.pending_cell(2, 1), Cell::live(Some(9)));
        assert_eq!(engine.pending_cell(2, 3), Cell::live(Some(9)));
    }

    #[test]
    fn birth_tie_keeps_first_scanned_owner() {
        // All three owners differ; the first in row-major scan order wins.
        let mut engine = engine_with(5, 5, &[(1, 2, 7), (2, 2, 8), (3, 2, 9)]);
        engine.step();
        // Above the row, the neighbours scan as (1,2), (2,2), (3,2).
        assert_eq!(engine.pending_cell(2, 1).owner, Some(7));
        assert_eq!(engine.pending_cell(2, 3).owner, Some(7));
    }

    #[test]
    fn plurality_owner_uses_strict_comparison() {
        let mut tally = NeighborTally::default();
        tally.record(Some(3));
        tally.record(Some(1));
        tally.record(None);
        assert_eq!(tally.alive, 3);
        assert_eq!(tally.plurality_owner(), Some(3));

        tally.record(Some(1));
        assert_eq!(tally.plurality_owner(), Some(1));
    }

    #[test]
    fn birth_from_unowned_neighbours_is_unowned() {
        let mut engine = GridEngine::new(5, 5);
        for x in 1..4 {
            engine.set_cell(x, 2, true, None);
        }
        engine.step();
        assert_eq!(engine.pending_cell(2, 1), Cell::live(None));
    }

    #[test]
    fn solid_block_erodes_to_its_border() {
        let cells: Vec<_> = (4..7)
            .flat_map(|y| (4..7).map(move |x| (x, y, 2)))
            .collect();
        let mut engine = engine_with(10, 10, &cells);
        engine.step();

        // Centre has 8 neighbours and dies.
        assert_eq!(engine.pending_cell(5, 5), Cell::DEAD);
        // Corners have 3 neighbours and survive.
        for (x, y) in [(4, 4), (6, 4), (4, 6), (6, 6)] {
            assert_eq!(engine.pending_cell(x, y), Cell::live(Some(2)));
        }
        // Edge midpoints have 5 neighbours and die.
        for (x, y) in [(5, 4), (4, 5), (6, 5), (5, 6)] {
            assert_eq!(engine.pending_cell(x, y), Cell::DEAD);
        }
        // Cells just outside each edge midpoint are born with the block's owner.
        for (x, y) in [(5, 3), (3, 5), (7, 5), (5, 7)] {
            assert_eq!(engine.pending_cell(x, y), Cell::live(Some(2)));
        }
    }

    #[test]
    fn commit_promotes_pending_and_counts_generations() {
        let mut engine = engine_with(5, 5, &[(1, 2, 0), (2, 2, 0), (3, 2, 0)]);
        engine.step();
        engine.commit();

        assert_eq!(engine.generation(), 1);
        assert!(engine.cell(2, 1).alive);
        assert!(!engine.cell(1, 2).alive);
        // Until the next step, every cell is steady or empty.
        assert_eq!(engine.phase(2, 1), CellPhase::Steady);
        assert_eq!(engine.phase(1, 2), CellPhase::Empty);
    }

    #[test]
    fn empty_grid_stays_empty() {
        let mut engine = GridEngine::new(8, 8);
        engine.step();
        engine.commit();
        assert_eq!(engine.alive_count(), 0);
    }

    #[test]
    fn dying_alpha_decreases_from_one() {
        let mut engine = engine_with(5, 5, &[(1, 2, 4), (2, 2, 5), (3, 2, 6)]);
        engine.step();
        assert_eq!(engine.visible_alpha(1, 2, 0.0), 1.0);
        let mut last = f32::MAX;
        for i in 0..=10 {
            let a = engine.visible_alpha(1, 2, i as f32 / 10.0);
            assert!(a <= last);
            last = a;
        }
        assert_eq!(engine.visible_alpha(1, 2, 1.0), 0.0);
    }

    #[test]
    fn born_alpha_increases_from_zero() {
        let mut engine = engine_with(5, 5, &[(1, 2, 4), (2, 2, 5), (3, 2, 6)]);
        engine.step();
        assert_eq!(engine.visible_alpha(2, 1, 0.0), 0.0);
        let mut last = f32::MIN;
        for i in 0..=10 {
            let a = engine.visible_alpha(2, 1, i as f32 / 10.0);
            assert!(a >= last);
            last = a;
        }
        assert_eq!(engine.visible_alpha(2, 1, 1.0), 1.0);
    }

    #[test]
    fn owners_switch_at_midpoint() {
        let mut engine = engine_with(5, 5, &[(1, 2, 4), (2, 2, 5), (3, 2, 6)]);
        engine.step();

        // Dying end cell.
        assert_eq!(engine.visible_owner(1, 2, 0.0), Some(4));
        assert_eq!(engine.visible_owner(1, 2, 0.49), Some(4));
        assert_eq!(engine.visible_owner(1, 2, 0.5), None);
        assert_eq!(engine.visible_owner(1, 2, 0.9), None);

        // Born cell above the middle.
        assert_eq!(engine.visible_owner(2, 1, 0.2), None);
        assert_eq!(engine.visible_owner(2, 1, 0.49), None);
        assert_eq!(engine.visible_owner(2, 1, 0.5), Some(4));
        assert_eq!(engine.visible_owner(2, 1, 1.0), Some(4));

        // Steady middle cell.
        assert_eq!(engine.visible_owner(2, 2, 0.7), Some(5));
        assert_eq!(engine.visible_alpha(2, 2, 0.7), 1.0);
    }

    #[test]
    fn out_of_bounds_queries_are_inert() {
        let engine = engine_with(3, 3, &[(0, 0, 1)]);
        assert_eq!(engine.visible_alpha(3, 0, 0.5), 0.0);
        assert_eq!(engine.visible_owner(0, 7, 0.5), None);
        assert_eq!(engine.cell(10, 10), Cell::DEAD);
        assert_eq!(engine.phase(3, 3), CellPhase::Empty);
    }
}

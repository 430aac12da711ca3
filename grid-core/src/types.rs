/// Identifier for an owner (content unit) of a live cell.
///
/// This is an index into the active-unit list of the current layer, and is
/// only meaningful within the lifetime of that layer.
pub type OwnerId = usize;

/// Cell coordinate on the grid, `(x, y)` with the origin at the top left.
pub type CellCoord = (usize, usize);

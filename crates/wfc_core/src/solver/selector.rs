//! Minimum-entropy cell selection.

use crate::grid::{CellStatus, Coord, Grid};
use crate::rng::WfcRng;

/// Pick the open cell with the fewest candidates.
///
/// Ties are collected in grid index order and one is drawn uniformly.
/// Returns `None` once every cell is collapsed.
///
/// # Panics
/// Panics if an open cell has an empty domain; propagation and
/// backtracking never leave one behind.
pub fn select_next(grid: &Grid, rng: &mut dyn WfcRng) -> Option<Coord> {
    let mut best = usize::MAX;
    let mut ties: Vec<Coord> = Vec::new();

    for cell in grid.cells() {
        if cell.status != CellStatus::Open {
            continue;
        }
        let size = cell.domain.len();
        assert!(size > 0, "open cell {} has an empty domain", cell.coord);
        if size < best {
            best = size;
            ties.clear();
            ties.push(cell.coord);
        } else if size == best {
            ties.push(cell.coord);
        }
    }

    match ties.len() {
        0 => None,
        1 => Some(ties[0]),
        n => Some(ties[rng.next_usize_max(n)]),
    }
}

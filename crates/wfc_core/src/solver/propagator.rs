//! Arc-consistency propagation over the six neighbor directions.
//!
//! Every shrink is recorded on a [`Trail`] so that a later backtrack can
//! restore exactly the cells a decision touched.

use crate::catalog::ModuleId;
use crate::direction::Direction;
use crate::grid::{CellStatus, Coord, Domain, Grid};
use crate::oracle::CompatibilityOracle;
use std::collections::VecDeque;
use tracing::trace;

/// A neighbor whose filtered domain came out empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contradiction {
    pub coord: Coord,
}

/// Undo log of prior domains, newest last.
///
/// Entries are `(cell index, domain before the change)`. Only open cells
/// are ever trailed, so rewinding also reopens them.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    entries: Vec<(usize, Domain)>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length, used as a rewind mark.
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn record(&mut self, index: usize, previous: Domain) {
        self.entries.push((index, previous));
    }

    /// Restore every entry past `mark`, newest first. Returns how many
    /// cells were restored.
    pub fn rewind(&mut self, grid: &mut Grid, mark: usize) -> usize {
        let mut restored = 0;
        while self.entries.len() > mark {
            let Some((index, previous)) = self.entries.pop() else {
                break;
            };
            let cell = grid.cell_at_mut(index);
            cell.domain = previous;
            cell.status = CellStatus::Open;
            restored += 1;
        }
        restored
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Propagate from a single changed cell.
pub fn propagate(
    grid: &mut Grid,
    oracle: &CompatibilityOracle,
    start: Coord,
    trail: &mut Trail,
) -> Result<(), Contradiction> {
    propagate_from_many(grid, oracle, std::iter::once(start), trail)
}

/// Propagate from several seeds at once (used after constraints are
/// applied). The queue is FIFO; a cell is enqueued at most once at a
/// time and may be reprocessed after it shrinks again. Seeds outside
/// the grid are ignored.
pub fn propagate_from_many(
    grid: &mut Grid,
    oracle: &CompatibilityOracle,
    seeds: impl IntoIterator<Item = Coord>,
    trail: &mut Trail,
) -> Result<(), Contradiction> {
    let mut queue = VecDeque::new();
    let mut queued = vec![false; grid.len()];
    for c in seeds.into_iter().filter(|&c| grid.contains(c)) {
        let i = grid.index(c);
        if !queued[i] {
            queued[i] = true;
            queue.push_back(c);
        }
    }

    while let Some(current) = queue.pop_front() {
        let ci = grid.index(current);
        queued[ci] = false;

        for direction in Direction::ALL {
            let Some(neighbor) = grid.neighbor(current, direction) else {
                continue;
            };
            let ni = grid.index(neighbor);
            if grid.cell_at(ni).is_collapsed() {
                continue;
            }

            let source = &grid.cell_at(ci).domain;
            let before = &grid.cell_at(ni).domain;
            let supported = |b: ModuleId| source.iter().any(|a| oracle.compatible(a, b, direction));
            let narrowed = before.filtered(supported);

            if narrowed.is_empty() {
                trace!(
                    x = neighbor.x,
                    y = neighbor.y,
                    z = neighbor.z,
                    "domain emptied"
                );
                return Err(Contradiction { coord: neighbor });
            }
            if narrowed.len() == before.len() {
                continue;
            }

            let previous = std::mem::replace(&mut grid.cell_at_mut(ni).domain, narrowed);
            trail.record(ni, previous);
            if !queued[ni] {
                queued[ni] = true;
                queue.push_back(neighbor);
            }
        }
    }
    Ok(())
}

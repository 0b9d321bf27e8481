//! Chronological backtracking over collapse decisions.
//!
//! Each collapse pushes a [`BacktrackRecord`]. Undoing a record rewinds
//! the trail to the mark it was taken at, then reopens the cell with the
//! failed choice removed. Nothing outside the cells a decision touched is
//! rebuilt.

use super::propagator::{propagate, Trail};
use crate::catalog::ModuleId;
use crate::grid::{CellStatus, Coord, Domain, Grid};
use crate::oracle::CompatibilityOracle;
use tracing::debug;

/// One collapse decision.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktrackRecord {
    pub coord: Coord,
    /// Domain of the cell immediately before it was collapsed.
    pub snapshot: Domain,
    pub chosen: ModuleId,
    /// Trail length when the decision was made.
    pub trail_mark: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktrackOutcome {
    /// Search can continue; the reopened cell is returned.
    Resumed(Coord),
    /// No decision is left to revise.
    Exhausted,
}

/// What a backtrack call did, for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktrackReport {
    pub outcome: BacktrackOutcome,
    /// Records popped, including the one that resumed.
    pub popped: usize,
    /// Records discarded because every alternative was ruled out.
    pub exhausted: usize,
}

/// Undo decisions, newest first, until one leaves a consistent grid.
///
/// Records whose coordinate lies outside the grid are discarded.
pub fn backtrack(
    grid: &mut Grid,
    oracle: &CompatibilityOracle,
    stack: &mut Vec<BacktrackRecord>,
    trail: &mut Trail,
) -> BacktrackReport {
    let mut popped = 0;
    let mut exhausted = 0;

    loop {
        let Some(record) = stack.pop() else {
            return BacktrackReport {
                outcome: BacktrackOutcome::Exhausted,
                popped,
                exhausted,
            };
        };
        popped += 1;

        trail.rewind(grid, record.trail_mark);
        if !grid.contains(record.coord) {
            exhausted += 1;
            continue;
        }

        let index = grid.index(record.coord);
        let remaining = record.snapshot.without(record.chosen);
        let cell = grid.cell_at_mut(index);
        cell.domain = remaining;
        cell.status = CellStatus::Open;
        // An older undo must unwind this restore as well.
        trail.record(index, record.snapshot.clone());

        let left = grid.cell_at(index).domain.len();
        debug!(
            x = record.coord.x,
            y = record.coord.y,
            z = record.coord.z,
            excluded = record.chosen.index(),
            remaining = left,
            depth = stack.len(),
            "backtrack"
        );

        if left == 0 {
            exhausted += 1;
            continue;
        }

        if let Err(contradiction) = propagate(grid, oracle, record.coord, trail) {
            debug!(
                x = contradiction.coord.x,
                y = contradiction.coord.y,
                z = contradiction.coord.z,
                "restored domain still contradicts"
            );
            continue;
        }
        return BacktrackReport {
            outcome: BacktrackOutcome::Resumed(record.coord),
            popped,
            exhausted,
        };
    }
}

//! Weighted observation of a single cell.

use super::backtrack::BacktrackRecord;
use super::propagator::Trail;
use crate::catalog::{ModuleCatalog, ModuleId};
use crate::grid::{CellStatus, Coord, Domain, Grid};
use crate::rng::WfcRng;

/// Pick an id from `domain` in proportion to its weight.
///
/// Draws `r` in `[0, total)` and walks the ids ascending until the
/// running sum exceeds `r`, so zero-weight ids are never picked while
/// some weight is positive. When every weight is zero the lowest id
/// wins and no draw is consumed.
pub fn weighted_choice(
    domain: &Domain,
    catalog: &ModuleCatalog,
    rng: &mut dyn WfcRng,
) -> Option<ModuleId> {
    let first = domain.iter().next()?;
    let total: f64 = domain.iter().map(|id| catalog.weight(id)).sum();
    if total <= 0.0 {
        return Some(first);
    }

    let r = rng.next_double() * total;
    let mut acc = 0.0;
    let mut last_positive = first;
    for id in domain.iter() {
        let w = catalog.weight(id);
        if w <= 0.0 {
            continue;
        }
        acc += w;
        last_positive = id;
        if acc > r {
            return Some(id);
        }
    }
    // Rounding can leave acc a hair under r.
    Some(last_positive)
}

/// Fix the cell at `coord` to one weighted choice and push the decision.
///
/// Returns `None` without touching the grid when `coord` is outside it
/// or its domain is empty. The caller propagates afterwards.
pub fn collapse(
    grid: &mut Grid,
    catalog: &ModuleCatalog,
    coord: Coord,
    rng: &mut dyn WfcRng,
    stack: &mut Vec<BacktrackRecord>,
    trail: &Trail,
) -> Option<ModuleId> {
    if !grid.contains(coord) {
        return None;
    }
    let index = grid.index(coord);
    let snapshot = grid.cell_at(index).domain.clone();
    let chosen = weighted_choice(&snapshot, catalog, rng)?;

    let cell = grid.cell_at_mut(index);
    cell.domain = Domain::singleton(chosen);
    cell.status = CellStatus::Collapsed;

    stack.push(BacktrackRecord {
        coord,
        snapshot,
        chosen,
        trail_mark: trail.mark(),
    });
    Some(chosen)
}

//! The 3D grid of cells and their candidate domains.
//!
//! Indexing follows `index = x + y * mx + z * mx * my`, the same layout
//! the rest of the crate uses for flat per-cell buffers.

use crate::catalog::{ModuleCatalog, ModuleId};
use crate::constraint::Constraint;
use crate::direction::Direction;
use crate::error::SolverError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Grid size along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub mx: usize,
    pub my: usize,
    pub mz: usize,
}

impl Dimensions {
    pub const fn new(mx: usize, my: usize, mz: usize) -> Self {
        Self { mx, my, mz }
    }

    /// Total number of cells, or `None` if it overflows `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        self.mx.checked_mul(self.my)?.checked_mul(self.mz)
    }

    pub fn contains(&self, c: Coord) -> bool {
        c.x < self.mx && c.y < self.my && c.z < self.mz
    }

    #[inline]
    pub fn index(&self, c: Coord) -> usize {
        c.x + c.y * self.mx + c.z * self.mx * self.my
    }

    #[inline]
    pub fn coord(&self, i: usize) -> Coord {
        Coord {
            x: i % self.mx,
            y: (i % (self.mx * self.my)) / self.mx,
            z: i / (self.mx * self.my),
        }
    }

    /// Neighbor of `c` in `direction`, or `None` past the boundary.
    pub fn neighbor(&self, c: Coord, direction: Direction) -> Option<Coord> {
        let (dx, dy, dz) = direction.offset();
        let x = c.x.checked_add_signed(dx as isize)?;
        let y = c.y.checked_add_signed(dy as isize)?;
        let z = c.z.checked_add_signed(dz as isize)?;
        let n = Coord { x, y, z };
        self.contains(n).then_some(n)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.mx, self.my, self.mz)
    }
}

/// Set of still-possible module ids, kept sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Domain(Vec<ModuleId>);

impl Domain {
    /// Build from any ids; sorts and removes duplicates.
    pub fn from_ids(ids: impl IntoIterator<Item = ModuleId>) -> Self {
        let mut v: Vec<ModuleId> = ids.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn singleton(id: ModuleId) -> Self {
        Self(vec![id])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[ModuleId] {
        &self.0
    }

    /// The only remaining id, if exactly one is left.
    pub fn single(&self) -> Option<ModuleId> {
        match self.0.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Copy of this domain without `id`.
    pub fn without(&self, id: ModuleId) -> Domain {
        Domain(self.0.iter().copied().filter(|&m| m != id).collect())
    }

    /// Ids of `self` that also appear in `other`.
    pub fn intersection(&self, other: &Domain) -> Domain {
        self.filtered(|m| other.contains(m))
    }

    /// Keep only the ids matching `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(ModuleId) -> bool) -> Domain {
        Domain(self.0.iter().copied().filter(|&m| keep(m)).collect())
    }
}

impl FromIterator<ModuleId> for Domain {
    fn from_iter<I: IntoIterator<Item = ModuleId>>(iter: I) -> Self {
        Domain::from_ids(iter)
    }
}

/// Whether the solver has fixed a cell.
///
/// Tracked separately from domain size: a cell narrowed to one id by
/// propagation is still `Open` until the solver collapses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Open,
    Collapsed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub coord: Coord,
    pub domain: Domain,
    pub status: CellStatus,
}

impl Cell {
    pub fn is_collapsed(&self) -> bool {
        self.status == CellStatus::Collapsed
    }

    /// The assigned module of a collapsed cell.
    pub fn assigned(&self) -> Option<ModuleId> {
        if self.is_collapsed() {
            self.domain.single()
        } else {
            None
        }
    }
}

/// Dense 3D array of cells. Dimensions are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    dims: Dimensions,
    cells: Vec<Cell>,
}

impl Grid {
    /// Every cell open with the full catalog as its domain.
    ///
    /// Sizes whose cell or candidate count overflows, or whose cells
    /// cannot be allocated, are rejected before anything is built.
    pub fn new(dims: Dimensions, catalog: &ModuleCatalog) -> Result<Self, SolverError> {
        if dims.mx == 0 || dims.my == 0 || dims.mz == 0 {
            return Err(SolverError::InvalidDimensions(dims.mx, dims.my, dims.mz));
        }
        if catalog.is_empty() {
            return Err(SolverError::EmptyCatalog);
        }
        let too_large = || SolverError::GridTooLarge(dims.mx, dims.my, dims.mz);
        let count = dims.cell_count().ok_or_else(too_large)?;
        if count.checked_mul(catalog.len()).is_none() {
            return Err(too_large());
        }

        let mut cells = Vec::new();
        cells.try_reserve_exact(count).map_err(|_| too_large())?;
        let full = Domain::from_ids(catalog.all_ids());
        cells.extend((0..count).map(|i| Cell {
            coord: dims.coord(i),
            domain: full.clone(),
            status: CellStatus::Open,
        }));
        Ok(Self { dims, cells })
    }

    /// Whether `c` lies inside the grid.
    pub fn contains(&self, c: Coord) -> bool {
        self.dims.contains(c)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index(&self, c: Coord) -> usize {
        self.dims.index(c)
    }

    pub fn neighbor(&self, c: Coord, direction: Direction) -> Option<Coord> {
        self.dims.neighbor(c, direction)
    }

    pub fn cell(&self, c: Coord) -> Option<&Cell> {
        if self.dims.contains(c) {
            self.cells.get(self.dims.index(c))
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn cell_at(&self, i: usize) -> &Cell {
        &self.cells[i]
    }

    #[inline]
    pub(crate) fn cell_at_mut(&mut self, i: usize) -> &mut Cell {
        &mut self.cells[i]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Intersect every cell in the constraint's region with its allowed
    /// set. Returns the coordinates whose domain shrank.
    ///
    /// An emptied domain means the instance is invalid; nothing past the
    /// first such cell is touched.
    pub fn apply_constraint(&mut self, constraint: &Constraint) -> Result<Vec<Coord>, SolverError> {
        let allowed = Domain::from_ids(constraint.allowed.iter().copied());
        let dims = self.dims;
        let mut changed = Vec::new();
        for cell in self.cells.iter_mut() {
            if !constraint.region.contains(cell.coord, dims) {
                continue;
            }
            let narrowed = cell.domain.intersection(&allowed);
            if narrowed.is_empty() {
                return Err(SolverError::ConstraintEmptiedDomain { coord: cell.coord });
            }
            if narrowed.len() < cell.domain.len() {
                cell.domain = narrowed;
                changed.push(cell.coord);
            }
        }
        Ok(changed)
    }

    /// First open cell with an empty domain. The solver asserts this
    /// holds after every successful propagation.
    pub fn verify_consistency(&self) -> Result<(), Coord> {
        match self
            .cells
            .iter()
            .find(|c| c.status == CellStatus::Open && c.domain.is_empty())
        {
            Some(c) => Err(c.coord),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Module;
    use crate::constraint::Region;

    fn catalog(n: usize) -> ModuleCatalog {
        let mut c = ModuleCatalog::new();
        for i in 0..n {
            c.register_default(Module::new(format!("m{}", i))).unwrap();
        }
        c
    }

    #[test]
    fn test_grid_new_fills_full_domains() {
        let grid = Grid::new(Dimensions::new(2, 3, 4), &catalog(3)).unwrap();
        assert_eq!(grid.len(), 24);
        for cell in grid.cells() {
            assert_eq!(cell.domain.len(), 3);
            assert_eq!(cell.status, CellStatus::Open);
        }
    }

    #[test]
    fn test_grid_rejects_zero_dimension_and_empty_catalog() {
        assert_eq!(
            Grid::new(Dimensions::new(0, 1, 1), &catalog(1)),
            Err(SolverError::InvalidDimensions(0, 1, 1))
        );
        assert_eq!(
            Grid::new(Dimensions::new(1, 1, 1), &catalog(0)),
            Err(SolverError::EmptyCatalog)
        );
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let huge = usize::MAX / 2;
        assert_eq!(Dimensions::new(huge, 4, 1).cell_count(), None);
        assert_eq!(
            Grid::new(Dimensions::new(huge, 4, 1), &catalog(2)),
            Err(SolverError::GridTooLarge(huge, 4, 1))
        );
        // The cell count fits but no allocator can provide it.
        let dims = Dimensions::new(1 << 20, 1 << 20, 1 << 20);
        assert_eq!(
            Grid::new(dims, &catalog(1)),
            Err(SolverError::GridTooLarge(1 << 20, 1 << 20, 1 << 20))
        );
    }

    #[test]
    fn test_index_coord_roundtrip() {
        let dims = Dimensions::new(3, 4, 5);
        assert_eq!(dims.cell_count(), Some(60));
        for i in 0..60 {
            assert_eq!(dims.index(dims.coord(i)), i);
        }
        assert_eq!(dims.index(Coord::new(1, 2, 3)), 1 + 2 * 3 + 3 * 12);
    }

    #[test]
    fn test_neighbor_bounds() {
        let dims = Dimensions::new(2, 1, 1);
        let origin = Coord::new(0, 0, 0);
        let east = Coord::new(1, 0, 0);
        assert_eq!(dims.neighbor(origin, Direction::PosX), Some(east));
        assert_eq!(dims.neighbor(origin, Direction::NegX), None);
        assert_eq!(dims.neighbor(origin, Direction::PosY), None);
        assert_eq!(dims.neighbor(east, Direction::PosX), None);
    }

    #[test]
    fn test_domain_ops() {
        let d = Domain::from_ids([ModuleId(3), ModuleId(1), ModuleId(3), ModuleId(2)]);
        assert_eq!(d.as_slice(), &[ModuleId(1), ModuleId(2), ModuleId(3)]);
        assert!(d.contains(ModuleId(2)));
        let odd = [ModuleId(1), ModuleId(3)];
        assert_eq!(d.without(ModuleId(2)).as_slice(), &odd);
        let other = Domain::from_ids([ModuleId(3), ModuleId(7)]);
        assert_eq!(d.intersection(&other).single(), Some(ModuleId(3)));
        assert_eq!(d.single(), None);
    }

    #[test]
    fn test_apply_constraint_narrows_matching_cells() {
        let mut grid = Grid::new(Dimensions::new(2, 2, 1), &catalog(3)).unwrap();
        let constraint = Constraint::new(Region::BottomLayer, [ModuleId(1), ModuleId(2)]);
        let changed = grid.apply_constraint(&constraint).unwrap();
        assert_eq!(changed, vec![Coord::new(0, 0, 0), Coord::new(1, 0, 0)]);
        assert_eq!(grid.cell(Coord::new(0, 0, 0)).unwrap().domain.len(), 2);
        assert_eq!(grid.cell(Coord::new(0, 1, 0)).unwrap().domain.len(), 3);
    }

    #[test]
    fn test_apply_constraint_empty_domain_fails() {
        let mut grid = Grid::new(Dimensions::new(1, 1, 1), &catalog(2)).unwrap();
        let first = Constraint::new(Region::All, [ModuleId(0)]);
        let second = Constraint::new(Region::All, [ModuleId(1)]);
        grid.apply_constraint(&first).unwrap();
        let err = grid.apply_constraint(&second).unwrap_err();
        assert_eq!(
            err,
            SolverError::ConstraintEmptiedDomain {
                coord: Coord::new(0, 0, 0)
            }
        );
    }

    #[test]
    fn test_collapsed_status_independent_of_domain_size() {
        let mut grid = Grid::new(Dimensions::new(1, 1, 1), &catalog(2)).unwrap();
        let pin = Constraint::new(Region::All, [ModuleId(1)]);
        grid.apply_constraint(&pin).unwrap();
        let cell = grid.cell(Coord::new(0, 0, 0)).unwrap();
        assert_eq!(cell.domain.single(), Some(ModuleId(1)));
        assert_eq!(cell.status, CellStatus::Open);
        assert_eq!(cell.assigned(), None);
        assert!(grid.verify_consistency().is_ok());
    }
}

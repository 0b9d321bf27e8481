//! Structural constraints applied before search begins.
//!
//! A constraint pins every cell of a region to a subset of the catalog,
//! e.g. "the bottom layer may only hold ground pieces".

use crate::catalog::ModuleId;
use crate::grid::{Coord, Dimensions};
use std::fmt;
use std::sync::Arc;

/// Grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn parse(s: &str) -> Option<Axis> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    fn component(self, c: Coord) -> usize {
        match self {
            Axis::X => c.x,
            Axis::Y => c.y,
            Axis::Z => c.z,
        }
    }

    fn extent(self, dims: Dimensions) -> usize {
        match self {
            Axis::X => dims.mx,
            Axis::Y => dims.my,
            Axis::Z => dims.mz,
        }
    }
}

pub type CoordPredicate = Arc<dyn Fn(Coord) -> bool + Send + Sync>;

/// Which cells a constraint applies to.
#[derive(Clone)]
pub enum Region {
    All,
    Cell(Coord),
    /// One slice perpendicular to `axis`.
    Layer { axis: Axis, index: usize },
    /// `y == 0`.
    BottomLayer,
    /// `y == my - 1`.
    TopLayer,
    /// Every cell touching the outside of the grid on a horizontal face.
    Boundary,
    Predicate(CoordPredicate),
}

impl Region {
    pub fn predicate(f: impl Fn(Coord) -> bool + Send + Sync + 'static) -> Self {
        Region::Predicate(Arc::new(f))
    }

    pub fn contains(&self, c: Coord, dims: Dimensions) -> bool {
        match self {
            Region::All => true,
            Region::Cell(target) => *target == c,
            Region::Layer { axis, index } => {
                axis.component(c) == *index && *index < axis.extent(dims)
            }
            Region::BottomLayer => c.y == 0,
            Region::TopLayer => c.y + 1 == dims.my,
            Region::Boundary => c.x == 0 || c.z == 0 || c.x + 1 == dims.mx || c.z + 1 == dims.mz,
            Region::Predicate(f) => f(c),
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::All => write!(f, "All"),
            Region::Cell(c) => write!(f, "Cell{}", c),
            Region::Layer { axis, index } => write!(f, "Layer({:?}={})", axis, index),
            Region::BottomLayer => write!(f, "BottomLayer"),
            Region::TopLayer => write!(f, "TopLayer"),
            Region::Boundary => write!(f, "Boundary"),
            Region::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// Restrict a region to a subset of module ids.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub region: Region,
    pub allowed: Vec<ModuleId>,
}

impl Constraint {
    pub fn new(region: Region, allowed: impl IntoIterator<Item = ModuleId>) -> Self {
        Self {
            region,
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Pin a single coordinate.
    pub fn at(coord: Coord, allowed: impl IntoIterator<Item = ModuleId>) -> Self {
        Self::new(Region::Cell(coord), allowed)
    }
}

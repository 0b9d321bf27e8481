//! Axis-aligned directions between grid cells.
//!
//! Order: +X, -X, +Y, -Y, +Z, -Z. Y points up, so `PosY` is "above".
//! Opposite directions are adjacent in the order, which makes
//! `opposite(d) == d ^ 1` on the raw index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction offsets, indexed by `Direction::index()`.
pub const DX: [i32; 6] = [1, -1, 0, 0, 0, 0];
pub const DY: [i32; 6] = [0, 0, 1, -1, 0, 0];
pub const DZ: [i32; 6] = [0, 0, 0, 0, 1, -1];

/// One of the six faces of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    /// All directions in index order.
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    /// The face on the other side of a shared boundary.
    #[inline]
    pub fn opposite(self) -> Direction {
        Self::ALL[self.index() ^ 1]
    }

    /// `(dx, dy, dz)` step for this direction.
    #[inline]
    pub fn offset(self) -> (i32, i32, i32) {
        let i = self.index();
        (DX[i], DY[i], DZ[i])
    }

    /// Face this direction maps to after a quarter turn about the Y axis.
    ///
    /// Inverse of the connector remap used by `Module::rotated_y`:
    /// the connector that faced `+Z` now faces `+X`, `-X` faces `+Z`,
    /// and so on. Vertical faces are unchanged.
    pub fn rotated_y(self) -> Direction {
        match self {
            Direction::PosZ => Direction::PosX,
            Direction::NegZ => Direction::NegX,
            Direction::NegX => Direction::PosZ,
            Direction::PosX => Direction::NegZ,
            vertical => vertical,
        }
    }

    /// Short name used in tileset files (`px`, `nx`, `py`, ...).
    pub fn short_name(self) -> &'static str {
        match self {
            Direction::PosX => "px",
            Direction::NegX => "nx",
            Direction::PosY => "py",
            Direction::NegY => "ny",
            Direction::PosZ => "pz",
            Direction::NegZ => "nz",
        }
    }

    /// Parse a short name or one of the aliases `up`/`down`/`above`/`below`.
    pub fn parse(s: &str) -> Option<Direction> {
        match s.trim().to_ascii_lowercase().as_str() {
            "px" | "+x" | "east" => Some(Direction::PosX),
            "nx" | "-x" | "west" => Some(Direction::NegX),
            "py" | "+y" | "up" | "above" => Some(Direction::PosY),
            "ny" | "-y" | "down" | "below" => Some(Direction::NegY),
            "pz" | "+z" | "north" => Some(Direction::PosZ),
            "nz" | "-z" | "south" => Some(Direction::NegZ),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

//! Wave-function-collapse solver for modular 3D building grids.
//!
//! This crate provides:
//! - `ModuleCatalog`: placeable modules with per-face connector labels and weights
//! - `CompatibilityOracle`: dense, symmetric adjacency table over the catalog
//! - `Grid`: per-cell candidate domains with structural constraints
//! - `Solver`: minimum-entropy search with arc-consistency propagation and
//!   chronological backtracking, driven one step at a time or to completion
//! - `tileset`: XML tileset loading
//! - `presets`: a built-in building tileset with architectural styles
//! - `output`: JSON export and solution checking
//!
//! ## Example
//!
//! ```
//! use wfc_core::{Dimensions, SolveOutcome};
//! use wfc_core::presets::building_tileset;
//!
//! let tileset = building_tileset(None).unwrap();
//! let mut solver = tileset.solver(Dimensions::new(4, 3, 4), Some(1)).unwrap();
//! match solver.run_to_completion() {
//!     SolveOutcome::Solved(assignment) => assert_eq!(assignment.len(), 48),
//!     SolveOutcome::Unsolvable => unreachable!(),
//! }
//! ```

pub mod catalog;
pub mod constraint;
pub mod direction;
pub mod error;
pub mod grid;
pub mod oracle;
pub mod output;
pub mod presets;
pub mod rng;
pub mod solver;
pub mod tileset;

pub use catalog::{Connector, Module, ModuleCatalog, ModuleId};
pub use constraint::{Axis, Constraint, Region};
pub use direction::Direction;
pub use error::{CatalogError, OracleError, OutputError, SolverError, TilesetError};
pub use grid::{Cell, CellStatus, Coord, Dimensions, Domain, Grid};
pub use oracle::{CompatibilityOracle, SocketRules};
pub use output::{assignment_to_json, save_assignment, verify_assignment, Violation};
pub use rng::{StdRandom, WfcRng};
pub use solver::{
    Assignment, SolveOutcome, Solver, SolverConfig, SolverState, SolverStats, StepResult,
};
pub use tileset::{load_tileset, parse_tileset, Tileset};

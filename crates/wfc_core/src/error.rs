//! Error types for catalog construction, solver setup, and I/O.

use crate::catalog::ModuleId;
use crate::direction::Direction;
use crate::grid::Coord;
use thiserror::Error;

/// Errors raised while registering modules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("module name '{0}' is already registered")]
    DuplicateName(String),

    #[error("module '{name}' has invalid weight {weight} (must be finite, >= 0)")]
    InvalidWeight { name: String, weight: f64 },

    #[error("unknown module id {0}")]
    UnknownId(ModuleId),

    #[error("unknown module or family '{0}'")]
    UnknownName(String),
}

/// Errors raised while building a compatibility oracle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("compatibility is asymmetric at ({a}, {b}, {direction})")]
    Asymmetric {
        a: ModuleId,
        b: ModuleId,
        direction: Direction,
    },

    #[error("module id {id} is out of range for an oracle over {len} modules")]
    OutOfRange { id: ModuleId, len: usize },

    #[error("compatibility table over {0} modules is too large")]
    TooLarge(usize),
}

/// Errors raised while constructing a solver. All of these are fatal
/// and are reported before any search begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("grid dimensions must be positive, got {0}x{1}x{2}")]
    InvalidDimensions(usize, usize, usize),

    #[error("grid of {0}x{1}x{2} cells is too large")]
    GridTooLarge(usize, usize, usize),

    #[error("module catalog is empty")]
    EmptyCatalog,

    #[error("oracle covers {oracle} modules but the catalog has {catalog}")]
    OracleMismatch { oracle: usize, catalog: usize },

    #[error("constraint left no candidates at {coord}")]
    ConstraintEmptiedDomain { coord: Coord },

    #[error("propagating initial constraints left no candidates at {coord}")]
    InitialContradiction { coord: Coord },

    #[error("constraint references module id {0} outside the catalog")]
    UnknownModule(ModuleId),
}

/// Errors raised while loading an XML tileset.
#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("failed to read tileset: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("missing attribute '{attribute}' in <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("invalid value '{value}' for attribute '{attribute}' in <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("unknown module '{0}' referenced in tileset")]
    UnknownModule(String),

    #[error("unknown direction '{0}' (expected px, nx, py, ny, pz or nz)")]
    UnknownDirection(String),

    #[error("tileset defines no modules")]
    Empty,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Errors raised while writing a solved assignment.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

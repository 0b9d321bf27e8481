//! Saving solved assignments and checking them.
//!
//! The JSON document lists the grid size and every placed module:
//!
//! ```json
//! {
//!   "dimensions": { "mx": 2, "my": 1, "mz": 1 },
//!   "cells": [
//!     { "x": 0, "y": 0, "z": 0, "module_id": 0, "module": "ground" },
//!     { "x": 1, "y": 0, "z": 0, "module_id": 0, "module": "ground" }
//!   ]
//! }
//! ```

use crate::catalog::{ModuleCatalog, ModuleId};
use crate::direction::Direction;
use crate::error::OutputError;
use crate::grid::{Coord, Dimensions};
use crate::oracle::CompatibilityOracle;
use crate::solver::Assignment;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedModule {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub module_id: usize,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDocument {
    pub dimensions: Dimensions,
    pub cells: Vec<PlacedModule>,
}

impl AssignmentDocument {
    pub fn new(assignment: &Assignment, dimensions: Dimensions, catalog: &ModuleCatalog) -> Self {
        let cells = assignment
            .iter()
            .map(|(c, &id)| PlacedModule {
                x: c.x,
                y: c.y,
                z: c.z,
                module_id: id.index(),
                module: catalog.name(id).to_string(),
            })
            .collect();
        Self { dimensions, cells }
    }

    pub fn to_assignment(&self) -> Assignment {
        self.cells
            .iter()
            .map(|p| (Coord::new(p.x, p.y, p.z), ModuleId(p.module_id)))
            .collect()
    }
}

/// Pretty-printed JSON for an assignment.
pub fn assignment_to_json(
    assignment: &Assignment,
    dimensions: Dimensions,
    catalog: &ModuleCatalog,
) -> Result<String, OutputError> {
    let doc = AssignmentDocument::new(assignment, dimensions, catalog);
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn save_assignment<P: AsRef<Path>>(
    path: P,
    assignment: &Assignment,
    dimensions: Dimensions,
    catalog: &ModuleCatalog,
) -> Result<(), OutputError> {
    let doc = AssignmentDocument::new(assignment, dimensions, catalog);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writer.flush()?;
    Ok(())
}

pub fn load_assignment<P: AsRef<Path>>(path: P) -> Result<AssignmentDocument, OutputError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Why an assignment is not a valid solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A coordinate inside the grid has no module.
    Missing(Coord),
    /// A coordinate outside the grid has a module.
    OutOfBounds(Coord),
    /// Two neighbors the oracle does not allow together.
    Incompatible {
        at: Coord,
        neighbor: Coord,
        direction: Direction,
    },
}

/// Check totality and adjacency validity.
pub fn verify_assignment(
    assignment: &Assignment,
    dims: Dimensions,
    oracle: &CompatibilityOracle,
) -> Result<(), Violation> {
    if let Some(&c) = assignment.keys().find(|c| !dims.contains(**c)) {
        return Err(Violation::OutOfBounds(c));
    }
    // Index order, without multiplying out the cell count.
    let coords = (0..dims.mz)
        .flat_map(|z| (0..dims.my).map(move |y| (y, z)))
        .flat_map(|(y, z)| (0..dims.mx).map(move |x| Coord::new(x, y, z)));
    for at in coords {
        let Some(&a) = assignment.get(&at) else {
            return Err(Violation::Missing(at));
        };
        // Each pair once, from its lower side.
        for direction in [Direction::PosX, Direction::PosY, Direction::PosZ] {
            let Some(neighbor) = dims.neighbor(at, direction) else {
                continue;
            };
            let Some(&b) = assignment.get(&neighbor) else {
                return Err(Violation::Missing(neighbor));
            };
            if !oracle.compatible(a, b, direction) {
                return Err(Violation::Incompatible {
                    at,
                    neighbor,
                    direction,
                });
            }
        }
    }
    Ok(())
}

//! A small built-in building tileset.
//!
//! Ground-floor pieces sit on the bottom layer, storeys stack above
//! them and roofs close the top layer. Any grid at least two cells tall
//! is solvable.
//!
//! Corner pieces turn two `none` faces outward, so they only fit where
//! both of those faces meet the edge of the grid.

use crate::catalog::{Connector, Module, ModuleCatalog, ModuleId};
use crate::constraint::{Constraint, Region};
use crate::direction::Direction;
use crate::error::CatalogError;
use crate::oracle::CompatibilityOracle;
use crate::tileset::Tileset;
use std::fmt;
use std::str::FromStr;

pub const GROUND: &str = "ground";
pub const DOOR: &str = "door";
pub const WALL: &str = "wall";
pub const WINDOW: &str = "window";
pub const COLUMN: &str = "column";
pub const CORNER: &str = "corner";
pub const STAIRS: &str = "stairs";
pub const ROOF: &str = "roof";

/// Weight presets applied per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Modern,
    Classical,
    Industrial,
    Medieval,
}

impl Style {
    pub const ALL: [Style; 4] = [
        Style::Modern,
        Style::Classical,
        Style::Industrial,
        Style::Medieval,
    ];

    fn weights(self) -> &'static [(&'static str, f64)] {
        match self {
            Style::Modern => &[(WINDOW, 0.6), (DOOR, 0.1)],
            Style::Classical => &[(COLUMN, 0.5), (WINDOW, 0.3)],
            Style::Industrial => &[(WINDOW, 0.2), (DOOR, 0.15)],
            Style::Medieval => &[(WINDOW, 0.15), (DOOR, 0.1)],
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modern" => Ok(Style::Modern),
            "classical" => Ok(Style::Classical),
            "industrial" => Ok(Style::Industrial),
            "medieval" => Ok(Style::Medieval),
            other => Err(format!("unknown style '{}'", other)),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Modern => "modern",
            Style::Classical => "classical",
            Style::Industrial => "industrial",
            Style::Medieval => "medieval",
        };
        f.write_str(name)
    }
}

fn storey(name: &str) -> Module {
    Module::new(name)
        .with_sides("facade")
        .with(Direction::PosY, "storey")
        .with(Direction::NegY, "storey")
}

/// Ground, door and corner facings, the storey fillers and roof.
pub fn building_catalog() -> Result<ModuleCatalog, CatalogError> {
    let mut catalog = ModuleCatalog::new();
    let ground = Module::new(GROUND)
        .with_sides("ground")
        .with(Direction::PosY, "storey");
    catalog.register(ground, 1.0)?;
    // The entry face only meets another entry or the grid edge.
    catalog.register_rotations(
        Module::new(DOOR)
            .with_sides("ground")
            .with(Direction::PosZ, "entry")
            .with(Direction::PosY, "storey"),
        0.1,
    )?;
    catalog.register(storey(WALL), 0.7)?;
    catalog.register(storey(WINDOW), 0.3)?;
    catalog.register(storey(COLUMN), 0.2)?;
    let corner = storey(CORNER)
        .with(Direction::NegX, Connector::none())
        .with(Direction::NegZ, Connector::none());
    catalog.register_rotations(corner, 0.2)?;
    // Same faces on every side, so only one orientation is registered.
    catalog.register_rotations(storey(STAIRS), 0.05)?;
    let roof = Module::new(ROOF)
        .with_sides("roof")
        .with(Direction::NegY, "storey");
    catalog.register(roof, 1.0)?;
    Ok(catalog)
}

/// Ground floor on the bottom layer, roofs on the top layer.
pub fn building_constraints(catalog: &ModuleCatalog) -> Result<Vec<Constraint>, CatalogError> {
    let mut ground = catalog.resolve(GROUND)?;
    ground.extend(catalog.resolve(DOOR)?);
    let roof: Vec<ModuleId> = catalog.resolve(ROOF)?;
    Ok(vec![
        Constraint::new(Region::BottomLayer, ground),
        Constraint::new(Region::TopLayer, roof),
    ])
}

/// Retune family weights for an architectural style.
pub fn apply_style(catalog: &mut ModuleCatalog, style: Style) -> Result<(), CatalogError> {
    for &(family, weight) in style.weights() {
        catalog.scale_family_weight(family, weight)?;
    }
    Ok(())
}

/// The building preset as a ready tileset.
pub fn building_tileset(style: Option<Style>) -> Result<Tileset, CatalogError> {
    let mut catalog = building_catalog()?;
    if let Some(style) = style {
        apply_style(&mut catalog, style)?;
    }
    let constraints = building_constraints(&catalog)?;
    let oracle = CompatibilityOracle::from_catalog(&catalog);
    Ok(Tileset {
        catalog,
        oracle,
        constraints,
    })
}

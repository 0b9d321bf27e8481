//! Module catalog: the finite set of placeable pieces.
//!
//! Each module exposes one connector label per face and carries a
//! non-negative selection weight. Ids are handed out in registration
//! order and never change; nothing else should be read into them.

use crate::direction::Direction;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

impl ModuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque label describing what a module exposes on one face.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connector(String);

impl Connector {
    /// Tag of the null connector. Never compatible with anything,
    /// including another `none`, unless the oracle is overridden.
    pub const NONE_TAG: &'static str = "none";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn none() -> Self {
        Self(Self::NONE_TAG.to_string())
    }

    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE_TAG
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Connector {
    fn from(s: &str) -> Self {
        Connector::new(s)
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A placeable unit with one connector per face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Unique name within a catalog.
    pub name: String,
    /// Base name shared by all rotation variants of the same piece.
    pub family: String,
    /// Connector labels indexed by `Direction::index()`.
    pub connectors: [Connector; 6],
}

impl Module {
    /// A module with every face set to `none`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            family: name.clone(),
            name,
            connectors: std::array::from_fn(|_| Connector::none()),
        }
    }

    /// Builder-style setter for one face.
    pub fn with(mut self, direction: Direction, label: impl Into<Connector>) -> Self {
        self.connectors[direction.index()] = label.into();
        self
    }

    /// Set all four horizontal faces to the same label.
    pub fn with_sides(self, label: &str) -> Self {
        self.with(Direction::PosX, label)
            .with(Direction::NegX, label)
            .with(Direction::PosZ, label)
            .with(Direction::NegZ, label)
    }

    #[inline]
    pub fn connector(&self, direction: Direction) -> &Connector {
        &self.connectors[direction.index()]
    }

    /// Quarter turn about the vertical axis.
    ///
    /// `+X <- +Z`, `-X <- -Z`, `+Z <- -X`, `-Z <- +X`; up and down stay.
    pub fn rotated_y(&self, name: impl Into<String>) -> Module {
        let mut connectors = self.connectors.clone();
        for d in Direction::ALL {
            connectors[d.rotated_y().index()] = self.connectors[d.index()].clone();
        }
        Module {
            name: name.into(),
            family: self.family.clone(),
            connectors,
        }
    }
}

/// Registry of module definitions and their weights.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
    weights: Vec<f64>,
    by_name: HashMap<String, ModuleId>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module with an explicit weight and return its new id.
    pub fn register(&mut self, module: Module, weight: f64) -> Result<ModuleId, CatalogError> {
        validate_weight(&module.name, weight)?;
        if self.by_name.contains_key(&module.name) {
            return Err(CatalogError::DuplicateName(module.name));
        }
        let id = ModuleId(self.modules.len());
        self.by_name.insert(module.name.clone(), id);
        self.modules.push(module);
        self.weights.push(weight);
        Ok(id)
    }

    /// Register with the default weight of 1.0.
    pub fn register_default(&mut self, module: Module) -> Result<ModuleId, CatalogError> {
        self.register(module, 1.0)
    }

    /// Register a module and its distinct quarter-turn variants.
    ///
    /// Variants whose connector layout repeats an earlier one are
    /// skipped, so a module that looks the same from every side is
    /// registered once.
    pub fn register_rotations(
        &mut self,
        module: Module,
        weight: f64,
    ) -> Result<Vec<ModuleId>, CatalogError> {
        let base = module.name.clone();
        let mut variants = vec![module];
        for (turn, suffix) in ["_r90", "_r180", "_r270"].iter().enumerate() {
            let next = variants[turn].rotated_y(format!("{}{}", base, suffix));
            variants.push(next);
        }

        let mut seen: Vec<[Connector; 6]> = Vec::new();
        let mut ids = Vec::new();
        for variant in variants {
            if seen.contains(&variant.connectors) {
                continue;
            }
            seen.push(variant.connectors.clone());
            ids.push(self.register(variant, weight)?);
        }
        Ok(ids)
    }

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    /// Selection weight of a module; unknown ids weigh nothing.
    pub fn weight(&self, id: ModuleId) -> f64 {
        self.weights.get(id.index()).copied().unwrap_or(0.0)
    }

    pub fn set_weight(&mut self, id: ModuleId, weight: f64) -> Result<(), CatalogError> {
        let name = self
            .get(id)
            .map(|m| m.name.clone())
            .ok_or(CatalogError::UnknownId(id))?;
        validate_weight(&name, weight)?;
        self.weights[id.index()] = weight;
        Ok(())
    }

    /// Set the weight of every variant in a family. Returns the number
    /// of modules touched.
    pub fn scale_family_weight(
        &mut self,
        family: &str,
        weight: f64,
    ) -> Result<usize, CatalogError> {
        let ids = self.ids_in_family(family);
        if ids.is_empty() {
            return Err(CatalogError::UnknownName(family.to_string()));
        }
        for &id in &ids {
            self.set_weight(id, weight)?;
        }
        Ok(ids.len())
    }

    /// All ids in ascending order.
    pub fn all_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(ModuleId)
    }

    pub fn id_of(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn ids_in_family(&self, family: &str) -> Vec<ModuleId> {
        self.ids_where(|m| m.family == family)
    }

    /// Resolve a name to every member of that family, or to the single
    /// module with that exact name (e.g. one rotation variant).
    pub fn resolve(&self, name: &str) -> Result<Vec<ModuleId>, CatalogError> {
        let family = self.ids_in_family(name);
        if !family.is_empty() {
            return Ok(family);
        }
        self.id_of(name)
            .map(|id| vec![id])
            .ok_or_else(|| CatalogError::UnknownName(name.to_string()))
    }

    pub fn ids_where(&self, mut predicate: impl FnMut(&Module) -> bool) -> Vec<ModuleId> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, m)| predicate(m))
            .map(|(i, _)| ModuleId(i))
            .collect()
    }

    pub fn name(&self, id: ModuleId) -> &str {
        self.get(id).map(|m| m.name.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i), m))
    }
}

fn validate_weight(name: &str, weight: f64) -> Result<(), CatalogError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidWeight {
            name: name.to_string(),
            weight,
        })
    }
}

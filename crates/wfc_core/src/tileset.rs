//! XML tileset loading.
//!
//! A tileset declares modules with their six connector labels, optional
//! socket pairings, explicit adjacency overrides and structural
//! constraints:
//!
//! ```xml
//! <tileset>
//!   <sockets identity="true">
//!     <connect a="bottom_to_middle" b="middle_to_bottom"/>
//!   </sockets>
//!   <modules>
//!     <module name="ground" weight="1.0" px="ground" nx="ground" py="storey"
//!             pz="ground" nz="ground"/>
//!     <module name="door" px="ground" py="storey" rotations="true"/>
//!   </modules>
//!   <rules>
//!     <forbid a="ground" b="door" dir="px"/>
//!     <top-only name="roof"/>
//!   </rules>
//!   <constraints>
//!     <bottom modules="ground door"/>
//!     <cell x="0" y="0" z="0" modules="ground"/>
//!   </constraints>
//! </tileset>
//! ```
//!
//! Missing connector attributes are `none`. When `<sockets>` is present
//! the oracle uses its pairings, otherwise labels match when equal.

use crate::catalog::{Connector, Module, ModuleCatalog, ModuleId};
use crate::constraint::{Axis, Constraint, Region};
use crate::direction::Direction;
use crate::error::{CatalogError, SolverError, TilesetError};
use crate::grid::{Coord, Dimensions};
use crate::oracle::{CompatibilityOracle, SocketRules};
use crate::solver::{Solver, SolverConfig};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A parsed tileset, ready to build solvers from.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub catalog: ModuleCatalog,
    pub oracle: CompatibilityOracle,
    pub constraints: Vec<Constraint>,
}

impl Tileset {
    /// A solver over this tileset with its constraints applied.
    pub fn solver(
        &self,
        dimensions: Dimensions,
        seed: Option<u64>,
    ) -> Result<Solver, SolverError> {
        let constraints = self.constraints.iter().cloned();
        let mut config = SolverConfig::new(dimensions).with_constraints(constraints);
        config.seed = seed;
        Solver::new(config, self.catalog.clone(), self.oracle.clone())
    }
}

/// Load and parse a tileset file.
pub fn load_tileset(path: impl AsRef<Path>) -> Result<Tileset, TilesetError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "loading tileset");
    parse_tileset(&xml)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Sockets,
    Modules,
    Rules,
    Constraints,
}

struct ModuleDef {
    name: String,
    weight: f64,
    connectors: Vec<(Direction, String)>,
    rotations: bool,
}

enum RuleDef {
    Allow(String, String, Direction),
    Forbid(String, String, Direction),
    TopOnly(String),
}

struct ConstraintDef {
    region: Region,
    modules: Vec<String>,
}

#[derive(Default)]
struct RawTileset {
    sockets: Option<SocketRules>,
    modules: Vec<ModuleDef>,
    rules: Vec<RuleDef>,
    constraints: Vec<ConstraintDef>,
}

/// Parse tileset XML from a string.
pub fn parse_tileset(xml: &str) -> Result<Tileset, TilesetError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut raw = RawTileset::default();
    let mut section = Section::None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = element_name(e);
                match section_of(&name) {
                    Some(s) => {
                        section = s;
                        if s == Section::Sockets {
                            raw.sockets = Some(socket_rules(e)?);
                        }
                    }
                    None => parse_element(&name, e, section, &mut raw)?,
                }
            }
            Event::Empty(ref e) => {
                let name = element_name(e);
                match section_of(&name) {
                    Some(Section::Sockets) => raw.sockets = Some(socket_rules(e)?),
                    Some(_) => {}
                    None => parse_element(&name, e, section, &mut raw)?,
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if section_of(&name).is_some() {
                    section = Section::None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    build(raw)
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn section_of(name: &str) -> Option<Section> {
    match name {
        "sockets" => Some(Section::Sockets),
        "modules" => Some(Section::Modules),
        "rules" => Some(Section::Rules),
        "constraints" => Some(Section::Constraints),
        _ => None,
    }
}

fn attributes(e: &BytesStart) -> Result<HashMap<String, String>, TilesetError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

struct Attrs<'a> {
    element: &'a str,
    map: HashMap<String, String>,
}

impl Attrs<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&str, TilesetError> {
        self.get(key).ok_or_else(|| TilesetError::MissingAttribute {
            element: self.element.to_string(),
            attribute: key.to_string(),
        })
    }

    fn invalid(&self, key: &str, value: &str) -> TilesetError {
        TilesetError::InvalidAttribute {
            element: self.element.to_string(),
            attribute: key.to_string(),
            value: value.to_string(),
        }
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, TilesetError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.trim().parse().map(Some).map_err(|_| self.invalid(key, v)),
        }
    }

    fn require_parse<T: std::str::FromStr>(&self, key: &str) -> Result<T, TilesetError> {
        let v = self.require(key)?;
        v.trim().parse().map_err(|_| self.invalid(key, v))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, TilesetError> {
        match self.get(key) {
            None => Ok(default),
            Some("true") | Some("1") | Some("yes") => Ok(true),
            Some("false") | Some("0") | Some("no") => Ok(false),
            Some(v) => Err(self.invalid(key, v)),
        }
    }

    fn direction(&self, key: &str) -> Result<Direction, TilesetError> {
        let v = self.require(key)?;
        Direction::parse(v)
            .ok_or_else(|| TilesetError::UnknownDirection(v.to_string()))
    }

    fn module_list(&self) -> Result<Vec<String>, TilesetError> {
        let v = self.require("modules")?;
        let names: Vec<String> = v
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Err(self.invalid("modules", v));
        }
        Ok(names)
    }
}

fn socket_rules(e: &BytesStart) -> Result<SocketRules, TilesetError> {
    let attrs = Attrs {
        element: "sockets",
        map: attributes(e)?,
    };
    let mut rules = SocketRules::new();
    rules.set_identity(attrs.flag("identity", true)?);
    Ok(rules)
}

fn parse_element(
    name: &str,
    e: &BytesStart,
    section: Section,
    raw: &mut RawTileset,
) -> Result<(), TilesetError> {
    let attrs = Attrs {
        element: name,
        map: attributes(e)?,
    };

    match (section, name) {
        (Section::Sockets, "connect") => {
            let a = attrs.require("a")?;
            let b = attrs.require("b")?;
            if let Some(rules) = raw.sockets.as_mut() {
                rules.add(a, b);
            }
        }
        (Section::Modules, "module") => {
            let mut connectors = Vec::new();
            for d in Direction::ALL {
                if let Some(label) = attrs.get(d.short_name()) {
                    connectors.push((d, label.to_string()));
                }
            }
            raw.modules.push(ModuleDef {
                name: attrs.require("name")?.to_string(),
                weight: attrs.parse("weight")?.unwrap_or(1.0),
                connectors,
                rotations: attrs.flag("rotations", false)?,
            });
        }
        (Section::Rules, "allow") => raw.rules.push(RuleDef::Allow(
            attrs.require("a")?.to_string(),
            attrs.require("b")?.to_string(),
            attrs.direction("dir")?,
        )),
        (Section::Rules, "forbid") => raw.rules.push(RuleDef::Forbid(
            attrs.require("a")?.to_string(),
            attrs.require("b")?.to_string(),
            attrs.direction("dir")?,
        )),
        (Section::Rules, "top-only") => {
            raw.rules.push(RuleDef::TopOnly(attrs.require("name")?.to_string()))
        }
        (Section::Constraints, _) => {
            let region = match name {
                "all" => Region::All,
                "top" => Region::TopLayer,
                "bottom" => Region::BottomLayer,
                "boundary" => Region::Boundary,
                "layer" => {
                    let axis_name = attrs.require("axis")?;
                    let axis = Axis::parse(axis_name)
                        .ok_or_else(|| attrs.invalid("axis", axis_name))?;
                    Region::Layer {
                        axis,
                        index: attrs.require_parse("index")?,
                    }
                }
                "cell" => Region::Cell(Coord::new(
                    attrs.require_parse("x")?,
                    attrs.require_parse("y")?,
                    attrs.require_parse("z")?,
                )),
                _ => {
                    debug!(element = name, "ignoring unknown constraint element");
                    return Ok(());
                }
            };
            raw.constraints.push(ConstraintDef {
                region,
                modules: attrs.module_list()?,
            });
        }
        _ => debug!(element = name, "ignoring element"),
    }
    Ok(())
}

fn resolve(catalog: &ModuleCatalog, name: &str) -> Result<Vec<ModuleId>, TilesetError> {
    catalog.resolve(name).map_err(|e| match e {
        CatalogError::UnknownName(n) => TilesetError::UnknownModule(n),
        other => TilesetError::Catalog(other),
    })
}

fn build(raw: RawTileset) -> Result<Tileset, TilesetError> {
    let mut catalog = ModuleCatalog::new();
    for def in raw.modules {
        let mut module = Module::new(def.name);
        for (d, label) in def.connectors {
            module = module.with(d, Connector::new(label));
        }
        if def.rotations {
            catalog.register_rotations(module, def.weight)?;
        } else {
            catalog.register(module, def.weight)?;
        }
    }
    if catalog.is_empty() {
        return Err(TilesetError::Empty);
    }

    let mut oracle = match &raw.sockets {
        Some(rules) => CompatibilityOracle::from_socket_rules(&catalog, rules),
        None => CompatibilityOracle::from_catalog(&catalog),
    };

    for rule in &raw.rules {
        match rule {
            RuleDef::Allow(a, b, d) | RuleDef::Forbid(a, b, d) => {
                let allowed = matches!(rule, RuleDef::Allow(..));
                for &ia in &resolve(&catalog, a)? {
                    for &ib in &resolve(&catalog, b)? {
                        oracle.set(ia, ib, *d, allowed);
                    }
                }
            }
            RuleDef::TopOnly(name) => {
                for id in resolve(&catalog, name)? {
                    oracle.forbid_above(id);
                }
            }
        }
    }

    let constraints = raw
        .constraints
        .into_iter()
        .map(|def| {
            let mut ids = Vec::new();
            for name in &def.modules {
                ids.extend(resolve(&catalog, name)?);
            }
            Ok(Constraint::new(def.region, ids))
        })
        .collect::<Result<Vec<_>, TilesetError>>()?;

    debug!(
        modules = catalog.len(),
        rules = raw.rules.len(),
        constraints = constraints.len(),
        "tileset parsed"
    );

    Ok(Tileset {
        catalog,
        oracle,
        constraints,
    })
}

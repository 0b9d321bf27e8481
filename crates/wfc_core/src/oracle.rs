//! Directional compatibility between modules.
//!
//! The relation is stored as a dense `[a][b][direction]` table sized
//! when the catalog is finalized. Every write goes through `set`, which
//! also writes the inverse triple `(b, a, opposite)`, so the table is
//! symmetric by construction.
//!
//! Anything not explicitly derived or allowed is incompatible.

use crate::catalog::{Connector, ModuleCatalog, ModuleId};
use crate::direction::Direction;
use crate::error::OracleError;
use std::collections::HashSet;

/// Which connector labels mate with which.
///
/// Pairs are unordered: listing `("bottom_to_middle", "middle_to_bottom")`
/// lets either side face the other. `none` never matches even if listed.
#[derive(Debug, Clone, Default)]
pub struct SocketRules {
    pairs: HashSet<(String, String)>,
    identity: bool,
}

impl SocketRules {
    /// Only explicitly listed pairs connect.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listed pairs connect, and every label also connects to itself.
    pub fn with_identity() -> Self {
        Self {
            pairs: HashSet::new(),
            identity: true,
        }
    }

    pub fn connect(mut self, a: &str, b: &str) -> Self {
        self.add(a, b);
        self
    }

    pub fn add(&mut self, a: &str, b: &str) {
        self.pairs.insert(ordered(a, b));
    }

    pub fn set_identity(&mut self, identity: bool) {
        self.identity = identity;
    }

    pub fn matches(&self, a: &Connector, b: &Connector) -> bool {
        if a.is_none() || b.is_none() {
            return false;
        }
        (self.identity && a == b) || self.pairs.contains(&ordered(a.as_str(), b.as_str()))
    }
}

fn table_len(n: usize) -> Option<usize> {
    n.checked_mul(n)?.checked_mul(Direction::ALL.len())
}

fn ordered(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Dense compatibility table over a fixed module set.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityOracle {
    /// `table[(a * n + b) * 6 + d]`: may `b` sit next to `a` in direction `d`?
    table: Vec<bool>,
    n: usize,
}

impl CompatibilityOracle {
    /// An oracle where nothing is compatible.
    ///
    /// # Panics
    /// Panics if an `n * n * 6` table does not fit in `usize`.
    pub fn incompatible(n: usize) -> Self {
        let Some(len) = table_len(n) else {
            panic!("compatibility table over {} modules overflows usize", n);
        };
        Self {
            table: vec![false; len],
            n,
        }
    }

    /// Labels match when equal and not `none`.
    pub fn from_catalog(catalog: &ModuleCatalog) -> Self {
        Self::derive(catalog, |a, b| !a.is_none() && a == b)
    }

    /// Labels match according to an explicit socket table.
    pub fn from_socket_rules(catalog: &ModuleCatalog, rules: &SocketRules) -> Self {
        Self::derive(catalog, |a, b| rules.matches(a, b))
    }

    fn derive(catalog: &ModuleCatalog, matches: impl Fn(&Connector, &Connector) -> bool) -> Self {
        let mut oracle = Self::incompatible(catalog.len());
        for (a, ma) in catalog.iter() {
            for (b, mb) in catalog.iter() {
                for d in Direction::ALL {
                    let facing = ma.connector(d);
                    let back = mb.connector(d.opposite());
                    if matches(facing, back) {
                        oracle.set(a, b, d, true);
                    }
                }
            }
        }
        oracle
    }

    /// Build from an explicit list of compatible triples. The list must
    /// already contain every inverse triple.
    pub fn from_table(
        n: usize,
        entries: &[(ModuleId, ModuleId, Direction)],
    ) -> Result<Self, OracleError> {
        if table_len(n).is_none() {
            return Err(OracleError::TooLarge(n));
        }
        let mut oracle = Self::incompatible(n);
        for &(a, b, d) in entries {
            for id in [a, b] {
                if id.index() >= n {
                    return Err(OracleError::OutOfRange { id, len: n });
                }
            }
            let i = oracle.slot(a, b, d);
            oracle.table[i] = true;
        }
        match oracle.first_asymmetry() {
            Some((a, b, direction)) => Err(OracleError::Asymmetric { a, b, direction }),
            None => Ok(oracle),
        }
    }

    #[inline]
    fn slot(&self, a: ModuleId, b: ModuleId, d: Direction) -> usize {
        (a.index() * self.n + b.index()) * 6 + d.index()
    }

    /// May `b` be placed adjacent to `a` on `a`'s `direction` side?
    #[inline]
    pub fn compatible(&self, a: ModuleId, b: ModuleId, direction: Direction) -> bool {
        if a.index() >= self.n || b.index() >= self.n {
            return false;
        }
        self.table[self.slot(a, b, direction)]
    }

    /// Override one triple and its inverse.
    ///
    /// # Panics
    /// Panics if either id is outside the oracle.
    pub fn set(&mut self, a: ModuleId, b: ModuleId, direction: Direction, value: bool) {
        assert!(
            a.index() < self.n && b.index() < self.n,
            "module id out of range for oracle over {} modules",
            self.n
        );
        let forward = self.slot(a, b, direction);
        let inverse = self.slot(b, a, direction.opposite());
        self.table[forward] = value;
        self.table[inverse] = value;
    }

    pub fn allow(&mut self, a: ModuleId, b: ModuleId, direction: Direction) {
        self.set(a, b, direction, true);
    }

    pub fn forbid(&mut self, a: ModuleId, b: ModuleId, direction: Direction) {
        self.set(a, b, direction, false);
    }

    /// Nothing may ever sit directly above `module`.
    pub fn forbid_above(&mut self, module: ModuleId) {
        for b in 0..self.n {
            self.set(module, ModuleId(b), Direction::PosY, false);
        }
    }

    /// Number of modules covered.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// First triple whose inverse disagrees, if any.
    pub fn first_asymmetry(&self) -> Option<(ModuleId, ModuleId, Direction)> {
        for a in (0..self.n).map(ModuleId) {
            for b in (0..self.n).map(ModuleId) {
                for d in Direction::ALL {
                    if self.compatible(a, b, d) != self.compatible(b, a, d.opposite()) {
                        return Some((a, b, d));
                    }
                }
            }
        }
        None
    }

    pub fn is_symmetric(&self) -> bool {
        self.first_asymmetry().is_none()
    }

    /// Write one slot without its inverse.
    #[cfg(test)]
    pub(crate) fn set_one_sided(&mut self, a: ModuleId, b: ModuleId, direction: Direction) {
        let i = self.slot(a, b, direction);
        self.table[i] = true;
    }
}

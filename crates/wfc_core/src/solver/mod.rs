//! The search driver: select, collapse, propagate, backtrack.
//!
//! A [`Solver`] owns its grid, catalog, oracle and random source. Each
//! call to [`Solver::step`] performs one decision and reports what
//! happened, so a visualizer can drive the solve one step at a time
//! while [`Solver::run_to_completion`] loops the same steps. Both paths
//! consume randomness identically and reach the same result for a seed.
//!
//! # Example
//!
//! ```
//! use wfc_core::{
//!     CompatibilityOracle, Dimensions, Direction, Module, ModuleCatalog, SolveOutcome, Solver,
//!     SolverConfig,
//! };
//!
//! let mut catalog = ModuleCatalog::new();
//! catalog.register_default(Module::new("floor").with_sides("tile")).unwrap();
//! let oracle = CompatibilityOracle::from_catalog(&catalog);
//! let config = SolverConfig::new(Dimensions::new(3, 1, 3)).with_seed(7);
//!
//! let mut solver = Solver::new(config, catalog, oracle).unwrap();
//! assert!(matches!(solver.run_to_completion(), SolveOutcome::Solved(_)));
//! ```

pub mod backtrack;
pub mod collapse;
pub mod propagator;
pub mod selector;

pub use backtrack::{BacktrackOutcome, BacktrackRecord};
pub use propagator::{Contradiction, Trail};

use crate::catalog::{ModuleCatalog, ModuleId};
use crate::constraint::Constraint;
use crate::error::SolverError;
use crate::grid::{Coord, Dimensions, Domain, Grid};
use crate::oracle::CompatibilityOracle;
use crate::rng::{StdRandom, WfcRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Coordinate to module mapping. Partial while solving, total on success.
pub type Assignment = BTreeMap<Coord, ModuleId>;

/// Construction inputs besides the catalog and oracle.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub dimensions: Dimensions,
    /// `None` draws a seed from OS entropy once at construction.
    pub seed: Option<u64>,
    pub constraints: Vec<Constraint>,
}

impl SolverConfig {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            seed: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }
}

/// Result of one [`Solver::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// A cell was collapsed and propagation succeeded.
    Progressed,
    /// Every cell is collapsed.
    Completed,
    /// The collapse led to a contradiction and backtracking recovered.
    ContradictionHandled,
    /// Backtracking ran out of decisions to revise.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(Assignment),
    Unsolvable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolverState {
    Running,
    Solved,
    Failed,
}

/// Counters for one run, cleared by [`Solver::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverStats {
    pub steps: usize,
    pub collapses: usize,
    pub contradictions: usize,
    /// Backtrack records popped.
    pub backtracks: usize,
    /// Popped records that had no alternative left.
    pub exhausted_records: usize,
}

pub struct Solver {
    catalog: ModuleCatalog,
    oracle: CompatibilityOracle,
    /// Grid after constraints and their propagation, restored by `reset`.
    initial: Grid,
    grid: Grid,
    stack: Vec<BacktrackRecord>,
    trail: Trail,
    initial_rng: Box<dyn WfcRng>,
    rng: Box<dyn WfcRng>,
    seed: Option<u64>,
    state: SolverState,
    stats: SolverStats,
}

impl Solver {
    /// Build a solver using `StdRandom` seeded from `config.seed`.
    pub fn new(
        config: SolverConfig,
        catalog: ModuleCatalog,
        oracle: CompatibilityOracle,
    ) -> Result<Self, SolverError> {
        let seed = config.seed.unwrap_or_else(StdRandom::entropy_seed);
        let rng = Box::new(StdRandom::from_seed(seed));
        let mut solver = Self::with_rng(config, catalog, oracle, rng)?;
        solver.seed = Some(seed);
        Ok(solver)
    }

    /// Build a solver around a caller-supplied random source. `config.seed`
    /// is ignored; `reset` replays from a clone of `rng`.
    ///
    /// # Panics
    /// Panics if the oracle is not symmetric.
    pub fn with_rng(
        config: SolverConfig,
        catalog: ModuleCatalog,
        oracle: CompatibilityOracle,
        rng: Box<dyn WfcRng>,
    ) -> Result<Self, SolverError> {
        if oracle.len() != catalog.len() {
            return Err(SolverError::OracleMismatch {
                oracle: oracle.len(),
                catalog: catalog.len(),
            });
        }
        if let Some((a, b, d)) = oracle.first_asymmetry() {
            panic!("compatibility oracle is asymmetric at ({a}, {b}, {d})");
        }

        let mut grid = Grid::new(config.dimensions, &catalog)?;
        let mut seeds = Vec::new();
        for constraint in &config.constraints {
            for &id in &constraint.allowed {
                if id.index() >= catalog.len() {
                    return Err(SolverError::UnknownModule(id));
                }
            }
            let changed = match grid.apply_constraint(constraint) {
                Ok(changed) => changed,
                Err(e) => {
                    warn!(constraint = ?constraint.region, "constraint emptied a domain");
                    return Err(e);
                }
            };
            seeds.extend(changed);
        }

        let mut scratch = Trail::new();
        if let Err(c) = propagator::propagate_from_many(&mut grid, &oracle, seeds, &mut scratch) {
            warn!(
                x = c.coord.x,
                y = c.coord.y,
                z = c.coord.z,
                "initial propagation failed"
            );
            return Err(SolverError::InitialContradiction { coord: c.coord });
        }

        debug!(
            dimensions = %config.dimensions,
            modules = catalog.len(),
            constraints = config.constraints.len(),
            "solver ready"
        );

        Ok(Self {
            catalog,
            oracle,
            initial: grid.clone(),
            grid,
            stack: Vec::new(),
            trail: Trail::new(),
            initial_rng: rng.clone(),
            rng,
            seed: None,
            state: SolverState::Running,
            stats: SolverStats::default(),
        })
    }

    /// Perform one decision. Once the run has terminated, repeated calls
    /// return the terminal result without touching the grid.
    pub fn step(&mut self) -> StepResult {
        match self.state {
            SolverState::Solved => return StepResult::Completed,
            SolverState::Failed => return StepResult::Failed,
            SolverState::Running => {}
        }
        self.stats.steps += 1;

        let Some(coord) = selector::select_next(&self.grid, self.rng.as_mut()) else {
            self.state = SolverState::Solved;
            info!(
                steps = self.stats.steps,
                collapses = self.stats.collapses,
                backtracks = self.stats.backtracks,
                "solve completed"
            );
            return StepResult::Completed;
        };

        let chosen = collapse::collapse(
            &mut self.grid,
            &self.catalog,
            coord,
            self.rng.as_mut(),
            &mut self.stack,
            &self.trail,
        );
        let propagated = match chosen {
            Some(module) => {
                self.stats.collapses += 1;
                debug!(
                    x = coord.x,
                    y = coord.y,
                    z = coord.z,
                    module = self.catalog.name(module),
                    depth = self.stack.len(),
                    "collapse"
                );
                propagator::propagate(&mut self.grid, &self.oracle, coord, &mut self.trail)
            }
            None => Err(Contradiction { coord }),
        };

        let Err(contradiction) = propagated else {
            debug_assert_eq!(self.grid.verify_consistency(), Ok(()));
            return StepResult::Progressed;
        };
        self.stats.contradictions += 1;
        debug!(
            x = contradiction.coord.x,
            y = contradiction.coord.y,
            z = contradiction.coord.z,
            "contradiction"
        );

        let report = backtrack::backtrack(
            &mut self.grid,
            &self.oracle,
            &mut self.stack,
            &mut self.trail,
        );
        self.stats.backtracks += report.popped;
        self.stats.exhausted_records += report.exhausted;
        match report.outcome {
            BacktrackOutcome::Resumed(_) => {
                debug_assert_eq!(self.grid.verify_consistency(), Ok(()));
                StepResult::ContradictionHandled
            }
            BacktrackOutcome::Exhausted => {
                self.state = SolverState::Failed;
                warn!(
                    steps = self.stats.steps,
                    contradictions = self.stats.contradictions,
                    "backtracking exhausted"
                );
                StepResult::Failed
            }
        }
    }

    /// Step until the run completes or fails.
    pub fn run_to_completion(&mut self) -> SolveOutcome {
        loop {
            match self.step() {
                StepResult::Completed => return SolveOutcome::Solved(self.current_assignment()),
                StepResult::Failed => return SolveOutcome::Unsolvable,
                StepResult::Progressed | StepResult::ContradictionHandled => {}
            }
        }
    }

    /// Collapsed cells only.
    pub fn current_assignment(&self) -> Assignment {
        self.grid
            .cells()
            .filter_map(|cell| cell.assigned().map(|id| (cell.coord, id)))
            .collect()
    }

    /// Back to the post-constraint grid with the initial random stream.
    pub fn reset(&mut self) {
        self.grid = self.initial.clone();
        self.stack.clear();
        self.trail.clear();
        self.rng = self.initial_rng.clone();
        self.state = SolverState::Running;
        self.stats = SolverStats::default();
        debug!("solver reset");
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    pub fn domain(&self, coord: Coord) -> Option<&Domain> {
        self.grid.cell(coord).map(|c| &c.domain)
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Number of collapse decisions currently on the stack.
    pub fn backtrack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn oracle(&self) -> &CompatibilityOracle {
        &self.oracle
    }

    /// Seed of the built-in generator; `None` for an injected one.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Module;
    use crate::constraint::Region;
    use crate::direction::Direction;

    fn open_catalog(n: usize) -> (ModuleCatalog, CompatibilityOracle) {
        let mut catalog = ModuleCatalog::new();
        for i in 0..n {
            let module = Module::new(format!("m{}", i))
                .with_sides("s")
                .with(Direction::PosY, "s")
                .with(Direction::NegY, "s");
            catalog.register_default(module).unwrap();
        }
        let oracle = CompatibilityOracle::from_catalog(&catalog);
        (catalog, oracle)
    }

    #[test]
    fn test_oracle_size_mismatch_rejected() {
        let (catalog, _) = open_catalog(2);
        let config = SolverConfig::new(Dimensions::new(1, 1, 1));
        let oracle = CompatibilityOracle::incompatible(3);
        let err = Solver::new(config, catalog, oracle).err();
        let expected = SolverError::OracleMismatch {
            oracle: 3,
            catalog: 2,
        };
        assert_eq!(err, Some(expected));
    }

    #[test]
    fn test_unknown_constraint_module_rejected() {
        let (catalog, oracle) = open_catalog(2);
        let config = SolverConfig::new(Dimensions::new(1, 1, 1))
            .with_constraint(Constraint::new(Region::All, [ModuleId(9)]));
        let err = Solver::new(config, catalog, oracle).err();
        assert_eq!(err, Some(SolverError::UnknownModule(ModuleId(9))));
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let (catalog, oracle) = open_catalog(1);
        let config = SolverConfig::new(Dimensions::new(1, 1, 1)).with_seed(1);
        let mut solver = Solver::new(config, catalog, oracle).unwrap();
        assert_eq!(solver.step(), StepResult::Progressed);
        assert_eq!(solver.step(), StepResult::Completed);
        assert_eq!(solver.step(), StepResult::Completed);
        assert_eq!(solver.state(), SolverState::Solved);
        assert_eq!(solver.stats().steps, 2);
    }

    #[test]
    fn test_unseeded_solver_remembers_seed() {
        let (catalog, oracle) = open_catalog(3);
        let config = SolverConfig::new(Dimensions::new(3, 2, 3));
        let mut solver = Solver::new(config, catalog, oracle).unwrap();
        assert!(solver.seed().is_some());
        let first = solver.run_to_completion();
        solver.reset();
        assert_eq!(solver.run_to_completion(), first);
    }

    #[test]
    fn test_reset_clears_progress() {
        let (catalog, oracle) = open_catalog(2);
        let config = SolverConfig::new(Dimensions::new(2, 2, 2)).with_seed(4);
        let mut solver = Solver::new(config, catalog, oracle).unwrap();
        solver.step();
        solver.step();
        assert_eq!(solver.current_assignment().len(), 2);
        solver.reset();
        assert!(solver.current_assignment().is_empty());
        assert_eq!(solver.backtrack_depth(), 0);
        assert_eq!(solver.stats(), SolverStats::default());
        assert_eq!(solver.state(), SolverState::Running);
    }

    #[test]
    #[should_panic(expected = "asymmetric")]
    fn test_asymmetric_oracle_panics() {
        let (catalog, _) = open_catalog(2);
        let mut oracle = CompatibilityOracle::incompatible(2);
        oracle.set_one_sided(ModuleId(0), ModuleId(1), Direction::PosX);
        let config = SolverConfig::new(Dimensions::new(1, 1, 1));
        let _ = Solver::new(config, catalog, oracle);
    }
}

//! End-to-end solver behavior on small hand-built catalogs.

use wfc_core::presets::building_tileset;
use wfc_core::rng::ScriptedRandom;
use wfc_core::{
    verify_assignment, CompatibilityOracle, Constraint, Coord, Dimensions, Direction, Module,
    ModuleCatalog, ModuleId, Region, SolveOutcome, Solver, SolverConfig, SolverError, SolverState,
    StepResult,
};

fn solved(outcome: SolveOutcome) -> wfc_core::Assignment {
    match outcome {
        SolveOutcome::Solved(assignment) => assignment,
        SolveOutcome::Unsolvable => panic!("expected a solution"),
    }
}

/// `n` modules that connect to each other on every side.
fn uniform(n: usize) -> (ModuleCatalog, CompatibilityOracle) {
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
fn test_single_cell_single_module() {
    let mut catalog = ModuleCatalog::new();
    let only = catalog.register(Module::new("block"), 1.0).unwrap();
    let oracle = CompatibilityOracle::from_catalog(&catalog);
    let config = SolverConfig::new(Dimensions::new(1, 1, 1)).with_seed(0);

    let mut solver = Solver::new(config, catalog, oracle).unwrap();
    let assignment = solved(solver.run_to_completion());
    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment[&Coord::new(0, 0, 0)], only);
}

#[test]
fn test_two_cells_only_valid_orientation() {
    for seed in 0..20 {
        let mut catalog = ModuleCatalog::new();
        let a = catalog
            .register_default(Module::new("A").with(Direction::PosX, "x"))
            .unwrap();
        let b = catalog
            .register_default(Module::new("B").with(Direction::NegX, "x"))
            .unwrap();
        let oracle = CompatibilityOracle::from_catalog(&catalog);
        let config = SolverConfig::new(Dimensions::new(2, 1, 1)).with_seed(seed);

        let mut solver = Solver::new(config, catalog, oracle).unwrap();
        let assignment = solved(solver.run_to_completion());
        assert_eq!(assignment[&Coord::new(0, 0, 0)], a, "seed {}", seed);
        assert_eq!(assignment[&Coord::new(1, 0, 0)], b, "seed {}", seed);
    }
}

#[test]
fn test_no_compatible_pair_is_unsolvable() {
    let mut catalog = ModuleCatalog::new();
    catalog.register_default(Module::new("p")).unwrap();
    catalog.register_default(Module::new("q")).unwrap();
    let oracle = CompatibilityOracle::from_catalog(&catalog);
    let config = SolverConfig::new(Dimensions::new(2, 1, 1)).with_seed(5);

    let mut solver = Solver::new(config, catalog, oracle).unwrap();
    assert_eq!(solver.run_to_completion(), SolveOutcome::Unsolvable);
    assert_eq!(solver.state(), SolverState::Failed);
    assert_eq!(solver.step(), StepResult::Failed);
    // One failed collapse; its only alternative fails too.
    assert_eq!(solver.stats().contradictions, 1);
    assert_eq!(solver.stats().backtracks, 1);
    assert_eq!(solver.backtrack_depth(), 0);
}

#[test]
fn test_pinned_cell_keeps_its_module() {
    let (catalog, oracle) = uniform(3);
    let origin = Coord::new(0, 0, 0);
    let config = SolverConfig::new(Dimensions::new(3, 1, 1))
        .with_seed(8)
        .with_constraint(Constraint::at(origin, [ModuleId(2)]));

    let mut solver = Solver::new(config, catalog, oracle).unwrap();
    let assignment = solved(solver.run_to_completion());
    assert_eq!(assignment.len(), 3);
    assert_eq!(assignment[&origin], ModuleId(2));
}

/// Two rows of two cells. Bottom-row pieces `A0`/`A1` repeat along X
/// while top-row pieces `B0`/`B1` alternate, and each `Ak` supports only
/// `Bk`. Any choice other than the weightless filler `E` closes an odd
/// parity cycle, so the first collapse always fails.
fn parity_cycle() -> (ModuleCatalog, CompatibilityOracle, Vec<Constraint>) {
    let mut catalog = ModuleCatalog::new();
    let a0 = catalog.register_default(Module::new("A0")).unwrap();
    let a1 = catalog.register_default(Module::new("A1")).unwrap();
    let b0 = catalog.register_default(Module::new("B0")).unwrap();
    let b1 = catalog.register_default(Module::new("B1")).unwrap();
    let e = catalog.register(Module::new("E"), 0.0).unwrap();

    let mut oracle = CompatibilityOracle::incompatible(catalog.len());
    for (l, r) in [(a0, a0), (a1, a1), (b0, b1), (b1, b0), (e, e)] {
        oracle.allow(l, r, Direction::PosX);
    }
    for (below, above) in [(a0, b0), (a1, b1), (e, e)] {
        oracle.allow(below, above, Direction::PosY);
    }

    let constraints = vec![
        Constraint::new(Region::BottomLayer, [a0, a1, e]),
        Constraint::new(Region::TopLayer, [b0, b1, e]),
    ];
    (catalog, oracle, constraints)
}

#[test]
fn test_backtracking_recovers_from_forced_contradiction() {
    for seed in 0..10 {
        let (catalog, oracle, constraints) = parity_cycle();
        let e = catalog.id_of("E").unwrap();
        let config = SolverConfig::new(Dimensions::new(2, 2, 1))
            .with_seed(seed)
            .with_constraints(constraints);
        let mut solver = Solver::new(config, catalog, oracle).unwrap();

        let mut handled = 0;
        loop {
            let depth_before = solver.backtrack_depth();
            match solver.step() {
                StepResult::ContradictionHandled => {
                    handled += 1;
                    assert!(solver.backtrack_depth() <= depth_before);
                }
                StepResult::Progressed => {}
                StepResult::Completed => break,
                StepResult::Failed => panic!("seed {} should be solvable", seed),
            }
        }

        assert!(handled >= 1, "seed {} never backtracked", seed);
        let assignment = solver.current_assignment();
        assert_eq!(assignment.len(), 4);
        assert!(assignment.values().all(|&id| id == e));
        let verdict = verify_assignment(&assignment, solver.dimensions(), solver.oracle());
        assert_eq!(verdict, Ok(()));
        assert!(solver.stats().backtracks >= handled);
    }
}

#[test]
fn test_constraint_emptying_domain_is_construction_error() {
    let (catalog, oracle) = uniform(2);
    let config = SolverConfig::new(Dimensions::new(2, 1, 1))
        .with_constraint(Constraint::new(Region::All, [ModuleId(0)]))
        .with_constraint(Constraint::at(Coord::new(1, 0, 0), [ModuleId(1)]));
    let err = Solver::new(config, catalog, oracle).err();
    assert_eq!(
        err,
        Some(SolverError::ConstraintEmptiedDomain {
            coord: Coord::new(1, 0, 0)
        })
    );
}

#[test]
fn test_initial_propagation_contradiction_is_construction_error() {
    let mut catalog = ModuleCatalog::new();
    let a = catalog
        .register_default(Module::new("a").with(Direction::PosX, "x"))
        .unwrap();
    let b = catalog
        .register_default(Module::new("b").with(Direction::NegX, "x"))
        .unwrap();
    let oracle = CompatibilityOracle::from_catalog(&catalog);
    // `b` on the left leaves nothing for its right neighbor.
    let config = SolverConfig::new(Dimensions::new(2, 1, 1))
        .with_constraint(Constraint::at(Coord::new(0, 0, 0), [b]))
        .with_constraint(Constraint::at(Coord::new(1, 0, 0), [a, b]));
    let err = Solver::new(config, catalog, oracle).err();
    assert_eq!(
        err,
        Some(SolverError::InitialContradiction {
            coord: Coord::new(1, 0, 0)
        })
    );
}

#[test]
fn test_invalid_dimensions_rejected() {
    let (catalog, oracle) = uniform(1);
    let config = SolverConfig::new(Dimensions::new(2, 0, 2));
    let err = Solver::new(config, catalog, oracle).err();
    assert_eq!(err, Some(SolverError::InvalidDimensions(2, 0, 2)));
}

#[test]
fn test_solutions_respect_adjacency() {
    let tileset = building_tileset(None).unwrap();
    let dims = Dimensions::new(5, 4, 5);
    for seed in 0..8 {
        let mut solver = tileset.solver(dims, Some(seed)).unwrap();
        let assignment = solved(solver.run_to_completion());
        assert_eq!(Some(assignment.len()), dims.cell_count());
        let verdict = verify_assignment(&assignment, dims, &tileset.oracle);
        assert_eq!(verdict, Ok(()));
    }
}

#[test]
fn test_same_seed_same_run() {
    let tileset = building_tileset(None).unwrap();
    let dims = Dimensions::new(4, 3, 4);
    let mut left = tileset.solver(dims, Some(99)).unwrap();
    let mut right = tileset.solver(dims, Some(99)).unwrap();

    loop {
        let a = left.step();
        let b = right.step();
        assert_eq!(a, b);
        assert_eq!(left.current_assignment(), right.current_assignment());
        if matches!(a, StepResult::Completed | StepResult::Failed) {
            break;
        }
    }
    assert_eq!(left.stats(), right.stats());
}

#[test]
fn test_stepwise_matches_automatic() {
    let tileset = building_tileset(None).unwrap();
    let dims = Dimensions::new(4, 3, 4);

    let mut stepped = tileset.solver(dims, Some(17)).unwrap();
    while !matches!(stepped.step(), StepResult::Completed | StepResult::Failed) {}

    let mut automatic = tileset.solver(dims, Some(17)).unwrap();
    let assignment = solved(automatic.run_to_completion());
    assert_eq!(stepped.current_assignment(), assignment);
}

#[test]
fn test_reset_replays_identically() {
    let tileset = building_tileset(None).unwrap();
    let mut solver = tileset.solver(Dimensions::new(3, 3, 3), Some(4)).unwrap();
    let initial: Vec<_> = solver.grid().cells().map(|c| c.domain.clone()).collect();

    let first = solved(solver.run_to_completion());
    let stats = solver.stats();
    solver.reset();

    let after_reset: Vec<_> = solver.grid().cells().map(|c| c.domain.clone()).collect();
    assert_eq!(initial, after_reset);
    assert_eq!(solver.state(), SolverState::Running);
    assert_eq!(solved(solver.run_to_completion()), first);
    assert_eq!(solver.stats(), stats);
}

#[test]
fn test_current_assignment_is_idempotent() {
    let tileset = building_tileset(None).unwrap();
    let mut solver = tileset.solver(Dimensions::new(3, 2, 3), Some(2)).unwrap();
    for _ in 0..5 {
        solver.step();
        let first = solver.current_assignment();
        let second = solver.current_assignment();
        assert_eq!(first, second);
        for coord in first.keys() {
            assert!(solver.grid().cell(*coord).unwrap().is_collapsed());
        }
    }
}

fn domain_sizes(solver: &Solver) -> Vec<usize> {
    solver.grid().cells().map(|c| c.domain.len()).collect()
}

#[test]
fn test_progress_never_grows_domains() {
    let tileset = building_tileset(None).unwrap();
    let mut solver = tileset.solver(Dimensions::new(4, 3, 4), Some(31)).unwrap();
    let mut previous = domain_sizes(&solver);
    loop {
        let result = solver.step();
        let current = domain_sizes(&solver);
        if result == StepResult::Progressed {
            for (now, before) in current.iter().zip(&previous) {
                assert!(now <= before);
            }
        }
        previous = current;
        if matches!(result, StepResult::Completed | StepResult::Failed) {
            break;
        }
    }
}

#[test]
fn test_injected_rng_drives_choices() {
    let (catalog, oracle) = uniform(2);
    // Always draw near zero: every weighted choice lands on the first id.
    let rng = Box::new(ScriptedRandom::new(vec![0.0], vec![0]));
    let config = SolverConfig::new(Dimensions::new(3, 1, 1));
    let mut solver = Solver::with_rng(config, catalog, oracle, rng).unwrap();
    assert_eq!(solver.seed(), None);

    let assignment = solved(solver.run_to_completion());
    assert!(assignment.values().all(|&id| id == ModuleId(0)));
    solver.reset();
    assert_eq!(solved(solver.run_to_completion()), assignment);
}

#[test]
fn test_unseeded_solvers_still_solve() {
    let tileset = building_tileset(None).unwrap();
    let mut solver = tileset.solver(Dimensions::new(3, 2, 3), None).unwrap();
    assert!(solver.seed().is_some());
    let assignment = solved(solver.run_to_completion());
    let verdict = verify_assignment(&assignment, solver.dimensions(), solver.oracle());
    assert_eq!(verdict, Ok(()));
}

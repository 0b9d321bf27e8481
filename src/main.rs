use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum, ValueHint};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wfc_core::presets::{building_tileset, Style};
use wfc_core::{
    load_tileset, save_assignment, verify_assignment, Assignment, Coord, Dimensions, SolveOutcome,
    StepResult, Tileset,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Building,
}

/// Generate modular 3D buildings with wave function collapse
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// XML tileset to solve instead of a built-in preset
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "preset")]
    tileset: Option<PathBuf>,

    /// Built-in tileset
    #[arg(long, value_enum, default_value_t = Preset::Building)]
    preset: Preset,

    /// Architectural style applied to the preset's weights
    #[arg(long, conflicts_with = "tileset")]
    style: Option<Style>,

    /// Grid size as WIDTHxHEIGHTxDEPTH
    #[arg(long, default_value = "6x4x6", value_parser = parse_size)]
    size: Dimensions,

    /// Seed for reproducible output; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Log every step outcome
    #[arg(long)]
    stepwise: bool,

    /// Write the solved grid as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

fn parse_size(s: &str) -> Result<Dimensions, String> {
    let parts: Vec<&str> = s.split(['x', 'X']).collect();
    let &[w, h, d] = parts.as_slice() else {
        return Err(format!("expected WIDTHxHEIGHTxDEPTH, got '{}'", s));
    };
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|_| format!("'{}' is not a positive integer", v))
    };
    Ok(Dimensions::new(parse(w)?, parse(h)?, parse(d)?))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let tileset: Tileset = match &cli.tileset {
        Some(path) => load_tileset(path)
            .with_context(|| format!("failed to load tileset {}", path.display()))?,
        None => match cli.preset {
            Preset::Building => building_tileset(cli.style)
                .context("failed to build preset")?,
        },
    };

    let mut solver = tileset
        .solver(cli.size, cli.seed)
        .context("failed to set up solver")?;
    info!(
        size = %cli.size,
        modules = tileset.catalog.len(),
        seed = solver.seed(),
        "solving"
    );

    let outcome = if cli.stepwise {
        loop {
            let result = solver.step();
            info!(
                step = solver.stats().steps,
                result = ?result,
                placed = solver.current_assignment().len(),
                depth = solver.backtrack_depth()
            );
            match result {
                StepResult::Completed => break SolveOutcome::Solved(solver.current_assignment()),
                StepResult::Failed => break SolveOutcome::Unsolvable,
                StepResult::Progressed | StepResult::ContradictionHandled => {}
            }
        }
    } else {
        solver.run_to_completion()
    };

    let SolveOutcome::Solved(assignment) = outcome else {
        bail!(
            "no solution for {} after {} contradictions",
            cli.size,
            solver.stats().contradictions
        );
    };

    if let Err(violation) = verify_assignment(&assignment, cli.size, &tileset.oracle) {
        bail!("solver produced an invalid grid: {:?}", violation);
    }
    info!(stats = ?solver.stats(), "solved");

    match &cli.output {
        Some(path) => {
            save_assignment(path, &assignment, cli.size, &tileset.catalog)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "saved");
        }
        None => print_layers(&assignment, cli.size, &tileset),
    }
    Ok(())
}

/// One block of text per storey, bottom first, using each module's initial.
fn print_layers(assignment: &Assignment, dims: Dimensions, tileset: &Tileset) {
    for y in 0..dims.my {
        println!("y = {}", y);
        for z in 0..dims.mz {
            let row: String = (0..dims.mx)
                .map(|x| {
                    assignment
                        .get(&Coord::new(x, y, z))
                        .and_then(|&id| tileset.catalog.name(id).chars().next())
                        .unwrap_or('?')
                })
                .collect();
            println!("  {}", row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("6x4x6"), Ok(Dimensions::new(6, 4, 6)));
        assert_eq!(parse_size("2X3x1"), Ok(Dimensions::new(2, 3, 1)));
        assert!(parse_size("6x4").is_err());
        assert!(parse_size("axbxc").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["wfc_studio"]).unwrap();
        assert_eq!(cli.size, Dimensions::new(6, 4, 6));
        assert!(cli.tileset.is_none());
        assert!(!cli.stepwise);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "wfc_studio",
            "--size",
            "3x2x3",
            "--seed",
            "9",
            "--style",
            "modern",
            "--stepwise",
        ])
        .unwrap();
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.style, Some(Style::Modern));
        assert!(cli.stepwise);
        let conflicting = ["wfc_studio", "--tileset", "a.xml", "--style", "modern"];
        assert!(Cli::try_parse_from(conflicting).is_err());
    }
}

//! `thermal steady`: load a network scenario, solve for the steady-state
//! temperature field, print + optionally write CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use thermal_network::{MNABuilder, MnaOptions};
use thermal_solver::SteadyStateSolver;

use crate::commands::BackendArg;
use crate::output::{print_steady_solution, steady_csv};
use crate::scenario::NetworkScenario;

#[derive(Debug, Args)]
pub struct SteadyArgs {
    /// Path to a network scenario JSON file.
    pub scenario: PathBuf,
    #[arg(long, value_enum, default_value = "auto")]
    pub backend: BackendArg,
    /// Write the per-node steady-state CSV to this path.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn run(args: &SteadyArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: NetworkScenario =
        serde_json::from_str(&text).context("parsing network scenario JSON")?;

    let mut network = scenario.build()?;
    let mna = MNABuilder::build(&network, &MnaOptions::default())
        .map_err(|e| anyhow::anyhow!("assembly error: {e}"))?;

    let backend = args.backend.resolve();
    let solution =
        SteadyStateSolver::solve(&mut network, &mna, scenario.ref_temperature, &backend)
            .map_err(|e| anyhow::anyhow!("solver error: {e}"))?;

    if !solution.converged {
        log::warn!(
            "steady-state solve did not converge after {} iterations (residual {:.3e})",
            solution.iterations,
            solution.residual
        );
    }

    print_steady_solution(&solution);

    if let Some(path) = &args.csv {
        std::fs::write(path, steady_csv(&solution))
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

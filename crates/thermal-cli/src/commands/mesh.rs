//! `thermal mesh`: extract a triangulated prism network from a simplified
//! stackup scenario, solve steady-state, and optionally dump the legacy VTK
//! mesh (spec.md §6 "optional VTK... dump", gated here by `--vtk` rather
//! than `Config::dump_mesh` directly since the CLI has no separate
//! `Workspace` wiring yet).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use thermal_network::{MNABuilder, MnaOptions};
use thermal_prism::{PrismExtractOptions, PrismExtractor};
use thermal_solver::SteadyStateSolver;

use crate::commands::BackendArg;
use crate::output::{print_steady_solution, steady_csv};
use crate::scenario::MeshScenario;

#[derive(Debug, Args)]
pub struct MeshArgs {
    /// Path to a mesh scenario JSON file.
    pub scenario: PathBuf,
    #[arg(long, value_enum, default_value = "auto")]
    pub backend: BackendArg,
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Write a legacy-ASCII VTK dump (with solved temperatures) to this path.
    #[arg(long)]
    pub vtk: Option<PathBuf>,
}

pub fn run(args: &MeshArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: MeshScenario =
        serde_json::from_str(&text).context("parsing mesh scenario JSON")?;

    let (materials, layer_specs, boundary) = scenario.build()?;
    let options = PrismExtractOptions {
        ref_t: scenario.ref_temperature,
        ..PrismExtractOptions::default()
    };

    let (mut network, geometry) =
        PrismExtractor::extract(&layer_specs, &materials, &[], &boundary, &options)
            .map_err(|e| anyhow::anyhow!("extraction error: {e}"))?;

    let mna = MNABuilder::build(&network, &MnaOptions::default())
        .map_err(|e| anyhow::anyhow!("assembly error: {e}"))?;

    let backend = args.backend.resolve();
    let solution =
        SteadyStateSolver::solve(&mut network, &mna, scenario.ref_temperature, &backend)
            .map_err(|e| anyhow::anyhow!("solver error: {e}"))?;

    print_steady_solution(&solution);
    log::debug!(
        "extracted {} elements, {} wedge cells",
        network.size(),
        geometry.cells.len()
    );

    if let Some(path) = &args.csv {
        std::fs::write(path, steady_csv(&solution))
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    if let Some(path) = &args.vtk {
        let vtk = thermal_prism::vtk::write_legacy_ascii(&geometry, Some(&solution.t));
        std::fs::write(path, vtk).with_context(|| format!("writing VTK to {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

//! `thermal transient`: load a network scenario, integrate from its initial
//! state (pinned `t` values, or `ref_temperature` where unpinned) out to
//! `--duration`, streaming accepted points to a CSV sink.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use thermal_network::{MNABuilder, MnaOptions};
use thermal_solver::{RkControl, TransientSolver};

use crate::output::CsvTransientObserver;
use crate::scenario::NetworkScenario;

#[derive(Debug, Args)]
pub struct TransientArgs {
    /// Path to a network scenario JSON file.
    pub scenario: PathBuf,
    /// Simulated duration, seconds.
    #[arg(long)]
    pub duration: f64,
    /// Write the accepted-point CSV stream to this path.
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Node indices to record in the CSV stream; repeat for multiple
    /// probes, omit to record every node.
    #[arg(long = "probe")]
    pub probes: Vec<usize>,
    /// Minimum elapsed simulated time between recorded CSV rows, seconds;
    /// 0 records every accepted integrator step.
    #[arg(long, default_value_t = 0.0)]
    pub interval: f64,
}

pub fn run(args: &TransientArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: NetworkScenario =
        serde_json::from_str(&text).context("parsing network scenario JSON")?;

    let network = scenario.build()?;
    let mna_options = MnaOptions { probes: args.probes.clone() };
    let mna = MNABuilder::build(&network, &mna_options)
        .map_err(|e| anyhow::anyhow!("assembly error: {e}"))?;

    let x0 = scenario.initial_state();
    let control = RkControl::for_duration(args.duration);
    let mut observer = CsvTransientObserver::with_probes(mna.probe_indices.clone(), args.interval);
    let num_sources = mna.num_sources();
    let excitation = move |_t: f64| vec![1.0; num_sources];

    let x_final = TransientSolver::run(
        &mna,
        &x0,
        scenario.ref_temperature,
        args.duration,
        &control,
        &excitation,
        &mut observer,
    )
    .map_err(|e| anyhow::anyhow!("transient error: {e}"))?;

    println!("Transient Analysis (duration = {} s)", args.duration);
    println!("==========================================");
    println!();
    println!("Final Node Temperatures:");
    for (i, t) in x_final.iter().enumerate() {
        println!("  T({i}) = {t:.6} K");
    }
    println!();

    if let Some(path) = &args.csv {
        std::fs::write(path, observer.into_csv())
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

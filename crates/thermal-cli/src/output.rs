//! Report formatting: tabular console output plus CSV emission for
//! spec.md §6's "steady-state min/max + per-node CSV, transient CSV stream"
//! outputs.

use std::fmt::Write as _;

use thermal_solver::{ProbeSampler, SteadyStateSolution, TransientObservation, TransientObserver};

/// Print every node temperature followed by the summary statistics.
pub fn print_steady_solution(solution: &SteadyStateSolution) {
    println!("Node Temperatures:");
    for (i, t) in solution.t.iter().enumerate() {
        println!("  T({}) = {:.6} K", i, t);
    }
    println!();
    println!(
        "min = {:.6} K, max = {:.6} K, converged = {}, iterations = {}, residual = {:.3e}",
        solution.min_t, solution.max_t, solution.converged, solution.iterations, solution.residual
    );
    println!();
}

pub fn steady_csv(solution: &SteadyStateSolution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "node,temperature_k");
    for (i, t) in solution.t.iter().enumerate() {
        let _ = writeln!(out, "{i},{t}");
    }
    out
}

/// Collects sampled transient points into a CSV buffer, one row per sampled
/// point: `t, v_p1, ..., v_pk` (spec.md §6's "transient CSV stream"), the
/// `p1..pk` probe columns and sample cadence driven by a `ProbeSampler`.
/// `thermal-cli` writes the buffer out once the run completes (or is
/// cancelled).
#[derive(Debug, Default)]
pub struct CsvTransientObserver {
    header_written: bool,
    buf: String,
    sampler: ProbeSampler,
    probe_labels: Vec<usize>,
}

impl CsvTransientObserver {
    /// Emits every node on every accepted step, matching `ProbeSampler`'s
    /// default cadence.
    pub fn new() -> Self {
        Self::default()
    }

    /// `probe_indices` selects which node temperatures become CSV columns
    /// (empty means every node); `interval` is the minimum elapsed
    /// simulated time between emitted rows.
    pub fn with_probes(probe_indices: Vec<usize>, interval: f64) -> Self {
        Self {
            header_written: false,
            buf: String::new(),
            probe_labels: probe_indices.clone(),
            sampler: ProbeSampler::new(probe_indices, interval),
        }
    }

    pub fn into_csv(self) -> String {
        self.buf
    }
}

impl TransientObserver for CsvTransientObserver {
    fn record(&mut self, obs: TransientObservation) -> bool {
        let Some((t, values)) = self.sampler.sample(obs.t, &obs.x) else {
            return true;
        };
        if !self.header_written {
            let _ = write!(self.buf, "t");
            if self.probe_labels.is_empty() {
                for i in 0..values.len() {
                    let _ = write!(self.buf, ",v{i}");
                }
            } else {
                for &p in &self.probe_labels {
                    let _ = write!(self.buf, ",v{p}");
                }
            }
            let _ = writeln!(self.buf);
            self.header_written = true;
        }
        let _ = write!(self.buf, "{t}");
        for v in &values {
            let _ = write!(self.buf, ",{v}");
        }
        let _ = writeln!(self.buf);
        true
    }
}

//! Steady-state solve: `G x = B u` (spec.md §4.3).
//!
//! Nodes whose temperature is already known when `solve` is called are
//! treated as Dirichlet-pinned (spec.md §3's "unknown" sentinel doubles as
//! the Dirichlet marker: a `Some(t)` node entering the solve is pinned, a
//! `None` node is free). Pinned columns are folded into the right-hand side
//! and the reduced system is solved only over the free nodes, per spec.md
//! §4.8's "assembly substitutes the known value and moves contributions to
//! the right-hand side".

use faer::sparse::{SparseColMat, Triplet};
use thermal_network::{MnaSystem, ThermalNetwork};

use crate::cg::{CgConfig, solve_cg};
use crate::direct::solve_direct;
use crate::error::SolverResult;
use crate::operator::SparseRealOperator;
use crate::preconditioner::JacobiPreconditioner;

/// Back-end selection for the steady-state solve (spec.md §4.3).
#[derive(Debug, Clone)]
pub enum SteadyBackend {
    /// Conjugate gradient (SPD). Default.
    Iterative(CgConfig),
    /// Simplicial Cholesky, falling back to sparse LU.
    Direct,
    /// Direct below `direct_threshold` nodes, CG above it: small systems are
    /// cheaper to factor directly, large SPD systems favor CG.
    Auto { direct_threshold: usize, cg: CgConfig },
}

impl Default for SteadyBackend {
    fn default() -> Self {
        SteadyBackend::Auto {
            direct_threshold: 64,
            cg: CgConfig::default(),
        }
    }
}

/// Result of a steady-state solve.
#[derive(Debug, Clone)]
pub struct SteadyStateSolution {
    /// Temperature at every node (including pinned/Dirichlet nodes,
    /// unchanged from their input value).
    pub t: Vec<f64>,
    pub min_t: f64,
    pub max_t: f64,
    /// `false` if the iterative back-end exhausted its iteration budget
    /// (spec.md §7: caller must consult this before trusting `t`).
    pub converged: bool,
    pub iterations: usize,
    pub residual: f64,
}

pub struct SteadyStateSolver;

impl SteadyStateSolver {
    /// Solve for the steady-state temperature field and write it back onto
    /// every free node of `network` (spec.md §4.3's "After solve, write x
    /// back to the network's t field for exactly the nodes covered").
    pub fn solve(
        network: &mut ThermalNetwork,
        mna: &MnaSystem,
        ref_t: f64,
        backend: &SteadyBackend,
    ) -> SolverResult<SteadyStateSolution> {
        let n = mna.size();
        let pinned: Vec<(usize, f64)> = (0..n)
            .filter_map(|i| network.node(i).t.map(|t| (i, t)))
            .collect();

        let mut is_free = vec![true; n];
        for &(i, _) in &pinned {
            is_free[i] = false;
        }
        let mut free_of = vec![usize::MAX; n];
        let mut free_indices = Vec::with_capacity(n);
        for i in 0..n {
            if is_free[i] {
                free_of[i] = free_indices.len();
                free_indices.push(i);
            }
        }
        let m = free_indices.len();

        let rhs_full = mna.rhs_full(ref_t);
        let mut rhs_reduced = vec![0.0_f64; m.max(1)];
        for &i in &free_indices {
            rhs_reduced[free_of[i]] = rhs_full[i];
        }

        let mut g_ff_triplets: Vec<Triplet<usize, usize, f64>> = Vec::new();
        let g_ref = mna.g.as_ref();
        let col_ptr = g_ref.col_ptr();
        let row_idx = g_ref.row_idx();
        let val = g_ref.val();
        for j in 0..n {
            for idx in col_ptr[j]..col_ptr[j + 1] {
                let i = row_idx[idx];
                let v = val[idx];
                if is_free[i] && is_free[j] {
                    g_ff_triplets.push(Triplet::new(free_of[i], free_of[j], v));
                } else if is_free[i] && !is_free[j] {
                    // Move the pinned column's contribution to the RHS.
                    let t_j = pinned
                        .iter()
                        .find(|&&(p, _)| p == j)
                        .map(|&(_, t)| t)
                        .unwrap();
                    rhs_reduced[free_of[i]] -= v * t_j;
                }
            }
        }

        if m == 0 {
            // Every node is pinned: nothing to solve.
            let t: Vec<f64> = (0..n).map(|i| network.node(i).t.unwrap()).collect();
            let (min_t, max_t) = min_max(&t);
            return Ok(SteadyStateSolution {
                t,
                min_t,
                max_t,
                converged: true,
                iterations: 0,
                residual: 0.0,
            });
        }

        let g_ff = SparseColMat::try_new_from_triplets(m, m, &g_ff_triplets)
            .expect("reduced G triplets are well-formed (derived from a valid sparse G)");

        let (x_free, converged, iterations, residual) = match backend {
            SteadyBackend::Direct => {
                let x = solve_direct(&g_ff, &rhs_reduced)?;
                (x, true, 0, 0.0)
            }
            SteadyBackend::Iterative(cfg) => {
                let op = SparseRealOperator::new(&g_ff);
                let pc = JacobiPreconditioner::from_matrix(&g_ff);
                let result = solve_cg(&op, &pc, &rhs_reduced, cfg);
                (result.x, result.converged, result.iterations, result.residual)
            }
            SteadyBackend::Auto { direct_threshold, cg } => {
                if m < *direct_threshold {
                    let x = solve_direct(&g_ff, &rhs_reduced)?;
                    (x, true, 0, 0.0)
                } else {
                    let op = SparseRealOperator::new(&g_ff);
                    let pc = JacobiPreconditioner::from_matrix(&g_ff);
                    let result = solve_cg(&op, &pc, &rhs_reduced, cg);
                    (result.x, result.converged, result.iterations, result.residual)
                }
            }
        };

        let mut t = vec![0.0_f64; n];
        for &(i, v) in &pinned {
            t[i] = v;
        }
        for (fi, &i) in free_indices.iter().enumerate() {
            t[i] = x_free[fi];
            network.set_t(i, x_free[fi]);
        }

        let (min_t, max_t) = min_max(&t);
        Ok(SteadyStateSolution {
            t,
            min_t,
            max_t,
            converged,
            iterations,
            residual,
        })
    }

    /// Iterative refinement for temperature-dependent conductivity
    /// (spec.md §4.3): repeatedly re-assemble and re-solve via `rebuild`
    /// (which should re-derive `{network, mna}` from the latest
    /// temperature field), stopping when the mean `|ΔT|` between passes
    /// drops below `residual` or `iterations` is exhausted.
    pub fn solve_with_refinement(
        iterations: usize,
        residual_tol: f64,
        ref_t: f64,
        backend: &SteadyBackend,
        mut rebuild: impl FnMut(Option<&[f64]>) -> SolverResult<(ThermalNetwork, MnaSystem)>,
    ) -> SolverResult<SteadyStateSolution> {
        let mut prev_t: Option<Vec<f64>> = None;
        let mut last = None;
        let passes = iterations.max(1);
        for _ in 0..passes {
            let (mut net, mna) = rebuild(prev_t.as_deref())?;
            let sol = Self::solve(&mut net, &mna, ref_t, backend)?;
            if let Some(prev) = &prev_t {
                let mean_abs: f64 = sol
                    .t
                    .iter()
                    .zip(prev)
                    .map(|(a, b)| (a - b).abs())
                    .sum::<f64>()
                    / sol.t.len().max(1) as f64;
                if mean_abs < residual_tol {
                    last = Some(sol);
                    break;
                }
            }
            prev_t = Some(sol.t.clone());
            last = Some(sol);
        }
        Ok(last.expect("at least one refinement pass always runs"))
    }
}

fn min_max(t: &[f64]) -> (f64, f64) {
    let min = t.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_network::MNABuilder;
    use thermal_network::MnaOptions;

    /// Scenario 1 (spec.md §8): two-node HTC network.
    #[test]
    fn two_node_htc_network_exact_temperatures() {
        let mut net = ThermalNetwork::new(2);
        net.set_hf(0, 1.0);
        net.set_r(0, 1, 10.0).unwrap();
        net.set_htc(1, 0.1);
        let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

        let sol = SteadyStateSolver::solve(&mut net, &mna, 300.0, &SteadyBackend::Direct).unwrap();
        assert!((sol.t[1] - 310.0).abs() < 1e-9);
        assert!((sol.t[0] - 320.0).abs() < 1e-9);
    }

    #[test]
    fn energy_is_conserved_at_steady_state() {
        let mut net = ThermalNetwork::new(3);
        net.set_hf(0, 2.0);
        net.set_r(0, 1, 4.0).unwrap();
        net.set_r(1, 2, 6.0).unwrap();
        net.set_htc(2, 0.2);
        let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();
        let ref_t = 300.0;
        let sol = SteadyStateSolver::solve(&mut net, &mna, ref_t, &SteadyBackend::Direct).unwrap();

        let total_hf = net.total_hf();
        let total_htc_balance: f64 = (0..3)
            .map(|i| net.node(i).htc * (ref_t - sol.t[i]))
            .sum();
        assert!((total_hf + total_htc_balance).abs() < 1e-6);
    }

    #[test]
    fn dirichlet_pinned_node_is_preserved_and_folds_into_rhs() {
        // Chain: node 0 (pinned at 300K) -- R=1 -- node 1 (free, hf=1W)
        let mut net = ThermalNetwork::new(2);
        net.set_t(0, 300.0);
        net.set_hf(1, 1.0);
        net.set_r(0, 1, 1.0).unwrap();
        let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

        let sol = SteadyStateSolver::solve(&mut net, &mna, 0.0, &SteadyBackend::Direct).unwrap();
        assert!((sol.t[0] - 300.0).abs() < 1e-9);
        // node1: G=1/R=1, rhs = hf(1) + (moved pinned contribution) G*T0 = 1 + 1*300
        assert!((sol.t[1] - 301.0).abs() < 1e-9);
    }
}

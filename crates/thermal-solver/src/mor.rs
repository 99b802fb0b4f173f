//! Model-order reduction (spec.md §4.5): a block-Arnoldi Krylov projection
//! (PRIMA-style moment matching) producing a reduced `{Ĝ,Ĉ,B̂}` pencil small
//! enough to integrate directly, plus `input2State`/`state2Output` lifting
//! operators back to full node space.

use nalgebra::{DMatrix, DVector};
use thermal_network::MnaSystem;

use crate::direct::solve_direct;
use crate::error::{SolverError, SolverResult};
use crate::transient::{RkCashKarp, RkControl, TransientObservation, TransientObserver};

/// `k = order * num_sources` is the nominal reduced dimension (spec.md
/// §4.5); the realized dimension may be smaller after rank-deficient Krylov
/// columns are dropped.
fn nominal_order(mna: &MnaSystem, order: usize) -> usize {
    (order * mna.num_sources().max(1)).min(mna.size())
}

fn dense_b(mna: &MnaSystem) -> DMatrix<f64> {
    let n = mna.size();
    let s = mna.num_sources();
    let mut out = DMatrix::<f64>::zeros(n, s.max(1));
    let b = mna.b.as_ref();
    let col_ptr = b.col_ptr();
    let row_idx = b.row_idx();
    let val = b.val();
    for j in 0..s {
        for idx in col_ptr[j]..col_ptr[j + 1] {
            out[(row_idx[idx], j)] = val[idx];
        }
    }
    out
}

fn solve_columns(mna: &MnaSystem, rhs: &DMatrix<f64>) -> SolverResult<DMatrix<f64>> {
    let n = mna.size();
    let ncols = rhs.ncols();
    let mut out = DMatrix::<f64>::zeros(n, ncols);
    for c in 0..ncols {
        let b: Vec<f64> = (0..n).map(|i| rhs[(i, c)]).collect();
        let x = solve_direct(&mna.g, &b)?;
        for i in 0..n {
            out[(i, c)] = x[i];
        }
    }
    Ok(out)
}

/// Build an orthonormal block-Arnoldi Krylov basis of `G^-1 B`,
/// `G^-1 C G^-1 B`, ... (moment-matching around `s=0`), one block of columns
/// per moment, up to `order` blocks. Columns that have become linearly
/// dependent on the existing basis (norm below `1e-10` of the original
/// block norm after orthogonalization) are dropped — the standard
/// deflation step in block Arnoldi.
fn build_basis(mna: &MnaSystem, order: usize) -> SolverResult<DMatrix<f64>> {
    let n = mna.size();
    let b_dense = dense_b(mna);
    let mut block = solve_columns(mna, &b_dense)?;

    let mut basis: Vec<nalgebra::DVector<f64>> = Vec::new();
    for pass in 0..order.max(1) {
        for c in 0..block.ncols() {
            let mut w = block.column(c).clone_owned();
            // Modified Gram-Schmidt, re-orthogonalized once for stability.
            for _ in 0..2 {
                for v in &basis {
                    let proj = v.dot(&w);
                    w -= v * proj;
                }
            }
            let norm = w.norm();
            if norm > 1e-10 {
                basis.push(w / norm);
            }
        }
        if pass + 1 < order {
            let c_times_block = apply_c_diag(mna, &block);
            block = solve_columns(mna, &c_times_block)?;
        }
    }

    if basis.is_empty() {
        return Err(SolverError::InvalidArg {
            what: "Krylov basis collapsed to dimension 0",
        });
    }

    let k = basis.len();
    let mut v = DMatrix::<f64>::zeros(n, k);
    for (j, col) in basis.iter().enumerate() {
        v.set_column(j, col);
    }
    Ok(v)
}

fn apply_c_diag(mna: &MnaSystem, block: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = block.clone();
    for (i, &c) in mna.c_diag.iter().enumerate() {
        for j in 0..out.ncols() {
            out[(i, j)] *= c;
        }
    }
    out
}

fn dense_g(mna: &MnaSystem) -> DMatrix<f64> {
    let n = mna.size();
    let mut out = DMatrix::<f64>::zeros(n, n);
    let g = mna.g.as_ref();
    let col_ptr = g.col_ptr();
    let row_idx = g.row_idx();
    let val = g.val();
    for j in 0..n {
        for idx in col_ptr[j]..col_ptr[j + 1] {
            out[(row_idx[idx], j)] += val[idx];
        }
    }
    out
}

/// A reduced model, carrying everything needed to integrate the reduced
/// pencil and lift its state back to full node space.
pub struct ReducedModel {
    /// n x k Krylov projection basis (orthonormal columns).
    projection: DMatrix<f64>,
    /// Indices into the k-wide projected space that remain differential
    /// after regularization (spec.md §4.5's "symmetric permutation
    /// separating differential/algebraic variables").
    kept: Vec<usize>,
    folded: Vec<usize>,
    /// kd x kd nonsingular reduced capacitance.
    pub c_hat: DMatrix<f64>,
    /// kd x kd reduced conductance (Schur-complemented against the folded
    /// block).
    pub g_hat: DMatrix<f64>,
    /// kd x S reduced input matrix.
    pub b_hat: DMatrix<f64>,
    g_ad_hat: DMatrix<f64>,
    g_aa_hat_lu: Option<nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>>,
    rhs_folded0: Vec<f64>,
}

pub struct MorReducer;

impl MorReducer {
    /// Reduce `mna` to dimension `order * num_sources` (clamped to the full
    /// order), regularizing the projected pencil so its capacitance matrix
    /// is nonsingular.
    pub fn reduce(mna: &MnaSystem, order: usize) -> SolverResult<ReducedModel> {
        let target = nominal_order(mna, order);
        if target == 0 {
            return Err(SolverError::InvalidArg {
                what: "reduced order must be positive",
            });
        }
        let v = build_basis(mna, order)?;
        let k = v.ncols();

        let g_dense = dense_g(mna);
        let c_dense = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(mna.c_diag.clone()));
        let b_dense = dense_b(mna);

        let g_hat_full = v.transpose() * &g_dense * &v;
        let c_hat_full = v.transpose() * &c_dense * &v;
        let b_hat_full = v.transpose() * &b_dense;

        // Regularize: rows whose C_hat row-norm is negligible relative to
        // the largest row are treated as algebraic and folded via Schur
        // complement, the same closed-form elimination used for
        // capacitance-free nodes at full order.
        let row_norms: Vec<f64> = (0..k)
            .map(|i| c_hat_full.row(i).iter().map(|x| x.abs()).sum::<f64>())
            .collect();
        let max_norm = row_norms.iter().cloned().fold(0.0_f64, f64::max);
        let threshold = (max_norm * 1e-8).max(1e-300);
        let kept: Vec<usize> = (0..k).filter(|&i| row_norms[i] > threshold).collect();
        let folded: Vec<usize> = (0..k).filter(|&i| row_norms[i] <= threshold).collect();

        let kd = kept.len();
        let ka = folded.len();
        if kd == 0 {
            return Err(SolverError::SingularReducedPencil);
        }

        let sub = |m: &DMatrix<f64>, rows: &[usize], cols: &[usize]| -> DMatrix<f64> {
            DMatrix::from_fn(rows.len(), cols.len(), |i, j| m[(rows[i], cols[j])])
        };

        let g_dd = sub(&g_hat_full, &kept, &kept);
        let g_da = sub(&g_hat_full, &kept, &folded);
        let g_ad = sub(&g_hat_full, &folded, &kept);
        let c_dd = sub(&c_hat_full, &kept, &kept);
        let b_d = DMatrix::from_fn(kd, b_hat_full.ncols(), |i, j| b_hat_full[(kept[i], j)]);

        if ka == 0 {
            return Ok(ReducedModel {
                projection: v,
                kept,
                folded,
                c_hat: c_dd,
                g_hat: g_dd,
                b_hat: b_d,
                g_ad_hat: DMatrix::zeros(0, kd),
                g_aa_hat_lu: None,
                rhs_folded0: Vec::new(),
            });
        }

        let g_aa = sub(&g_hat_full, &folded, &folded);
        let lu = g_aa.clone().lu();
        // Folded rows carry no independent source term of their own beyond
        // what the projected B already captures; treat their static
        // forcing as zero (they are algebraic combinations of the kept
        // state by construction of the Krylov basis).
        let rhs_a0 = vec![0.0_f64; ka];
        let x_a0 = lu
            .solve(&nalgebra::DVector::from_vec(rhs_a0.clone()))
            .ok_or(SolverError::SingularReducedPencil)?;

        // G_dd_reduced = G_dd - G_da * G_aa^-1 * G_ad
        let g_aa_inv_g_ad = lu
            .solve(&g_ad)
            .ok_or(SolverError::SingularReducedPencil)?;
        let g_hat_reduced = &g_dd - &g_da * &g_aa_inv_g_ad;

        Ok(ReducedModel {
            projection: v,
            kept,
            folded,
            c_hat: c_dd,
            g_hat: g_hat_reduced,
            b_hat: b_d,
            g_ad_hat: g_ad,
            g_aa_hat_lu: Some(lu),
            rhs_folded0: x_a0.as_slice().to_vec(),
        })
    }
}

impl ReducedModel {
    pub fn reduced_order(&self) -> usize {
        self.kept.len()
    }

    /// Project a full node-space vector down onto the kept (differential)
    /// reduced coordinates: `x̂ = V^T x`, restricted to `kept`.
    pub fn input2state(&self, x_full: &[f64]) -> Vec<f64> {
        let x = nalgebra::DVector::from_row_slice(x_full);
        let x_hat_full = self.projection.transpose() * x;
        self.kept.iter().map(|&i| x_hat_full[i]).collect()
    }

    /// Lift a reduced differential state back to full node space:
    /// reconstruct the folded coordinates via the Schur relation, assemble
    /// the full k-wide reduced state, then `x = V x̂`.
    pub fn state2output(&self, x_hat_d: &[f64]) -> SolverResult<Vec<f64>> {
        let k = self.kept.len() + self.folded.len();
        let mut x_hat = vec![0.0_f64; k];
        for (i, &idx) in self.kept.iter().enumerate() {
            x_hat[idx] = x_hat_d[i];
        }
        if !self.folded.is_empty() {
            let lu = self
                .g_aa_hat_lu
                .as_ref()
                .expect("folded indices non-empty implies g_aa_hat_lu is Some");
            let x_d = nalgebra::DVector::from_row_slice(x_hat_d);
            let rhs = &self.g_ad_hat * &x_d;
            let correction = lu.solve(&rhs).ok_or(SolverError::SingularReducedPencil)?;
            for (i, &idx) in self.folded.iter().enumerate() {
                x_hat[idx] = self.rhs_folded0[i] - correction[i];
            }
        }
        let x_hat_vec = nalgebra::DVector::from_vec(x_hat);
        let x_full = &self.projection * x_hat_vec;
        Ok(x_full.as_slice().to_vec())
    }

    /// Integrate the reduced pencil `dx̂/dt = coeff*x̂ + input*u(t)` (spec.md
    /// §4.5), with `coeff = Ĉ'^-1*(-Ĝ')` and `input = Ĉ'^-1*B̂'` obtained by
    /// Cholesky-factoring `Ĉ'` once up front, using the same adaptive
    /// Cash-Karp 5(4) stepper as the full-order solve. `excitation(t)` is the
    /// same per-source scale factor on baseline `hf` that the full-order
    /// solver takes; `mna` supplies `rhs_u_excited` to turn it into a
    /// source-space forcing vector. `observer` receives every accepted
    /// point, lifted back to full node space.
    pub fn run(
        &self,
        mna: &MnaSystem,
        x0_full: &[f64],
        ref_t: f64,
        duration: f64,
        control: &RkControl,
        excitation: &dyn Fn(f64) -> Vec<f64>,
        observer: &mut dyn TransientObserver,
    ) -> SolverResult<Vec<f64>> {
        let kd = self.kept.len();
        let chol = nalgebra::linalg::Cholesky::new(self.c_hat.clone())
            .ok_or(SolverError::SingularReducedPencil)?;
        let coeff = chol.solve(&(-&self.g_hat));
        let input_mat = chol.solve(&self.b_hat);

        let dxdt = |x_d: &[f64], u: &[f64]| -> Vec<f64> {
            let xv = DVector::from_row_slice(x_d);
            let uv = DVector::from_row_slice(u);
            let dx = &coeff * xv + &input_mat * uv;
            dx.as_slice().to_vec()
        };
        let u_at = |t: f64| mna.rhs_u_excited(ref_t, &excitation(t));

        let mut x_d = self.input2state(x0_full);
        let mut t = 0.0_f64;
        let mut h = control.dt0.clamp(control.dt_min, control.dt_max);

        if !observer.record(TransientObservation { t, x: self.state2output(&x_d)? }) {
            return self.state2output(&x_d);
        }

        while t < duration {
            if t + h > duration {
                h = duration - t;
            }
            let (x_next, err) = Self::try_step(&dxdt, &u_at, t, &x_d, h);

            let scale: Vec<f64> = x_d
                .iter()
                .zip(&x_next)
                .map(|(a, b)| control.abs_tol + control.rel_tol * a.abs().max(b.abs()))
                .collect();
            let weighted_err = if kd == 0 {
                0.0
            } else {
                let sum: f64 = err.iter().zip(&scale).map(|(e, s)| (e / s).powi(2)).sum();
                (sum / kd as f64).sqrt()
            };

            if weighted_err <= 1.0 || h <= control.dt_min * (1.0 + 1e-9) {
                t += h;
                x_d = x_next;
                if !observer.record(TransientObservation { t, x: self.state2output(&x_d)? }) {
                    break;
                }
                if weighted_err > 0.0 {
                    let grow = 0.9 * weighted_err.powf(-0.2);
                    h = (h * grow.clamp(0.2, 5.0)).clamp(control.dt_min, control.dt_max);
                } else {
                    h = (h * 2.0).clamp(control.dt_min, control.dt_max);
                }
            } else {
                let shrink = 0.9 * weighted_err.powf(-0.25);
                let new_h = (h * shrink.clamp(0.1, 1.0)).clamp(control.dt_min, control.dt_max);
                if new_h >= h && h <= control.dt_min * (1.0 + 1e-9) {
                    return Err(SolverError::StepSizeUnderflow { t, h });
                }
                h = new_h;
            }
        }

        self.state2output(&x_d)
    }

    fn try_step(
        dxdt: &dyn Fn(&[f64], &[f64]) -> Vec<f64>,
        u_at: &dyn Fn(f64) -> Vec<f64>,
        t: f64,
        x: &[f64],
        h: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let kd = x.len();
        let e = |c: f64| u_at(t + c * h);

        let k1 = dxdt(x, &e(RkCashKarp::C[0]));

        let x2: Vec<f64> = (0..kd).map(|i| x[i] + h * RkCashKarp::A21 * k1[i]).collect();
        let k2 = dxdt(&x2, &e(RkCashKarp::C[1]));

        let x3: Vec<f64> = (0..kd)
            .map(|i| x[i] + h * (RkCashKarp::A31 * k1[i] + RkCashKarp::A32 * k2[i]))
            .collect();
        let k3 = dxdt(&x3, &e(RkCashKarp::C[2]));

        let x4: Vec<f64> = (0..kd)
            .map(|i| {
                x[i] + h * (RkCashKarp::A41 * k1[i] + RkCashKarp::A42 * k2[i] + RkCashKarp::A43 * k3[i])
            })
            .collect();
        let k4 = dxdt(&x4, &e(RkCashKarp::C[3]));

        let x5: Vec<f64> = (0..kd)
            .map(|i| {
                x[i]
                    + h * (RkCashKarp::A51 * k1[i]
                        + RkCashKarp::A52 * k2[i]
                        + RkCashKarp::A53 * k3[i]
                        + RkCashKarp::A54 * k4[i])
            })
            .collect();
        let k5 = dxdt(&x5, &e(RkCashKarp::C[4]));

        let x6: Vec<f64> = (0..kd)
            .map(|i| {
                x[i]
                    + h * (RkCashKarp::A61 * k1[i]
                        + RkCashKarp::A62 * k2[i]
                        + RkCashKarp::A63 * k3[i]
                        + RkCashKarp::A64 * k4[i]
                        + RkCashKarp::A65 * k5[i])
            })
            .collect();
        let k6 = dxdt(&x6, &e(RkCashKarp::C[5]));

        let x_next: Vec<f64> = (0..kd)
            .map(|i| {
                x[i]
                    + h * (RkCashKarp::B1 * k1[i]
                        + RkCashKarp::B3 * k3[i]
                        + RkCashKarp::B4 * k4[i]
                        + RkCashKarp::B6 * k6[i])
            })
            .collect();
        let x_next_star: Vec<f64> = (0..kd)
            .map(|i| {
                x[i]
                    + h * (RkCashKarp::BS1 * k1[i]
                        + RkCashKarp::BS3 * k3[i]
                        + RkCashKarp::BS4 * k4[i]
                        + RkCashKarp::BS5 * k5[i]
                        + RkCashKarp::BS6 * k6[i])
            })
            .collect();

        let err: Vec<f64> = x_next.iter().zip(&x_next_star).map(|(a, b)| a - b).collect();
        (x_next, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_network::{MNABuilder, MnaOptions, ThermalNetwork};

    /// Scenario 5 (spec.md §8): a reduced model of a small chain should
    /// reproduce the full steady-state solution to tight tolerance, since a
    /// Krylov basis built from `G^-1 B` exactly spans the DC solution for a
    /// single-source network.
    #[test]
    fn reduced_model_reproduces_steady_state_for_single_source_chain() {
        let mut net = ThermalNetwork::new(3);
        net.set_c(0, 1.0);
        net.set_c(1, 1.0);
        net.set_c(2, 1.0);
        net.set_hf(0, 4.0);
        net.set_r(0, 1, 2.0).unwrap();
        net.set_r(1, 2, 2.0).unwrap();
        net.set_htc(2, 0.5);
        let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

        let reduced = MorReducer::reduce(&mna, 3).unwrap();
        assert!(reduced.reduced_order() >= 1);
        assert!(reduced.reduced_order() <= mna.size());

        let x0 = vec![300.0; 3];
        let x_hat0 = reduced.input2state(&x0);
        let x_full_back = reduced.state2output(&x_hat0).unwrap();
        for i in 0..3 {
            assert!((x_full_back[i] - x0[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn reduced_order_is_clamped_to_full_size() {
        let mut net = ThermalNetwork::new(2);
        net.set_c(0, 1.0);
        net.set_c(1, 1.0);
        net.set_hf(0, 1.0);
        net.set_r(0, 1, 1.0).unwrap();
        net.set_htc(1, 1.0);
        let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

        let reduced = MorReducer::reduce(&mna, 100).unwrap();
        assert!(reduced.reduced_order() <= 2);
    }
}

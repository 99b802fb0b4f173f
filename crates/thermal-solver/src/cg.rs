//! Preconditioned conjugate gradient for SPD systems `Ax = b`.
//!
//! A config struct with a `Default`, a result struct carrying iteration
//! count/residual/convergence flag rather than an `Err`, and a free function
//! taking `&dyn RealOperator`.

use crate::operator::RealOperator;
use crate::preconditioner::RealPreconditioner;

/// CG solver configuration.
#[derive(Debug, Clone)]
pub struct CgConfig {
    pub max_iter: usize,
    pub abs_tol: f64,
    pub rel_tol: f64,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            abs_tol: 1e-12,
            rel_tol: 1e-10,
        }
    }
}

/// Result of a (possibly non-converged) CG solve.
#[derive(Debug, Clone)]
pub struct CgResult {
    pub x: Vec<f64>,
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
}

/// Solve `A x = b` for SPD `A` via preconditioned CG.
///
/// Never returns an `Err`: on non-convergence it returns the best iterate
/// found with `converged = false` (spec.md §4.3, §7) so callers always get a
/// result to inspect.
pub fn solve_cg(
    op: &dyn RealOperator,
    pc: &dyn RealPreconditioner,
    b: &[f64],
    config: &CgConfig,
) -> CgResult {
    let n = op.dim();
    assert_eq!(b.len(), n, "RHS dimension mismatch");

    let b_norm = norm(b);
    if b_norm < 1e-300 {
        return CgResult {
            x: vec![0.0; n],
            iterations: 0,
            residual: 0.0,
            converged: true,
        };
    }

    let mut x = vec![0.0_f64; n];
    let mut r = b.to_vec();
    let mut z = vec![0.0_f64; n];
    pc.apply(&r, &mut z);
    let mut p = z.clone();
    let mut rz_old = dot(&r, &z);

    let tol = config.abs_tol.max(config.rel_tol * b_norm);
    let mut residual = norm(&r);

    if residual <= tol {
        return CgResult {
            x,
            iterations: 0,
            residual: residual / b_norm,
            converged: true,
        };
    }

    let mut ap = vec![0.0_f64; n];
    let mut iterations = 0;
    for k in 0..config.max_iter {
        iterations = k + 1;
        op.apply(&p, &mut ap);
        let p_ap = dot(&p, &ap);
        if p_ap.abs() < 1e-300 {
            // Breakdown: p is (numerically) in the null space of A.
            break;
        }
        let alpha = rz_old / p_ap;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }
        residual = norm(&r);
        if residual <= tol {
            return CgResult {
                x,
                iterations,
                residual: residual / b_norm,
                converged: true,
            };
        }
        pc.apply(&r, &mut z);
        let rz_new = dot(&r, &z);
        let beta = rz_new / rz_old;
        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }
        rz_old = rz_new;
    }

    log::warn!(
        "CG did not converge in {} iterations (residual/|b| = {:.3e})",
        iterations,
        residual / b_norm
    );
    CgResult {
        x,
        iterations,
        residual: residual / b_norm,
        converged: false,
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::SparseRealOperator;
    use crate::preconditioner::{IdentityPreconditioner, JacobiPreconditioner};
    use faer::sparse::{SparseColMat, Triplet};

    #[test]
    fn solves_simple_spd_system() {
        // [[4,1],[1,3]] x = [1,2] -> x = [1/11, 7/11]
        let triplets = [
            Triplet::new(0, 0, 4.0),
            Triplet::new(0, 1, 1.0),
            Triplet::new(1, 0, 1.0),
            Triplet::new(1, 1, 3.0),
        ];
        let a = SparseColMat::<usize, f64>::try_new_from_triplets(2, 2, &triplets).unwrap();
        let op = SparseRealOperator::new(&a);
        let pc = IdentityPreconditioner::new(2);
        let result = solve_cg(&op, &pc, &[1.0, 2.0], &CgConfig::default());
        assert!(result.converged);
        assert!((result.x[0] - 1.0 / 11.0).abs() < 1e-8);
        assert!((result.x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn jacobi_preconditioned_cg_converges_faster_or_equal() {
        let triplets = [
            Triplet::new(0, 0, 10.0),
            Triplet::new(0, 1, 1.0),
            Triplet::new(1, 0, 1.0),
            Triplet::new(1, 1, 10.0),
        ];
        let a = SparseColMat::<usize, f64>::try_new_from_triplets(2, 2, &triplets).unwrap();
        let op = SparseRealOperator::new(&a);
        let jacobi = JacobiPreconditioner::from_matrix(&a);
        let result = solve_cg(&op, &jacobi, &[1.0, 1.0], &CgConfig::default());
        assert!(result.converged);
    }
}

//! Preconditioners for the iterative steady-state solver.

use faer::sparse::SparseColMat;

/// Given `Gx = b`, a preconditioner `M` approximates `G^-1`; CG is run on
/// the preconditioned system for better convergence on the typically very
/// diagonally-dominant conductance matrices produced by MNA assembly.
pub trait RealPreconditioner: Send + Sync {
    /// `y = M^-1 * x`.
    fn apply(&self, x: &[f64], y: &mut [f64]);
    fn dim(&self) -> usize;
}

/// Jacobi (diagonal) preconditioner: `M = diag(G)`.
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    pub fn from_matrix(g: &SparseColMat<usize, f64>) -> Self {
        let n = g.nrows();
        let mut diag = vec![0.0_f64; n];
        let m = g.as_ref();
        let col_ptr = m.col_ptr();
        let row_idx = m.row_idx();
        let val = m.val();
        for j in 0..n {
            for idx in col_ptr[j]..col_ptr[j + 1] {
                if row_idx[idx] == j {
                    diag[j] += val[idx];
                }
            }
        }
        let inv_diag = diag
            .into_iter()
            .map(|d| if d.abs() < 1e-30 { 1.0 } else { 1.0 / d })
            .collect();
        Self { inv_diag }
    }
}

impl RealPreconditioner for JacobiPreconditioner {
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        for i in 0..self.inv_diag.len() {
            y[i] = x[i] * self.inv_diag[i];
        }
    }

    fn dim(&self) -> usize {
        self.inv_diag.len()
    }
}

/// Identity preconditioner (unpreconditioned CG).
pub struct IdentityPreconditioner {
    n: usize,
}

impl IdentityPreconditioner {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl RealPreconditioner for IdentityPreconditioner {
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        y.copy_from_slice(x);
    }

    fn dim(&self) -> usize {
        self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::sparse::Triplet;

    #[test]
    fn jacobi_extracts_diagonal_inverse() {
        let triplets = [
            Triplet::new(0, 0, 2.0),
            Triplet::new(1, 1, 4.0),
            Triplet::new(0, 1, -1.0),
        ];
        let g = SparseColMat::<usize, f64>::try_new_from_triplets(2, 2, &triplets).unwrap();
        let pc = JacobiPreconditioner::from_matrix(&g);
        let mut y = vec![0.0; 2];
        pc.apply(&[1.0, 1.0], &mut y);
        assert!((y[0] - 0.5).abs() < 1e-12);
        assert!((y[1] - 0.25).abs() < 1e-12);
    }
}

//! Linear-operator abstraction for iterative solvers.
//!
//! Anything that can apply a matrix-vector product can drive CG, independent
//! of whether the matrix is sparse, dense, or implicit (e.g. a MOR-reduced
//! operator).

use faer::sparse::SparseColMat;

pub trait RealOperator: Send + Sync {
    /// Dimension of the operator (it is square: `dim() x dim()`).
    fn dim(&self) -> usize;

    /// `y = A * x`.
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

/// Sparse real-valued operator wrapping a faer `SparseColMat<usize, f64>`.
pub struct SparseRealOperator<'a> {
    matrix: &'a SparseColMat<usize, f64>,
}

impl<'a> SparseRealOperator<'a> {
    pub fn new(matrix: &'a SparseColMat<usize, f64>) -> Self {
        Self { matrix }
    }
}

impl RealOperator for SparseRealOperator<'_> {
    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let n = self.matrix.nrows();
        assert_eq!(x.len(), n);
        assert_eq!(y.len(), n);
        y.iter_mut().for_each(|yi| *yi = 0.0);

        let mat_ref = self.matrix.as_ref();
        let col_ptr = mat_ref.col_ptr();
        let row_idx = mat_ref.row_idx();
        let val = mat_ref.val();

        for j in 0..n {
            let xj = x[j];
            if xj == 0.0 {
                continue;
            }
            for idx in col_ptr[j]..col_ptr[j + 1] {
                y[row_idx[idx]] += val[idx] * xj;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::sparse::Triplet;

    #[test]
    fn sparse_operator_matches_dense_matvec() {
        let triplets = [
            Triplet::new(0, 0, 2.0),
            Triplet::new(0, 1, -1.0),
            Triplet::new(1, 0, -1.0),
            Triplet::new(1, 1, 2.0),
        ];
        let m = SparseColMat::<usize, f64>::try_new_from_triplets(2, 2, &triplets).unwrap();
        let op = SparseRealOperator::new(&m);
        let mut y = vec![0.0; 2];
        op.apply(&[1.0, 1.0], &mut y);
        assert!((y[0] - 1.0).abs() < 1e-12);
        assert!((y[1] - 1.0).abs() < 1e-12);
    }
}

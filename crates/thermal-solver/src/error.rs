use thiserror::Error;

/// Errors from the linear and ODE solvers (spec.md §7).
///
/// `NonConvergence` is deliberately absent here: a non-converged CG solve is
/// not an `Err`, it's a best-effort `SteadyStateSolution` with `converged:
/// false` the caller must check (spec.md §7's "return best effort with a
/// warning; do not throw").
#[derive(Debug, Error)]
pub enum SolverError {
    /// `G` was not positive-definite after boundary-condition application
    /// (direct back-end), or regularizing the MOR pencil left `Ĉ'`
    /// singular/indefinite.
    #[error("singular matrix: {what}")]
    Singular { what: &'static str },

    /// Cholesky factorization of the reduced capacitance pencil failed.
    #[error("singular reduced pencil after regularization")]
    SingularReducedPencil,

    /// The adaptive integrator's step size fell below `dt_min` while still
    /// failing to meet tolerance.
    #[error("integrator step size underflow at t={t}, h={h}")]
    StepSizeUnderflow { t: f64, h: f64 },

    /// A caller-supplied argument violates a documented precondition.
    #[error("invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Network(#[from] thermal_core::ThermalError),
}

pub type SolverResult<T> = Result<T, SolverError>;

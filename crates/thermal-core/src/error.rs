use thiserror::Error;

/// Errors shared by the network/assembly layer (`thermal-network`) and the
/// extractors (`thermal-grid`, `thermal-prism`).
///
/// Solver-specific failures (`SingularMatrix`, `NonConvergence`,
/// `IntegratorFailure`) live in `thermal_solver::SolverError` instead, since
/// they carry partial results the caller must consult (spec.md §7).
#[derive(Debug, Error)]
pub enum ThermalError {
    /// An index passed by the caller is out of range. This is an
    /// `InvalidInput` programming error (spec.md §7): fatal, not retried.
    #[error("index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// `setR(i, i, ..)` was attempted.
    #[error("self-loop rejected: node {index}")]
    SelfLoop { index: usize },

    /// A value that must be finite was NaN/infinite.
    #[error("non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    /// A caller-supplied argument violates a documented precondition.
    #[error("invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A material or layer name could not be resolved; no silent default is
    /// substituted (spec.md §7).
    #[error("unknown material: {name}")]
    UnknownMaterial { name: String },

    /// The layer stack is missing information needed to extract a network.
    #[error("incomplete stackup: {what}")]
    IncompleteStackup { what: String },
}

pub type ThermalResult<T> = Result<T, ThermalError>;

/// Ensure `v` is finite, producing a well-formed `ThermalError` otherwise.
pub fn ensure_finite(v: f64, what: &'static str) -> ThermalResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ThermalError::NonFinite { what, value: v })
    }
}

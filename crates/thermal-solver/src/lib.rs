//! Linear and ODE solvers over the sparse MNA pencil assembled by
//! `thermal_network`: preconditioned CG and direct back-ends for the
//! steady-state solve, an adaptive Runge-Kutta-Cash-Karp integrator for the
//! full-order transient solve, and Krylov model-order reduction.

pub mod cg;
pub mod direct;
pub mod error;
pub mod mor;
pub mod operator;
pub mod preconditioner;
pub mod steady;
pub mod transient;

pub use cg::{CgConfig, CgResult, solve_cg};
pub use direct::solve_direct;
pub use error::{SolverError, SolverResult};
pub use mor::{MorReducer, ReducedModel};
pub use operator::{RealOperator, SparseRealOperator};
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, RealPreconditioner};
pub use steady::{SteadyBackend, SteadyStateSolution, SteadyStateSolver};
pub use transient::{
    CapFreeReduction, ProbeSampler, RecordingObserver, RkControl, TransientObservation,
    TransientObserver, TransientSolver,
};

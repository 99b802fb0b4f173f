pub mod mesh;
pub mod steady;
pub mod transient;

use clap::ValueEnum;
use thermal_solver::{CgConfig, SteadyBackend};

/// `--backend` choice shared by `steady` and `mesh`, mapping onto
/// `SteadyBackend` (spec.md §4.3).
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Direct,
    Iterative,
    Auto,
}

impl BackendArg {
    pub fn resolve(self) -> SteadyBackend {
        match self {
            BackendArg::Direct => SteadyBackend::Direct,
            BackendArg::Iterative => SteadyBackend::Iterative(CgConfig::default()),
            BackendArg::Auto => SteadyBackend::default(),
        }
    }
}

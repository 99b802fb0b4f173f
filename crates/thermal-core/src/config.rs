use crate::numeric::{DEFAULT_REF_TEMPERATURE, Real};

/// Run configuration recognised by the solvers and extractors (spec.md §6).
///
/// Rather than a generic "options bag", this is a plain struct with one
/// documented default per field, a `Default` impl, and `with_*` builder
/// methods.
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker thread count for the dedicated rayon pool. Defaults to the
    /// host's available parallelism.
    pub threads: usize,
    /// Outer temperature-dependent-conductivity iteration count (0 disables
    /// iterative refinement).
    pub iteration: usize,
    /// Outer-loop convergence bound on mean |ΔT| (K).
    pub residual: Real,
    /// Reference ambient temperature (K).
    pub ref_temperature: Real,
    /// Absolute tolerance for iterative linear solves and the integrator.
    pub abs_tol: Real,
    /// Relative tolerance for iterative linear solves and the integrator.
    pub rel_tol: Real,
    /// Krylov order multiplier for model-order reduction (k = sources * mor_order).
    pub mor_order: usize,
    /// Emit a VTK mesh dump after extraction.
    pub dump_mesh: bool,
    /// Emit a temperature hotmap alongside the mesh dump.
    pub dump_hotmap: bool,
    /// Directory for diagnostic artifacts (mesh/hotmap dumps).
    pub work_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            iteration: 0,
            residual: 1e-6,
            ref_temperature: DEFAULT_REF_TEMPERATURE,
            abs_tol: 1e-12,
            rel_tol: 1e-10,
            mor_order: 2,
            dump_mesh: false,
            dump_hotmap: false,
            work_dir: None,
        }
    }
}

impl Config {
    /// A configuration pinned to a single worker thread, useful for
    /// deterministic tests.
    pub fn single_threaded() -> Self {
        Self {
            threads: 1,
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_ref_temperature(mut self, ref_temperature: Real) -> Self {
        self.ref_temperature = ref_temperature;
        self
    }

    pub fn with_tolerances(mut self, abs_tol: Real, rel_tol: Real) -> Self {
        self.abs_tol = abs_tol;
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_mor_order(mut self, mor_order: usize) -> Self {
        self.mor_order = mor_order.max(1);
        self
    }
}

/// Explicit, caller-owned run context (spec.md §9): no process-wide
/// singleton.
///
/// A `Workspace` bundles the run configuration and a dedicated thread pool;
/// it holds no back-references to any layout or network it is used with, so
/// independent tests (and independent solves within one process) can each
/// own a `Workspace` without interference.
pub struct Workspace {
    config: Config,
    pool: rayon::ThreadPool,
}

impl Workspace {
    pub fn new(config: Config) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .expect("failed to build thread pool");
        Self { config, pool }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.iteration, 0);
        assert!((cfg.ref_temperature - 298.15).abs() < 1e-9);
        assert_eq!(cfg.mor_order, 2);
    }

    #[test]
    fn workspace_pool_has_requested_threads() {
        let ws = Workspace::new(Config::single_threaded());
        assert_eq!(ws.pool().current_num_threads(), 1);
    }
}

//! thermal-core: stable foundation for the thermal network solver stack.
//!
//! Contains:
//! - `ids`: stable compact identifiers for nodes/elements/layers/materials
//! - `error`: shared error type for the network and extraction layers
//! - `numeric`: `Real` alias, tolerances, polynomial evaluation
//! - `config`: run `Config` and the explicit `Workspace` replacing the
//!   original implementation's process-wide singleton (spec.md §9)

pub mod config;
pub mod error;
pub mod ids;
pub mod numeric;

pub use config::{Config, Workspace};
pub use error::{ThermalError, ThermalResult, ensure_finite};
pub use ids::{ElementId, Id, LayerId, MaterialId, NodeId};
pub use numeric::{DEFAULT_REF_TEMPERATURE, Real, Tolerances, eval_poly};

//! Per-layer triangulated prism mesh extraction (spec.md §4.7), grounded on
//! the original `EPrismaThermalModel.h` / `EStackupPrismaThermalModel.cpp`.

pub mod adjacency;
pub mod element;
pub mod error;
pub mod geometry2;
pub mod layer;
pub mod mesh;
pub mod network;
pub mod vtk;

pub use element::{PrismaElement, PrismaLayer};
pub use error::{PrismError, PrismResult};
pub use layer::{MeshMode, PrismaLayerSpec};
pub use mesh::{Mesh, MeshParams, MeshTriangle};
pub use network::{PrismBoundaryInputs, PrismExtractOptions, PrismExtractor, PrismGeometry};

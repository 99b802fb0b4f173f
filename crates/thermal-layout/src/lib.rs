//! Layer stackup, material database, and board-level geometry consumed by
//! the grid and prism extractors (spec.md §6).

pub mod bondwire;
pub mod boundary;
pub mod component;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod material;
pub mod power;

pub use bondwire::Bondwire;
pub use boundary::{BBox3, BcContribution, BlockBc, BoundaryCondition, Orientation, UniformBc};
pub use component::Component;
pub use error::{LayoutError, LayoutResult};
pub use geometry::{Polygon, PowerBlock};
pub use layer::{Layer, LayerKind, LayerStack};
pub use material::{Material, MaterialBuilder, MaterialDb, MaterialKind, MaterialProperty, PolyT};
pub use power::{BBox2, PowerModel, PowerTable, DEFAULT_SAMPLE_TEMPERATURES_C};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrismError {
    #[error("mesh has no input polygons")]
    EmptyMesh,

    #[error("degenerate geometry: {what}")]
    DegenerateGeometry { what: String },

    #[error("triangulation failed: {what}")]
    Triangulation { what: String },

    #[error(transparent)]
    Layout(#[from] thermal_layout::LayoutError),

    #[error(transparent)]
    Network(#[from] thermal_core::ThermalError),
}

pub type PrismResult<T> = Result<T, PrismError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid has zero voxels")]
    EmptyGrid,

    #[error("invalid grid dimensions: {what}")]
    InvalidDimensions { what: &'static str },

    #[error(transparent)]
    Layout(#[from] thermal_layout::LayoutError),

    #[error(transparent)]
    Network(#[from] thermal_core::ThermalError),
}

pub type GridResult<T> = Result<T, GridError>;

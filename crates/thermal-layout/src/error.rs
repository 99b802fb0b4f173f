use thiserror::Error;

/// Errors from loading/validating layout input (spec.md §7's "IO/Material
/// lookup failures" kind).
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unknown material: {name}")]
    UnknownMaterial { name: String },

    #[error("incomplete layer stackup: {what}")]
    IncompleteStackup { what: String },

    #[error("invalid geometry: {what}")]
    InvalidGeometry { what: &'static str },

    #[error(transparent)]
    Core(#[from] thermal_core::ThermalError),
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Convenience result type used across the mosaic engine.
pub type MosaicResult<T> = Result<T, MosaicError>;

/// Top-level error taxonomy used by engine APIs.
///
/// `Validation`, `Layout` and `Unsupported` are structural errors raised while a session is set
/// up. `Tile` is scoped to the computation of a single destination tile.
#[derive(thiserror::Error, Debug)]
pub enum MosaicError {
    /// Invalid caller-provided arguments or shapes.
    #[error("validation error: {0}")]
    Validation(String),

    /// Source layouts that cannot be reconciled into one destination layout.
    #[error("layout error: {0}")]
    Layout(String),

    /// A sample representation that cannot be converted to the destination lane.
    #[error("unsupported sample type: {0}")]
    Unsupported(String),

    /// Failure to acquire or compute data for one tile.
    #[error("tile error: {0}")]
    Tile(String),

    /// Errors when serializing or deserializing job descriptions.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MosaicError {
    /// Build a [`MosaicError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MosaicError::Layout`] value.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Build a [`MosaicError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`MosaicError::Tile`] value.
    pub fn tile(msg: impl Into<String>) -> Self {
        Self::Tile(msg.into())
    }

    /// Build a [`MosaicError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that are raised at session setup, before any tile is computed.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Layout(_) | Self::Unsupported(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

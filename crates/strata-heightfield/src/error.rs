//! Heightfield generation error types.

/// Errors reported synchronously by heightfield generation entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeightfieldError {
    /// The requested grid size cannot hold any samples.
    #[error("heightmap size must be positive, got {0}")]
    InvalidSize(u32),
}

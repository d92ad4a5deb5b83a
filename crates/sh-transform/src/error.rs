//! Error types for spherical-harmonic transforms.

use geo_common::GeoError;
use shm_parser::ShmError;
use thiserror::Error;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur while building coefficient sets or transforming grids.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Geometry or parameter validation failure.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The coefficient file could not be read.
    #[error("coefficient file error: {0}")]
    Model(#[from] ShmError),

    /// Coefficient array with an unusable layout.
    #[error("invalid coefficient array: {0}")]
    InvalidCoefficients(String),

    /// Grid with an unusable layout or values.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl TransformError {
    /// Two arrays that must share a band limit do not.
    pub fn degree_mismatch(left: usize, right: usize) -> Self {
        Self::Geo(GeoError::DegreeMismatch { left, right })
    }

    /// Array shape differs from the expected one.
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Debug,
        found: impl std::fmt::Debug,
    ) -> Self {
        Self::Geo(GeoError::shape_mismatch(context, expected, found))
    }
}

//! Error types for tomographic reconstruction.

use geo_common::GeoError;
use gravity_field::GravityError;
use sh_transform::TransformError;
use thiserror::Error;

/// Result type for reconstruction operations.
pub type TomographyResult<T> = Result<T, TomographyError>;

/// Errors raised by the back-projection and Fourier-slice stages.
#[derive(Error, Debug)]
pub enum TomographyError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Gravity(#[from] GravityError),

    /// Shell or reference radius out of range.
    #[error("invalid radius: {0}")]
    InvalidRadius(String),

    /// Negative or non-finite Tikhonov parameter.
    #[error("invalid regularization parameter: {0}")]
    InvalidRegularization(f64),

    /// Direction vector that is zero, non-finite or not of unit length.
    #[error("invalid direction #{index}: {message}")]
    InvalidDirection { index: usize, message: String },

    /// Voxel bin edges unusable.
    #[error("invalid bin edges: {0}")]
    InvalidBins(String),

    /// Spherical field arrays that do not line up.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl TomographyError {
    /// Create an InvalidDirection error.
    pub fn invalid_direction(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidDirection {
            index,
            message: message.into(),
        }
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

//! Error types for gravity-field computations.

use geo_common::GeoError;
use sh_transform::TransformError;
use thiserror::Error;

/// Result type for gravity-field operations.
pub type GravityResult<T> = Result<T, GravityError>;

/// Errors raised while synthesizing or inverting gravity functionals.
#[derive(Error, Debug)]
pub enum GravityError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// GM or reference radius needed but not known.
    #[error("missing constant: {0}")]
    MissingConstant(&'static str),

    /// Normal gravity evaluated to a non-positive value.
    #[error("normal gravity must be positive, got {0}")]
    InvalidNormalGravity(f64),
}

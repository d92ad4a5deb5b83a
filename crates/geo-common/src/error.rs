//! Error types shared across gravtomo crates.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Primary error type for geometry and parameter validation.
#[derive(Debug, Error)]
pub enum GeoError {
    // === Parameter Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid radius: {0}")]
    InvalidRadius(String),

    #[error("Invalid reference ellipsoid: {0}")]
    InvalidEllipsoid(String),

    // === Shape Errors ===
    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("Maximum degree mismatch: {left} vs {right}")]
    DegreeMismatch { left: usize, right: usize },

    // === Data Errors ===
    #[error("Failed to read data: {0}")]
    DataReadError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GeoError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Debug,
        found: impl std::fmt::Debug,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        }
    }

    /// Short machine-readable code, used in run summaries.
    pub fn code(&self) -> &'static str {
        match self {
            GeoError::InvalidParameter { .. } => "InvalidParameterValue",
            GeoError::InvalidRadius(_) => "InvalidRadius",
            GeoError::InvalidEllipsoid(_) => "InvalidEllipsoid",
            GeoError::ShapeMismatch { .. } | GeoError::DegreeMismatch { .. } => "ShapeMismatch",
            GeoError::DataReadError(_) => "DataReadError",
            GeoError::InternalError(_) => "NoApplicableCode",
        }
    }
}

impl From<std::io::Error> for GeoError {
    fn from(err: std::io::Error) -> Self {
        GeoError::DataReadError(err.to_string())
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::InternalError(format!("JSON error: {}", err))
    }
}

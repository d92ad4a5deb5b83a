//! Global map projections.
//!
//! Projections map geographic coordinates (degrees) onto a plane and back.
//! Plane coordinates are unitless; [`Projection::bounds`] gives the extent of
//! the whole globe so callers can scale to pixels.

pub mod cylindrical;
pub mod mollweide;

pub use cylindrical::Equirectangular;
pub use mollweide::Mollweide;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from projection setup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("unknown projection '{0}' (expected cyl or moll)")]
    UnknownProjection(String),

    #[error("central meridian must be finite, got {0}")]
    InvalidCentralMeridian(f64),
}

/// Forward and inverse mapping of one projection.
pub trait Projection {
    /// Plane coordinates `(x, y)` of a point, `y` pointing north.
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64);

    /// Geographic `(lat, lon)` in degrees of a plane point, `None` off the globe.
    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// `(min_x, min_y, max_x, max_y)` of the projected globe.
    fn bounds(&self) -> (f64, f64, f64, f64);

    /// Height over width of the projected globe.
    fn aspect_ratio(&self) -> f64 {
        let (x0, y0, x1, y1) = self.bounds();
        (y1 - y0) / (x1 - x0)
    }
}

/// Projection names accepted by the map drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProjectionKind {
    /// Equidistant cylindrical
    #[default]
    #[serde(rename = "cyl")]
    Cylindrical,
    #[serde(rename = "moll")]
    Mollweide,
}

impl ProjectionKind {
    /// Parse a projection name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, ProjectionError> {
        match name.to_lowercase().as_str() {
            "cyl" | "equirectangular" | "platecarree" => Ok(Self::Cylindrical),
            "moll" | "mollweide" => Ok(Self::Mollweide),
            _ => Err(ProjectionError::UnknownProjection(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cylindrical => "cyl",
            Self::Mollweide => "moll",
        }
    }

    /// Build the projection centered on `lon_0` degrees.
    pub fn build(&self, lon_0: f64) -> Result<Box<dyn Projection + Send + Sync>, ProjectionError> {
        if !lon_0.is_finite() {
            return Err(ProjectionError::InvalidCentralMeridian(lon_0));
        }
        Ok(match self {
            Self::Cylindrical => Box::new(Equirectangular::new(lon_0)),
            Self::Mollweide => Box::new(Mollweide::new(lon_0)),
        })
    }
}

impl std::fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Longitude difference `lon - lon_0` wrapped to `[-180, 180)`.
pub fn wrap_longitude(lon_deg: f64, lon_0: f64) -> f64 {
    (lon_deg - lon_0 + 180.0).rem_euclid(360.0) - 180.0
}

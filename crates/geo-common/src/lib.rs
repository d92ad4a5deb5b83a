//! Common types shared across the gravtomo workspace.
//!
//! Holds the reference-ellipsoid constants, the Driscoll-Healy grid
//! geometry and the workspace-wide error type.

pub mod constants;
pub mod ellipsoid;
pub mod error;
pub mod grid;

pub use ellipsoid::ReferenceEllipsoid;
pub use error::{GeoError, GeoResult};
pub use grid::{DhGridSpec, Sampling};

//! Spherical-harmonic coefficients and Driscoll-Healy grid transforms.
//!
//! All transforms use 4pi-normalized real harmonics without the
//! Condon-Shortley phase. Coefficient sets in other conventions are
//! converted on the way in.
//!
//! # Example
//!
//! ```
//! use geo_common::Sampling;
//! use sh_transform::SphericalHarmonicCoeffs;
//!
//! let mut coeffs = SphericalHarmonicCoeffs::zeros(8);
//! coeffs.set(0, 0, 0, 1.0).unwrap();
//! let grid = coeffs.synthesize(Sampling::Double);
//! assert_eq!(grid.data().dim(), (18, 36));
//! ```

pub mod coeffs;
pub mod config;
pub mod dh;
pub mod error;
pub mod legendre;

pub use coeffs::{Normalization, PhaseConvention, SphericalHarmonicCoeffs};
pub use config::TransformConfig;
pub use dh::{dh_weights, expand_dh, make_grid_dh, DhGrid};
pub use error::{TransformError, TransformResult};
pub use legendre::LegendreRecursion;

use shm_parser::{read_model_file, ReadOptions};
use std::path::Path;
use tracing::info;

/// Load a coefficient file, truncated to `lmax` when given.
pub fn load_coefficients(path: impl AsRef<Path>, lmax: Option<usize>) -> TransformResult<SphericalHarmonicCoeffs> {
    let options = ReadOptions {
        max_degree: lmax,
        ..ReadOptions::default()
    };
    let model = read_model_file(path, &options)?;
    let coeffs = SphericalHarmonicCoeffs::from_model(&model);
    // A file stopping below the requested degree is padded with zeros.
    let coeffs = match lmax {
        Some(l) if l != coeffs.lmax() => coeffs.with_lmax(l),
        _ => coeffs,
    };
    info!(
        lmax = coeffs.lmax(),
        gm = ?coeffs.gm,
        r0 = ?coeffs.r0,
        "Coefficients ready"
    );
    Ok(coeffs)
}

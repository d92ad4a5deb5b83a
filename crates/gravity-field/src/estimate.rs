//! Disturbing-potential estimation from geoid heights or gravity disturbances.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{GravityError, GravityResult};
use crate::normal::NormalGravity;
use geo_common::ReferenceEllipsoid;
use sh_transform::{DhGrid, SphericalHarmonicCoeffs};

/// Functional the disturbing potential is estimated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PotentialSource {
    /// Geoid heights, converted with Bruns' formula
    #[default]
    Geoid,
    /// Gravity disturbances, converted with the inverse radial derivative
    GravityDisturbance,
}

impl PotentialSource {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "geoid" => Some(Self::Geoid),
            "gravity_disturbance" | "gravity" => Some(Self::GravityDisturbance),
            _ => None,
        }
    }
}

/// Bruns' formula `T = N gamma` applied node by node.
pub fn bruns(
    geoid: &DhGrid,
    ellipsoid: &ReferenceEllipsoid,
    normal_gravity: NormalGravity,
) -> GravityResult<DhGrid> {
    let spec = geoid.spec();
    for i in [0, spec.nlat() / 2] {
        let gamma = normal_gravity.at_colatitude(ellipsoid, spec.colatitude(i));
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(GravityError::InvalidNormalGravity(gamma));
        }
    }
    Ok(geoid.map_with_colatitude(|n, theta| n * normal_gravity.at_colatitude(ellipsoid, theta)))
}

/// Disturbing-potential coefficients (m^2/s^2) from a geoid grid.
#[instrument(skip(geoid, ellipsoid), fields(lmax = geoid.lmax()))]
pub fn potential_from_geoid(
    geoid: &DhGrid,
    ellipsoid: &ReferenceEllipsoid,
    normal_gravity: NormalGravity,
    r0: f64,
) -> GravityResult<SphericalHarmonicCoeffs> {
    let t = bruns(geoid, ellipsoid, normal_gravity)?;
    let coeffs = t.expand().with_constants(ellipsoid.gm, r0);
    debug!(t00 = coeffs.get(0, 0, 0), "Expanded disturbing potential");
    Ok(coeffs)
}

/// Disturbing-potential coefficients (m^2/s^2) from a gravity-disturbance grid.
///
/// Inverts `dg_lm = (l + 1) / r0 T_lm` on the sphere of radius `r0`.
#[instrument(skip(disturbance), fields(lmax = disturbance.lmax()))]
pub fn potential_from_gravity_disturbance(
    disturbance: &DhGrid,
    gm: f64,
    r0: f64,
) -> GravityResult<SphericalHarmonicCoeffs> {
    let dg = disturbance.expand();
    let factors = Array1::from_shape_fn(dg.lmax() + 1, |l| r0 / (l + 1) as f64);
    Ok(dg.scale_by_degree(&factors)?.with_constants(gm, r0))
}

/// Dispatch on the source functional.
pub fn estimate_disturbing_potential(
    source: PotentialSource,
    grid: &DhGrid,
    ellipsoid: &ReferenceEllipsoid,
    normal_gravity: NormalGravity,
    r0: f64,
) -> GravityResult<SphericalHarmonicCoeffs> {
    match source {
        PotentialSource::Geoid => potential_from_geoid(grid, ellipsoid, normal_gravity, r0),
        PotentialSource::GravityDisturbance => {
            potential_from_gravity_disturbance(grid, ellipsoid.gm, r0)
        }
    }
}

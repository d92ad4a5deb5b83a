//! Normal gravity field of the reference ellipsoid.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

use crate::error::GravityResult;
use geo_common::ReferenceEllipsoid;
use sh_transform::SphericalHarmonicCoeffs;

/// Highest even zonal degree of the normal field that is evaluated.
/// `J_2n` falls off like `e^2n`, so terms past degree 20 are below 1e-20.
const MAX_NORMAL_DEGREE: usize = 20;

/// How normal gravity is evaluated when converting geoid heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NormalGravity {
    /// Somigliana closed form on the ellipsoid, latitude dependent
    #[default]
    Somigliana,
    /// Constant `GM / a^2`
    Spherical,
}

impl NormalGravity {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "somigliana" | "ellipsoidal" => Some(Self::Somigliana),
            "spherical" | "constant" => Some(Self::Spherical),
            _ => None,
        }
    }

    /// Normal gravity (m/s^2) at a colatitude in radians.
    ///
    /// Colatitude is treated as the complement of geodetic latitude.
    pub fn at_colatitude(&self, ellipsoid: &ReferenceEllipsoid, colatitude: f64) -> f64 {
        match self {
            Self::Somigliana => ellipsoid.normal_gravity(FRAC_PI_2 - colatitude),
            Self::Spherical => {
                let a = ellipsoid.semi_major_axis;
                ellipsoid.gm / (a * a)
            }
        }
    }
}

/// 4pi-normalized coefficients of the normal potential, scaled to `gm` and `r0`.
///
/// `C00 = GM_ell / GM` and `C_2n,0 = -J_2n / sqrt(4n + 1) (GM_ell / GM) (a / r0)^2n`.
/// All other terms are zero.
pub fn normal_coefficients(
    ellipsoid: &ReferenceEllipsoid,
    gm: f64,
    r0: f64,
    lmax: usize,
) -> GravityResult<SphericalHarmonicCoeffs> {
    let mut coeffs = SphericalHarmonicCoeffs::zeros(lmax).with_constants(gm, r0);
    let mass_ratio = ellipsoid.gm / gm;
    let radius_ratio = ellipsoid.semi_major_axis / r0;

    coeffs.set(0, 0, 0, mass_ratio)?;
    let mut n = 1;
    while 2 * n <= lmax.min(MAX_NORMAL_DEGREE) {
        let degree = 2 * n;
        let value = -ellipsoid.j2n(n as u32) / ((4 * n + 1) as f64).sqrt()
            * mass_ratio
            * radius_ratio.powi(degree as i32);
        coeffs.set(0, degree, 0, value)?;
        n += 1;
    }
    debug!(
        ellipsoid = %ellipsoid.name,
        c20 = coeffs.get(0, 2, 0),
        "Built normal-field coefficients"
    );
    Ok(coeffs)
}

/// Zero-degree geoid undulation `N0 = ((GM - GM_ell) / r0 - (W0 - U0)) / gamma`.
pub fn zero_degree_term(ellipsoid: &ReferenceEllipsoid, gm: f64, r0: f64, gamma: f64) -> f64 {
    let potential_offset = ellipsoid.geoid_potential() - ellipsoid.normal_potential();
    ((gm - ellipsoid.gm) / r0 - potential_offset) / gamma
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_c20_matches_egm_scale() {
        // The normal C20 is within 1e-7 of the EGM2008 value -4.8417e-4
        let ell = ReferenceEllipsoid::grs80();
        let c = normal_coefficients(&ell, 3.986_004_415e14, 6_378_136.3, 10).unwrap();
        let c20 = c.get(0, 2, 0);
        assert!((c20 + 4.841_66e-4).abs() < 1e-7, "C20 = {}", c20);
        assert!(c.get(0, 4, 0) > 0.0);
        assert_eq!(c.get(0, 3, 0), 0.0);
        assert_eq!(c.get(0, 2, 2), 0.0);
    }

    #[test]
    fn test_normal_c00() {
        let ell = ReferenceEllipsoid::grs80();
        let c = normal_coefficients(&ell, ell.gm, ell.semi_major_axis, 4).unwrap();
        assert_eq!(c.get(0, 0, 0), 1.0);
        assert!((c.get(0, 2, 0) + ell.j2() / 5f64.sqrt()).abs() < 1e-18);
    }

    #[test]
    fn test_normal_coefficients_lmax_one() {
        let ell = ReferenceEllipsoid::grs80();
        let c = normal_coefficients(&ell, ell.gm, ell.semi_major_axis, 1).unwrap();
        assert_eq!(c.lmax(), 1);
        assert_eq!(c.get(0, 0, 0), 1.0);
    }

    #[test]
    fn test_normal_gravity_variants() {
        let ell = ReferenceEllipsoid::grs80();
        let equator = NormalGravity::Somigliana.at_colatitude(&ell, FRAC_PI_2);
        assert!((equator - ell.gravity_equator()).abs() < 1e-12);
        let spherical = NormalGravity::Spherical.at_colatitude(&ell, 0.3);
        assert!((spherical - 9.798).abs() < 1e-2);
        assert_eq!(NormalGravity::from_str("SPHERICAL"), Some(NormalGravity::Spherical));
    }

    #[test]
    fn test_zero_degree_term() {
        let ell = ReferenceEllipsoid::grs80();
        // Same GM and W0 = U0 (to 1e-3 m^2/s^2) give a near-zero N0
        assert!(zero_degree_term(&ell, ell.gm, ell.semi_major_axis, 9.8).abs() < 1e-3);
        // EGM2008 GM is 5.85e7 m^3/s^2 below the GRS80 value
        let n0 = zero_degree_term(&ell, 3.986_004_415e14, 6_378_136.3, 9.797_644_656);
        assert!((n0 + 0.936).abs() < 1e-3, "N0 = {}", n0);
    }
}

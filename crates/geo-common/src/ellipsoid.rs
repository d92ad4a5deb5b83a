//! Reference ellipsoid and its normal gravity field.
//!
//! The ellipsoid is an immutable value passed into every computation that
//! needs physical constants. Derived quantities (J2, normal potential,
//! Somigliana normal gravity) follow the closed forms of Moritz (1980),
//! "Geodetic Reference System 1980", Bulletin Geodesique 54(3).

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// Level ellipsoid defining the normal gravity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEllipsoid {
    /// Short identifier (e.g. "GRS80")
    pub name: String,
    /// Semi-major axis (meters)
    pub semi_major_axis: f64,
    /// Geometric flattening
    pub flattening: f64,
    /// Geocentric gravitational constant GM (m^3/s^2)
    pub gm: f64,
    /// Angular velocity of rotation (rad/s)
    pub omega: f64,
    /// Potential of the reference geoid W0 (m^2/s^2). When absent the
    /// normal potential U0 of the ellipsoid itself is used.
    #[serde(default)]
    pub reference_potential: Option<f64>,
}

impl ReferenceEllipsoid {
    /// Geodetic Reference System 1980.
    pub fn grs80() -> Self {
        Self {
            name: "GRS80".to_string(),
            semi_major_axis: 6_378_137.0,
            flattening: 0.003_352_810_681_183_637_418,
            gm: 3.986_005e14,
            omega: 7.292_115e-5,
            reference_potential: Some(6.263_686_085_0e7),
        }
    }

    /// World Geodetic System 1984.
    pub fn wgs84() -> Self {
        Self {
            name: "WGS84".to_string(),
            semi_major_axis: 6_378_137.0,
            flattening: 1.0 / 298.257_223_563,
            gm: 3.986_004_418e14,
            omega: 7.292_115e-5,
            reference_potential: None,
        }
    }

    /// Look up a preset by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "GRS80" => Some(Self::grs80()),
            "WGS84" => Some(Self::wgs84()),
            _ => None,
        }
    }

    /// Validate the defining constants.
    pub fn validate(&self) -> GeoResult<()> {
        if !(self.semi_major_axis.is_finite() && self.semi_major_axis > 0.0) {
            return Err(GeoError::InvalidEllipsoid(format!(
                "semi_major_axis must be positive, got {}",
                self.semi_major_axis
            )));
        }
        if !(self.flattening > 0.0 && self.flattening < 1.0) {
            return Err(GeoError::InvalidEllipsoid(format!(
                "flattening must be in (0, 1), got {}",
                self.flattening
            )));
        }
        if !(self.gm.is_finite() && self.gm > 0.0) {
            return Err(GeoError::InvalidEllipsoid(format!(
                "gm must be positive, got {}",
                self.gm
            )));
        }
        if !(self.omega.is_finite() && self.omega >= 0.0) {
            return Err(GeoError::InvalidEllipsoid(format!(
                "omega must be non-negative, got {}",
                self.omega
            )));
        }
        Ok(())
    }

    /// Semi-minor axis b (meters).
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.flattening)
    }

    /// First eccentricity squared e^2.
    pub fn first_eccentricity_sq(&self) -> f64 {
        let a = self.semi_major_axis;
        let b = self.semi_minor_axis();
        (a * a - b * b) / (a * a)
    }

    /// Second eccentricity e'.
    pub fn second_eccentricity(&self) -> f64 {
        let a = self.semi_major_axis;
        let b = self.semi_minor_axis();
        ((a * a - b * b) / (b * b)).sqrt()
    }

    /// m = omega^2 a^2 b / GM.
    pub fn m(&self) -> f64 {
        let a = self.semi_major_axis;
        self.omega * self.omega * a * a * self.semi_minor_axis() / self.gm
    }

    fn q0(&self) -> f64 {
        let ep = self.second_eccentricity();
        0.5 * ((1.0 + 3.0 / (ep * ep)) * ep.atan() - 3.0 / ep)
    }

    fn q0_prime(&self) -> f64 {
        let ep = self.second_eccentricity();
        3.0 * (1.0 + 1.0 / (ep * ep)) * (1.0 - ep.atan() / ep) - 1.0
    }

    /// Dynamical form factor J2.
    pub fn j2(&self) -> f64 {
        let e2 = self.first_eccentricity_sq();
        let ep = self.second_eccentricity();
        e2 / 3.0 * (1.0 - 2.0 / 15.0 * self.m() * ep / self.q0())
    }

    /// Even zonal harmonic J_{2n} of the normal field (unnormalized).
    pub fn j2n(&self, n: u32) -> f64 {
        let e2 = self.first_eccentricity_sq();
        let nf = n as f64;
        let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
        sign * 3.0 * e2.powi(n as i32) / ((2.0 * nf + 1.0) * (2.0 * nf + 3.0))
            * (1.0 - nf + 5.0 * nf * self.j2() / e2)
    }

    /// Normal potential U0 on the ellipsoid surface.
    pub fn normal_potential(&self) -> f64 {
        let ep = self.second_eccentricity();
        let a = self.semi_major_axis;
        self.gm / (ep * self.semi_minor_axis()) * ep.atan() + self.omega * self.omega * a * a / 3.0
    }

    /// Potential of the reference geoid: W0 if configured, else U0.
    pub fn geoid_potential(&self) -> f64 {
        self.reference_potential
            .unwrap_or_else(|| self.normal_potential())
    }

    /// Normal gravity at the equator (m/s^2).
    pub fn gravity_equator(&self) -> f64 {
        let m = self.m();
        let ep = self.second_eccentricity();
        let a = self.semi_major_axis;
        self.gm / (a * self.semi_minor_axis())
            * (1.0 - m - m / 6.0 * ep * self.q0_prime() / self.q0())
    }

    /// Normal gravity at the poles (m/s^2).
    pub fn gravity_pole(&self) -> f64 {
        let m = self.m();
        let ep = self.second_eccentricity();
        let a = self.semi_major_axis;
        self.gm / (a * a) * (1.0 + m / 3.0 * ep * self.q0_prime() / self.q0())
    }

    /// Somigliana normal gravity on the ellipsoid at a geodetic latitude (radians).
    pub fn normal_gravity(&self, latitude: f64) -> f64 {
        let a = self.semi_major_axis;
        let b = self.semi_minor_axis();
        let ga = self.gravity_equator();
        let gb = self.gravity_pole();
        let k = b * gb / (a * ga) - 1.0;
        let s2 = latitude.sin().powi(2);
        ga * (1.0 + k * s2) / (1.0 - self.first_eccentricity_sq() * s2).sqrt()
    }

    /// Radius of the sphere with the same volume as the ellipsoid.
    pub fn volumetric_radius(&self) -> f64 {
        let a = self.semi_major_axis;
        (a * a * self.semi_minor_axis()).cbrt()
    }
}

impl Default for ReferenceEllipsoid {
    fn default() -> Self {
        Self::grs80()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grs80_semi_minor_axis() {
        let ell = ReferenceEllipsoid::grs80();
        assert!((ell.semi_minor_axis() - 6_356_752.3141).abs() < 1e-3);
    }

    #[test]
    fn test_grs80_j2() {
        let ell = ReferenceEllipsoid::grs80();
        assert!((ell.j2() - 1.082_63e-3).abs() < 1e-9, "J2 = {}", ell.j2());
    }

    #[test]
    fn test_grs80_j4() {
        let ell = ReferenceEllipsoid::grs80();
        assert!((ell.j2n(1) - ell.j2()).abs() < 1e-15);
        assert!((ell.j2n(2) + 2.370_912_22e-6).abs() < 1e-13, "J4 = {}", ell.j2n(2));
    }

    #[test]
    fn test_grs80_normal_potential() {
        let ell = ReferenceEllipsoid::grs80();
        assert!((ell.normal_potential() - 62_636_860.850).abs() < 1e-2);
    }

    #[test]
    fn test_grs80_normal_gravity() {
        let ell = ReferenceEllipsoid::grs80();
        assert!((ell.gravity_equator() - 9.780_326_7715).abs() < 1e-9);
        assert!((ell.gravity_pole() - 9.832_186_3685).abs() < 1e-9);
        assert!((ell.normal_gravity(0.0) - ell.gravity_equator()).abs() < 1e-12);
        assert!(
            (ell.normal_gravity(std::f64::consts::FRAC_PI_2) - ell.gravity_pole()).abs() < 1e-9
        );
        assert!((ell.normal_gravity(45f64.to_radians()) - 9.806_199_2).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_flattening() {
        let mut ell = ReferenceEllipsoid::grs80();
        assert!(ell.validate().is_ok());
        ell.flattening = 0.0;
        assert!(ell.validate().is_err());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ReferenceEllipsoid::from_name("grs80"), Some(ReferenceEllipsoid::grs80()));
        assert!(ReferenceEllipsoid::from_name("WGS84").is_some());
        assert!(ReferenceEllipsoid::from_name("clarke1866").is_none());
    }
}

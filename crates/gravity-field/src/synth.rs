//! Geoid and gravity-disturbance synthesis from a gravity model.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{GravityError, GravityResult};
use crate::normal::{normal_coefficients, NormalGravity};
use geo_common::{ReferenceEllipsoid, Sampling};
use sh_transform::{DhGrid, SphericalHarmonicCoeffs};

/// Options for geoid synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Normal gravity used in Bruns' formula.
    pub normal_gravity: NormalGravity,

    /// Keep the zero-degree term from the GM and W0 differences.
    pub include_zero_degree: bool,

    /// Longitude sampling of the output grid.
    pub sampling: Sampling,

    /// Subtract the ellipsoid's normal field. Off, the full model potential
    /// is synthesized.
    pub remove_normal_field: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            normal_gravity: NormalGravity::Somigliana,
            include_zero_degree: true,
            sampling: Sampling::Double,
            remove_normal_field: true,
        }
    }
}

/// GM and reference radius of a model, or an error naming the missing one.
pub fn model_constants(model: &SphericalHarmonicCoeffs) -> GravityResult<(f64, f64)> {
    let gm = model.gm.ok_or(GravityError::MissingConstant("gm"))?;
    let r0 = model.r0.ok_or(GravityError::MissingConstant("r0"))?;
    Ok((gm, r0))
}

/// Dimensionless coefficients of the disturbing potential `T = W - U`.
pub fn disturbing_coefficients(
    model: &SphericalHarmonicCoeffs,
    ellipsoid: &ReferenceEllipsoid,
) -> GravityResult<SphericalHarmonicCoeffs> {
    ellipsoid.validate()?;
    let (gm, r0) = model_constants(model)?;
    let model = model.to_geodesy_convention();
    let normal = normal_coefficients(ellipsoid, gm, r0, model.lmax())?;
    Ok(model.difference(&normal)?)
}

/// Coefficients the functionals are synthesized from: the disturbing
/// potential, or the whole model when the normal field is kept.
pub fn observed_coefficients(
    model: &SphericalHarmonicCoeffs,
    ellipsoid: &ReferenceEllipsoid,
    remove_normal_field: bool,
) -> GravityResult<SphericalHarmonicCoeffs> {
    if remove_normal_field {
        disturbing_coefficients(model, ellipsoid)
    } else {
        model_constants(model)?;
        Ok(model.to_geodesy_convention())
    }
}

/// Geoid heights (meters) on the sphere of the model's reference radius.
///
/// `N = (T - (W0 - U0)) / gamma`. Without the zero-degree term both the
/// `C00` difference and the potential offset are dropped. The offset only
/// applies when the normal field is removed.
#[instrument(skip(model, ellipsoid), fields(lmax = model.lmax(), ellipsoid = %ellipsoid.name))]
pub fn geoid_grid(
    model: &SphericalHarmonicCoeffs,
    ellipsoid: &ReferenceEllipsoid,
    options: &SynthesisOptions,
) -> GravityResult<DhGrid> {
    let (gm, r0) = model_constants(model)?;
    let mut dc = observed_coefficients(model, ellipsoid, options.remove_normal_field)?;
    let offset = if !options.include_zero_degree {
        dc.set(0, 0, 0, 0.0)?;
        0.0
    } else if options.remove_normal_field {
        ellipsoid.geoid_potential() - ellipsoid.normal_potential()
    } else {
        0.0
    };

    let potential = dc.synthesize(options.sampling).map(|v| v * gm / r0);
    let geoid = potential.map_with_colatitude(|t, theta| {
        (t - offset) / options.normal_gravity.at_colatitude(ellipsoid, theta)
    });

    let (min, max) = geoid.min_max();
    info!(min, max, offset, "Synthesized geoid");
    Ok(geoid)
}

/// Gravity disturbance `dg = -dT/dr` (m/s^2) on the sphere of the model's reference radius.
///
/// Uses the sampling and normal-field choice of `options`.
#[instrument(skip(model, ellipsoid, options), fields(lmax = model.lmax(), ellipsoid = %ellipsoid.name))]
pub fn gravity_disturbance_grid(
    model: &SphericalHarmonicCoeffs,
    ellipsoid: &ReferenceEllipsoid,
    options: &SynthesisOptions,
) -> GravityResult<DhGrid> {
    let (gm, r0) = model_constants(model)?;
    let dc = observed_coefficients(model, ellipsoid, options.remove_normal_field)?;
    let factors = Array1::from_shape_fn(dc.lmax() + 1, |l| gm / (r0 * r0) * (l + 1) as f64);
    let grid = dc.scale_by_degree(&factors)?.synthesize(options.sampling);

    let (min, max) = grid.min_max();
    info!(min, max, "Synthesized gravity disturbance");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_all_approx_eq, create_uniform_sphere};

    fn grs80_sphere(lmax: usize) -> (ReferenceEllipsoid, SphericalHarmonicCoeffs) {
        let ell = ReferenceEllipsoid::grs80();
        let c = SphericalHarmonicCoeffs::from_array(create_uniform_sphere(lmax))
            .unwrap()
            .with_constants(ell.gm, ell.semi_major_axis);
        (ell, c)
    }

    #[test]
    fn test_missing_constants() {
        let c = SphericalHarmonicCoeffs::zeros(4);
        let err = geoid_grid(&c, &ReferenceEllipsoid::grs80(), &SynthesisOptions::default()).unwrap_err();
        assert!(matches!(err, GravityError::MissingConstant("gm")));
    }

    #[test]
    fn test_normal_field_has_zero_disturbance() {
        let (ell, _) = grs80_sphere(8);
        let model = normal_coefficients(&ell, ell.gm, ell.semi_major_axis, 8).unwrap();
        let options = SynthesisOptions {
            include_zero_degree: false,
            ..SynthesisOptions::default()
        };
        let geoid = geoid_grid(&model, &ell, &options).unwrap();
        assert_all_approx_eq!(geoid.data().iter(), 0.0, 1e-9);
        let options = SynthesisOptions {
            sampling: Sampling::Equal,
            ..SynthesisOptions::default()
        };
        let dg = gravity_disturbance_grid(&model, &ell, &options).unwrap();
        assert_all_approx_eq!(dg.data().iter(), 0.0, 1e-12);
    }

    #[test]
    fn test_uniform_sphere_geoid_reflects_missing_flattening() {
        // A sphere lacks the normal C20, so its geoid is a pure degree-2 zonal pattern
        let (ell, c) = grs80_sphere(6);
        let options = SynthesisOptions {
            normal_gravity: NormalGravity::Spherical,
            include_zero_degree: false,
            sampling: Sampling::Double,
            remove_normal_field: true,
        };
        let geoid = geoid_grid(&c, &ell, &options).unwrap();
        let spec = geoid.spec();
        let pole = geoid.data()[[0, 0]];
        let equator = geoid.data()[[spec.nlat() / 2, 0]];
        assert!(pole > 0.0 && equator < 0.0, "pole {} equator {}", pole, equator);
        // Zonal: constant along each row
        for row in geoid.data().rows() {
            assert_all_approx_eq!(row.iter(), row[0], 1e-9);
        }
    }

    #[test]
    fn test_uniform_sphere_without_normal_field_is_constant() {
        let (ell, c) = grs80_sphere(6);
        let options = SynthesisOptions {
            normal_gravity: NormalGravity::Spherical,
            remove_normal_field: false,
            ..SynthesisOptions::default()
        };
        let gamma = ell.gm / ell.semi_major_axis.powi(2);
        let geoid = geoid_grid(&c, &ell, &options).unwrap();
        assert_all_approx_eq!(geoid.data().iter(), ell.gm / ell.semi_major_axis / gamma, 1e-3);

        let dg = gravity_disturbance_grid(&c, &ell, &options).unwrap();
        assert_all_approx_eq!(dg.data().iter(), gamma, 1e-10);
    }
}

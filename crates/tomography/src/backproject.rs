//! Back-projection of a potential onto an interior shell.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{TomographyError, TomographyResult};
use crate::filter::RampConeFilter;
use crate::kernel::{validate_regularization, RadialKernel};
use geo_common::Sampling;
use sh_transform::{DhGrid, SphericalHarmonicCoeffs};

/// Settings of one back-projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackProjection {
    /// Tikhonov parameter; `None` uses the kernel directly.
    pub regularization: Option<f64>,
    /// Longitude sampling of the output grids.
    pub sampling: Sampling,
    /// Zero `C[0, 2, 0]` before synthesis.
    pub remove_flattening: bool,
}

impl Default for BackProjection {
    fn default() -> Self {
        Self {
            regularization: None,
            sampling: Sampling::Double,
            remove_flattening: true,
        }
    }
}

/// Grids and coefficients of one reconstruction.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub unfiltered: DhGrid,
    pub filtered: DhGrid,
    pub coefficients: SphericalHarmonicCoeffs,
    pub filtered_coefficients: SphericalHarmonicCoeffs,
    /// Value of `C[0, 2, 0]` that was zeroed, before filtering.
    pub removed_c20: f64,
}

/// Back-project potential coefficients through `kernel`.
#[instrument(level = "debug", skip_all, fields(kernel = %kernel.kind(), lmax = kernel.lmax()))]
pub fn back_project(
    potential: &SphericalHarmonicCoeffs,
    kernel: &RadialKernel,
    settings: &BackProjection,
) -> TomographyResult<Reconstruction> {
    if potential.lmax() != kernel.lmax() {
        return Err(TomographyError::shape_mismatch(
            "kernel degrees",
            potential.lmax() + 1,
            kernel.lmax() + 1,
        ));
    }
    if let Some(lambda) = settings.regularization {
        validate_regularization(lambda)?;
    }

    let multipliers = kernel.back_projection_multipliers(settings.regularization)?;
    let mut coefficients = potential.scale_by_degree(&multipliers)?;
    let removed_c20 = if settings.remove_flattening {
        coefficients.zero_degree2_order0()
    } else {
        0.0
    };
    debug!(removed_c20, "Applied back-projection multipliers");

    let unfiltered = coefficients.synthesize(settings.sampling);
    let filtered_coefficients = RampConeFilter::new(kernel.lmax()).apply(&coefficients)?;
    let filtered = filtered_coefficients.synthesize(settings.sampling);

    let (lo, hi) = filtered.min_max();
    info!(
        shell_radius = kernel.geometry().shell_radius,
        reference_radius = kernel.geometry().reference_radius,
        regularization = ?settings.regularization,
        filtered_min = lo,
        filtered_max = hi,
        "Back-projection complete"
    );

    Ok(Reconstruction {
        unfiltered,
        filtered,
        coefficients,
        filtered_coefficients,
        removed_c20,
    })
}

/// Apply the kernel itself: `C'_lm = K_l C_lm`.
pub fn forward_project(
    source: &SphericalHarmonicCoeffs,
    kernel: &RadialKernel,
) -> TomographyResult<SphericalHarmonicCoeffs> {
    if source.lmax() != kernel.lmax() {
        return Err(TomographyError::shape_mismatch(
            "kernel degrees",
            source.lmax() + 1,
            kernel.lmax() + 1,
        ));
    }
    Ok(source.scale_by_degree(kernel.values())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{KernelKind, ShellGeometry};
    use test_utils::{assert_all_approx_eq, create_coefficient_array, create_single_harmonic, create_uniform_sphere};

    fn kernel(kind: KernelKind, r: f64, big_r: f64, lmax: usize) -> RadialKernel {
        RadialKernel::build(kind, ShellGeometry::new(r, big_r).unwrap(), lmax).unwrap()
    }

    #[test]
    fn test_identity_at_reference_radius() {
        let c = SphericalHarmonicCoeffs::from_array(create_coefficient_array(8, 2)).unwrap();
        let k = kernel(KernelKind::Continuation, 1.0, 1.0, 8);
        let rec = back_project(&c, &k, &BackProjection::default()).unwrap();
        assert_eq!(rec.removed_c20, c.get(0, 2, 0));
        assert_eq!(rec.coefficients.get(0, 2, 0), 0.0);
        assert_eq!(rec.coefficients.get(0, 3, 1), c.get(0, 3, 1));
    }

    #[test]
    fn test_stabilized_inverse_recovers_single_degree() {
        let lmax = 10;
        let k = kernel(KernelKind::Continuation, 0.8, 1.0, lmax);
        let source = SphericalHarmonicCoeffs::from_array(create_single_harmonic(lmax, (0, 5, 3), 1.0)).unwrap();
        let observed = forward_project(&source, &k).unwrap();
        let settings = BackProjection {
            regularization: Some(1e-12),
            ..Default::default()
        };
        let rec = back_project(&observed, &k, &settings).unwrap();
        assert!((rec.coefficients.get(0, 5, 3) - 1.0).abs() < 1e-9);
        assert!((rec.coefficients.l2_norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_sphere_constant_at_any_shell() {
        for r in [1.0, 0.9, 0.5] {
            for kind in [KernelKind::Continuation, KernelKind::SingleLayer] {
                let c = SphericalHarmonicCoeffs::from_array(create_uniform_sphere(6)).unwrap();
                let k = kernel(kind, r, 1.0, 6);
                let rec = back_project(&c, &k, &BackProjection::default()).unwrap();
                let value = rec.unfiltered.data()[[0, 0]];
                assert_all_approx_eq!(rec.unfiltered.data().iter(), value, 1e-13);
                // ramp weight at degree 0 is zero
                assert_all_approx_eq!(rec.filtered.data().iter(), 0.0, 1e-13);
            }
        }
    }

    #[test]
    fn test_degree_mismatch() {
        let c = SphericalHarmonicCoeffs::zeros(6);
        let k = kernel(KernelKind::Continuation, 0.5, 1.0, 5);
        assert!(back_project(&c, &k, &BackProjection::default()).is_err());
        assert!(forward_project(&c, &k).is_err());
    }

    #[test]
    fn test_negative_regularization_rejected() {
        let c = SphericalHarmonicCoeffs::zeros(4);
        let k = kernel(KernelKind::Continuation, 0.5, 1.0, 4);
        let settings = BackProjection {
            regularization: Some(-0.1),
            ..Default::default()
        };
        assert!(matches!(
            back_project(&c, &k, &settings),
            Err(TomographyError::InvalidRegularization(_))
        ));
    }

    #[test]
    fn test_keep_flattening() {
        let c = SphericalHarmonicCoeffs::from_array(create_single_harmonic(4, (0, 2, 0), 2.0)).unwrap();
        let k = kernel(KernelKind::Continuation, 0.5, 1.0, 4);
        let settings = BackProjection {
            remove_flattening: false,
            ..Default::default()
        };
        let rec = back_project(&c, &k, &settings).unwrap();
        assert_eq!(rec.removed_c20, 0.0);
        assert!((rec.coefficients.get(0, 2, 0) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_output_grid_shape() {
        let c = SphericalHarmonicCoeffs::zeros(5);
        let k = kernel(KernelKind::Continuation, 0.5, 1.0, 5);
        let rec = back_project(&c, &k, &BackProjection::default()).unwrap();
        assert_eq!(rec.unfiltered.data().dim(), (12, 24));
        let equal = BackProjection {
            sampling: Sampling::Equal,
            ..Default::default()
        };
        let rec = back_project(&c, &k, &equal).unwrap();
        assert_eq!(rec.filtered.data().dim(), (12, 12));
    }
}

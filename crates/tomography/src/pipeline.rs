//! End-to-end reconstruction from a gravity model.

use ndarray::Array1;
use tracing::{info, instrument};

use crate::backproject::{back_project, BackProjection, Reconstruction};
use crate::config::{FourierSliceConfig, TomographyConfig};
use crate::error::{TomographyError, TomographyResult};
use crate::fourier_slice::{fibonacci_directions, AccumulatedVolume, SliceAccumulator, SliceGeometry, SphericalField};
use crate::kernel::RadialKernel;
use gravity_field::{
    estimate_disturbing_potential, geoid_grid, gravity_disturbance_grid, model_constants, PotentialSource,
};
use sh_transform::{DhGrid, SphericalHarmonicCoeffs};

/// Every intermediate product of a run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Geoid heights (m) or gravity disturbances (m/s^2) at the model radius
    pub observation: DhGrid,
    /// Disturbing-potential coefficients (m^2/s^2) at the reference radius
    pub potential: SphericalHarmonicCoeffs,
    pub kernel: RadialKernel,
    pub reconstruction: Reconstruction,
}

/// Run every stage from model coefficients to the filtered reconstruction.
#[instrument(skip_all, fields(source = ?config.source, kernel = %config.kernel))]
pub fn run_pipeline(model: &SphericalHarmonicCoeffs, config: &TomographyConfig) -> TomographyResult<PipelineOutput> {
    config.validate().map_err(TomographyError::ConfigError)?;
    let ellipsoid = config.reference_ellipsoid()?;
    let model = match config.lmax {
        Some(lmax) if lmax != model.lmax() => model.with_lmax(lmax),
        _ => model.clone(),
    };
    let (_, r0) = model_constants(&model)?;

    let options = config.synthesis_options();
    let observation = match config.source {
        PotentialSource::Geoid => geoid_grid(&model, &ellipsoid, &options)?,
        PotentialSource::GravityDisturbance => gravity_disturbance_grid(&model, &ellipsoid, &options)?,
    };
    let potential =
        estimate_disturbing_potential(config.source, &observation, &ellipsoid, config.normal_gravity, r0)?;

    let geometry = config.shell.geometry(r0)?;
    let potential = continue_to_radius(&potential, r0, geometry.reference_radius)?;
    let kernel = RadialKernel::build(config.kernel, geometry, potential.lmax())?;
    let settings = BackProjection {
        regularization: config.regularization,
        sampling: config.sampling,
        remove_flattening: true,
    };
    let reconstruction = back_project(&potential, &kernel, &settings)?;

    info!(
        lmax = potential.lmax(),
        shell_radius = geometry.shell_radius,
        reference_radius = geometry.reference_radius,
        "Reconstruction pipeline finished"
    );
    Ok(PipelineOutput {
        observation,
        potential,
        kernel,
        reconstruction,
    })
}

/// Harmonic continuation of potential coefficients from radius `from` to `to`.
///
/// `T_lm(to) = (from / to)^(l + 1) T_lm(from)`.
pub fn continue_to_radius(
    potential: &SphericalHarmonicCoeffs,
    from: f64,
    to: f64,
) -> TomographyResult<SphericalHarmonicCoeffs> {
    if !(from > 0.0 && to > 0.0 && from.is_finite() && to.is_finite()) {
        return Err(TomographyError::InvalidRadius(format!(
            "continuation radii must be positive, got {} -> {}",
            from, to
        )));
    }
    if from == to {
        return Ok(potential.clone());
    }
    let ratio = from / to;
    let factors = Array1::from_shape_fn(potential.lmax() + 1, |l| ratio.powi(l as i32 + 1));
    let mut out = potential.scale_by_degree(&factors)?;
    out.r0 = Some(to);
    Ok(out)
}

/// Fourier-slice volume of a grid treated as a radial field on the unit sphere.
pub fn fourier_slice_from_grid(grid: &DhGrid, config: &FourierSliceConfig) -> TomographyResult<AccumulatedVolume> {
    config.validate().map_err(TomographyError::ConfigError)?;
    let field = SphericalField::radial_from_grid(grid)?;
    let geometry = SliceGeometry::uniform(config.bins, config.half_width)?;
    let directions = fibonacci_directions(config.directions);
    Ok(SliceAccumulator::accumulate(&field, &geometry, &directions)?.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellPlacement;
    use crate::kernel::KernelKind;
    use geo_common::ReferenceEllipsoid;
    use gravity_field::NormalGravity;
    use test_utils::{assert_all_approx_eq, create_coefficient_array};

    fn model(lmax: usize) -> SphericalHarmonicCoeffs {
        let ell = ReferenceEllipsoid::grs80();
        SphericalHarmonicCoeffs::from_array(create_coefficient_array(lmax, 9))
            .unwrap()
            .with_constants(ell.gm, ell.semi_major_axis)
    }

    #[test]
    fn test_continue_to_radius() {
        let mut c = SphericalHarmonicCoeffs::zeros(2).with_constants(1.0, 2.0);
        c.set(0, 2, 1, 1.0).unwrap();
        let out = continue_to_radius(&c, 2.0, 4.0).unwrap();
        assert!((out.get(0, 2, 1) - 0.125).abs() < 1e-15);
        assert_eq!(out.r0, Some(4.0));
        assert!(continue_to_radius(&c, 0.0, 4.0).is_err());
    }

    #[test]
    fn test_pipeline_geoid_source() {
        let config = TomographyConfig {
            lmax: Some(8),
            ..Default::default()
        };
        let out = run_pipeline(&model(10), &config).unwrap();
        assert_eq!(out.potential.lmax(), 8);
        assert_eq!(out.observation.data().dim(), (18, 36));
        assert_eq!(out.reconstruction.coefficients.get(0, 2, 0), 0.0);
        assert!(out.reconstruction.filtered.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_pipeline_gravity_source_at_model_radius() {
        let mut config = TomographyConfig {
            source: PotentialSource::GravityDisturbance,
            regularization: Some(1e-6),
            ..Default::default()
        };
        config.shell.reference_radius = None;
        config.shell.placement = ShellPlacement::Depth(100_000.0);
        let out = run_pipeline(&model(6), &config).unwrap();
        let ell = ReferenceEllipsoid::grs80();
        assert_eq!(out.kernel.geometry().reference_radius, ell.semi_major_axis);
        assert_eq!(out.potential.r0, Some(ell.semi_major_axis));
    }

    #[test]
    fn test_pipeline_uniform_sphere_stays_constant() {
        let ell = ReferenceEllipsoid::grs80();
        let sphere = SphericalHarmonicCoeffs::from_array(test_utils::create_uniform_sphere(8))
            .unwrap()
            .with_constants(ell.gm, ell.semi_major_axis);
        let config = TomographyConfig {
            normal_gravity: NormalGravity::Spherical,
            remove_normal_field: false,
            kernel: KernelKind::Continuation,
            ..Default::default()
        };
        let out = run_pipeline(&sphere, &config).unwrap();

        let observation = out.observation.data();
        assert_all_approx_eq!(observation.iter(), observation[[0, 0]], 1e-6 * observation[[0, 0]].abs());
        let unfiltered = out.reconstruction.unfiltered.data();
        let scale = unfiltered[[0, 0]].abs().max(1e-30);
        assert!(unfiltered[[0, 0]] != 0.0);
        assert_all_approx_eq!(unfiltered.iter(), unfiltered[[0, 0]], 1e-9 * scale);
        let filtered = out.reconstruction.filtered.data();
        assert_all_approx_eq!(filtered.iter(), filtered[[0, 0]], 1e-9 * scale);
    }

    #[test]
    fn test_pipeline_stabilized_fbp_kernel() {
        let config = TomographyConfig {
            lmax: Some(6),
            kernel: KernelKind::StabilizedFbp,
            ..Default::default()
        };
        let out = run_pipeline(&model(6), &config).unwrap();
        assert_eq!(out.kernel.kind(), KernelKind::StabilizedFbp);
        assert!(out.reconstruction.unfiltered.data().iter().all(|v| v.is_finite()));
        assert_eq!(out.reconstruction.coefficients.get(0, 2, 0), 0.0);
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let config = TomographyConfig {
            regularization: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            run_pipeline(&model(4), &config),
            Err(TomographyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_pipeline_requires_constants() {
        let bare = SphericalHarmonicCoeffs::from_array(create_coefficient_array(4, 1)).unwrap();
        assert!(run_pipeline(&bare, &TomographyConfig::default()).is_err());
    }

    #[test]
    fn test_fourier_slice_from_grid() {
        let spec = geo_common::DhGridSpec::new(4, geo_common::Sampling::Double);
        let grid = DhGrid::from_fn(spec, |theta, _| theta.cos());
        let config = FourierSliceConfig {
            bins: 8,
            half_width: 1.0,
            directions: 6,
        };
        let out = fourier_slice_from_grid(&grid, &config).unwrap();
        assert_eq!(out.directions, 6);
        assert_eq!(out.volume.dim(), (8, 8, 8));
    }
}

//! Configuration for reconstruction runs.

use geo_common::constants::MEAN_EARTH_RADIUS;
use geo_common::{ReferenceEllipsoid, Sampling};
use gravity_field::{NormalGravity, PotentialSource, SynthesisOptions};
use serde::{Deserialize, Serialize};

use crate::error::{TomographyError, TomographyResult};
use crate::kernel::{KernelKind, ShellGeometry};

/// Where the source shell sits relative to the reference sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellPlacement {
    /// Absolute shell radius in meters
    Radius(f64),
    /// Depth below the reference sphere in meters
    Depth(f64),
    /// Shell radius as a fraction of the reference radius
    Fraction(f64),
}

impl Default for ShellPlacement {
    fn default() -> Self {
        Self::Fraction(0.9)
    }
}

/// Shell and reference sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Reference radius R; `None` uses the model's reference radius.
    pub reference_radius: Option<f64>,
    pub placement: ShellPlacement,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            reference_radius: Some(MEAN_EARTH_RADIUS),
            placement: ShellPlacement::default(),
        }
    }
}

impl ShellConfig {
    /// Resolve against the model radius `r0`.
    pub fn geometry(&self, r0: f64) -> TomographyResult<ShellGeometry> {
        let big_r = self.reference_radius.unwrap_or(r0);
        match self.placement {
            ShellPlacement::Radius(r) => ShellGeometry::new(r, big_r),
            ShellPlacement::Depth(depth) => ShellGeometry::from_depth(depth, big_r),
            ShellPlacement::Fraction(f) => ShellGeometry::new(f * big_r, big_r),
        }
    }
}

/// Parameters of one back-projection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomographyConfig {
    /// Functional the disturbing potential is estimated from
    pub source: PotentialSource,

    /// Truncation degree (None keeps the model's)
    pub lmax: Option<usize>,

    /// Reference ellipsoid preset name
    pub ellipsoid: String,

    /// Normal gravity in Bruns' formula
    pub normal_gravity: NormalGravity,

    /// Keep the zero-degree geoid term
    pub include_zero_degree: bool,

    /// Subtract the normal field before synthesis
    pub remove_normal_field: bool,

    pub kernel: KernelKind,

    /// Tikhonov parameter of the stabilized back-projection
    pub regularization: Option<f64>,

    pub shell: ShellConfig,

    /// Longitude sampling of all grids
    pub sampling: Sampling,
}

impl Default for TomographyConfig {
    fn default() -> Self {
        Self {
            source: PotentialSource::Geoid,
            lmax: None,
            ellipsoid: "grs80".to_string(),
            normal_gravity: NormalGravity::Somigliana,
            include_zero_degree: true,
            remove_normal_field: true,
            kernel: KernelKind::Continuation,
            regularization: None,
            shell: ShellConfig::default(),
            sampling: Sampling::Double,
        }
    }
}

impl TomographyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRAVTOMO_SOURCE") {
            if let Some(source) = PotentialSource::from_str(&val) {
                config.source = source;
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_LMAX") {
            if let Ok(lmax) = val.parse() {
                config.lmax = Some(lmax);
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_ELLIPSOID") {
            config.ellipsoid = val;
        }

        if let Ok(val) = std::env::var("GRAVTOMO_NORMAL_GRAVITY") {
            if let Some(ng) = NormalGravity::from_str(&val) {
                config.normal_gravity = ng;
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_REMOVE_NORMAL_FIELD") {
            if let Ok(remove) = val.parse() {
                config.remove_normal_field = remove;
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_KERNEL") {
            if let Some(kind) = KernelKind::from_str(&val) {
                config.kernel = kind;
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_LAMBDA") {
            config.regularization = val.parse().ok();
        }

        if let Ok(val) = std::env::var("GRAVTOMO_REFERENCE_RADIUS") {
            if let Ok(r) = val.parse() {
                config.shell.reference_radius = Some(r);
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_SHELL_DEPTH") {
            if let Ok(depth) = val.parse() {
                config.shell.placement = ShellPlacement::Depth(depth);
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_SHELL_RADIUS") {
            if let Ok(r) = val.parse() {
                config.shell.placement = ShellPlacement::Radius(r);
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_SAMPLING") {
            config.sampling = match val.to_lowercase().as_str() {
                "1" | "equal" => Sampling::Equal,
                _ => Sampling::Double,
            };
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.lmax == Some(0) {
            return Err("lmax must be > 0".to_string());
        }
        if ReferenceEllipsoid::from_name(&self.ellipsoid).is_none() {
            return Err(format!("unknown ellipsoid '{}'", self.ellipsoid));
        }
        if let Some(lambda) = self.regularization {
            if !(lambda.is_finite() && lambda >= 0.0) {
                return Err(format!("regularization must be finite and >= 0, got {}", lambda));
            }
        }
        if let Some(r) = self.shell.reference_radius {
            if !(r.is_finite() && r > 0.0) {
                return Err(format!("reference_radius must be positive, got {}", r));
            }
        }
        match self.shell.placement {
            ShellPlacement::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(format!("shell fraction must be in (0, 1], got {}", f))
            }
            ShellPlacement::Depth(d) if !(d.is_finite() && d >= 0.0) => {
                Err(format!("shell depth must be >= 0, got {}", d))
            }
            ShellPlacement::Radius(r) if !(r.is_finite() && r > 0.0) => {
                Err(format!("shell radius must be positive, got {}", r))
            }
            _ => Ok(()),
        }
    }

    /// Options for synthesizing the observation grid.
    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            normal_gravity: self.normal_gravity,
            include_zero_degree: self.include_zero_degree,
            sampling: self.sampling,
            remove_normal_field: self.remove_normal_field,
        }
    }

    /// The reference ellipsoid named by `ellipsoid`.
    pub fn reference_ellipsoid(&self) -> TomographyResult<ReferenceEllipsoid> {
        ReferenceEllipsoid::from_name(&self.ellipsoid)
            .ok_or_else(|| TomographyError::ConfigError(format!("unknown ellipsoid '{}'", self.ellipsoid)))
    }
}

/// Parameters of a Fourier-slice accumulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FourierSliceConfig {
    /// Voxels per axis
    pub bins: usize,

    /// Bins cover `[-half_width, half_width]` on every axis
    pub half_width: f64,

    /// Number of projection directions on a Fibonacci sphere
    pub directions: usize,
}

impl Default for FourierSliceConfig {
    fn default() -> Self {
        Self {
            bins: 32,
            half_width: 1.0,
            directions: 64,
        }
    }
}

impl FourierSliceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.bins == 0 || self.bins > 512 {
            return Err("bins must be between 1 and 512".to_string());
        }
        if !(self.half_width.is_finite() && self.half_width > 0.0) {
            return Err(format!("half_width must be positive, got {}", self.half_width));
        }
        if self.directions == 0 {
            return Err("directions must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TomographyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.kernel, KernelKind::Continuation);
        assert!(FourierSliceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_shell_geometry_from_placement() {
        let mut shell = ShellConfig::default();
        let g = shell.geometry(6_378_136.3).unwrap();
        assert!((g.shell_radius - 0.9 * MEAN_EARTH_RADIUS).abs() < 1e-6);

        shell.placement = ShellPlacement::Depth(100_000.0);
        shell.reference_radius = None;
        let g = shell.geometry(6_378_136.3).unwrap();
        assert!((g.shell_radius - 6_278_136.3).abs() < 1e-6);

        shell.placement = ShellPlacement::Radius(7_000_000.0);
        assert!(shell.geometry(6_378_136.3).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TomographyConfig::default();
        config.regularization = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = TomographyConfig::default();
        config.ellipsoid = "clarke1866".to_string();
        assert!(config.validate().is_err());
        assert!(config.reference_ellipsoid().is_err());

        let mut config = TomographyConfig::default();
        config.shell.placement = ShellPlacement::Fraction(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml() {
        let yaml = r#"
source: gravity_disturbance
lmax: 120
kernel: single_layer
regularization: 1.0e-3
remove_normal_field: false
shell:
  placement:
    depth: 250000.0
"#;
        let config: TomographyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source, PotentialSource::GravityDisturbance);
        assert_eq!(config.lmax, Some(120));
        assert_eq!(config.kernel, KernelKind::SingleLayer);
        assert_eq!(config.regularization, Some(1e-3));
        assert_eq!(config.shell.placement, ShellPlacement::Depth(250_000.0));
        assert_eq!(config.shell.reference_radius, Some(MEAN_EARTH_RADIUS));
        assert_eq!(config.normal_gravity, NormalGravity::Somigliana);
        assert!(!config.remove_normal_field);
        assert!(!config.synthesis_options().remove_normal_field);
        assert!(TomographyConfig::default().remove_normal_field);
        assert!(config.validate().is_ok());
    }
}

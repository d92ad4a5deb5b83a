//! Per-degree radial kernels relating a source shell to the reference sphere.
//!
//! Every kernel is zonal, so spherical convolution with it reduces to one
//! multiplier `K_l` per degree.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

use crate::error::{TomographyError, TomographyResult};
use geo_common::constants::GRAVITATIONAL_CONSTANT;
use geo_common::{DhGridSpec, Sampling};
use sh_transform::DhGrid;

/// Shell ratio above which an unregularized back-projection has no depth resolution.
pub const NEAR_SURFACE_RATIO: f64 = 0.999;

/// Filter parameter of the stabilized FBP kernel when none is configured.
pub const DEFAULT_FBP_FILTER: f64 = 5e-10;

/// Which radial kernel to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// Upward continuation `(r / R)^l`
    #[default]
    Continuation,
    /// Potential at `R` of a unit surface density on the shell
    SingleLayer,
    /// Expansion of the negative point-to-shell distance
    ShellDistance,
    /// Filtered back-projection operator
    /// `BP_l = 2 pi (4 pi / (2l + 1)) (r / R)^l / R`, always stabilized
    /// with `filter / R`
    StabilizedFbp,
}

impl KernelKind {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "continuation" => Some(Self::Continuation),
            "single_layer" => Some(Self::SingleLayer),
            "shell_distance" | "distance" => Some(Self::ShellDistance),
            "stabilized_fbp" | "fbp" => Some(Self::StabilizedFbp),
            _ => None,
        }
    }

    /// Get the kernel name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuation => "continuation",
            Self::SingleLayer => "single_layer",
            Self::ShellDistance => "shell_distance",
            Self::StabilizedFbp => "stabilized_fbp",
        }
    }
}

impl std::fmt::Display for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Radii of the source shell and the reference sphere (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShellGeometry {
    /// Radius r of the source shell
    pub shell_radius: f64,
    /// Radius R of the sphere the potential is given on
    pub reference_radius: f64,
}

impl ShellGeometry {
    /// Validated geometry: both finite and `0 < r <= R`.
    pub fn new(shell_radius: f64, reference_radius: f64) -> TomographyResult<Self> {
        let geometry = Self {
            shell_radius,
            reference_radius,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Geometry of a shell `depth` meters below the reference sphere.
    pub fn from_depth(depth: f64, reference_radius: f64) -> TomographyResult<Self> {
        Self::new(reference_radius - depth, reference_radius)
    }

    /// Check `0 < r <= R`.
    pub fn validate(&self) -> TomographyResult<()> {
        let (r, big_r) = (self.shell_radius, self.reference_radius);
        if !(big_r.is_finite() && big_r > 0.0) {
            return Err(TomographyError::InvalidRadius(format!(
                "reference radius must be positive and finite, got {}",
                big_r
            )));
        }
        if !(r.is_finite() && r > 0.0) {
            return Err(TomographyError::InvalidRadius(format!(
                "shell radius must be positive and finite, got {}",
                r
            )));
        }
        if r > big_r {
            return Err(TomographyError::InvalidRadius(format!(
                "shell radius {} exceeds reference radius {}",
                r, big_r
            )));
        }
        Ok(())
    }

    /// `r / R`.
    pub fn ratio(&self) -> f64 {
        self.shell_radius / self.reference_radius
    }

    /// Depth of the shell below the reference sphere.
    pub fn depth(&self) -> f64 {
        self.reference_radius - self.shell_radius
    }
}

/// Per-degree multipliers `K_l` for `l = 0..=lmax`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialKernel {
    kind: KernelKind,
    geometry: ShellGeometry,
    values: Array1<f64>,
}

impl RadialKernel {
    /// Build the kernel of `kind` for `geometry` up to `lmax`.
    pub fn build(kind: KernelKind, geometry: ShellGeometry, lmax: usize) -> TomographyResult<Self> {
        geometry.validate()?;
        let ratio = geometry.ratio();
        let values = match kind {
            KernelKind::Continuation => continuation(ratio, lmax),
            KernelKind::SingleLayer => {
                let (r, big_r) = (geometry.shell_radius, geometry.reference_radius);
                let scale = 4.0 * PI * GRAVITATIONAL_CONSTANT * r * r / big_r;
                continuation(ratio, lmax)
                    .indexed_iter()
                    .map(|(l, c)| scale * c / (2 * l + 1) as f64)
                    .collect()
            }
            KernelKind::ShellDistance => shell_distance(geometry, lmax),
            KernelKind::StabilizedFbp => {
                let big_r = geometry.reference_radius;
                continuation(ratio, lmax)
                    .indexed_iter()
                    .map(|(l, c)| 8.0 * PI * PI / (big_r * (2 * l + 1) as f64) * c)
                    .collect()
            }
        };
        debug!(kind = %kind, ratio, lmax, k_lmax = values[lmax], "Built radial kernel");
        Ok(Self {
            kind,
            geometry,
            values,
        })
    }

    /// Wrap precomputed multipliers.
    pub fn from_values(kind: KernelKind, geometry: ShellGeometry, values: Array1<f64>) -> TomographyResult<Self> {
        geometry.validate()?;
        if values.is_empty() {
            return Err(TomographyError::shape_mismatch("kernel values", "lmax + 1 >= 1", 0));
        }
        Ok(Self {
            kind,
            geometry,
            values,
        })
    }

    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    pub fn geometry(&self) -> ShellGeometry {
        self.geometry
    }

    /// Band limit.
    pub fn lmax(&self) -> usize {
        self.values.len() - 1
    }

    /// Raw multipliers.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Multipliers of the back-projection operator.
    ///
    /// Without regularization this is `K_l` itself. With `lambda` the
    /// stabilized `K_l / (K_l^2 + lambda)` is returned; a zero denominator
    /// gives 0. The FBP kernel is always stabilized, with `lambda / R` and
    /// [`DEFAULT_FBP_FILTER`] when no parameter is given.
    pub fn back_projection_multipliers(&self, regularization: Option<f64>) -> TomographyResult<Array1<f64>> {
        if let Some(lambda) = regularization {
            validate_regularization(lambda)?;
        }
        let regularization = match self.kind {
            KernelKind::StabilizedFbp => {
                Some(regularization.unwrap_or(DEFAULT_FBP_FILTER) / self.geometry.reference_radius)
            }
            _ => regularization,
        };
        match regularization {
            None => {
                if self.geometry.ratio() > NEAR_SURFACE_RATIO {
                    warn!(
                        ratio = self.geometry.ratio(),
                        "Shell is at the reference sphere; the kernel is close to identity and carries no depth information"
                    );
                }
                Ok(self.values.clone())
            }
            Some(lambda) => {
                let mut zeroed = 0usize;
                let out = self.values.mapv(|k| {
                    let denom = k * k + lambda;
                    if denom == 0.0 {
                        zeroed += 1;
                        0.0
                    } else {
                        k / denom
                    }
                });
                if zeroed > 0 {
                    debug!(zeroed, "Zero denominators in stabilized multiplier");
                }
                Ok(out)
            }
        }
    }
}

/// Check a Tikhonov parameter is finite and non-negative.
pub fn validate_regularization(lambda: f64) -> TomographyResult<()> {
    if lambda.is_finite() && lambda >= 0.0 {
        Ok(())
    } else {
        Err(TomographyError::InvalidRegularization(lambda))
    }
}

fn continuation(ratio: f64, lmax: usize) -> Array1<f64> {
    let mut values = Array1::<f64>::zeros(lmax + 1);
    let mut power = 1.0;
    for v in values.iter_mut() {
        *v = power;
        power *= ratio;
    }
    values
}

/// Zonal expansion of `-sqrt(R^2 + r^2 - 2 r R cos(theta))` turned into a
/// convolution multiplier by Funk-Hecke: `K_l = k_l0 / sqrt(2l + 1)`.
fn shell_distance(geometry: ShellGeometry, lmax: usize) -> Array1<f64> {
    let (r, big_r) = (geometry.shell_radius, geometry.reference_radius);
    let spec = DhGridSpec::new(lmax, Sampling::Equal);
    let grid = DhGrid::from_fn(spec, |theta, _| {
        -(big_r * big_r + r * r - 2.0 * r * big_r * theta.cos()).max(0.0).sqrt()
    });
    let expansion = grid.expand();
    Array1::from_shape_fn(lmax + 1, |l| expansion.get(0, l, 0) / ((2 * l + 1) as f64).sqrt())
}

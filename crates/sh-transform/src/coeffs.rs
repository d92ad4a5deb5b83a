//! Dense spherical-harmonic coefficient sets.
//!
//! Coefficients live in an `Array3<f64>` of shape `[2, lmax + 1, lmax + 1]`
//! indexed `(component, degree, order)`: component 0 holds the cosine terms
//! `C_lm`, component 1 the sine terms `S_lm`. Entries with `m > l` and the
//! sine terms of order 0 are kept at zero.

use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use crate::error::{TransformError, TransformResult};
use shm_parser::ShmModel;

/// Normalization of the real spherical harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Geodesy convention, mean square of each harmonic over the sphere is 1
    #[default]
    #[serde(rename = "4pi")]
    FourPi,
    /// Orthonormal, integral of the square over the sphere is 1
    Ortho,
}

impl Normalization {
    /// Parse from the numeric convention (1 = 4pi, 4 = orthonormal).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::FourPi),
            4 => Some(Self::Ortho),
            _ => None,
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "4pi" | "fourpi" | "1" => Some(Self::FourPi),
            "ortho" | "orthonormal" | "4" => Some(Self::Ortho),
            _ => None,
        }
    }

    /// Factor converting a coefficient in this normalization to 4pi.
    fn to_four_pi(self) -> f64 {
        match self {
            Self::FourPi => 1.0,
            Self::Ortho => 1.0 / (4.0 * PI).sqrt(),
        }
    }
}

/// Whether the Condon-Shortley phase `(-1)^m` is part of the harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhaseConvention {
    /// Geodesy convention (csphase = 1)
    #[default]
    Excluded,
    /// Physics convention (csphase = -1)
    Included,
}

impl PhaseConvention {
    /// Parse from the numeric convention (1 or -1).
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(Self::Excluded),
            -1 => Some(Self::Included),
            _ => None,
        }
    }
}

/// A band-limited real spherical-harmonic expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalHarmonicCoeffs {
    coeffs: Array3<f64>,
    normalization: Normalization,
    phase: PhaseConvention,
    /// Formal errors, same layout as `coeffs`
    errors: Option<Array3<f64>>,
    /// GM the coefficients are scaled to (m^3/s^2)
    pub gm: Option<f64>,
    /// Reference radius of the expansion (meters)
    pub r0: Option<f64>,
}

impl SphericalHarmonicCoeffs {
    /// All-zero coefficients up to `lmax`, 4pi normalized.
    pub fn zeros(lmax: usize) -> Self {
        Self {
            coeffs: Array3::zeros((2, lmax + 1, lmax + 1)),
            normalization: Normalization::FourPi,
            phase: PhaseConvention::Excluded,
            errors: None,
            gm: None,
            r0: None,
        }
    }

    /// Wrap a raw 4pi-normalized array.
    ///
    /// The array must have shape `[2, n, n]` with `n >= 1`. Entries that
    /// cannot carry signal (`m > l`, `S_l0`) are cleared.
    pub fn from_array(coeffs: Array3<f64>) -> TransformResult<Self> {
        Self::from_array_with(coeffs, Normalization::FourPi, PhaseConvention::Excluded)
    }

    /// Wrap a raw array given in an arbitrary convention.
    pub fn from_array_with(
        mut coeffs: Array3<f64>,
        normalization: Normalization,
        phase: PhaseConvention,
    ) -> TransformResult<Self> {
        let shape = coeffs.shape();
        if shape[0] != 2 || shape[1] == 0 || shape[1] != shape[2] {
            return Err(TransformError::InvalidCoefficients(format!(
                "expected shape [2, n, n] with n >= 1, got {:?}",
                shape
            )));
        }
        if coeffs.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::InvalidCoefficients(
                "coefficients must be finite".to_string(),
            ));
        }
        let cleared = clear_unused(&mut coeffs);
        if cleared > 0 {
            debug!(cleared, "Cleared coefficients outside the triangular layout");
        }
        Ok(Self {
            coeffs,
            normalization,
            phase,
            errors: None,
            gm: None,
            r0: None,
        })
    }

    /// Wrap an array produced inside this crate, already in 4pi layout.
    pub(crate) fn from_raw(coeffs: Array3<f64>) -> Self {
        Self {
            coeffs,
            normalization: Normalization::FourPi,
            phase: PhaseConvention::Excluded,
            errors: None,
            gm: None,
            r0: None,
        }
    }

    /// Build from a parsed model file, keeping its GM, radius and formal errors.
    pub fn from_model(model: &ShmModel) -> Self {
        let lmax = model.lmax;
        let mut out = Self::zeros(lmax);
        let mut errors = model
            .has_errors()
            .then(|| Array3::<f64>::zeros((2, lmax + 1, lmax + 1)));

        for r in &model.records {
            out.coeffs[[0, r.degree, r.order]] = r.c;
            if r.order > 0 {
                out.coeffs[[1, r.degree, r.order]] = r.s;
            }
            if let (Some(err), Some(sc), Some(ss)) = (errors.as_mut(), r.sigma_c, r.sigma_s) {
                err[[0, r.degree, r.order]] = sc;
                if r.order > 0 {
                    err[[1, r.degree, r.order]] = ss;
                }
            }
        }
        out.errors = errors;
        out.gm = model.header.gm;
        out.r0 = model.header.radius;
        out
    }

    /// Attach GM and reference radius.
    pub fn with_constants(mut self, gm: f64, r0: f64) -> Self {
        self.gm = Some(gm);
        self.r0 = Some(r0);
        self
    }

    /// Band limit.
    pub fn lmax(&self) -> usize {
        self.coeffs.shape()[1] - 1
    }

    /// Normalization of the stored values.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Phase convention of the stored values.
    pub fn phase(&self) -> PhaseConvention {
        self.phase
    }

    /// Borrow the raw array.
    pub fn as_array(&self) -> &Array3<f64> {
        &self.coeffs
    }

    /// Take the raw array.
    pub fn into_array(self) -> Array3<f64> {
        self.coeffs
    }

    /// Formal errors, if the source carried them.
    pub fn errors(&self) -> Option<&Array3<f64>> {
        self.errors.as_ref()
    }

    /// Value at (component, degree, order); zero outside the band limit.
    pub fn get(&self, component: usize, l: usize, m: usize) -> f64 {
        self.coeffs.get([component, l, m]).copied().unwrap_or(0.0)
    }

    /// Set a single coefficient.
    pub fn set(&mut self, component: usize, l: usize, m: usize, value: f64) -> TransformResult<()> {
        if component > 1 || l > self.lmax() || m > l || (component == 1 && m == 0) {
            return Err(TransformError::InvalidCoefficients(format!(
                "cannot set ({}, {}, {}) with lmax {}",
                component,
                l,
                m,
                self.lmax()
            )));
        }
        self.coeffs[[component, l, m]] = value;
        Ok(())
    }

    /// Convert to another normalization and phase convention.
    pub fn converted(&self, normalization: Normalization, phase: PhaseConvention) -> Self {
        let scale = self.normalization.to_four_pi() / normalization.to_four_pi();
        let flip_phase = self.phase != phase;
        let mut out = self.clone();
        for ((_, _, m), v) in out.coeffs.indexed_iter_mut() {
            *v *= scale;
            if flip_phase && m % 2 == 1 {
                *v = -*v;
            }
        }
        if let Some(err) = out.errors.as_mut() {
            err.mapv_inplace(|e| e * scale.abs());
        }
        out.normalization = normalization;
        out.phase = phase;
        out
    }

    /// Same expansion in the 4pi, no-phase convention used by the transforms.
    pub fn to_geodesy_convention(&self) -> Self {
        self.converted(Normalization::FourPi, PhaseConvention::Excluded)
    }

    /// Truncate or zero-pad to a new band limit.
    pub fn with_lmax(&self, lmax: usize) -> Self {
        let keep = lmax.min(self.lmax());
        let resize = |src: &Array3<f64>| {
            let mut dst = Array3::zeros((2, lmax + 1, lmax + 1));
            for i in 0..2 {
                for l in 0..=keep {
                    for m in 0..=l {
                        dst[[i, l, m]] = src[[i, l, m]];
                    }
                }
            }
            dst
        };
        Self {
            coeffs: resize(&self.coeffs),
            normalization: self.normalization,
            phase: self.phase,
            errors: self.errors.as_ref().map(resize),
            gm: self.gm,
            r0: self.r0,
        }
    }

    /// Rescale to a different GM and reference radius.
    ///
    /// `C'_lm = C_lm (GM / GM') (r0 / r0')^l`, which describes the same potential.
    pub fn rescaled(&self, gm: f64, r0: f64) -> TransformResult<Self> {
        let (Some(old_gm), Some(old_r0)) = (self.gm, self.r0) else {
            return Err(TransformError::InvalidCoefficients(
                "rescaling needs GM and r0 on the source coefficients".to_string(),
            ));
        };
        if !(gm > 0.0 && r0 > 0.0) {
            return Err(TransformError::InvalidCoefficients(format!(
                "rescaling targets must be positive, got gm={} r0={}",
                gm, r0
            )));
        }
        let ratio = old_r0 / r0;
        let factors = Array1::from_shape_fn(self.lmax() + 1, |l| old_gm / gm * ratio.powi(l as i32));
        let mut out = self.scale_by_degree(&factors)?;
        out.gm = Some(gm);
        out.r0 = Some(r0);
        Ok(out)
    }

    /// Multiply every order of degree `l` by `factors[l]`.
    pub fn scale_by_degree(&self, factors: &Array1<f64>) -> TransformResult<Self> {
        if factors.len() != self.lmax() + 1 {
            return Err(TransformError::degree_mismatch(self.lmax(), factors.len().saturating_sub(1)));
        }
        let mut out = self.clone();
        for mut component in out.coeffs.axis_iter_mut(Axis(0)) {
            for (mut row, &k) in component.axis_iter_mut(Axis(0)).zip(factors.iter()) {
                row.mapv_inplace(|v| v * k);
            }
        }
        if let Some(err) = out.errors.as_mut() {
            for mut component in err.axis_iter_mut(Axis(0)) {
                for (mut row, &k) in component.axis_iter_mut(Axis(0)).zip(factors.iter()) {
                    row.mapv_inplace(|v| v * k.abs());
                }
            }
        }
        Ok(out)
    }

    /// Multiply both components elementwise by a `[lmax + 1, lmax + 1]` weight array.
    pub fn weighted(&self, weights: &Array2<f64>) -> TransformResult<Self> {
        let n = self.lmax() + 1;
        if weights.dim() != (n, n) {
            return Err(TransformError::shape_mismatch(
                "coefficient weights",
                (n, n),
                weights.dim(),
            ));
        }
        let mut out = self.clone();
        for mut component in out.coeffs.axis_iter_mut(Axis(0)) {
            component *= weights;
        }
        out.errors = None;
        Ok(out)
    }

    /// Coefficient-wise difference `self - other`.
    pub fn difference(&self, other: &Self) -> TransformResult<Self> {
        if self.lmax() != other.lmax() {
            return Err(TransformError::degree_mismatch(self.lmax(), other.lmax()));
        }
        if self.normalization != other.normalization || self.phase != other.phase {
            return Err(TransformError::InvalidCoefficients(
                "cannot subtract coefficients in different conventions".to_string(),
            ));
        }
        let mut out = self.clone();
        out.coeffs = &self.coeffs - &other.coeffs;
        Ok(out)
    }

    /// Zero the degree-2, order-0 terms (the flattening of the reference
    /// ellipsoid) and return the removed cosine value.
    pub fn zero_degree2_order0(&mut self) -> f64 {
        if self.lmax() < 2 {
            return 0.0;
        }
        let removed = self.coeffs[[0, 2, 0]];
        self.coeffs[[0, 2, 0]] = 0.0;
        self.coeffs[[1, 2, 0]] = 0.0;
        removed
    }

    /// Euclidean norm of the whole array.
    pub fn l2_norm(&self) -> f64 {
        self.coeffs.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Degree variances `sum_m (C_lm^2 + S_lm^2)` for each degree.
    pub fn power_per_degree(&self) -> Vec<f64> {
        (0..=self.lmax())
            .map(|l| {
                (0..=l)
                    .map(|m| self.coeffs[[0, l, m]].powi(2) + self.coeffs[[1, l, m]].powi(2))
                    .sum()
            })
            .collect()
    }
}

/// Zero entries with `m > l` and sine terms of order 0; return how many were non-zero.
fn clear_unused(coeffs: &mut Array3<f64>) -> usize {
    let mut cleared = 0;
    for ((i, l, m), v) in coeffs.indexed_iter_mut() {
        if (m > l || (i == 1 && m == 0)) && *v != 0.0 {
            *v = 0.0;
            cleared += 1;
        }
    }
    cleared
}

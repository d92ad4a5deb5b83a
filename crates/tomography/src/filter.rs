//! Ramp-cone weighting of back-projected coefficients.

use ndarray::{Array1, Array2};

use crate::error::TomographyResult;
use sh_transform::SphericalHarmonicCoeffs;

/// `W[l, m] = sqrt(ramp[l]^2 ramp[m]^2)` with `ramp = linspace(0, 1, lmax + 1)`.
///
/// The weights vanish at degree 0 and order 0 and grow linearly towards the
/// band limit, suppressing the low-degree blur of the back-projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RampConeFilter {
    weights: Array2<f64>,
}

impl RampConeFilter {
    pub fn new(lmax: usize) -> Self {
        let ramp = ramp(lmax);
        let weights = Array2::from_shape_fn((lmax + 1, lmax + 1), |(l, m)| {
            (ramp[l].powi(2) * ramp[m].powi(2)).sqrt()
        });
        Self { weights }
    }

    pub fn lmax(&self) -> usize {
        self.weights.nrows() - 1
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Weight both components of `coeffs`.
    pub fn apply(&self, coeffs: &SphericalHarmonicCoeffs) -> TomographyResult<SphericalHarmonicCoeffs> {
        Ok(coeffs.weighted(&self.weights)?)
    }

    /// Whether `W == W^T`.
    pub fn is_symmetric(&self) -> bool {
        self.weights == self.weights.t()
    }
}

/// `lmax + 1` evenly spaced values from 0 to 1 inclusive.
fn ramp(lmax: usize) -> Array1<f64> {
    if lmax == 0 {
        return Array1::zeros(1);
    }
    Array1::linspace(0.0, 1.0, lmax + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::create_coefficient_array;

    #[test]
    fn test_weights_shape_and_corners() {
        let f = RampConeFilter::new(4);
        assert_eq!(f.weights().dim(), (5, 5));
        assert_eq!(f.weights()[[0, 0]], 0.0);
        assert_eq!(f.weights()[[4, 0]], 0.0);
        assert!((f.weights()[[4, 4]] - 1.0).abs() < 1e-15);
        assert!((f.weights()[[2, 1]] - 0.5 * 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_symmetric() {
        for lmax in [0, 1, 7, 30] {
            assert!(RampConeFilter::new(lmax).is_symmetric());
        }
    }

    #[test]
    fn test_lmax_zero() {
        let f = RampConeFilter::new(0);
        assert_eq!(f.lmax(), 0);
        assert_eq!(f.weights()[[0, 0]], 0.0);
    }

    #[test]
    fn test_apply_kills_zonal_terms() {
        let c = SphericalHarmonicCoeffs::from_array(create_coefficient_array(6, 3)).unwrap();
        let out = RampConeFilter::new(6).apply(&c).unwrap();
        for l in 0..=6 {
            assert_eq!(out.get(0, l, 0), 0.0);
        }
        let expected = c.get(1, 6, 3) * 0.5;
        assert!((out.get(1, 6, 3) - expected).abs() < 1e-18);
    }

    #[test]
    fn test_apply_rejects_mismatched_lmax() {
        let c = SphericalHarmonicCoeffs::zeros(5);
        assert!(RampConeFilter::new(4).apply(&c).is_err());
    }
}

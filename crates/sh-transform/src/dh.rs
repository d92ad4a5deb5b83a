//! Driscoll-Healy grids and the transforms between grids and coefficients.
//!
//! Longitudes are handled with one real FFT per colatitude row, colatitudes
//! with the Driscoll-Healy quadrature weights. Rows are independent and are
//! processed in parallel with rayon.

use ndarray::{Array2, Array3, Axis};
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::FftPlanner;
use std::f64::consts::PI;
use tracing::{debug, instrument};

use crate::coeffs::SphericalHarmonicCoeffs;
use crate::error::{TransformError, TransformResult};
use crate::legendre::{plm_index, plm_len, LegendreRecursion};
use geo_common::{DhGridSpec, Sampling};

/// A real field sampled on a Driscoll-Healy grid, rows ordered north to south.
#[derive(Debug, Clone, PartialEq)]
pub struct DhGrid {
    spec: DhGridSpec,
    data: Array2<f64>,
}

impl DhGrid {
    /// Wrap a `(colatitude, longitude)` array, inferring lmax and sampling from its shape.
    pub fn new(data: Array2<f64>) -> TransformResult<Self> {
        let (nlat, nlon) = data.dim();
        let spec = DhGridSpec::from_shape(nlat, nlon)?;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::InvalidGrid(
                "grid contains non-finite values".to_string(),
            ));
        }
        Ok(Self { spec, data })
    }

    /// Grid filled by evaluating `f(colatitude, longitude)` at each node (radians).
    pub fn from_fn(spec: DhGridSpec, f: impl Fn(f64, f64) -> f64) -> Self {
        let data = Array2::from_shape_fn(spec.shape(), |(i, j)| {
            f(spec.colatitude(i), spec.longitude(j))
        });
        Self { spec, data }
    }

    /// Grid geometry.
    pub fn spec(&self) -> DhGridSpec {
        self.spec
    }

    /// Band limit of the grid.
    pub fn lmax(&self) -> usize {
        self.spec.lmax
    }

    /// Borrow the samples.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Take the samples.
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    /// Apply `f` to every sample.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            spec: self.spec,
            data: self.data.mapv(f),
        }
    }

    /// Apply `f(value, colatitude)` to every sample.
    pub fn map_with_colatitude(&self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut data = self.data.clone();
        for (i, mut row) in data.axis_iter_mut(Axis(0)).enumerate() {
            let theta = self.spec.colatitude(i);
            row.mapv_inplace(|v| f(v, theta));
        }
        Self {
            spec: self.spec,
            data,
        }
    }

    /// Smallest and largest sample.
    pub fn min_max(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Area-weighted mean over the sphere, using the quadrature weights.
    pub fn area_mean(&self) -> f64 {
        let weights = dh_weights(self.spec.nlat());
        let nlon = self.spec.nlon() as f64;
        let total: f64 = self
            .data
            .axis_iter(Axis(0))
            .zip(weights.iter())
            .map(|(row, w)| w * row.sum() / nlon)
            .sum();
        // weights sum to 2
        total / 2.0
    }

    /// Expand into spherical harmonics up to the grid's band limit.
    pub fn expand(&self) -> SphericalHarmonicCoeffs {
        expand_dh(self)
    }
}

/// Driscoll-Healy quadrature weights for `n` colatitudes `theta_i = pi i / n`.
///
/// `w_i = (4 / n) sin(theta_i) sum_{k < n/2} sin((2k + 1) theta_i) / (2k + 1)`.
/// The weights sum to 2, the integral of `sin(theta)` over `[0, pi]`.
pub fn dh_weights(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let theta = PI * i as f64 / n as f64;
            let series: f64 = (0..n / 2)
                .map(|k| {
                    let odd = (2 * k + 1) as f64;
                    (odd * theta).sin() / odd
                })
                .sum();
            4.0 / n as f64 * theta.sin() * series
        })
        .collect()
}

/// Forward transform: grid to 4pi-normalized coefficients.
///
/// `C_lm = 1/(4 pi) sum_i w_i P_lm(cos theta_i) (2 pi / nlon) sum_j f_ij cos(m phi_j)`,
/// likewise for `S_lm` with `sin(m phi_j)`.
#[instrument(level = "debug", skip(grid), fields(lmax = grid.lmax(), nlon = grid.spec().nlon()))]
pub fn expand_dh(grid: &DhGrid) -> SphericalHarmonicCoeffs {
    let spec = grid.spec();
    let lmax = spec.lmax;
    let nlon = spec.nlon();
    let weights = dh_weights(spec.nlat());
    let recursion = LegendreRecursion::new(lmax);
    let fft = FftPlanner::<f64>::new().plan_fft_forward(nlon);
    let lon_factor = 2.0 * PI / nlon as f64 / (4.0 * PI);

    let coeffs = grid
        .data()
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .fold(
            || (Array3::<f64>::zeros((2, lmax + 1, lmax + 1)), vec![0.0; plm_len(lmax)]),
            |(mut acc, mut plm), (i, row)| {
                let w = weights[i];
                if w == 0.0 {
                    return (acc, plm);
                }
                let mut buf: Vec<Complex64> = row.iter().map(|&v| Complex64::new(v, 0.0)).collect();
                fft.process(&mut buf);
                recursion.evaluate(spec.colatitude(i).cos(), &mut plm);

                for m in 0..=lmax {
                    let cos_sum = buf[m].re * w * lon_factor;
                    let sin_sum = -buf[m].im * w * lon_factor;
                    for l in m..=lmax {
                        let p = plm[plm_index(l, m)];
                        acc[[0, l, m]] += p * cos_sum;
                        if m > 0 {
                            acc[[1, l, m]] += p * sin_sum;
                        }
                    }
                }
                (acc, plm)
            },
        )
        .map(|(acc, _)| acc)
        .reduce(|| Array3::<f64>::zeros((2, lmax + 1, lmax + 1)), |a, b| a + b);

    debug!(lmax, "Expanded DH grid");
    SphericalHarmonicCoeffs::from_raw(coeffs)
}

/// Inverse transform: coefficients to a Driscoll-Healy grid.
///
/// Coefficients in other conventions are converted to 4pi without phase first.
#[instrument(level = "debug", skip(coeffs), fields(lmax = coeffs.lmax()))]
pub fn make_grid_dh(coeffs: &SphericalHarmonicCoeffs, sampling: Sampling) -> DhGrid {
    let coeffs = coeffs.to_geodesy_convention();
    let lmax = coeffs.lmax();
    let spec = DhGridSpec::new(lmax, sampling);
    let nlon = spec.nlon();
    let recursion = LegendreRecursion::new(lmax);
    let ifft = FftPlanner::<f64>::new().plan_fft_inverse(nlon);
    let c = coeffs.as_array();

    let mut data = Array2::<f64>::zeros(spec.shape());
    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            let mut plm = vec![0.0; plm_len(lmax)];
            recursion.evaluate(spec.colatitude(i).cos(), &mut plm);

            let mut buf = vec![Complex64::new(0.0, 0.0); nlon];
            for m in 0..=lmax {
                let mut a = 0.0;
                let mut b = 0.0;
                for l in m..=lmax {
                    let p = plm[plm_index(l, m)];
                    a += c[[0, l, m]] * p;
                    b += c[[1, l, m]] * p;
                }
                buf[m] = Complex64::new(a, -b);
            }
            ifft.process(&mut buf);
            for (dst, src) in row.iter_mut().zip(buf.iter()) {
                *dst = src.re;
            }
        });

    DhGrid { spec, data }
}

impl SphericalHarmonicCoeffs {
    /// Synthesize on a Driscoll-Healy grid.
    pub fn synthesize(&self, sampling: Sampling) -> DhGrid {
        make_grid_dh(self, sampling)
    }
}

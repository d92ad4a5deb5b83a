//! Test data generators for synthetic gravity-field data.
//!
//! These generators create predictable, verifiable coefficient sets, model
//! files and grids that can be used across the test suite. Coefficient
//! arrays use the `[2, lmax + 1, lmax + 1]` layout (cos/sin, degree, order).

use ndarray::{Array2, Array3};

/// Creates a coefficient array with deterministic pseudo-random values.
///
/// Magnitudes follow a Kaula-like decay `1e-5 / l^2`, so degree 2 is the
/// largest term after the monopole. `C00 = 1`, degree 1 is zero (geocentric
/// frame) and entries that must vanish (`m > l`, `S_l0`) are zero.
///
/// # Example
///
/// ```
/// use test_utils::create_coefficient_array;
///
/// let c = create_coefficient_array(4, 7);
/// assert_eq!(c.shape(), &[2, 5, 5]);
/// assert_eq!(c[[0, 0, 0]], 1.0);
/// assert_eq!(c[[1, 3, 0]], 0.0);
/// ```
pub fn create_coefficient_array(lmax: usize, seed: u32) -> Array3<f64> {
    let mut coeffs = Array3::<f64>::zeros((2, lmax + 1, lmax + 1));
    coeffs[[0, 0, 0]] = 1.0;
    for l in 2..=lmax {
        for m in 0..=l {
            coeffs[[0, l, m]] = synthetic_coefficient(l, m, 0, seed);
            if m > 0 {
                coeffs[[1, l, m]] = synthetic_coefficient(l, m, 1, seed);
            }
        }
    }
    coeffs
}

/// Creates a coefficient array with a single non-zero entry.
///
/// # Arguments
///
/// * `lmax` - Band limit of the array
/// * `index` - `(component, degree, order)` of the non-zero entry
/// * `value` - Its value
pub fn create_single_harmonic(lmax: usize, index: (usize, usize, usize), value: f64) -> Array3<f64> {
    let mut coeffs = Array3::<f64>::zeros((2, lmax + 1, lmax + 1));
    coeffs[[index.0, index.1, index.2]] = value;
    coeffs
}

/// Creates the coefficients of a homogeneous sphere (`C00 = 1`, all else zero).
pub fn create_uniform_sphere(lmax: usize) -> Array3<f64> {
    create_single_harmonic(lmax, (0, 0, 0), 1.0)
}

/// Renders the coefficients of [`create_coefficient_array`] as `.shm` text.
///
/// Lines start at degree 2 like the EGM2008 distribution, values use
/// Fortran `D` exponents. With `with_sigmas` each line carries two formal
/// errors equal to 1% of the coefficient magnitude.
pub fn create_shm_text(lmax: usize, seed: u32, with_sigmas: bool) -> String {
    let coeffs = create_coefficient_array(lmax, seed);
    let mut out = String::new();
    for l in 2..=lmax {
        for m in 0..=l {
            let c = coeffs[[0, l, m]];
            let s = coeffs[[1, l, m]];
            out.push_str(&format!(
                "{:5}{:5}  {}  {}",
                l,
                m,
                fortran_exponent(c),
                fortran_exponent(s)
            ));
            if with_sigmas {
                out.push_str(&format!(
                    "  {}  {}",
                    fortran_exponent(c.abs() * 0.01),
                    fortran_exponent(s.abs() * 0.01)
                ));
            }
            out.push('\n');
        }
    }
    out
}

/// Renders the coefficients of [`create_coefficient_array`] as an ICGEM `.gfc` file.
pub fn create_gfc_text(lmax: usize, seed: u32, radius: f64, gm: f64) -> String {
    let coeffs = create_coefficient_array(lmax, seed);
    let mut out = String::new();
    out.push_str("generating_institute  synthetic\n");
    out.push_str("product_type          gravity_field\n");
    out.push_str("modelname             SYNTH\n");
    out.push_str(&format!("earth_gravity_constant  {:e}\n", gm));
    out.push_str(&format!("radius                {}\n", radius));
    out.push_str(&format!("max_degree            {}\n", lmax));
    out.push_str("errors                formal\n");
    out.push_str("norm                  fully_normalized\n");
    out.push_str("tide_system           tide_free\n\n");
    out.push_str("key     L    M         C                  S                sigma C            sigma S\n");
    out.push_str("end_of_head ==============================================================\n");
    for l in 0..=lmax {
        for m in 0..=l {
            out.push_str(&format!(
                "gfc {:5}{:5}  {:.12e}  {:.12e}  {:.4e}  {:.4e}\n",
                l,
                m,
                coeffs[[0, l, m]],
                coeffs[[1, l, m]],
                0.0,
                0.0
            ));
        }
    }
    out
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(nlat: usize, nlon: usize, value: f64) -> Array2<f64> {
    Array2::from_elem((nlat, nlon), value)
}

/// Creates unit position vectors on an equiangular (theta, phi) sampling.
///
/// Colatitudes are cell centers `theta_i = pi (i + 0.5) / ntheta`,
/// longitudes `phi_j = 2 pi j / nphi`. Returned in row-major order.
pub fn create_sphere_samples(ntheta: usize, nphi: usize) -> Vec<[f64; 3]> {
    let mut points = Vec::with_capacity(ntheta * nphi);
    for i in 0..ntheta {
        let theta = std::f64::consts::PI * (i as f64 + 0.5) / ntheta as f64;
        for j in 0..nphi {
            let phi = 2.0 * std::f64::consts::PI * j as f64 / nphi as f64;
            points.push([theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]);
        }
    }
    points
}

/// Creates `n + 1` evenly spaced bin edges spanning `[lo, hi]`.
pub fn create_bin_edges(n: usize, lo: f64, hi: f64) -> Vec<f64> {
    (0..=n)
        .map(|k| lo + (hi - lo) * k as f64 / n as f64)
        .collect()
}

/// Deterministic coefficient value for (l, m, component).
fn synthetic_coefficient(l: usize, m: usize, component: u32, seed: u32) -> f64 {
    let hash = simple_hash(l as u32, (m as u32) << 1 | component, seed);
    let unit = (hash % 2_000_001) as f64 / 1_000_000.0 - 1.0;
    unit * 1e-5 / (l * l) as f64
}

fn fortran_exponent(value: f64) -> String {
    format!("{:.15E}", value).replace('E', "D")
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient_array_layout() {
        let c = create_coefficient_array(6, 42);
        assert_eq!(c.shape(), &[2, 7, 7]);
        assert_eq!(c[[0, 0, 0]], 1.0);
        assert_eq!(c[[0, 1, 0]], 0.0);
        for l in 0..=6 {
            assert_eq!(c[[1, l, 0]], 0.0);
            for m in (l + 1)..=6 {
                assert_eq!(c[[0, l, m]], 0.0);
                assert_eq!(c[[1, l, m]], 0.0);
            }
        }
        assert!(c[[0, 2, 0]].abs() <= 1e-5 / 4.0);
    }

    #[test]
    fn test_coefficient_array_deterministic() {
        assert_eq!(create_coefficient_array(5, 1), create_coefficient_array(5, 1));
        assert_ne!(create_coefficient_array(5, 1), create_coefficient_array(5, 2));
    }

    #[test]
    fn test_shm_text_line_count() {
        let text = create_shm_text(4, 3, true);
        // degrees 2..=4: 3 + 4 + 5 lines
        assert_eq!(text.lines().count(), 12);
        assert!(text.contains('D'));
        assert_eq!(text.lines().next().unwrap().split_whitespace().count(), 6);
    }

    #[test]
    fn test_gfc_text_has_header() {
        let text = create_gfc_text(3, 3, 6378136.3, 3.986004415e14);
        assert!(text.contains("end_of_head"));
        assert_eq!(text.lines().filter(|l| l.starts_with("gfc")).count(), 10);
    }

    #[test]
    fn test_sphere_samples_are_unit() {
        for p in create_sphere_samples(8, 16) {
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bin_edges() {
        let edges = create_bin_edges(4, -1.0, 1.0);
        assert_eq!(edges, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }
}

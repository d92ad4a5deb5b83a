//! 4pi-normalized associated Legendre functions.
//!
//! Values are normalized so that `int_{-1}^{1} P_lm^2 dx = 2 (2 - delta_m0)`
//! and exclude the Condon-Shortley phase. Sectoral terms are accumulated
//! with a 1e-280 scale factor so that high orders near the poles do not
//! underflow before the tesseral recursion has run.

/// Scale applied to sectoral seeds.
const SCALEF: f64 = 1e-280;

/// Position of (l, m) in the packed triangular layout.
#[inline]
pub fn plm_index(l: usize, m: usize) -> usize {
    l * (l + 1) / 2 + m
}

/// Number of packed entries up to degree `lmax`.
#[inline]
pub fn plm_len(lmax: usize) -> usize {
    (lmax + 1) * (lmax + 2) / 2
}

/// Precomputed recursion coefficients for one band limit.
///
/// Shared read-only between threads; each evaluation writes into a
/// caller-provided buffer.
#[derive(Debug, Clone)]
pub struct LegendreRecursion {
    lmax: usize,
    a: Vec<f64>,
    b: Vec<f64>,
    sectoral: Vec<f64>,
}

impl LegendreRecursion {
    /// Build recursion coefficients up to degree `lmax`.
    pub fn new(lmax: usize) -> Self {
        let len = plm_len(lmax);
        let mut a = vec![0.0; len];
        let mut b = vec![0.0; len];
        for m in 0..=lmax {
            for l in (m + 2)..=lmax {
                let (lf, mf) = (l as f64, m as f64);
                let idx = plm_index(l, m);
                a[idx] = ((2.0 * lf - 1.0) * (2.0 * lf + 1.0) / ((lf - mf) * (lf + mf))).sqrt();
                b[idx] = ((2.0 * lf + 1.0) * (lf + mf - 1.0) * (lf - mf - 1.0)
                    / ((lf - mf) * (lf + mf) * (2.0 * lf - 3.0)))
                    .sqrt();
            }
        }
        let sectoral = (0..=lmax)
            .map(|m| match m {
                0 => 1.0,
                1 => 3f64.sqrt(),
                _ => ((2 * m + 1) as f64 / (2 * m) as f64).sqrt(),
            })
            .collect();
        Self { lmax, a, b, sectoral }
    }

    /// Band limit.
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Evaluate all `P_lm(x)` for `0 <= m <= l <= lmax` into `out`.
    ///
    /// `x` is the cosine of colatitude. `out` must hold `plm_len(lmax)` values.
    pub fn evaluate(&self, x: f64, out: &mut [f64]) {
        debug_assert_eq!(out.len(), plm_len(self.lmax));
        let lmax = self.lmax;
        let u = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();

        out[0] = 1.0;
        if lmax == 0 {
            return;
        }

        // Zonal column, unscaled.
        out[plm_index(1, 0)] = 3f64.sqrt() * x;
        for l in 2..=lmax {
            let idx = plm_index(l, 0);
            out[idx] = self.a[idx] * x * out[plm_index(l - 1, 0)] - self.b[idx] * out[plm_index(l - 2, 0)];
        }

        let mut pmm = SCALEF;
        let mut rescalem = 1.0 / SCALEF;
        for m in 1..=lmax {
            rescalem *= u;
            pmm *= self.sectoral[m];
            out[plm_index(m, m)] = pmm * rescalem;
            if m == lmax {
                break;
            }

            let mut p2 = pmm;
            let mut p1 = ((2 * m + 3) as f64).sqrt() * x * pmm;
            out[plm_index(m + 1, m)] = p1 * rescalem;
            for l in (m + 2)..=lmax {
                let idx = plm_index(l, m);
                let p = self.a[idx] * x * p1 - self.b[idx] * p2;
                out[idx] = p * rescalem;
                p2 = p1;
                p1 = p;
            }
        }
    }

    /// Convenience wrapper allocating the output buffer.
    pub fn evaluate_vec(&self, x: f64) -> Vec<f64> {
        let mut out = vec![0.0; plm_len(self.lmax)];
        self.evaluate(x, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_degree_closed_forms() {
        let rec = LegendreRecursion::new(3);
        let theta: f64 = 0.7;
        let (x, u) = (theta.cos(), theta.sin());
        let p = rec.evaluate_vec(x);

        assert!((p[plm_index(0, 0)] - 1.0).abs() < 1e-14);
        assert!((p[plm_index(1, 0)] - 3f64.sqrt() * x).abs() < 1e-14);
        assert!((p[plm_index(1, 1)] - 3f64.sqrt() * u).abs() < 1e-14);
        assert!((p[plm_index(2, 0)] - 5f64.sqrt() * 0.5 * (3.0 * x * x - 1.0)).abs() < 1e-14);
        assert!((p[plm_index(2, 1)] - 15f64.sqrt() * x * u).abs() < 1e-14);
        assert!((p[plm_index(2, 2)] - 15f64.sqrt() / 2.0 * u * u).abs() < 1e-14);
        assert!(
            (p[plm_index(3, 0)] - 7f64.sqrt() * 0.5 * (5.0 * x * x * x - 3.0 * x)).abs() < 1e-14
        );
    }

    #[test]
    fn test_poles() {
        let rec = LegendreRecursion::new(10);
        let north = rec.evaluate_vec(1.0);
        for l in 0..=10 {
            assert!((north[plm_index(l, 0)] - ((2 * l + 1) as f64).sqrt()).abs() < 1e-12);
            for m in 1..=l {
                assert_eq!(north[plm_index(l, m)], 0.0);
            }
        }
    }

    #[test]
    fn test_normalization_by_quadrature() {
        // Midpoint rule in theta: int_0^pi P_lm^2 sin(theta) dtheta = 2 (2 - delta_m0)
        let lmax = 8;
        let rec = LegendreRecursion::new(lmax);
        let n = 4000;
        let mut acc = vec![0.0; plm_len(lmax)];
        for k in 0..n {
            let theta = std::f64::consts::PI * (k as f64 + 0.5) / n as f64;
            let p = rec.evaluate_vec(theta.cos());
            for (a, v) in acc.iter_mut().zip(p.iter()) {
                *a += v * v * theta.sin() * std::f64::consts::PI / n as f64;
            }
        }
        for l in 0..=lmax {
            for m in 0..=l {
                let expected = if m == 0 { 2.0 } else { 4.0 };
                let got = acc[plm_index(l, m)];
                assert!((got - expected).abs() < 1e-4, "l={} m={} got {}", l, m, got);
            }
        }
    }

    #[test]
    fn test_high_degree_finite() {
        let rec = LegendreRecursion::new(1000);
        let p = rec.evaluate_vec(0.3f64.cos().min(0.999_999));
        assert!(p.iter().all(|v| v.is_finite()));
    }
}

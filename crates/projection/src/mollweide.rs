//! Mollweide equal-area projection on the unit sphere.
//!
//! `x = 2 sqrt(2) / pi * dlon * cos(t)`, `y = sqrt(2) sin(t)` with the
//! auxiliary angle `t` solving `2t + sin(2t) = pi sin(lat)`.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use crate::{wrap_longitude, Projection};

/// Newton iterations for the auxiliary angle
const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct Mollweide {
    /// Central meridian in degrees
    pub lon_0: f64,
}

impl Mollweide {
    pub fn new(lon_0: f64) -> Self {
        Self { lon_0 }
    }

    /// Auxiliary angle `t` for latitude `lat` (radians).
    fn auxiliary_angle(lat: f64) -> f64 {
        if (FRAC_PI_2 - lat.abs()).abs() < TOLERANCE {
            return lat;
        }
        let target = PI * lat.sin();
        let mut t2 = lat * 2.0;
        for _ in 0..MAX_ITERATIONS {
            let delta = (t2 + t2.sin() - target) / (1.0 + t2.cos());
            t2 -= delta;
            if delta.abs() < TOLERANCE {
                break;
            }
        }
        t2 / 2.0
    }
}

impl Projection for Mollweide {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let t = Self::auxiliary_angle(lat_deg.to_radians());
        let dlon = wrap_longitude(lon_deg, self.lon_0).to_radians();
        (2.0 * SQRT_2 / PI * dlon * t.cos(), SQRT_2 * t.sin())
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if y.abs() > SQRT_2 {
            return None;
        }
        let t = (y / SQRT_2).asin();
        let cos_t = t.cos();
        let dlon = if cos_t.abs() < TOLERANCE {
            if x.abs() > TOLERANCE {
                return None;
            }
            0.0
        } else {
            PI * x / (2.0 * SQRT_2 * cos_t)
        };
        if dlon.abs() > PI + TOLERANCE {
            return None;
        }
        let lat = ((2.0 * t + (2.0 * t).sin()) / PI).clamp(-1.0, 1.0).asin();
        Some((lat.to_degrees(), (dlon.to_degrees() + self.lon_0).rem_euclid(360.0)))
    }

    fn bounds(&self) -> (f64, f64, f64, f64) {
        (-2.0 * SQRT_2, -SQRT_2, 2.0 * SQRT_2, SQRT_2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_and_poles() {
        let p = Mollweide::new(0.0);
        let (x, y) = p.forward(0.0, 180.0 - 1e-9);
        assert!((x - 2.0 * SQRT_2).abs() < 1e-6);
        assert!(y.abs() < 1e-12);

        let (x, y) = p.forward(90.0, 40.0);
        assert!(x.abs() < 1e-12);
        assert!((y - SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_roundtrip() {
        let p = Mollweide::new(180.0);
        for &(lat, lon) in &[(0.0, 180.0), (45.0, 10.0), (-60.0, 300.0), (89.0, 90.0)] {
            let (x, y) = p.forward(lat, lon);
            let (lat2, lon2) = p.inverse(x, y).unwrap();
            assert!((lat - lat2).abs() < 1e-8, "{} vs {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-8, "{} vs {}", lon, lon2);
        }
    }

    #[test]
    fn test_outside_ellipse() {
        let p = Mollweide::new(0.0);
        assert!(p.inverse(2.0 * SQRT_2, 1.0).is_none());
        assert!(p.inverse(0.0, 1.5).is_none());
        assert_eq!(p.aspect_ratio(), 0.5);
    }
}

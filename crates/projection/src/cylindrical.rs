//! Equidistant cylindrical projection.
//!
//! Plane coordinates are degrees: `x` is the longitude east of the central
//! meridian in `[-180, 180)`, `y` the latitude.

use crate::{wrap_longitude, Projection};

#[derive(Debug, Clone)]
pub struct Equirectangular {
    /// Central meridian in degrees
    pub lon_0: f64,
}

impl Equirectangular {
    pub fn new(lon_0: f64) -> Self {
        Self { lon_0 }
    }
}

impl Projection for Equirectangular {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        (wrap_longitude(lon_deg, self.lon_0), lat_deg)
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
            return None;
        }
        Some((y, (x + self.lon_0).rem_euclid(360.0)))
    }

    fn bounds(&self) -> (f64, f64, f64, f64) {
        (-180.0, -90.0, 180.0, 90.0)
    }
}

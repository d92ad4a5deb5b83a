//! Driscoll-Healy grid geometry.
//!
//! A DH grid for a band limit `lmax` has `n = 2 * lmax + 2` colatitude rows
//! `theta_i = pi * i / n` (north pole first, south pole excluded) and either
//! `n` or `2 n` equally spaced longitudes starting at 0 degrees east.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{GeoError, GeoResult};

/// Longitude sampling of a DH grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    /// n x n grid (equal number of colatitudes and longitudes)
    Equal,
    /// n x 2n grid (equal spacing in latitude and longitude)
    #[default]
    Double,
}

impl Sampling {
    /// Parse from the numeric convention (1 or 2).
    pub fn from_factor(factor: u8) -> Option<Self> {
        match factor {
            1 => Some(Self::Equal),
            2 => Some(Self::Double),
            _ => None,
        }
    }

    /// Number of longitudes per colatitude.
    pub fn factor(&self) -> usize {
        match self {
            Self::Equal => 1,
            Self::Double => 2,
        }
    }
}

/// Specification of a Driscoll-Healy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhGridSpec {
    /// Spherical-harmonic band limit
    pub lmax: usize,
    /// Longitude sampling
    pub sampling: Sampling,
}

impl DhGridSpec {
    /// Create a new grid specification.
    pub fn new(lmax: usize, sampling: Sampling) -> Self {
        Self { lmax, sampling }
    }

    /// Recover the specification from grid dimensions (rows, cols).
    pub fn from_shape(nlat: usize, nlon: usize) -> GeoResult<Self> {
        if nlat < 2 || nlat % 2 != 0 {
            return Err(GeoError::invalid_parameter(
                "nlat",
                format!("DH grids need an even number of rows >= 2, got {}", nlat),
            ));
        }
        let sampling = if nlon == nlat {
            Sampling::Equal
        } else if nlon == 2 * nlat {
            Sampling::Double
        } else {
            return Err(GeoError::shape_mismatch(
                "DH grid longitudes",
                format!("{} or {}", nlat, 2 * nlat),
                nlon,
            ));
        };
        Ok(Self {
            lmax: nlat / 2 - 1,
            sampling,
        })
    }

    /// Number of colatitude rows.
    pub fn nlat(&self) -> usize {
        2 * self.lmax + 2
    }

    /// Number of longitude columns.
    pub fn nlon(&self) -> usize {
        self.nlat() * self.sampling.factor()
    }

    /// Grid shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.nlat(), self.nlon())
    }

    /// Colatitude of row `i` in radians.
    pub fn colatitude(&self, i: usize) -> f64 {
        PI * i as f64 / self.nlat() as f64
    }

    /// Longitude of column `j` in radians.
    pub fn longitude(&self, j: usize) -> f64 {
        2.0 * PI * j as f64 / self.nlon() as f64
    }

    /// All colatitudes in radians.
    pub fn colatitudes(&self) -> Vec<f64> {
        (0..self.nlat()).map(|i| self.colatitude(i)).collect()
    }

    /// All longitudes in radians.
    pub fn longitudes(&self) -> Vec<f64> {
        (0..self.nlon()).map(|j| self.longitude(j)).collect()
    }

    /// Latitudes of the rows in degrees (90 at row 0, decreasing).
    pub fn latitudes_deg(&self) -> Vec<f64> {
        (0..self.nlat())
            .map(|i| 90.0 - self.colatitude(i).to_degrees())
            .collect()
    }

    /// Angular spacing between rows in degrees.
    pub fn spacing_deg(&self) -> f64 {
        180.0 / self.nlat() as f64
    }

    /// Unit position vector of grid node (i, j).
    pub fn unit_vector(&self, i: usize, j: usize) -> [f64; 3] {
        let theta = self.colatitude(i);
        let phi = self.longitude(j);
        [
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        ]
    }
}

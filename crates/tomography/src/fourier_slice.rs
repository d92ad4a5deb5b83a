//! Fourier-slice accumulation of a spherical X-ray-transform field.
//!
//! For each direction `d` the sample positions are projected onto the plane
//! orthogonal to `d`, binned into a voxel volume carrying `F . d`, and
//! transformed with a centered 3D FFT. Frequency voxels without spatial
//! support are dropped, so each direction contributes one central slice.
//! Slices from many directions are averaged voxel by voxel.

use ndarray::{Array3, Zip};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{TomographyError, TomographyResult};
use crate::fft3::{fft3, fftshift, ifft3, ifftshift};
use sh_transform::DhGrid;

/// Allowed deviation of a direction vector from unit length.
const UNIT_TOLERANCE: f64 = 1e-6;

/// Voxel bin edges, shared by all three axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceGeometry {
    edges: Vec<f64>,
}

impl SliceGeometry {
    /// Validated geometry from `n + 1` strictly increasing finite edges.
    pub fn new(edges: Vec<f64>) -> TomographyResult<Self> {
        if edges.len() < 2 {
            return Err(TomographyError::InvalidBins(format!(
                "need at least two edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(TomographyError::InvalidBins("edges must be finite".to_string()));
        }
        if let Some(k) = edges.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TomographyError::InvalidBins(format!(
                "edges not strictly increasing at index {} ({} then {})",
                k,
                edges[k],
                edges[k + 1]
            )));
        }
        Ok(Self { edges })
    }

    /// `n` evenly spaced bins covering `[-half_width, half_width]`.
    pub fn uniform(n: usize, half_width: f64) -> TomographyResult<Self> {
        if n == 0 {
            return Err(TomographyError::InvalidBins("need at least one bin".to_string()));
        }
        let edges = (0..=n)
            .map(|k| -half_width + 2.0 * half_width * k as f64 / n as f64)
            .collect();
        Self::new(edges)
    }

    /// Number of bins per axis.
    pub fn bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin `k` with `e_k <= x < e_{k+1}`, if any.
    pub fn bin(&self, x: f64) -> Option<usize> {
        let above = self.edges.partition_point(|e| *e <= x);
        if above == 0 || above > self.bins() {
            None
        } else {
            Some(above - 1)
        }
    }
}

/// Cartesian 3-vectors sampled at positions on the sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalField {
    positions: Vec<[f64; 3]>,
    values: Vec<[f64; 3]>,
}

impl SphericalField {
    pub fn new(positions: Vec<[f64; 3]>, values: Vec<[f64; 3]>) -> TomographyResult<Self> {
        if positions.len() != values.len() {
            return Err(TomographyError::shape_mismatch(
                "field values",
                positions.len(),
                values.len(),
            ));
        }
        if positions.is_empty() {
            return Err(TomographyError::InvalidField("field has no samples".to_string()));
        }
        let finite = |v: &[f64; 3]| v.iter().all(|c| c.is_finite());
        if let Some(i) = positions.iter().position(|p| !finite(p)) {
            return Err(TomographyError::InvalidField(format!("non-finite position at sample {}", i)));
        }
        if let Some(i) = values.iter().position(|v| !finite(v)) {
            return Err(TomographyError::InvalidField(format!("non-finite value at sample {}", i)));
        }
        Ok(Self { positions, values })
    }

    /// Radial field `v(theta, phi) * r_hat` at the unit-sphere nodes of a DH grid.
    pub fn radial_from_grid(grid: &DhGrid) -> TomographyResult<Self> {
        let spec = grid.spec();
        let mut positions = Vec::with_capacity(spec.nlat() * spec.nlon());
        let mut values = Vec::with_capacity(positions.capacity());
        for ((i, j), &v) in grid.data().indexed_iter() {
            let p = spec.unit_vector(i, j);
            positions.push(p);
            values.push([v * p[0], v * p[1], v * p[2]]);
        }
        Self::new(positions, values)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn values(&self) -> &[[f64; 3]] {
        &self.values
    }
}

/// Spectrum contributed by one direction.
#[derive(Debug, Clone)]
pub struct Slice {
    /// Centered spectrum, zero where `counts` is zero.
    pub spectrum: Array3<Complex64>,
    /// Samples binned into each spatial voxel.
    pub counts: Array3<u32>,
    /// Samples whose projection fell outside every bin.
    pub skipped: usize,
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn validate_direction(index: usize, d: &[f64; 3]) -> TomographyResult<()> {
    if d.iter().any(|c| !c.is_finite()) {
        return Err(TomographyError::invalid_direction(index, "non-finite component"));
    }
    let norm = dot(d, d).sqrt();
    if norm == 0.0 {
        return Err(TomographyError::invalid_direction(index, "zero vector"));
    }
    if (norm - 1.0).abs() > UNIT_TOLERANCE {
        return Err(TomographyError::invalid_direction(
            index,
            format!("expected unit length, got {}", norm),
        ));
    }
    Ok(())
}

/// Slice of `field` for a single unit `direction`.
pub fn process_slice(
    field: &SphericalField,
    geometry: &SliceGeometry,
    direction: [f64; 3],
) -> TomographyResult<Slice> {
    slice_at(0, field, geometry, &direction)
}

fn slice_at(
    index: usize,
    field: &SphericalField,
    geometry: &SliceGeometry,
    d: &[f64; 3],
) -> TomographyResult<Slice> {
    validate_direction(index, d)?;
    let n = geometry.bins();
    let mut sums = Array3::<f64>::zeros((n, n, n));
    let mut counts = Array3::<u32>::zeros((n, n, n));
    let mut skipped = 0usize;

    for (p, f) in field.positions.iter().zip(field.values.iter()) {
        let along = dot(p, d);
        let projected = [p[0] - along * d[0], p[1] - along * d[1], p[2] - along * d[2]];
        let voxel = match (
            geometry.bin(projected[0]),
            geometry.bin(projected[1]),
            geometry.bin(projected[2]),
        ) {
            (Some(x), Some(y), Some(z)) => [x, y, z],
            _ => {
                skipped += 1;
                continue;
            }
        };
        sums[voxel] += dot(f, d);
        counts[voxel] += 1;
    }
    if skipped > 0 {
        debug!(direction = index, skipped, "Samples outside the voxel grid");
    }

    let averaged = Zip::from(&sums).and(&counts).map_collect(|&s, &c| {
        if c > 0 {
            Complex64::new(s / c as f64, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    });
    let mut spectrum = ifftshift(&averaged);
    fft3(&mut spectrum);
    let mut spectrum = fftshift(&spectrum);
    Zip::from(&mut spectrum).and(&counts).for_each(|s, &c| {
        if c == 0 {
            *s = Complex64::new(0.0, 0.0);
        }
    });

    Ok(Slice {
        spectrum,
        counts,
        skipped,
    })
}

/// Running sum of slices with a per-voxel hit count.
#[derive(Debug, Clone)]
pub struct SliceAccumulator {
    sum: Array3<Complex64>,
    hits: Array3<u32>,
    directions: usize,
    skipped: usize,
}

/// Averaged spectrum and its spatial volume.
#[derive(Debug, Clone)]
pub struct AccumulatedVolume {
    /// Centered spectrum averaged over the slices that hit each voxel.
    pub spectrum: Array3<Complex64>,
    /// Real part of the inverse centered transform.
    pub volume: Array3<f64>,
    /// Number of slices contributing to each voxel.
    pub hits: Array3<u32>,
    pub directions: usize,
    pub skipped: usize,
}

impl SliceAccumulator {
    /// Empty accumulator for `n x n x n` voxels.
    pub fn new(n: usize) -> Self {
        Self {
            sum: Array3::from_elem((n, n, n), Complex64::new(0.0, 0.0)),
            hits: Array3::zeros((n, n, n)),
            directions: 0,
            skipped: 0,
        }
    }

    pub fn directions(&self) -> usize {
        self.directions
    }

    /// Add one slice.
    pub fn add(&mut self, slice: &Slice) -> TomographyResult<()> {
        if slice.spectrum.dim() != self.sum.dim() {
            return Err(TomographyError::shape_mismatch(
                "slice volume",
                self.sum.dim(),
                slice.spectrum.dim(),
            ));
        }
        self.sum += &slice.spectrum;
        Zip::from(&mut self.hits).and(&slice.counts).for_each(|h, &c| {
            if c > 0 {
                *h += 1;
            }
        });
        self.directions += 1;
        self.skipped += slice.skipped;
        Ok(())
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: Self) -> TomographyResult<()> {
        if other.sum.dim() != self.sum.dim() {
            return Err(TomographyError::shape_mismatch(
                "accumulator volume",
                self.sum.dim(),
                other.sum.dim(),
            ));
        }
        self.sum += &other.sum;
        self.hits += &other.hits;
        self.directions += other.directions;
        self.skipped += other.skipped;
        Ok(())
    }

    /// Process all `directions` in parallel and sum their slices.
    #[instrument(level = "debug", skip_all, fields(samples = field.len(), directions = directions.len()))]
    pub fn accumulate(
        field: &SphericalField,
        geometry: &SliceGeometry,
        directions: &[[f64; 3]],
    ) -> TomographyResult<Self> {
        let n = geometry.bins();
        let acc = directions
            .par_iter()
            .enumerate()
            .try_fold(
                || Self::new(n),
                |mut acc, (index, d)| {
                    let slice = slice_at(index, field, geometry, d)?;
                    acc.add(&slice)?;
                    Ok::<_, TomographyError>(acc)
                },
            )
            .try_reduce(
                || Self::new(n),
                |mut a, b| {
                    a.merge(b)?;
                    Ok(a)
                },
            )?;
        if acc.skipped > 0 {
            warn!(
                skipped = acc.skipped,
                "Projected samples fell outside the bin edges and were ignored"
            );
        }
        Ok(acc)
    }

    /// Average every voxel over its hits and invert the centered transform.
    pub fn finish(self) -> AccumulatedVolume {
        let spectrum = Zip::from(&self.sum).and(&self.hits).map_collect(|&s, &h| {
            if h > 0 {
                s / h as f64
            } else {
                Complex64::new(0.0, 0.0)
            }
        });
        let mut spatial = ifftshift(&spectrum);
        ifft3(&mut spatial);
        let volume = fftshift(&spatial).mapv(|v| v.re);
        info!(directions = self.directions, "Fourier-slice accumulation finished");
        AccumulatedVolume {
            spectrum,
            volume,
            hits: self.hits,
            directions: self.directions,
            skipped: self.skipped,
        }
    }
}

/// `count` nearly uniform unit vectors on a golden-angle spiral.
pub fn fibonacci_directions(count: usize) -> Vec<[f64; 3]> {
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..count)
        .map(|i| {
            let z = 1.0 - (2 * i + 1) as f64 / count as f64;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let phi = golden * i as f64;
            [r * phi.cos(), r * phi.sin(), z]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{create_bin_edges, create_sphere_samples};

    fn constant_field(value: [f64; 3]) -> SphericalField {
        let positions = create_sphere_samples(24, 48);
        let values = vec![value; positions.len()];
        SphericalField::new(positions, values).unwrap()
    }

    #[test]
    fn test_geometry_validation() {
        assert!(SliceGeometry::new(vec![0.0]).is_err());
        assert!(SliceGeometry::new(vec![0.0, 0.0]).is_err());
        assert!(SliceGeometry::new(vec![0.0, 1.0, 0.5]).is_err());
        assert!(SliceGeometry::new(vec![0.0, f64::NAN]).is_err());
        assert_eq!(SliceGeometry::new(vec![0.0, 1.0]).unwrap().bins(), 1);
    }

    #[test]
    fn test_binning_is_half_open() {
        let g = SliceGeometry::new(create_bin_edges(4, -1.0, 1.0)).unwrap();
        assert_eq!(g.bin(-1.0), Some(0));
        assert_eq!(g.bin(-0.5), Some(1));
        assert_eq!(g.bin(0.0), Some(2));
        assert_eq!(g.bin(0.99), Some(3));
        assert_eq!(g.bin(1.0), None);
        assert_eq!(g.bin(-1.5), None);
    }

    #[test]
    fn test_invalid_directions() {
        let field = constant_field([0.0, 0.0, 1.0]);
        let g = SliceGeometry::uniform(4, 1.0).unwrap();
        assert!(process_slice(&field, &g, [0.0, 0.0, 0.0]).is_err());
        assert!(process_slice(&field, &g, [0.0, 0.0, 2.0]).is_err());
        assert!(process_slice(&field, &g, [f64::NAN, 0.0, 1.0]).is_err());
        let bad = [[0.0, 0.0, 1.0], [1.0, 1.0, 0.0]];
        match SliceAccumulator::accumulate(&field, &g, &bad) {
            Err(TomographyError::InvalidDirection { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidDirection, got {:?}", other.map(|a| a.directions())),
        }
    }

    #[test]
    fn test_field_shape_mismatch() {
        assert!(SphericalField::new(vec![[0.0, 0.0, 1.0]], vec![]).is_err());
        assert!(SphericalField::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_axis_direction_support_is_orthogonal_plane() {
        let n = 8;
        let field = constant_field([0.0, 0.0, 1.0]);
        let g = SliceGeometry::new(create_bin_edges(n, -1.0, 1.0)).unwrap();
        let slice = process_slice(&field, &g, [0.0, 0.0, 1.0]).unwrap();

        for ((_, _, z), &c) in slice.counts.indexed_iter() {
            if z != n / 2 {
                assert_eq!(c, 0);
            }
        }
        let mut in_plane = 0.0;
        for ((_, _, z), s) in slice.spectrum.indexed_iter() {
            if z == n / 2 {
                in_plane += s.norm();
            } else {
                assert_eq!(*s, Complex64::new(0.0, 0.0));
            }
        }
        assert!(in_plane > 0.0);
        assert_eq!(slice.skipped, 0);
    }

    #[test]
    fn test_accumulate_matches_sequential() {
        let field = constant_field([0.3, -0.2, 0.9]);
        let g = SliceGeometry::uniform(6, 1.0).unwrap();
        let dirs = fibonacci_directions(5);
        let parallel = SliceAccumulator::accumulate(&field, &g, &dirs).unwrap();

        let mut sequential = SliceAccumulator::new(6);
        for d in &dirs {
            sequential.add(&process_slice(&field, &g, *d).unwrap()).unwrap();
        }
        assert_eq!(parallel.directions(), 5);
        assert_eq!(parallel.hits, sequential.hits);
        for (a, b) in parallel.sum.iter().zip(sequential.sum.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn test_finish_averages_hits() {
        let field = constant_field([0.0, 0.0, 1.0]);
        let g = SliceGeometry::uniform(4, 1.0).unwrap();
        let slice = process_slice(&field, &g, [0.0, 0.0, 1.0]).unwrap();
        let mut acc = SliceAccumulator::new(4);
        acc.add(&slice).unwrap();
        acc.add(&slice).unwrap();
        let out = acc.finish();
        assert_eq!(out.directions, 2);
        for ((s, h), single) in out.spectrum.iter().zip(out.hits.iter()).zip(slice.spectrum.iter()) {
            if *h > 0 {
                assert_eq!(*h, 2);
            }
            assert!((s - single).norm() < 1e-12);
        }
        assert!(out.volume.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fibonacci_directions_are_unit() {
        let dirs = fibonacci_directions(50);
        assert_eq!(dirs.len(), 50);
        for d in &dirs {
            assert!((dot(d, d).sqrt() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_radial_field_from_grid() {
        let spec = geo_common::DhGridSpec::new(3, geo_common::Sampling::Double);
        let grid = DhGrid::from_fn(spec, |_, _| 2.0);
        let field = SphericalField::radial_from_grid(&grid).unwrap();
        assert_eq!(field.len(), 8 * 16);
        for (p, v) in field.positions().iter().zip(field.values().iter()) {
            assert!((dot(p, v) - 2.0).abs() < 1e-12);
        }
    }
}

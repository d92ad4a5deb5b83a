//! Three-dimensional FFT and spectrum centering on ndarray volumes.

use ndarray::{Array3, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

/// Unnormalized forward 3D DFT.
pub fn fft3(volume: &mut Array3<Complex64>) {
    transform(volume, Direction::Forward);
}

/// Inverse 3D DFT, scaled by `1 / (n0 n1 n2)`.
pub fn ifft3(volume: &mut Array3<Complex64>) {
    transform(volume, Direction::Inverse);
    let scale = 1.0 / volume.len().max(1) as f64;
    volume.mapv_inplace(|v| v * scale);
}

fn transform(volume: &mut Array3<Complex64>, direction: Direction) {
    let mut planner = FftPlanner::<f64>::new();
    for axis in 0..3 {
        let n = volume.len_of(Axis(axis));
        if n <= 1 {
            continue;
        }
        let fft: Arc<dyn Fft<f64>> = match direction {
            Direction::Forward => planner.plan_fft_forward(n),
            Direction::Inverse => planner.plan_fft_inverse(n),
        };
        let mut buf = vec![Complex64::new(0.0, 0.0); n];
        for mut lane in volume.lanes_mut(Axis(axis)) {
            for (dst, src) in buf.iter_mut().zip(lane.iter()) {
                *dst = *src;
            }
            fft.process(&mut buf);
            for (dst, src) in lane.iter_mut().zip(buf.iter()) {
                *dst = *src;
            }
        }
    }
}

/// Move the zero-frequency voxel to the center of every axis.
pub fn fftshift<T: Clone>(volume: &Array3<T>) -> Array3<T> {
    let (a, b, c) = volume.dim();
    roll(volume, [a / 2, b / 2, c / 2])
}

/// Inverse of [`fftshift`].
pub fn ifftshift<T: Clone>(volume: &Array3<T>) -> Array3<T> {
    let (a, b, c) = volume.dim();
    roll(volume, [a - a / 2, b - b / 2, c - c / 2])
}

fn roll<T: Clone>(volume: &Array3<T>, shift: [usize; 3]) -> Array3<T> {
    let (a, b, c) = volume.dim();
    Array3::from_shape_fn((a, b, c), |(i, j, k)| {
        volume[[
            (i + a - shift[0] % a.max(1)) % a,
            (j + b - shift[1] % b.max(1)) % b,
            (k + c - shift[2] % c.max(1)) % c,
        ]]
        .clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_delta_transforms_to_constant() {
        let mut v = Array3::from_elem((4, 4, 4), c(0.0));
        v[[0, 0, 0]] = c(1.0);
        fft3(&mut v);
        assert!(v.iter().all(|x| (x - c(1.0)).norm() < 1e-14));
    }

    #[test]
    fn test_roundtrip() {
        let original = Array3::from_shape_fn((3, 4, 5), |(i, j, k)| {
            Complex64::new((i * 20 + j * 5 + k) as f64, (i as f64) - 0.5 * k as f64)
        });
        let mut v = original.clone();
        fft3(&mut v);
        ifft3(&mut v);
        for (a, b) in v.iter().zip(original.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_shift_moves_origin_to_center() {
        let mut v = Array3::from_elem((4, 5, 6), 0u8);
        v[[0, 0, 0]] = 1;
        let shifted = fftshift(&v);
        assert_eq!(shifted[[2, 2, 3]], 1);
        assert_eq!(ifftshift(&shifted), v);
    }

    #[test]
    fn test_odd_shift_inverse() {
        let v = Array3::from_shape_fn((3, 5, 7), |(i, j, k)| i * 100 + j * 10 + k);
        assert_eq!(fftshift(&ifftshift(&v)), v);
        assert_eq!(ifftshift(&fftshift(&v)), v);
    }
}

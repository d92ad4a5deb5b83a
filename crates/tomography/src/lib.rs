//! Spherical-shell back-projection and Fourier-slice reconstruction.
//!
//! - [`kernel`]: per-degree radial kernels between a shell and the reference sphere
//! - [`backproject`]: kernel multiplication, flattening removal and synthesis
//! - [`filter`]: ramp-cone weighting of the back-projected coefficients
//! - [`fourier_slice`]: 3D Fourier-slice accumulation of a spherical field
//! - [`pipeline`]: the stages chained from a gravity model
//!
//! # Example
//!
//! ```
//! use sh_transform::SphericalHarmonicCoeffs;
//! use tomography::{back_project, BackProjection, KernelKind, RadialKernel, ShellGeometry};
//!
//! let mut potential = SphericalHarmonicCoeffs::zeros(6);
//! potential.set(0, 3, 1, 1.0).unwrap();
//! let geometry = ShellGeometry::new(0.8, 1.0).unwrap();
//! let kernel = RadialKernel::build(KernelKind::Continuation, geometry, 6).unwrap();
//! let rec = back_project(&potential, &kernel, &BackProjection::default()).unwrap();
//! assert!((rec.coefficients.get(0, 3, 1) - 0.512).abs() < 1e-12);
//! ```

pub mod backproject;
pub mod config;
pub mod error;
pub mod fft3;
pub mod filter;
pub mod fourier_slice;
pub mod kernel;
pub mod pipeline;

pub use backproject::{back_project, forward_project, BackProjection, Reconstruction};
pub use config::{FourierSliceConfig, ShellConfig, ShellPlacement, TomographyConfig};
pub use error::{TomographyError, TomographyResult};
pub use filter::RampConeFilter;
pub use fourier_slice::{
    fibonacci_directions, process_slice, AccumulatedVolume, Slice, SliceAccumulator, SliceGeometry, SphericalField,
};
pub use kernel::{KernelKind, RadialKernel, ShellGeometry};
pub use pipeline::{continue_to_radius, fourier_slice_from_grid, run_pipeline, PipelineOutput};

//! Command-line runs of the gravitational tomography pipeline.
//!
//! Loads a gravity model, runs one of the stages and writes PNG maps,
//! raw grids with JSON sidecars and a `summary.json` into the output
//! directory.

pub mod commands;
pub mod config;
pub mod output;

pub use commands::{fourier_slice, load_model, reconstruct, render, synthesize};
pub use config::{OutputConfig, RunConfig};
pub use output::{read_grid, read_grid_2d, write_grid, GridSidecar, RunSummary};

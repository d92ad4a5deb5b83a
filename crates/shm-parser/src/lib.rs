//! Readers for spherical-harmonic gravity model files.
//!
//! Two layouts are supported:
//! - EGM2008-style `.shm` tables (`l m C S [sigmaC sigmaS]`, Fortran `D`
//!   exponents allowed, optional leading `r0 gm [lmax]` line)
//! - ICGEM `.gfc` files with a keyword header ended by `end_of_head`
//!
//! Records are returned sorted by (degree, order). Conversion into a dense
//! coefficient array happens in the `sh-transform` crate.

pub mod error;
pub mod model;
pub mod parse;
pub mod reader;

pub use error::{ShmError, ShmResult};
pub use model::{CoefficientRecord, ModelFormat, ModelHeader, ShmModel};
pub use reader::{read_model, read_model_file, ReadOptions};

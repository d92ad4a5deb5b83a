//! Gravity functionals of a spherical-harmonic model.
//!
//! - [`normal`]: normal field of the reference ellipsoid
//! - [`synth`]: geoid and gravity-disturbance grids from model coefficients
//! - [`estimate`]: disturbing potential from those grids (Bruns' formula or
//!   the inverse radial derivative)

pub mod error;
pub mod estimate;
pub mod normal;
pub mod synth;

pub use error::{GravityError, GravityResult};
pub use estimate::{
    bruns, estimate_disturbing_potential, potential_from_geoid, potential_from_gravity_disturbance,
    PotentialSource,
};
pub use normal::{normal_coefficients, zero_degree_term, NormalGravity};
pub use synth::{
    disturbing_coefficients, geoid_grid, gravity_disturbance_grid, model_constants, observed_coefficients,
    SynthesisOptions,
};

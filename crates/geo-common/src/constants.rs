//! Physical constants that are not tied to a particular reference ellipsoid.

/// Newtonian gravitational constant (m^3 kg^-1 s^-2, CODATA 2018).
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Mean Earth radius used as the default tomography reference radius (meters).
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

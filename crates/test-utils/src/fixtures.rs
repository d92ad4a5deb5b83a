//! Common test fixtures for gravtomo tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in gravity-model processing.

/// Excerpts of real coefficient files.
pub mod models {
    /// First lines of the EGM2008 tide-free distribution (degrees 2 and 3).
    pub const EGM2008_HEAD: &str = "\
    2    0   -0.484165143790815D-03    0.000000000000000D+00    0.7481239490D-11    0.0000000000D+00
    2    1   -0.206615509074176D-09    0.138441389137979D-08    0.7061397443D-11    0.7004263936D-11
    2    2    0.243938357328313D-05   -0.140027370385934D-05    0.7436209380D-11    0.7451286774D-11
    3    0    0.957161207093473D-06    0.000000000000000D+00    0.5731696060D-11    0.0000000000D+00
    3    1    0.203046201047864D-05    0.248200415856872D-06    0.5829079936D-11    0.5848521128D-11
    3    2    0.904787894809528D-06   -0.619005475177618D-06    0.6311109870D-11    0.6322058120D-11
    3    3    0.721321757121568D-06    0.141434926192941D-05    0.6176488720D-11    0.6172637140D-11
";

    /// EGM2008 reference radius (meters).
    pub const EGM2008_RADIUS: f64 = 6_378_136.3;

    /// EGM2008 gravitational parameter (m^3/s^2).
    pub const EGM2008_GM: f64 = 3.986_004_415e14;

    /// EGM2008 C20.
    pub const EGM2008_C20: f64 = -0.484_165_143_790_815e-3;

    /// A minimal ICGEM file.
    pub const ICGEM_SMALL: &str = "\
product_type          gravity_field
modelname             TEST
earth_gravity_constant  0.3986004415E+15
radius                0.63781363E+07
max_degree            2
norm                  fully_normalized
tide_system           tide_free
errors                formal

key   L    M    C                    S                    sigma C    sigma S
end_of_head ===================================================================
gfc   0    0    1.000000000000E+00   0.000000000000E+00   0.0E+00    0.0E+00
gfc   2    0   -4.841651437908E-04   0.000000000000E+00   7.5E-12    0.0E+00
gfc   2    1   -2.066155090742E-10   1.384413891380E-09   7.1E-12    7.0E-12
gfc   2    2    2.439383573283E-06  -1.400273703859E-06   7.4E-12    7.5E-12
";

    /// ICGEM file declaring a normalization other than fully normalized.
    pub const ICGEM_UNNORMALIZED: &str = "\
modelname  BAD
norm       unnormalized
end_of_head
gfc 2 0 -1.0826E-03 0.0
";
}

/// Reference physical constants used across tests.
pub mod constants {
    /// GRS80 semi-major axis (meters)
    pub const GRS80_A: f64 = 6_378_137.0;

    /// GRS80 GM (m^3/s^2)
    pub const GRS80_GM: f64 = 3.986_005e14;

    /// GRS80 normal gravity at the equator (m/s^2)
    pub const GRS80_GAMMA_A: f64 = 9.780_326_7715;

    /// GRS80 normal gravity at the poles (m/s^2)
    pub const GRS80_GAMMA_B: f64 = 9.832_186_3685;
}

/// Shell radii for back-projection tests, as (name, shell radius, reference radius).
pub mod shells {
    pub const SURFACE: (&str, f64, f64) = ("surface", 6_378_136.3, 6_378_136.3);
    pub const DEPTH_100KM: (&str, f64, f64) = ("100km", 6_278_136.3, 6_378_136.3);
    pub const CMB: (&str, f64, f64) = ("core-mantle boundary", 3_480_000.0, 6_378_136.3);
}

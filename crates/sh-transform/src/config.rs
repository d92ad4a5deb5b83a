//! Configuration for the spherical-harmonic transforms.

use geo_common::Sampling;
use serde::{Deserialize, Serialize};

use crate::coeffs::Normalization;
use crate::error::{TransformError, TransformResult};

/// Highest degree the scaled Legendre recursion is trusted for.
pub const MAX_SUPPORTED_DEGREE: usize = 2800;

/// Configuration for grid synthesis and expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Longitude sampling of synthesized grids.
    pub sampling: Sampling,

    /// Truncation degree applied when loading coefficients (None keeps the file's).
    pub lmax: Option<usize>,

    /// Normalization of coefficients written to disk.
    pub output_normalization: Normalization,

    /// Worker threads for the rayon pool (0 lets rayon decide).
    pub threads: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sampling: Sampling::Double,
            lmax: None,
            output_normalization: Normalization::FourPi,
            threads: 0,
        }
    }
}

impl TransformConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRAVTOMO_SAMPLING") {
            config.sampling = match val.to_lowercase().as_str() {
                "1" | "equal" => Sampling::Equal,
                _ => Sampling::Double,
            };
        }

        if let Ok(val) = std::env::var("GRAVTOMO_LMAX") {
            if let Ok(lmax) = val.parse() {
                config.lmax = Some(lmax);
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_OUTPUT_NORM") {
            if let Some(norm) = Normalization::from_str(&val) {
                config.output_normalization = norm;
            }
        }

        if let Ok(val) = std::env::var("GRAVTOMO_THREADS") {
            if let Ok(threads) = val.parse() {
                config.threads = threads;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(lmax) = self.lmax {
            if lmax == 0 {
                return Err("lmax must be > 0".to_string());
            }
            if lmax > MAX_SUPPORTED_DEGREE {
                return Err(format!("lmax must be <= {}", MAX_SUPPORTED_DEGREE));
            }
        }
        if self.threads > 1024 {
            return Err("threads must be <= 1024".to_string());
        }
        Ok(())
    }

    /// Install the global rayon pool sized by `threads`.
    ///
    /// Only the first call in a process has an effect.
    pub fn install_thread_pool(&self) -> TransformResult<()> {
        if self.threads == 0 {
            return Ok(());
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build_global()
            .map_err(|e| TransformError::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TransformConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling, Sampling::Double);
    }

    #[test]
    fn test_validate_lmax() {
        let mut config = TransformConfig::default();
        config.lmax = Some(0);
        assert!(config.validate().is_err());
        config.lmax = Some(MAX_SUPPORTED_DEGREE + 1);
        assert!(config.validate().is_err());
        config.lmax = Some(180);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial() {
        let config: TransformConfig = serde_yaml::from_str("sampling: equal\nlmax: 90\n").unwrap();
        assert_eq!(config.sampling, Sampling::Equal);
        assert_eq!(config.lmax, Some(90));
        assert_eq!(config.threads, 0);
    }
}

//! Run configuration for the gravtomo CLI.
//!
//! A run is described by one YAML file:
//!
//! ```yaml
//! tomography:
//!   source: geoid
//!   lmax: 180
//!   kernel: shell_distance
//!   regularization: 1.0e-4
//!   shell:
//!     placement: { depth: 100000.0 }
//! fourier_slice:
//!   bins: 32
//! map:
//!   projection: moll
//!   colormap: rdbu_r
//! output:
//!   dir: ${GRAVTOMO_OUTPUT_DIR:-out}
//! ```
//!
//! `${VAR}` and `${VAR:-default}` are substituted from the environment
//! before parsing. Without a file, the tomography section comes from the
//! `GRAVTOMO_*` environment variables.

use anyhow::{Context, Result};
use renderer::MapStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tomography::{FourierSliceConfig, TomographyConfig};

/// Where and what a run writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,

    /// Write raw little-endian f64 grids with JSON sidecars
    pub write_grids: bool,

    /// Write PNG maps
    pub write_maps: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
            write_grids: true,
            write_maps: true,
        }
    }
}

/// Everything a CLI run needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub tomography: TomographyConfig,
    pub fourier_slice: FourierSliceConfig,
    pub map: MapStyle,
    pub output: OutputConfig,
}

impl RunConfig {
    /// Configuration from the environment only.
    pub fn from_env() -> Self {
        let mut config = Self {
            tomography: TomographyConfig::from_env(),
            ..Default::default()
        };
        if let Ok(dir) = std::env::var("GRAVTOMO_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }
        config
    }

    /// Load a YAML file with environment variable substitution.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse YAML text with environment variable substitution.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = serde_yaml::from_str(&expanded).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tomography
            .validate()
            .map_err(|e| anyhow::anyhow!("tomography: {}", e))?;
        self.fourier_slice
            .validate()
            .map_err(|e| anyhow::anyhow!("fourier_slice: {}", e))?;
        self.map.validate().context("map")?;
        anyhow::ensure!(
            !self.output.dir.as_os_str().is_empty(),
            "output.dir cannot be empty"
        );
        Ok(())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in `content`.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => {
                        depth += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        depth -= 1;
                        if depth > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_field::PotentialSource;
    use projection::ProjectionKind;
    use tomography::{KernelKind, ShellPlacement};

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("GRAVTOMO_TEST_EXPAND", "12");
        assert_eq!(expand_env_vars("lmax: ${GRAVTOMO_TEST_EXPAND}").unwrap(), "lmax: 12");
        assert_eq!(
            expand_env_vars("dir: ${GRAVTOMO_TEST_UNSET_VAR:-out/run}").unwrap(),
            "dir: out/run"
        );
        assert!(expand_env_vars("x: ${GRAVTOMO_TEST_UNSET_VAR}").is_err());
        assert!(expand_env_vars("x: ${OPEN").is_err());
        assert_eq!(expand_env_vars("cost: $5").unwrap(), "cost: $5");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
tomography:
  source: gravity_disturbance
  lmax: 60
  kernel: shell_distance
  regularization: 1.0e-4
  shell:
    placement:
      depth: 100000.0
fourier_slice:
  bins: 16
map:
  projection: moll
  colormap: rdbu_r
output:
  dir: ${GRAVTOMO_TEST_OUT_DIR:-results}
  write_grids: false
"#;
        let config = RunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.tomography.source, PotentialSource::GravityDisturbance);
        assert_eq!(config.tomography.lmax, Some(60));
        assert_eq!(config.tomography.kernel, KernelKind::ShellDistance);
        assert_eq!(config.tomography.shell.placement, ShellPlacement::Depth(100_000.0));
        assert_eq!(config.fourier_slice.bins, 16);
        assert_eq!(config.fourier_slice.directions, 64);
        assert_eq!(config.map.projection, ProjectionKind::Mollweide);
        assert_eq!(config.output.dir, PathBuf::from("results"));
        assert!(!config.output.write_grids);
        assert!(config.output.write_maps);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(RunConfig::from_yaml("tomography:\n  regularization: -1.0\n").is_err());
        assert!(RunConfig::from_yaml("fourier_slice:\n  bins: 0\n").is_err());
        assert!(RunConfig::from_yaml("map:\n  width: 2\n").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(&path, "tomography:\n  lmax: 20\n").unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.tomography.lmax, Some(20));
        assert!(RunConfig::load(dir.path().join("missing.yaml")).is_err());
    }
}

//! Files written by a run: raw grids with JSON sidecars and the run summary.
//!
//! A grid `name` is stored as `name.f64` (row-major little-endian `f64`)
//! next to `name.json` describing its shape and meaning.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const GRID_EXTENSION: &str = "f64";
pub const DTYPE: &str = "float64";
pub const BYTE_ORDER: &str = "little";

/// Sidecar describing a raw grid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSidecar {
    pub name: String,
    /// Row-major shape
    pub shape: Vec<usize>,
    pub dtype: String,
    pub byte_order: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lmax: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

impl GridSidecar {
    pub fn new(name: impl Into<String>, shape: &[usize]) -> Self {
        Self {
            name: name.into(),
            shape: shape.to_vec(),
            dtype: DTYPE.to_string(),
            byte_order: BYTE_ORDER.to_string(),
            units: None,
            lmax: None,
            description: None,
            created: Utc::now(),
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_lmax(mut self, lmax: usize) -> Self {
        self.lmax = Some(lmax);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn len(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Write `values` (row-major, matching `sidecar.shape`) to `dir`.
///
/// Returns the path of the data file.
pub fn write_grid<'a>(
    dir: &Path,
    sidecar: &GridSidecar,
    values: impl IntoIterator<Item = &'a f64>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut bytes = Vec::with_capacity(sidecar.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    anyhow::ensure!(
        bytes.len() == sidecar.len() * 8,
        "grid '{}' has {} values, shape {:?} needs {}",
        sidecar.name,
        bytes.len() / 8,
        sidecar.shape,
        sidecar.len()
    );

    let data_path = dir.join(format!("{}.{}", sidecar.name, GRID_EXTENSION));
    fs::write(&data_path, &bytes).with_context(|| format!("Failed to write {}", data_path.display()))?;
    let sidecar_path = data_path.with_extension("json");
    fs::write(&sidecar_path, serde_json::to_vec_pretty(sidecar)?)
        .with_context(|| format!("Failed to write {}", sidecar_path.display()))?;
    debug!(path = %data_path.display(), shape = ?sidecar.shape, "Grid written");
    Ok(data_path)
}

/// Read a grid written by [`write_grid`], given either of its two files.
pub fn read_grid(path: &Path) -> Result<(GridSidecar, ArrayD<f64>)> {
    let data_path = path.with_extension(GRID_EXTENSION);
    let sidecar_path = path.with_extension("json");
    let sidecar: GridSidecar = serde_json::from_slice(
        &fs::read(&sidecar_path).with_context(|| format!("Failed to read {}", sidecar_path.display()))?,
    )
    .with_context(|| format!("Invalid sidecar {}", sidecar_path.display()))?;
    anyhow::ensure!(
        sidecar.dtype == DTYPE && sidecar.byte_order == BYTE_ORDER,
        "unsupported grid encoding {} ({})",
        sidecar.dtype,
        sidecar.byte_order
    );

    let bytes = fs::read(&data_path).with_context(|| format!("Failed to read {}", data_path.display()))?;
    anyhow::ensure!(
        bytes.len() == sidecar.len() * 8,
        "{} holds {} bytes, shape {:?} needs {}",
        data_path.display(),
        bytes.len(),
        sidecar.shape,
        sidecar.len() * 8
    );
    let values: Vec<f64> = bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect();
    let array = ArrayD::from_shape_vec(IxDyn(&sidecar.shape), values)?;
    Ok((sidecar, array))
}

/// Read a two-dimensional grid.
pub fn read_grid_2d(path: &Path) -> Result<(GridSidecar, Array2<f64>)> {
    let (sidecar, array) = read_grid(path)?;
    let array = array
        .into_dimensionality()
        .with_context(|| format!("grid '{}' with shape {:?} is not 2D", sidecar.name, sidecar.shape))?;
    Ok((sidecar, array))
}

/// One product of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// `summary.json` of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub command: String,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<PathBuf>,
    /// Scalar results keyed by name
    pub values: serde_json::Map<String, serde_json::Value>,
    pub products: Vec<Product>,
}

impl RunSummary {
    pub fn new(command: impl Into<String>, model: Option<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            command: command.into(),
            started: now,
            finished: now,
            model,
            values: serde_json::Map::new(),
            products: Vec::new(),
        }
    }

    pub fn value(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        self.values.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn product(&mut self, name: &str, path: PathBuf, range: Option<(f64, f64)>) {
        self.products.push(Product {
            name: name.to_string(),
            path,
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
        });
    }

    /// Stamp the finish time and write `summary.json` into `dir`.
    pub fn write(mut self, dir: &Path) -> Result<PathBuf> {
        self.finished = Utc::now();
        fs::create_dir_all(dir)?;
        let path = dir.join("summary.json");
        fs::write(&path, serde_json::to_vec_pretty(&self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

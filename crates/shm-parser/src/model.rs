//! Parsed gravity-model types.

use serde::{Deserialize, Serialize};

/// Input file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Plain `l m C S [sigmaC sigmaS]` table, optionally with a
    /// leading `r0 gm [lmax]` line (EGM2008 distribution format)
    Shm,
    /// ICGEM `.gfc` with a keyword header terminated by `end_of_head`
    Icgem,
}

impl ModelFormat {
    /// Guess the format from the file contents.
    pub fn detect(text: &str) -> Self {
        if text.lines().any(|l| l.trim_start().starts_with("end_of_head")) {
            Self::Icgem
        } else {
            Self::Shm
        }
    }
}

/// One coefficient line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRecord {
    pub degree: usize,
    pub order: usize,
    /// Cosine coefficient C_lm
    pub c: f64,
    /// Sine coefficient S_lm
    pub s: f64,
    /// Formal error of C_lm
    pub sigma_c: Option<f64>,
    /// Formal error of S_lm
    pub sigma_s: Option<f64>,
}

/// Metadata found in the file header (all optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelHeader {
    /// Model name (ICGEM `modelname`)
    pub name: Option<String>,
    /// Reference radius of the coefficients (meters)
    pub radius: Option<f64>,
    /// Gravitational parameter GM (m^3/s^2)
    pub gm: Option<f64>,
    /// Declared maximum degree
    pub max_degree: Option<usize>,
    /// Declared normalization (ICGEM `norm`)
    pub normalization: Option<String>,
    /// Declared tide system
    pub tide_system: Option<String>,
}

/// A parsed gravity model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShmModel {
    pub format: ModelFormat,
    pub header: ModelHeader,
    pub records: Vec<CoefficientRecord>,
    /// Largest degree present in `records`
    pub lmax: usize,
}

impl ShmModel {
    /// True when every record carries formal errors.
    pub fn has_errors(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| r.sigma_c.is_some() && r.sigma_s.is_some())
    }

    /// Look up a single coefficient record.
    pub fn get(&self, degree: usize, order: usize) -> Option<&CoefficientRecord> {
        self.records
            .iter()
            .find(|r| r.degree == degree && r.order == order)
    }

    /// Number of (degree, order) pairs expected for a complete model to `lmax`.
    pub fn expected_len(lmax: usize) -> usize {
        (lmax + 1) * (lmax + 2) / 2
    }

    /// True when every (degree, order) up to `lmax` is present.
    pub fn is_complete(&self) -> bool {
        self.records.len() == Self::expected_len(self.lmax)
    }
}

//! Style configuration for map rendering.

use projection::ProjectionKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::gradient::Colormap;

/// How a map is drawn.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapStyle {
    pub projection: ProjectionKind,

    /// Central meridian in degrees
    pub lon_0: f64,

    pub colormap: Colormap,

    /// Lower color limit; defaults to the data minimum
    pub vmin: Option<f64>,

    /// Upper color limit; defaults to the data maximum
    pub vmax: Option<f64>,

    pub title: Option<String>,

    /// Label of the colorbar
    pub units_label: Option<String>,

    /// Width of the map area in pixels
    pub width: usize,

    /// Spacing of parallels in degrees (0 disables them)
    pub parallels_step: f64,

    /// Spacing of meridians in degrees (0 disables them)
    pub meridians_step: f64,

    pub graticule_color: String,

    pub background: String,

    pub colorbar: bool,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Cylindrical,
            lon_0: 180.0,
            colormap: Colormap::Inferno,
            vmin: None,
            vmax: None,
            title: None,
            units_label: None,
            width: 720,
            parallels_step: 30.0,
            meridians_step: 60.0,
            graticule_color: "#000000".to_string(),
            background: "#ffffff".to_string(),
            colorbar: true,
        }
    }
}

impl MapStyle {
    /// Load a style from a JSON string.
    pub fn from_json(json_str: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load a style from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check the style before drawing.
    pub fn validate(&self) -> RenderResult<()> {
        if !self.lon_0.is_finite() {
            return Err(RenderError::InvalidStyle(format!("lon_0 must be finite, got {}", self.lon_0)));
        }
        if !(16..=8192).contains(&self.width) {
            return Err(RenderError::InvalidStyle(format!(
                "width must be between 16 and 8192, got {}",
                self.width
            )));
        }
        for (name, step) in [("parallels_step", self.parallels_step), ("meridians_step", self.meridians_step)] {
            if !(step.is_finite() && step >= 0.0) {
                return Err(RenderError::InvalidStyle(format!("{} must be >= 0, got {}", name, step)));
            }
        }
        if let (Some(lo), Some(hi)) = (self.vmin, self.vmax) {
            if !(lo < hi) {
                return Err(RenderError::InvalidRange { vmin: lo, vmax: hi });
            }
        }
        hex_to_rgb(&self.graticule_color).ok_or_else(|| RenderError::InvalidColor(self.graticule_color.clone()))?;
        hex_to_rgb(&self.background).ok_or_else(|| RenderError::InvalidColor(self.background.clone()))?;
        Ok(())
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#FF0000"), Some((255, 0, 0)));
        assert_eq!(hex_to_rgb("00ff00"), Some((0, 255, 0)));
        assert_eq!(hex_to_rgb("#GGGGGG"), None);
        assert_eq!(hex_to_rgb("#fff"), None);
    }

    #[test]
    fn test_defaults() {
        let style = MapStyle::default();
        assert_eq!(style.lon_0, 180.0);
        assert_eq!(style.colormap, Colormap::Inferno);
        assert_eq!(style.parallels_step, 30.0);
        assert_eq!(style.meridians_step, 60.0);
        assert!(style.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let style = MapStyle::from_json(
            r#"{"projection": "moll", "lon_0": 0, "colormap": "rdbu_r", "vmin": -50, "vmax": 50, "units_label": "m"}"#,
        )
        .unwrap();
        assert_eq!(style.projection, ProjectionKind::Mollweide);
        assert_eq!(style.lon_0, 0.0);
        assert_eq!(style.vmin, Some(-50.0));
        assert_eq!(style.units_label.as_deref(), Some("m"));
        assert!(style.colorbar);
    }

    #[test]
    fn test_validate() {
        let mut style = MapStyle {
            vmin: Some(1.0),
            vmax: Some(1.0),
            ..Default::default()
        };
        assert!(style.validate().is_err());
        style.vmax = None;
        style.background = "white".to_string();
        assert!(matches!(style.validate(), Err(RenderError::InvalidColor(_))));
    }
}

//! Colormaps and value-to-color mapping.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::style::hex_to_rgb;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#RRGGBB`.
    pub fn from_hex(hex: &str) -> RenderResult<Self> {
        hex_to_rgb(hex)
            .map(|(r, g, b)| Self::new(r, g, b, 255))
            .ok_or_else(|| RenderError::InvalidColor(hex.to_string()))
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation, `t` clamped to `[0, 1]`.
pub fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

// Anchors at t = 0, 0.1, ..., 1.
const INFERNO: [&str; 11] = [
    "#000004", "#160b39", "#420a68", "#6a176e", "#932667", "#bc3754", "#dd513a", "#f37819", "#fca50a", "#f6d746",
    "#fcffa4",
];
const VIRIDIS: [&str; 11] = [
    "#440154", "#482475", "#414487", "#355f8d", "#2a788e", "#21918c", "#22a884", "#44bf70", "#7ad151", "#bddf26",
    "#fde725",
];
const MAGMA: [&str; 11] = [
    "#000004", "#140e36", "#3b0f70", "#641a80", "#8c2981", "#b73779", "#de4968", "#f7705c", "#fe9f6d", "#fecf92",
    "#fcfdbf",
];
const PLASMA: [&str; 11] = [
    "#0d0887", "#41049d", "#6a00a8", "#8f0da4", "#b12a90", "#cc4778", "#e16462", "#f2844b", "#fca636", "#fcce25",
    "#f0f921",
];
const RDBU_R: [&str; 11] = [
    "#053061", "#2166ac", "#4393c3", "#92c5de", "#d1e5f0", "#f7f7f7", "#fddbc7", "#f4a582", "#d6604d", "#b2182b",
    "#67001f",
];
const GRAY: [&str; 2] = ["#000000", "#ffffff"];

/// Named colormaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    #[default]
    Inferno,
    Viridis,
    Magma,
    Plasma,
    /// Diverging blue-white-red
    RdbuR,
    Gray,
}

impl Colormap {
    /// Parse a colormap name (case-insensitive).
    pub fn from_name(name: &str) -> RenderResult<Self> {
        match name.to_lowercase().as_str() {
            "inferno" => Ok(Self::Inferno),
            "viridis" => Ok(Self::Viridis),
            "magma" => Ok(Self::Magma),
            "plasma" => Ok(Self::Plasma),
            "rdbu_r" | "rdbu" | "seismic" => Ok(Self::RdbuR),
            "gray" | "grey" | "greys_r" => Ok(Self::Gray),
            _ => Err(RenderError::UnknownColormap(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inferno => "inferno",
            Self::Viridis => "viridis",
            Self::Magma => "magma",
            Self::Plasma => "plasma",
            Self::RdbuR => "rdbu_r",
            Self::Gray => "gray",
        }
    }

    fn anchors(&self) -> &'static [&'static str] {
        match self {
            Self::Inferno => &INFERNO,
            Self::Viridis => &VIRIDIS,
            Self::Magma => &MAGMA,
            Self::Plasma => &PLASMA,
            Self::RdbuR => &RDBU_R,
            Self::Gray => &GRAY,
        }
    }

    /// Color at normalized position `t` in `[0, 1]`.
    pub fn color_at(&self, t: f64) -> Color {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (anchors.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(anchors.len() - 2);
        // anchors are compile-time constants
        let c1 = Color::from_hex(anchors[lo]).unwrap_or(Color::BLACK);
        let c2 = Color::from_hex(anchors[lo + 1]).unwrap_or(Color::BLACK);
        interpolate_color(c1, c2, scaled - lo as f64)
    }

    /// `n` evenly spaced colors from the low to the high end.
    pub fn lut(&self, n: usize) -> Vec<Color> {
        match n {
            0 => Vec::new(),
            1 => vec![self.color_at(0.0)],
            _ => (0..n).map(|i| self.color_at(i as f64 / (n - 1) as f64)).collect(),
        }
    }
}

/// Maps values in `[vmin, vmax]` onto a quantized colormap.
#[derive(Debug, Clone)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
    lut: Vec<Color>,
}

impl ColorScale {
    /// Levels in the look-up table
    pub const LEVELS: usize = 256;

    pub fn new(colormap: Colormap, vmin: f64, vmax: f64) -> RenderResult<Self> {
        if !(vmin.is_finite() && vmax.is_finite() && vmin < vmax) {
            return Err(RenderError::InvalidRange { vmin, vmax });
        }
        Ok(Self {
            vmin,
            vmax,
            lut: colormap.lut(Self::LEVELS),
        })
    }

    /// Color of `value`; values outside the range saturate, NaN is transparent.
    pub fn color(&self, value: f64) -> Color {
        if value.is_nan() {
            return Color::transparent();
        }
        let t = ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0);
        let idx = (t * (self.lut.len() - 1) as f64).round() as usize;
        self.lut[idx]
    }
}

/// Smallest and largest finite value, `None` when there is none.
pub fn finite_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

//! Global map drawing: projected raster, graticule and colorbar.
//!
//! Input grids are equiangular in latitude and longitude, rows from the
//! north pole southwards (`lat_i = 90 - 180 i / nlat`) and columns eastwards
//! from the prime meridian (`lon_j = 360 j / nlon`). A Driscoll-Healy grid
//! has exactly this layout.

use ndarray::Array2;
use projection::Projection;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, instrument};

use crate::error::{RenderError, RenderResult};
use crate::gradient::{finite_range, Color, ColorScale};
use crate::png::encode_png;
use crate::style::MapStyle;

/// Blank border around the figure in pixels
const PAD: usize = 8;
const COLORBAR_GAP: usize = 12;
const COLORBAR_WIDTH: usize = 18;
const TICK_LENGTH: usize = 5;
const COLORBAR_TICKS: usize = 5;
/// Sampling step along graticule lines in degrees
const LINE_STEP_DEG: f64 = 0.25;

/// A drawn map ready for encoding.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    /// RGBA bytes, row-major
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub vmin: f64,
    pub vmax: f64,
    /// Values at the colorbar tick marks, bottom to top
    pub ticks: Vec<f64>,
    metadata: Vec<(String, String)>,
}

impl RenderedMap {
    /// Color of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        let i = (y * self.width + x) * 4;
        Color::new(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3])
    }

    /// Metadata written as PNG `tEXt` chunks.
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        let text: Vec<(&str, &str)> = self.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        encode_png(&self.pixels, self.width, self.height, &text)
    }

    /// Encode and write to `path`.
    pub fn save_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        std::fs::write(path, self.to_png()?)?;
        Ok(())
    }
}

/// Draws grids with one style.
pub struct MapDrawer {
    style: MapStyle,
    projection: Box<dyn Projection + Send + Sync>,
    graticule: Color,
    background: Color,
}

impl MapDrawer {
    pub fn new(style: MapStyle) -> RenderResult<Self> {
        style.validate()?;
        let projection = style.projection.build(style.lon_0)?;
        let graticule = Color::from_hex(&style.graticule_color)?;
        let background = Color::from_hex(&style.background)?;
        Ok(Self {
            style,
            projection,
            graticule,
            background,
        })
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    /// Pixel size of the map area alone.
    pub fn map_size(&self) -> (usize, usize) {
        let width = self.style.width;
        let height = ((width as f64) * self.projection.aspect_ratio()).round().max(1.0) as usize;
        (width, height)
    }

    /// Color limits: the style's where set, the data range otherwise.
    pub fn color_range(&self, data: &Array2<f64>) -> RenderResult<(f64, f64)> {
        let data_range = finite_range(data.iter());
        let (lo, hi) = match (self.style.vmin, self.style.vmax, data_range) {
            (Some(lo), Some(hi), _) => (lo, hi),
            (lo, hi, Some((dlo, dhi))) => {
                let (lo, hi) = (lo.unwrap_or(dlo), hi.unwrap_or(dhi));
                if lo == hi && self.style.vmin.is_none() && self.style.vmax.is_none() {
                    (lo - 0.5, hi + 0.5)
                } else {
                    (lo, hi)
                }
            }
            _ => return Err(RenderError::InvalidGrid("grid has no finite values".to_string())),
        };
        if !(lo < hi) {
            return Err(RenderError::InvalidRange { vmin: lo, vmax: hi });
        }
        Ok((lo, hi))
    }

    /// Draw `data` into an RGBA image.
    #[instrument(level = "debug", skip_all, fields(projection = %self.style.projection, shape = ?data.dim()))]
    pub fn draw(&self, data: &Array2<f64>) -> RenderResult<RenderedMap> {
        let (nlat, nlon) = data.dim();
        if nlat < 2 || nlon < 2 {
            return Err(RenderError::InvalidGrid(format!("grid {}x{} is too small", nlat, nlon)));
        }
        let (vmin, vmax) = self.color_range(data)?;
        let scale = ColorScale::new(self.style.colormap, vmin, vmax)?;

        let (map_w, map_h) = self.map_size();
        let bar_space = if self.style.colorbar {
            COLORBAR_GAP + COLORBAR_WIDTH + TICK_LENGTH
        } else {
            0
        };
        let width = PAD + map_w + bar_space + PAD;
        let height = PAD + map_h + PAD;
        let mut canvas = Canvas::new(width, height, self.background);

        let inside = self.draw_raster(&mut canvas, data, &scale, map_w, map_h);
        self.draw_graticule(&mut canvas, map_w, map_h);
        draw_outline(&mut canvas, &inside, map_w, map_h, self.graticule);
        let ticks = if self.style.colorbar {
            draw_colorbar(&mut canvas, &scale, PAD + map_w + COLORBAR_GAP, map_h)
        } else {
            Vec::new()
        };
        debug!(width, height, vmin, vmax, "Map drawn");

        let metadata = self.metadata(vmin, vmax, &ticks);
        Ok(RenderedMap {
            pixels: canvas.pixels,
            width,
            height,
            vmin,
            vmax,
            ticks,
            metadata,
        })
    }

    /// Fill the map area, returning which map pixels lie on the globe.
    fn draw_raster(
        &self,
        canvas: &mut Canvas,
        data: &Array2<f64>,
        scale: &ColorScale,
        map_w: usize,
        map_h: usize,
    ) -> Vec<bool> {
        let (x0, y0, x1, y1) = self.projection.bounds();
        let projection = &self.projection;
        let rows: Vec<(Vec<u8>, Vec<bool>)> = (0..map_h)
            .into_par_iter()
            .map(|row| {
                let py = y1 - (row as f64 + 0.5) / map_h as f64 * (y1 - y0);
                let mut rgba = Vec::with_capacity(map_w * 4);
                let mut inside = Vec::with_capacity(map_w);
                for col in 0..map_w {
                    let px = x0 + (col as f64 + 0.5) / map_w as f64 * (x1 - x0);
                    match projection.inverse(px, py) {
                        Some((lat, lon)) => {
                            rgba.extend_from_slice(&scale.color(sample_bilinear(data, lat, lon)).to_array());
                            inside.push(true);
                        }
                        None => {
                            rgba.extend_from_slice(&[0, 0, 0, 0]);
                            inside.push(false);
                        }
                    }
                }
                (rgba, inside)
            })
            .collect();

        let mut mask = Vec::with_capacity(map_w * map_h);
        for (row, (rgba, inside)) in rows.into_iter().enumerate() {
            for (col, (px, &on_globe)) in rgba.chunks_exact(4).zip(inside.iter()).enumerate() {
                if on_globe {
                    canvas.set(PAD + col, PAD + row, Color::new(px[0], px[1], px[2], px[3]));
                }
            }
            mask.extend(inside);
        }
        mask
    }

    fn draw_graticule(&self, canvas: &mut Canvas, map_w: usize, map_h: usize) {
        let (x0, y0, x1, y1) = self.projection.bounds();
        let mut plot = |lat: f64, lon: f64| {
            let (px, py) = self.projection.forward(lat, lon);
            let col = ((px - x0) / (x1 - x0) * map_w as f64).floor();
            let row = ((y1 - py) / (y1 - y0) * map_h as f64).floor();
            if col >= 0.0 && row >= 0.0 && (col as usize) < map_w && (row as usize) < map_h {
                canvas.set(PAD + col as usize, PAD + row as usize, self.graticule);
            }
        };

        let samples = |lo: f64, hi: f64| {
            let n = ((hi - lo) / LINE_STEP_DEG).ceil() as usize;
            (0..=n).map(move |k| lo + (hi - lo) * k as f64 / n as f64)
        };

        let step = self.style.parallels_step;
        if step > 0.0 {
            let mut lat = -90.0 + step;
            while lat < 90.0 - 1e-9 {
                for lon in samples(self.style.lon_0 - 180.0, self.style.lon_0 + 180.0 - 1e-9) {
                    plot(lat, lon);
                }
                lat += step;
            }
        }
        let step = self.style.meridians_step;
        if step > 0.0 {
            let mut lon = 0.0;
            while lon < 360.0 - 1e-9 {
                for lat in samples(-90.0, 90.0) {
                    plot(lat, lon);
                }
                lon += step;
            }
        }
    }

    fn metadata(&self, vmin: f64, vmax: f64, ticks: &[f64]) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(title) = &self.style.title {
            out.push(("Title".to_string(), title.clone()));
        }
        if let Some(units) = &self.style.units_label {
            out.push(("Units".to_string(), units.clone()));
        }
        out.push((
            "Projection".to_string(),
            format!("{} lon_0={}", self.style.projection, self.style.lon_0),
        ));
        out.push(("Colormap".to_string(), self.style.colormap.as_str().to_string()));
        out.push(("Range".to_string(), format!("{} {}", vmin, vmax)));
        if !ticks.is_empty() {
            let labels: Vec<String> = ticks.iter().map(|t| format_tick(*t)).collect();
            out.push(("Colorbar ticks".to_string(), labels.join(",")));
        }
        out.push(("Software".to_string(), "gravtomo".to_string()));
        out
    }
}

/// Bilinear sample at `(lat, lon)` degrees, periodic in longitude.
pub fn sample_bilinear(data: &Array2<f64>, lat: f64, lon: f64) -> f64 {
    let (nlat, nlon) = data.dim();
    let fi = ((90.0 - lat) * nlat as f64 / 180.0).clamp(0.0, (nlat - 1) as f64);
    let fj = lon.rem_euclid(360.0) * nlon as f64 / 360.0;
    let i0 = fi.floor() as usize;
    let i1 = (i0 + 1).min(nlat - 1);
    let j0 = (fj.floor() as usize) % nlon;
    let j1 = (j0 + 1) % nlon;
    let (di, dj) = (fi - i0 as f64, fj - fj.floor());

    let top = data[[i0, j0]] * (1.0 - dj) + data[[i0, j1]] * dj;
    let bottom = data[[i1, j0]] * (1.0 - dj) + data[[i1, j1]] * dj;
    top * (1.0 - di) + bottom * di
}

fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e5).contains(&magnitude) {
        format!("{:.3e}", value)
    } else {
        let s = format!("{:.3}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Globe edge: on-globe pixels with an off-globe 4-neighbor or at the map border.
fn draw_outline(canvas: &mut Canvas, inside: &[bool], map_w: usize, map_h: usize, color: Color) {
    let at = |col: usize, row: usize| inside[row * map_w + col];
    for row in 0..map_h {
        for col in 0..map_w {
            if !at(col, row) {
                continue;
            }
            let edge = col == 0
                || row == 0
                || col + 1 == map_w
                || row + 1 == map_h
                || !at(col - 1, row)
                || !at(col + 1, row)
                || !at(col, row - 1)
                || !at(col, row + 1);
            if edge {
                canvas.set(PAD + col, PAD + row, color);
            }
        }
    }
}

/// Vertical colorbar spanning 80% of the map height, high values on top.
fn draw_colorbar(canvas: &mut Canvas, scale: &ColorScale, left: usize, map_h: usize) -> Vec<f64> {
    let top = PAD + map_h / 10;
    let bottom = (PAD + map_h - map_h / 10).max(top + 2);
    let bar_h = bottom - top;
    for row in top..bottom {
        let t = 1.0 - (row - top) as f64 / (bar_h - 1) as f64;
        let color = scale.color(scale.vmin + t * (scale.vmax - scale.vmin));
        for col in left..left + COLORBAR_WIDTH {
            canvas.set(col, row, color);
        }
    }
    for col in left..left + COLORBAR_WIDTH {
        canvas.set(col, top, Color::BLACK);
        canvas.set(col, bottom - 1, Color::BLACK);
    }
    for row in top..bottom {
        canvas.set(left, row, Color::BLACK);
        canvas.set(left + COLORBAR_WIDTH - 1, row, Color::BLACK);
    }

    (0..COLORBAR_TICKS)
        .map(|k| {
            let t = k as f64 / (COLORBAR_TICKS - 1) as f64;
            let row = bottom - 1 - (t * (bar_h - 1) as f64).round() as usize;
            for col in left + COLORBAR_WIDTH..left + COLORBAR_WIDTH + TICK_LENGTH {
                canvas.set(col, row, Color::BLACK);
            }
            scale.vmin + t * (scale.vmax - scale.vmin)
        })
        .collect()
}

struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize, fill: Color) -> Self {
        let pixels = fill.to_array().repeat(width * height);
        Self { width, height, pixels }
    }

    fn set(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * 4;
            self.pixels[i..i + 4].copy_from_slice(&color.to_array());
        }
    }
}

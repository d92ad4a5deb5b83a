//! Subcommand implementations.

use anyhow::{Context, Result};
use gravity_field::{geoid_grid, gravity_disturbance_grid, PotentialSource};
use ndarray::{s, Array2};
use renderer::gradient::{finite_range, ColorScale};
use renderer::{png, MapDrawer, MapStyle};
use sh_transform::{load_coefficients, DhGrid, SphericalHarmonicCoeffs};
use std::path::{Path, PathBuf};
use tomography::{fourier_slice_from_grid, run_pipeline};
use tracing::{info, instrument, warn};

use crate::config::RunConfig;
use crate::output::{read_grid_2d, write_grid, GridSidecar, RunSummary};

/// Load model coefficients truncated to the configured degree.
///
/// Files without GM or a reference radius fall back to the reference
/// ellipsoid's values.
pub fn load_model(path: &Path, config: &RunConfig) -> Result<SphericalHarmonicCoeffs> {
    let mut model = load_coefficients(path, config.tomography.lmax)
        .with_context(|| format!("Failed to load coefficients from {}", path.display()))?;
    if model.gm.is_none() || model.r0.is_none() {
        let ellipsoid = config.tomography.reference_ellipsoid()?;
        warn!(
            gm = ellipsoid.gm,
            r0 = ellipsoid.semi_major_axis,
            "Model file carries no GM or reference radius, using the ellipsoid's"
        );
        model.gm = model.gm.or(Some(ellipsoid.gm));
        model.r0 = model.r0.or(Some(ellipsoid.semi_major_axis));
    }
    Ok(model)
}

fn observation_units(source: PotentialSource) -> &'static str {
    match source {
        PotentialSource::Geoid => "m",
        PotentialSource::GravityDisturbance => "m/s^2",
    }
}

fn observation_name(source: PotentialSource) -> &'static str {
    match source {
        PotentialSource::Geoid => "geoid",
        PotentialSource::GravityDisturbance => "gravity_disturbance",
    }
}

/// Writes grids and maps of one run into the output directory.
struct Products<'a> {
    config: &'a RunConfig,
    summary: RunSummary,
}

impl<'a> Products<'a> {
    fn new(config: &'a RunConfig, command: &str, model: Option<PathBuf>) -> Self {
        Self {
            config,
            summary: RunSummary::new(command, model),
        }
    }

    fn dir(&self) -> &Path {
        &self.config.output.dir
    }

    fn grid(&mut self, name: &str, grid: &DhGrid, title: &str, units: Option<&str>) -> Result<()> {
        let data = grid.data();
        let range = finite_range(data.iter());
        if self.config.output.write_grids {
            let mut sidecar = GridSidecar::new(name, &[data.nrows(), data.ncols()])
                .with_lmax(grid.lmax())
                .with_description(title);
            if let Some(units) = units {
                sidecar = sidecar.with_units(units);
            }
            let path = write_grid(self.dir(), &sidecar, data.iter())?;
            self.summary.product(name, path, range);
        }
        if self.config.output.write_maps {
            let style = MapStyle {
                title: self.config.map.title.clone().or_else(|| Some(title.to_string())),
                units_label: self
                    .config
                    .map
                    .units_label
                    .clone()
                    .or_else(|| units.map(str::to_string)),
                ..self.config.map.clone()
            };
            let path = self.dir().join(format!("{}.png", name));
            MapDrawer::new(style)?
                .draw(data)?
                .save_png(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Map written");
            self.summary.product(&format!("{}_map", name), path, range);
        }
        Ok(())
    }

    fn finish(self) -> Result<RunSummary> {
        let path = self.summary.clone().write(self.dir())?;
        info!(path = %path.display(), "Run summary written");
        Ok(self.summary)
    }
}

/// Full back-projection run from a model file.
#[instrument(skip(config), fields(model = %model_path.display()))]
pub fn reconstruct(model_path: &Path, config: &RunConfig) -> Result<RunSummary> {
    let model = load_model(model_path, config)?;
    let out = run_pipeline(&model, &config.tomography)?;
    let geometry = out.kernel.geometry();
    let source = config.tomography.source;

    let mut products = Products::new(config, "reconstruct", Some(model_path.to_path_buf()));
    products.summary.value("lmax", out.potential.lmax())?;
    products.summary.value("source", source)?;
    products.summary.value("kernel", out.kernel.kind())?;
    products.summary.value("regularization", config.tomography.regularization)?;
    products.summary.value("shell_radius", geometry.shell_radius)?;
    products.summary.value("reference_radius", geometry.reference_radius)?;
    products.summary.value("removed_c20", out.reconstruction.removed_c20)?;
    products
        .summary
        .value("potential_power", out.potential.power_per_degree())?;

    products.grid(
        observation_name(source),
        &out.observation,
        "Observation",
        Some(observation_units(source)),
    )?;
    products.grid("unfiltered", &out.reconstruction.unfiltered, "Unfiltered back-projection", None)?;
    products.grid("filtered", &out.reconstruction.filtered, "Filtered back-projection", None)?;
    products.finish()
}

/// Synthesize the observation grid only.
#[instrument(skip(config), fields(model = %model_path.display()))]
pub fn synthesize(model_path: &Path, config: &RunConfig) -> Result<RunSummary> {
    let model = load_model(model_path, config)?;
    let grid = observation_grid(&model, config)?;
    let source = config.tomography.source;
    let (lo, hi) = grid.min_max();
    info!(source = ?source, lmax = model.lmax(), min = lo, max = hi, "Observation grid synthesized");

    let mut products = Products::new(config, "geoid", Some(model_path.to_path_buf()));
    products.summary.value("lmax", model.lmax())?;
    products.summary.value("source", source)?;
    products.summary.value("area_mean", grid.area_mean())?;
    let title = match source {
        PotentialSource::Geoid => "Geoid height",
        PotentialSource::GravityDisturbance => "Gravity disturbance",
    };
    products.grid(observation_name(source), &grid, title, Some(observation_units(source)))?;
    products.finish()
}

fn observation_grid(model: &SphericalHarmonicCoeffs, config: &RunConfig) -> Result<DhGrid> {
    let tomo = &config.tomography;
    tomo.validate().map_err(|e| anyhow::anyhow!("tomography: {}", e))?;
    let ellipsoid = tomo.reference_ellipsoid()?;
    let options = tomo.synthesis_options();
    let grid = match tomo.source {
        PotentialSource::Geoid => geoid_grid(model, &ellipsoid, &options)?,
        PotentialSource::GravityDisturbance => gravity_disturbance_grid(model, &ellipsoid, &options)?,
    };
    Ok(grid)
}

/// Fourier-slice volume of the observation grid.
#[instrument(skip(config), fields(model = %model_path.display()))]
pub fn fourier_slice(model_path: &Path, config: &RunConfig) -> Result<RunSummary> {
    let model = load_model(model_path, config)?;
    let grid = observation_grid(&model, config)?;
    let volume = fourier_slice_from_grid(&grid, &config.fourier_slice)?;
    let n = config.fourier_slice.bins;
    let covered = volume.hits.iter().filter(|&&h| h > 0).count();

    let mut products = Products::new(config, "fourier-slice", Some(model_path.to_path_buf()));
    products.summary.value("bins", n)?;
    products.summary.value("half_width", config.fourier_slice.half_width)?;
    products.summary.value("directions", volume.directions)?;
    products.summary.value("skipped_samples", volume.skipped)?;
    products.summary.value("covered_voxels", covered)?;

    let range = finite_range(volume.volume.iter());
    if config.output.write_grids {
        let sidecar = GridSidecar::new("volume", &[n, n, n])
            .with_description("Real part of the inverse transform of the accumulated spectrum");
        let path = write_grid(&config.output.dir, &sidecar, volume.volume.iter())?;
        products.summary.product("volume", path, range);

        let hits: Vec<f64> = volume.hits.iter().map(|&h| h as f64).collect();
        let sidecar = GridSidecar::new("hits", &[n, n, n]).with_description("Slices contributing per voxel");
        let path = write_grid(&config.output.dir, &sidecar, hits.iter())?;
        products.summary.product("hits", path, None);
    }
    if config.output.write_maps {
        let plane = volume.volume.slice(s![.., .., n / 2]).to_owned();
        let path = config.output.dir.join("volume_center.png");
        write_plane_png(&plane, &config.map, &path)?;
        products.summary.product("volume_center", path, finite_range(plane.iter()));
    }
    products.finish()
}

/// Draw a Cartesian plane with the style's colormap, one pixel per cell.
fn write_plane_png(plane: &Array2<f64>, style: &MapStyle, path: &Path) -> Result<()> {
    let (lo, hi) = match (style.vmin, style.vmax, finite_range(plane.iter())) {
        (Some(lo), Some(hi), _) => (lo, hi),
        (lo, hi, Some((dlo, dhi))) => (lo.unwrap_or(dlo), hi.unwrap_or(dhi)),
        _ => (0.0, 1.0),
    };
    let (lo, hi) = if lo < hi { (lo, hi) } else { (lo - 0.5, lo + 0.5) };
    let scale = ColorScale::new(style.colormap, lo, hi)?;
    let (rows, cols) = plane.dim();
    let pixels: Vec<u8> = plane.iter().flat_map(|&v| scale.color(v).to_array()).collect();
    let range = format!("{} {}", lo, hi);
    let text = [("Title", "Fourier-slice volume, central plane"), ("Range", range.as_str())];
    std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
    std::fs::write(path, png::encode_png(&pixels, cols, rows, &text)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Render a grid file written by an earlier run.
#[instrument(skip(style))]
pub fn render(grid_path: &Path, style: &MapStyle, out: Option<&Path>) -> Result<PathBuf> {
    let (sidecar, data) = read_grid_2d(grid_path)?;
    let style = MapStyle {
        title: style.title.clone().or_else(|| sidecar.description.clone()),
        units_label: style.units_label.clone().or_else(|| sidecar.units.clone()),
        ..style.clone()
    };
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| grid_path.with_extension("png"));
    MapDrawer::new(style)?.draw(&data)?.save_png(&out)?;
    info!(grid = %sidecar.name, path = %out.display(), "Map written");
    Ok(out)
}

//! gravtomo command-line tool.
//!
//! Back-projects gravity models onto spherical shells, synthesizes geoid
//! and gravity-disturbance grids, accumulates Fourier-slice volumes and
//! renders grids as maps.

use anyhow::Result;
use clap::{Parser, Subcommand};
use gravity_field::PotentialSource;
use projection::ProjectionKind;
use renderer::{Colormap, MapStyle};
use std::path::PathBuf;
use tomography::{KernelKind, ShellPlacement};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gravtomo::RunConfig;

#[derive(Parser, Debug)]
#[command(name = "gravtomo")]
#[command(about = "Gravitational tomography from spherical-harmonic gravity models")]
struct Args {
    /// Run configuration file (YAML); GRAVTOMO_* variables are used without one
    #[arg(short, long, env = "GRAVTOMO_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory (overrides the configuration)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

/// Overrides shared by the model-driven subcommands.
#[derive(clap::Args, Debug)]
struct ModelArgs {
    /// Coefficient file (.shm or ICGEM .gfc)
    model: PathBuf,

    /// Truncation degree
    #[arg(long)]
    lmax: Option<usize>,

    /// Observation the potential is estimated from: geoid or gravity_disturbance
    #[arg(long)]
    source: Option<String>,

    /// Synthesize the full model potential instead of the disturbing potential
    #[arg(long)]
    keep_normal_field: bool,
}

/// Map overrides.
#[derive(clap::Args, Debug)]
struct MapArgs {
    /// Projection: cyl or moll
    #[arg(long)]
    projection: Option<String>,

    /// Central meridian in degrees
    #[arg(long)]
    lon_0: Option<f64>,

    /// Colormap name
    #[arg(long)]
    colormap: Option<String>,

    #[arg(long)]
    vmin: Option<f64>,

    #[arg(long)]
    vmax: Option<f64>,

    #[arg(long)]
    title: Option<String>,

    /// Colorbar label
    #[arg(long)]
    units: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filtered back-projection onto a shell
    Reconstruct {
        #[command(flatten)]
        model: ModelArgs,

        /// Radial kernel: continuation, single_layer, shell_distance or stabilized_fbp
        #[arg(long)]
        kernel: Option<String>,

        /// Tikhonov regularization parameter
        #[arg(long)]
        lambda: Option<f64>,

        /// Shell depth below the reference sphere (m)
        #[arg(long, conflicts_with = "shell_radius")]
        depth: Option<f64>,

        /// Absolute shell radius (m)
        #[arg(long)]
        shell_radius: Option<f64>,

        #[command(flatten)]
        map: MapArgs,
    },

    /// Geoid or gravity-disturbance grid of a model
    Geoid {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        map: MapArgs,
    },

    /// Fourier-slice volume of the observation grid
    FourierSlice {
        #[command(flatten)]
        model: ModelArgs,

        /// Voxels per axis
        #[arg(long)]
        bins: Option<usize>,

        /// Number of projection directions
        #[arg(long)]
        directions: Option<usize>,

        #[command(flatten)]
        map: MapArgs,
    },

    /// Draw a grid written by an earlier run
    Render {
        /// Grid file (.f64 or its .json sidecar)
        grid: PathBuf,

        /// Map style file (JSON)
        #[arg(long)]
        style: Option<PathBuf>,

        /// Output PNG (defaults to the grid path with .png)
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        map: MapArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::from_env(),
    };
    if let Some(dir) = &args.output {
        config.output.dir = dir.clone();
    }
    info!(output = %config.output.dir.display(), "Starting gravtomo");

    match &args.command {
        Command::Reconstruct {
            model,
            kernel,
            lambda,
            depth,
            shell_radius,
            map,
        } => {
            apply_model_args(&mut config, model)?;
            if let Some(name) = kernel {
                config.tomography.kernel =
                    KernelKind::from_str(name).ok_or_else(|| anyhow::anyhow!("unknown kernel '{}'", name))?;
            }
            if lambda.is_some() {
                config.tomography.regularization = *lambda;
            }
            if let Some(depth) = depth {
                config.tomography.shell.placement = ShellPlacement::Depth(*depth);
            }
            if let Some(radius) = shell_radius {
                config.tomography.shell.placement = ShellPlacement::Radius(*radius);
            }
            apply_map_args(&mut config.map, map)?;
            config.validate()?;
            let summary = gravtomo::reconstruct(&model.model, &config)?;
            info!(products = summary.products.len(), "Reconstruction finished");
        }
        Command::Geoid { model, map } => {
            apply_model_args(&mut config, model)?;
            apply_map_args(&mut config.map, map)?;
            config.validate()?;
            let summary = gravtomo::synthesize(&model.model, &config)?;
            info!(products = summary.products.len(), "Synthesis finished");
        }
        Command::FourierSlice {
            model,
            bins,
            directions,
            map,
        } => {
            apply_model_args(&mut config, model)?;
            if let Some(bins) = bins {
                config.fourier_slice.bins = *bins;
            }
            if let Some(directions) = directions {
                config.fourier_slice.directions = *directions;
            }
            apply_map_args(&mut config.map, map)?;
            config.validate()?;
            let summary = gravtomo::fourier_slice(&model.model, &config)?;
            info!(products = summary.products.len(), "Fourier-slice accumulation finished");
        }
        Command::Render { grid, style, out, map } => {
            let mut map_style = match style {
                Some(path) => MapStyle::from_file(path)?,
                None => config.map.clone(),
            };
            apply_map_args(&mut map_style, map)?;
            gravtomo::render(grid, &map_style, out.as_deref())?;
        }
    }

    Ok(())
}

fn apply_model_args(config: &mut RunConfig, args: &ModelArgs) -> Result<()> {
    if args.lmax.is_some() {
        config.tomography.lmax = args.lmax;
    }
    if let Some(name) = &args.source {
        config.tomography.source =
            PotentialSource::from_str(name).ok_or_else(|| anyhow::anyhow!("unknown source '{}'", name))?;
    }
    if args.keep_normal_field {
        config.tomography.remove_normal_field = false;
    }
    Ok(())
}

fn apply_map_args(style: &mut MapStyle, args: &MapArgs) -> Result<()> {
    if let Some(name) = &args.projection {
        style.projection = ProjectionKind::from_name(name)?;
    }
    if let Some(lon_0) = args.lon_0 {
        style.lon_0 = lon_0;
    }
    if let Some(name) = &args.colormap {
        style.colormap = Colormap::from_name(name)?;
    }
    if args.vmin.is_some() {
        style.vmin = args.vmin;
    }
    if args.vmax.is_some() {
        style.vmax = args.vmax;
    }
    if args.title.is_some() {
        style.title = args.title.clone();
    }
    if args.units.is_some() {
        style.units_label = args.units.clone();
    }
    Ok(())
}

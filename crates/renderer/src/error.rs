//! Error types for map rendering.

use projection::ProjectionError;
use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("unknown colormap '{0}'")]
    UnknownColormap(String),

    #[error("invalid color '{0}' (expected #RRGGBB)")]
    InvalidColor(String),

    /// Color range with `vmin >= vmax` or non-finite bounds.
    #[error("invalid color range: vmin={vmin}, vmax={vmax}")]
    InvalidRange { vmin: f64, vmax: f64 },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("style parse error: {0}")]
    StyleParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

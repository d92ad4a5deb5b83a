//! Map rendering of global grids.
//!
//! Draws equiangular latitude/longitude grids in a cylindrical or Mollweide
//! projection with a graticule and a colorbar, and encodes the result as PNG.
//! Text that would annotate the figure (title, units, tick values) is carried
//! in PNG `tEXt` chunks.

pub mod error;
pub mod gradient;
pub mod map;
pub mod png;
pub mod style;

pub use error::{RenderError, RenderResult};
pub use gradient::{Color, ColorScale, Colormap};
pub use map::{MapDrawer, RenderedMap};
pub use style::MapStyle;

/// Draw `data` with `style` and return the PNG bytes.
pub fn draw_map(data: &ndarray::Array2<f64>, style: &MapStyle) -> RenderResult<Vec<u8>> {
    MapDrawer::new(style.clone())?.draw(data)?.to_png()
}

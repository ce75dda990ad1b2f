//! Indexed-color software rasterizer
//!
//! Features:
//! - 256-color r3g3b2 palette with optional Floyd-Steinberg dithering
//! - Near/far and screen-rect polygon clipping
//! - Perspective-corrected or affine texture mapping
//! - Per-polygon mip selection
//! - Reciprocal-w depth buffer (16-bit, or 8-bit with the `depth8` feature)

mod buffer;
mod color;
mod context;
mod error;
mod framebuffer;
mod image;
mod math;
mod pipeline;
mod raster;
mod state;
mod texture;
mod types;

pub use buffer::*;
pub use color::*;
pub use context::*;
pub use error::*;
pub use framebuffer::*;
pub use self::image::*;
pub use math::*;
pub use pipeline::*;
pub use state::*;
pub use texture::*;
pub use types::*;

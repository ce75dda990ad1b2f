//! bonnie-raster: CPU-only 3D rendering into 8-bit palette framebuffers
//!
//! Geometry goes in through vertex/index buffers, render state lives in a
//! state machine, and the [`Context`](rasterizer::Context) clips, projects and
//! scan-converts triangles into a [`Framebuffer`](rasterizer::Framebuffer) of
//! color indices plus depth. [`present`] turns that into RGBA for display.

pub mod config;
pub mod present;
pub mod rasterizer;

pub use config::{load_config, load_config_from_str, save_config, ConfigError, RenderConfig};
pub use rasterizer::{Context, Error, ErrorKind, Result};

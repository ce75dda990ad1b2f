//! Renderer configuration
//!
//! Stored as RON next to the demo binary. Every field has a default, so a
//! partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::rasterizer::MathMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    SerializeError(#[from] ron::Error),
}

/// Most vertices one triangle can have after the two z planes and four screen edges
pub const CLIPPED_TRIANGLE_VERTICES: usize = 3 + 2 + 4;

/// Framebuffer size used when the caller does not pick one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Divide texture coordinates by w per pixel instead of affine mapping
    pub perspective_corrected: bool,
    pub math_mode: MathMode,
    /// Upper bound for a polygon after near/far and screen clipping
    pub max_polygon_vertices: usize,
    pub z_clip_near: f32,
    pub z_clip_far: f32,
    pub default_viewport: ViewportSize,
    /// Initial value of the mip-mapping capability for new state machines
    pub mip_mapping: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            perspective_corrected: true,
            math_mode: MathMode::Fast,
            max_polygon_vertices: 32,
            z_clip_near: 1.0,
            z_clip_far: 100.0,
            default_viewport: ViewportSize { width: 640, height: 480 },
            mip_mapping: false,
        }
    }
}

/// Load a configuration from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Save a configuration to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a configuration from a RON string (for embedded defaults or testing)
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    let config: RenderConfig = ron::from_str(s)?;
    if config.max_polygon_vertices < CLIPPED_TRIANGLE_VERTICES {
        log::warn!(
            "max_polygon_vertices = {} is below the {} a clipped triangle can reach; such draws will fail",
            config.max_polygon_vertices,
            CLIPPED_TRIANGLE_VERTICES
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(config.perspective_corrected);
        assert_eq!(config.math_mode, MathMode::Fast);
        assert_eq!(config.max_polygon_vertices, 32);
        assert_eq!(config.z_clip_near, 1.0);
        assert_eq!(config.z_clip_far, 100.0);
        assert_eq!(config.default_viewport, ViewportSize { width: 640, height: 480 });
        assert!(!config.mip_mapping);
    }

    #[test]
    fn test_small_polygon_limit_still_loads() {
        let config = load_config_from_str("(max_polygon_vertices: 4)").unwrap();
        assert_eq!(config.max_polygon_vertices, 4);
        assert!(config.max_polygon_vertices < CLIPPED_TRIANGLE_VERTICES);
        assert!(RenderConfig::default().max_polygon_vertices >= CLIPPED_TRIANGLE_VERTICES);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = load_config_from_str("(mip_mapping: true, math_mode: Precise)").unwrap();
        assert!(config.mip_mapping);
        assert_eq!(config.math_mode, MathMode::Precise);
        assert_eq!(config.z_clip_far, 100.0);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            load_config_from_str("(z_clip_near: \"near\")"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.ron");

        let config = RenderConfig {
            perspective_corrected: false,
            z_clip_near: 0.5,
            default_viewport: ViewportSize { width: 320, height: 240 },
            ..Default::default()
        };
        save_config(&config, &path).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path().join("absent.ron")),
            Err(ConfigError::IoError(_))
        ));
    }
}

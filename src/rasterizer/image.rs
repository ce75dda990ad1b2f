//! Image decoding for texture upload

use std::path::Path;

use super::color::{self, Rgb};
use super::error::{Error, Result};

/// Raw 8-bit image with 1 to 4 interleaved components per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub components: u32,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, components: u32) -> Result<Self> {
        let len = byte_len(width, height, components)?;
        Ok(Self {
            width,
            height,
            components,
            data: vec![0; len],
        })
    }

    pub fn from_raw(width: u32, height: u32, components: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height, components)?;
        if data.len() < expected {
            return Err(Error::ArgumentMismatch(format!(
                "image data holds {} bytes, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                components,
                expected
            )));
        }
        Ok(Self { width, height, components, data })
    }

    /// Decode an image file into RGB
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = ::image::open(path).map_err(|e| decode_error(e, &path.display().to_string()))?;
        let image = Self::from_dynamic(img)?;
        log::debug!("loaded image {} ({}x{})", path.display(), image.width, image.height);
        Ok(image)
    }

    /// Decode an in-memory encoded image into RGB
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let img = ::image::load_from_memory(bytes).map_err(|e| decode_error(e, "memory"))?;
        Self::from_dynamic(img)
    }

    fn from_dynamic(img: ::image::DynamicImage) -> Result<Self> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_raw(width, height, 3, rgb.into_raw())
    }

    /// Checkerboard of two colors with 4x4 cells
    pub fn checkerboard(width: u32, height: u32, a: Rgb, b: Rgb) -> Result<Self> {
        let mut image = Self::new(width, height, 3)?;
        for y in 0..height {
            for x in 0..width {
                let c = if ((x / 4) + (y / 4)) % 2 == 0 { a } else { b };
                let i = (y as usize * width as usize + x as usize) * 3;
                image.data[i..i + 3].copy_from_slice(&[c.r, c.g, c.b]);
            }
        }
        Ok(image)
    }

    /// Pixels expanded to RGB; one or two components are read as gray
    pub fn rgb_pixels(&self) -> Vec<Rgb> {
        self.data
            .chunks_exact(self.components as usize)
            .take((self.width * self.height) as usize)
            .map(|p| {
                if p.len() < 3 {
                    Rgb::gray(p[0])
                } else {
                    Rgb::new(p[0], p[1], p[2])
                }
            })
            .collect()
    }

    /// One palette index per pixel
    pub fn to_color_indices(&self, dither: bool) -> Vec<u8> {
        color::quantize(self.width as usize, self.height as usize, &self.rgb_pixels(), dither)
    }
}

/// Size of the pixel data in bytes, rejecting empty formats and sizes past `u32`
fn byte_len(width: u32, height: u32, components: u32) -> Result<usize> {
    if width == 0 || height == 0 || !(1..=4).contains(&components) {
        return Err(Error::invalid_argument(format!(
            "invalid image format {}x{} with {} components",
            width, height, components
        )));
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(components))
        .map(|n| n as usize)
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "image {}x{} with {} components is too large",
                width, height, components
            ))
        })
}

fn decode_error(e: ::image::ImageError, source: &str) -> Error {
    match e {
        ::image::ImageError::Unsupported(u) => {
            Error::MissingPlugin(format!("no decoder for {}: {}", source, u))
        }
        ::image::ImageError::IoError(io) => Error::from(io),
        other => Error::invalid_argument(format!("failed to decode {}: {}", source, other)),
    }
}

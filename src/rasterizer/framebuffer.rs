//! Indexed-color framebuffer with quantized depth
//!
//! Besides the pixel array the framebuffer owns the two per-row scanline side
//! tables the polygon filler writes its edges into.

use std::fmt::Debug;

use super::error::{Error, Result};
use super::types::{ClearFlags, RasterVertex};

/// Depth quantization policy, fixed at build time
pub trait DepthEncoding {
    type Stored: Copy + Default + PartialOrd + Debug;
    const MAX: f32;

    /// `z` in [0, 1] to the stored integer range (rounded)
    fn encode(z: f32) -> Self::Stored;
    fn decode(d: Self::Stored) -> f32;
}

#[derive(Debug, Clone, Copy)]
pub struct Depth16;

impl DepthEncoding for Depth16 {
    type Stored = u16;
    const MAX: f32 = u16::MAX as f32;

    fn encode(z: f32) -> u16 {
        (z.clamp(0.0, 1.0) * Self::MAX).round() as u16
    }

    fn decode(d: u16) -> f32 {
        d as f32 / Self::MAX
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Depth8;

impl DepthEncoding for Depth8 {
    type Stored = u8;
    const MAX: f32 = u8::MAX as f32;

    fn encode(z: f32) -> u8 {
        (z.clamp(0.0, 1.0) * Self::MAX).round() as u8
    }

    fn decode(d: u8) -> f32 {
        d as f32 / Self::MAX
    }
}

#[cfg(not(feature = "depth8"))]
pub type ActiveDepth = Depth16;
#[cfg(feature = "depth8")]
pub type ActiveDepth = Depth8;

pub type DepthValue = <ActiveDepth as DepthEncoding>::Stored;

pub const DEPTH_MAX: f32 = <ActiveDepth as DepthEncoding>::MAX;

pub fn encode_depth(z: f32) -> DepthValue {
    ActiveDepth::encode(z)
}

pub fn decode_depth(d: DepthValue) -> f32 {
    ActiveDepth::decode(d)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pixel {
    pub color_index: u8,
    pub depth: DepthValue,
}

/// One row of a polygon edge: linear pixel offset plus interpolated attributes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanlineSide {
    pub offset: i64,
    pub z: f32,
    pub u: f32,
    pub v: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
    scanlines_start: Vec<ScanlineSide>,
    scanlines_end: Vec<ScanlineSide>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_argument(format!(
                "framebuffer size {}x{} must be non-zero",
                width, height
            )));
        }

        Ok(Self {
            width,
            height,
            pixels: vec![Pixel::default(); width as usize * height as usize],
            scanlines_start: vec![ScanlineSide::default(); height as usize],
            scanlines_end: vec![ScanlineSide::default(); height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn clear(&mut self, color_index: u8, depth: f32, flags: ClearFlags) {
        let depth = encode_depth(depth);
        let color = flags.contains(ClearFlags::COLOR);
        let zbuf = flags.contains(ClearFlags::DEPTH);

        for pixel in &mut self.pixels {
            if color {
                pixel.color_index = color_index;
            }
            if zbuf {
                pixel.depth = depth;
            }
        }
    }

    /// Writes a color index, ignoring coordinates outside the framebuffer
    pub fn plot(&mut self, x: i32, y: i32, color_index: u8) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.pixels[(y as u32 * self.width + x as u32) as usize].color_index = color_index;
        }
    }

    /// Interpolates the edge a -> b into one of the side tables, one entry per row.
    ///
    /// Endpoints are ordered by y so a shared edge produces identical entries for
    /// both polygons. Horizontal edges are skipped: their rows are covered by the
    /// adjacent edges of the same chain.
    pub fn setup_scanlines(&mut self, side: Side, a: &RasterVertex, b: &RasterVertex) {
        let (start, end) = if a.y <= b.y { (a, b) } else { (b, a) };
        let dy = end.y - start.y;
        if dy == 0 {
            return;
        }

        let width = self.width as f64;
        let table = match side {
            Side::Start => &mut self.scanlines_start,
            Side::End => &mut self.scanlines_end,
        };

        let inv_dy = 1.0 / dy as f64;
        let offset_step = width + (end.x - start.x) as f64 * inv_dy;
        let z_step = (end.z - start.z) as f64 * inv_dy;
        let u_step = (end.u - start.u) as f64 * inv_dy;
        let v_step = (end.v - start.v) as f64 * inv_dy;

        // +0.5 so truncation rounds the edge position to the nearest pixel
        let mut offset = start.y as f64 * width + start.x as f64 + 0.5;
        let mut z = start.z as f64;
        let mut u = start.u as f64;
        let mut v = start.v as f64;

        for y in start.y..=end.y {
            if let Some(entry) = usize::try_from(y).ok().and_then(|row| table.get_mut(row)) {
                *entry = ScanlineSide {
                    offset: offset.floor() as i64,
                    z: z as f32,
                    u: u as f32,
                    v: v as f32,
                };
            }
            offset += offset_step;
            z += z_step;
            u += u_step;
            v += v_step;
        }
    }

    pub fn scanline(&self, side: Side, row: usize) -> Option<&ScanlineSide> {
        match side {
            Side::Start => self.scanlines_start.get(row),
            Side::End => self.scanlines_end.get(row),
        }
    }

    /// Split borrow for span filling: pixels plus both side tables
    pub(crate) fn span_parts(&mut self) -> (&mut [Pixel], &[ScanlineSide], &[ScanlineSide]) {
        (&mut self.pixels, &self.scanlines_start, &self.scanlines_end)
    }
}

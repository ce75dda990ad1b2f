//! Palette-indexed textures with a contiguous mip chain
//!
//! All levels live in one texel array in descending size order. Each level is
//! addressed through a [`MipLevel`] handle; the array is only reallocated when
//! the dimensions or the mip count of an upload differ from the current ones.

use super::color::{self, Rgb};
use super::error::{Error, Result};
use super::image::Image;
use super::math::MathMode;

pub const MAX_TEXTURE_SIZE: u32 = 256;

/// Location of one mip level inside the texel array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevel {
    pub offset: usize,
    pub width: u32,
    pub height: u32,
}

impl MipLevel {
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed view of a single mip level
#[derive(Debug, Clone, Copy)]
pub struct MipView<'a> {
    pub width: u32,
    pub height: u32,
    texels: &'a [u8],
}

impl<'a> MipView<'a> {
    /// Nearest-neighbor sample; coordinates wrap into [0, 1), negative values included
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> u8 {
        let u = u - u.floor();
        let v = v - v.floor();

        let x = ((u * self.width as f32) as usize).min(self.width as usize - 1);
        let y = ((v * self.height as f32) as usize).min(self.height as usize - 1);

        self.texels[y * self.width as usize + x]
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            self.texels.get((y * self.width + x) as usize).copied()
        } else {
            None
        }
    }

    pub fn texels(&self) -> &'a [u8] {
        self.texels
    }
}

/// Number of levels down to 1x1, level 0 included
pub fn num_mips(width: u32, height: u32) -> usize {
    let (mut w, mut h) = (width.max(1), height.max(1));
    let mut count = 1;
    while w > 1 || h > 1 {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        count += 1;
    }
    count
}

/// Screen-space texture coordinate change along two polygon edges, per pixel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TexelDerivatives {
    pub dudx: f32,
    pub dvdx: f32,
    pub dudy: f32,
    pub dvdy: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Texture {
    width: u32,
    height: u32,
    levels: Vec<MipLevel>,
    texels: Vec<u8>,
}

impl Texture {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1x1 texture holding a single color index
    pub fn singular(color_index: u8) -> Self {
        Self {
            width: 1,
            height: 1,
            levels: vec![MipLevel { offset: 0, width: 1, height: 1 }],
            texels: vec![color_index],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mips(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn texels(&self) -> &[u8] {
        &self.texels
    }

    pub fn has_image(&self) -> bool {
        !self.levels.is_empty()
    }

    pub fn level_width(&self, mip: usize) -> Option<u32> {
        self.levels.get(mip).map(|l| l.width)
    }

    pub fn level_height(&self, mip: usize) -> Option<u32> {
        self.levels.get(mip).map(|l| l.height)
    }

    /// View of a mip level, clamped to the smallest one
    pub fn level(&self, mip: usize) -> Option<MipView<'_>> {
        let level = self.levels.get(mip.min(self.levels.len().checked_sub(1)?))?;
        Some(MipView {
            width: level.width,
            height: level.height,
            texels: &self.texels[level.offset..level.offset + level.len()],
        })
    }

    /// Upload RGB pixels, quantizing each generated level to palette indices
    pub fn upload(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Rgb],
        dither: bool,
        generate_mips: bool,
    ) -> Result<()> {
        if width == 0 || height == 0 || width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            return Err(Error::invalid_argument(format!(
                "texture size {}x{} outside 1..={}",
                width, height, MAX_TEXTURE_SIZE
            )));
        }

        let count = width as usize * height as usize;
        if pixels.len() < count {
            return Err(Error::ArgumentMismatch(format!(
                "{} pixels supplied for a {}x{} texture",
                pixels.len(),
                width,
                height
            )));
        }

        let mips = if generate_mips { num_mips(width, height) } else { 1 };
        self.reserve(width, height, mips);

        let mut rgb = pixels[..count].to_vec();
        for (i, level) in self.levels.iter().enumerate() {
            let indices = color::quantize(level.width as usize, level.height as usize, &rgb, dither);
            self.texels[level.offset..level.offset + level.len()].copy_from_slice(&indices);

            if i + 1 < mips {
                rgb = downsample(&rgb, level.width, level.height);
            }
        }

        Ok(())
    }

    pub fn upload_image(&mut self, image: &Image, dither: bool, generate_mips: bool) -> Result<()> {
        self.upload(image.width, image.height, &image.rgb_pixels(), dither, generate_mips)
    }

    fn reserve(&mut self, width: u32, height: u32, mips: usize) {
        if self.width == width && self.height == height && self.levels.len() == mips {
            return;
        }

        self.width = width;
        self.height = height;
        self.levels.clear();

        let (mut w, mut h, mut offset) = (width, height, 0);
        for _ in 0..mips {
            let level = MipLevel { offset, width: w, height: h };
            offset += level.len();
            self.levels.push(level);
            w = (w / 2).max(1);
            h = (h / 2).max(1);
        }

        self.texels = vec![0; offset];
        log::debug!("texture storage {}x{} with {} mips ({} texels)", width, height, mips, offset);
    }

    /// Mip level for a polygon from its texel derivatives, before the LOD bias
    pub fn compute_mip_level(&self, d: &TexelDerivatives, mode: MathMode) -> usize {
        if self.levels.len() <= 1 {
            return 0;
        }

        let w = self.width as f32;
        let h = self.height as f32;
        let len_x = (d.dudx * w) * (d.dudx * w) + (d.dvdx * h) * (d.dvdx * h);
        let len_y = (d.dudy * w) * (d.dudy * w) + (d.dvdy * h) * (d.dvdy * h);
        let rho_sq = len_x.max(len_y);

        // Degenerate edges produce NaN
        if !rho_sq.is_finite() || rho_sq <= 1.0 {
            return 0;
        }

        // log2(sqrt(x)) == log2(x) / 2
        let lod = mode.int_log2(rho_sq) / 2;
        (lod.max(0) as usize).min(self.levels.len() - 1)
    }
}

/// 2x2 box filter; 1x2 or 2x1 once a dimension reaches one texel
fn downsample(src: &[Rgb], width: u32, height: u32) -> Vec<Rgb> {
    let (w, h) = (width as usize, height as usize);
    let nw = (w / 2).max(1);
    let nh = (h / 2).max(1);

    let mut out = Vec::with_capacity(nw * nh);
    for y in 0..nh {
        let ys = if h > 1 { [2 * y, (2 * y + 1).min(h - 1)] } else { [0, 0] };
        for x in 0..nw {
            let xs = if w > 1 { [2 * x, (2 * x + 1).min(w - 1)] } else { [0, 0] };

            let mut sum = [0u32; 3];
            let mut n = 0u32;
            for (iy, sy) in ys.iter().enumerate() {
                if iy == 1 && h <= 1 {
                    continue;
                }
                for (ix, sx) in xs.iter().enumerate() {
                    if ix == 1 && w <= 1 {
                        continue;
                    }
                    let c = src[sy * w + sx];
                    sum[0] += c.r as u32;
                    sum[1] += c.g as u32;
                    sum[2] += c.b as u32;
                    n += 1;
                }
            }

            let avg = sum.map(|s| ((s + n / 2) / n) as u8);
            out.push(Rgb::new(avg[0], avg[1], avg[2]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_mips() {
        assert_eq!(num_mips(1, 1), 1);
        assert_eq!(num_mips(4, 4), 3);
        assert_eq!(num_mips(256, 16), 9);
        assert_eq!(num_mips(5, 3), 3);
    }

    #[test]
    fn test_solid_color_stays_solid_in_every_mip() {
        let color = Rgb::new(219, 73, 170);
        let mut tex = Texture::new();
        tex.upload(16, 8, &vec![color; 128], false, true).unwrap();

        assert_eq!(tex.mips(), 5);
        for mip in 0..tex.mips() {
            let view = tex.level(mip).unwrap();
            assert!(view.texels().iter().all(|t| *t == color.index()), "mip {}", mip);
        }
        assert_eq!(tex.level_width(4), Some(1));
        assert_eq!(tex.level_height(3), Some(1));
    }

    #[test]
    fn test_levels_are_contiguous() {
        let mut tex = Texture::new();
        tex.upload(8, 4, &vec![Rgb::BLACK; 32], false, true).unwrap();
        let mut expected = 0;
        for level in tex.levels() {
            assert_eq!(level.offset, expected);
            expected += level.len();
        }
        assert_eq!(tex.texels().len(), expected);
    }

    #[test]
    fn test_storage_reused_for_same_shape() {
        let mut tex = Texture::new();
        tex.upload(8, 8, &vec![Rgb::BLACK; 64], false, true).unwrap();
        let ptr = tex.texels().as_ptr();

        tex.upload(8, 8, &vec![Rgb::new(255, 255, 255); 64], false, true).unwrap();
        assert_eq!(tex.texels().as_ptr(), ptr);
        assert_eq!(tex.level(0).unwrap().sample(0.5, 0.5), 0xff);

        tex.upload(8, 8, &vec![Rgb::BLACK; 64], false, false).unwrap();
        assert_eq!(tex.mips(), 1);
        assert_eq!(tex.texels().len(), 64);
    }

    #[test]
    fn test_box_filter_averages() {
        let pixels = [
            Rgb::gray(0),
            Rgb::gray(100),
            Rgb::gray(200),
            Rgb::gray(100),
        ];
        assert_eq!(downsample(&pixels, 2, 2), vec![Rgb::gray(100)]);
        assert_eq!(downsample(&pixels[..2], 1, 2), vec![Rgb::gray(50)]);
        assert_eq!(downsample(&pixels[..2], 2, 1), vec![Rgb::gray(50)]);
    }

    #[test]
    fn test_sample_wraps_negative() {
        let mut tex = Texture::new();
        tex.upload(2, 1, &[Rgb::BLACK, Rgb::new(255, 0, 0)], false, false).unwrap();
        let view = tex.level(0).unwrap();

        assert_eq!(view.sample(0.25, 0.0), 0);
        assert_eq!(view.sample(-0.25, 0.0), 0b1110_0000);
        assert_eq!(view.sample(1.25, 0.0), 0);
        assert_eq!(view.sample(1.0, 0.99), 0);
    }

    #[test]
    fn test_upload_rejects_bad_sizes() {
        let mut tex = Texture::new();
        assert!(matches!(
            tex.upload(512, 1, &vec![Rgb::BLACK; 512], false, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tex.upload(4, 4, &[Rgb::BLACK; 3], false, false),
            Err(Error::ArgumentMismatch(_))
        ));
        assert!(!tex.has_image());
        assert!(tex.level(0).is_none());
    }

    #[test]
    fn test_compute_mip_level() {
        let mut tex = Texture::new();
        tex.upload(64, 64, &vec![Rgb::BLACK; 64 * 64], false, true).unwrap();

        // One texel per pixel
        let unit = TexelDerivatives { dudx: 1.0 / 64.0, dvdx: 0.0, dudy: 0.0, dvdy: 1.0 / 64.0 };
        assert_eq!(tex.compute_mip_level(&unit, MathMode::Fast), 0);

        // Four texels per pixel
        let minified = TexelDerivatives { dudx: 4.0 / 64.0, dvdx: 0.0, dudy: 0.0, dvdy: 4.0 / 64.0 };
        assert_eq!(tex.compute_mip_level(&minified, MathMode::Fast), 2);
        assert_eq!(tex.compute_mip_level(&minified, MathMode::Precise), 2);

        let huge = TexelDerivatives { dudx: 1000.0, ..Default::default() };
        assert_eq!(tex.compute_mip_level(&huge, MathMode::Fast), tex.mips() - 1);
    }

    #[test]
    fn test_singular() {
        let tex = Texture::singular(42);
        assert_eq!(tex.level(3).unwrap().sample(-7.3, 12.9), 42);
    }
}

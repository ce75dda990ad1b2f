//! 8-bit r3g3b2 color palette
//!
//! ```text
//! Bit     7 6 5 4 3 2 1 0
//! Color   R R R G G G B B
//! ```

use serde::{Deserialize, Serialize};

/// Channel levels for the 3-bit red/green components
pub const LEVELS_3BIT: [u8; 8] = [0, 36, 73, 109, 146, 182, 219, 255];
/// Channel levels for the 2-bit blue component
pub const LEVELS_2BIT: [u8; 4] = [0, 85, 170, 255];

/// Quantization step per channel used by error diffusion
pub const DITHER_SCALE: [i32; 3] = [36, 36, 85];
/// Divisor per channel when selecting a palette index
pub const INDEX_SELECT: [u32; 3] = [32, 32, 64];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    pub fn index(self) -> u8 {
        color_index(self.r, self.g, self.b)
    }
}

pub fn color_index(r: u8, g: u8, b: u8) -> u8 {
    (((r as u32 / INDEX_SELECT[0]) << 5) | ((g as u32 / INDEX_SELECT[1]) << 2) | (b as u32 / INDEX_SELECT[2])) as u8
}

/// 256-entry lookup from color index to RGB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: [Rgb; 256],
}

impl ColorPalette {
    pub fn r3g3b2() -> Self {
        let mut colors = [Rgb::BLACK; 256];
        let mut i = 0;
        for r in LEVELS_3BIT {
            for g in LEVELS_3BIT {
                for b in LEVELS_2BIT {
                    colors[i] = Rgb::new(r, g, b);
                    i += 1;
                }
            }
        }
        Self { colors }
    }

    pub fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    pub fn colors(&self) -> &[Rgb; 256] {
        &self.colors
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::r3g3b2()
    }
}

/// Quantize RGB pixels to palette indices, optionally with Floyd-Steinberg dithering.
///
/// Error distribution around the current pixel `px`:
/// ```text
///        [ px ] [7/16]
/// [3/16] [5/16] [1/16]
/// ```
pub fn quantize(width: usize, height: usize, pixels: &[Rgb], dither: bool) -> Vec<u8> {
    if !dither {
        return pixels.iter().map(|c| c.index()).collect();
    }

    let mut buffer: Vec<[i32; 3]> = pixels
        .iter()
        .map(|c| [c.r as i32, c.g as i32, c.b as i32])
        .collect();

    for y in 0..height {
        for x in 0..width {
            for (comp, scale) in DITHER_SCALE.iter().enumerate() {
                diffuse(&mut buffer, x, y, comp, width, height, *scale);
            }
        }
    }

    buffer
        .iter()
        .map(|c| {
            let [r, g, b] = c.map(|v| v.clamp(0, 255) as u8);
            color_index(r, g, b)
        })
        .collect()
}

fn diffuse(buffer: &mut [[i32; 3]], x: usize, y: usize, comp: usize, width: usize, height: usize, scale: i32) {
    let at = |x: usize, y: usize| y * width + x;

    let old = buffer[at(x, y)][comp];
    let new = (old / scale) * scale;
    buffer[at(x, y)][comp] = new;

    let err = old - new;
    let right = x + 1 < width;
    let below = y + 1 < height;

    if right {
        buffer[at(x + 1, y)][comp] += err * 7 / 16;
    }
    if x > 0 && below {
        buffer[at(x - 1, y + 1)][comp] += err * 3 / 16;
    }
    if below {
        buffer[at(x, y + 1)][comp] += err * 5 / 16;
    }
    if right && below {
        buffer[at(x + 1, y + 1)][comp] += err / 16;
    }
}

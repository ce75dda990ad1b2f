//! Framebuffer to RGBA conversion for display

use crate::rasterizer::{ColorPalette, Framebuffer, Pixel};

/// Expand color indices through the palette into RGBA bytes.
///
/// Framebuffer storage starts at the bottom row; with `flip` set the output
/// starts at the top row, as window textures expect.
pub fn framebuffer_to_rgba(fb: &Framebuffer, palette: &ColorPalette, flip: bool) -> Vec<u8> {
    let width = fb.width() as usize;
    let mut rgba = Vec::with_capacity(fb.pixels().len() * 4);

    let mut push_row = |row: &[Pixel]| {
        for p in row {
            let c = palette.color(p.color_index);
            rgba.extend_from_slice(&[c.r, c.g, c.b, 255]);
        }
    };

    if flip {
        fb.pixels().chunks_exact(width).rev().for_each(&mut push_row);
    } else {
        fb.pixels().chunks_exact(width).for_each(&mut push_row);
    }

    rgba
}

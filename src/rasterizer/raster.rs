//! Scanline rasterization of clipped polygons, lines and points
//!
//! Everything here works in framebuffer storage coordinates (row 0 is the
//! bottom row). Polygons must already be clipped to the framebuffer.

use super::framebuffer::{encode_depth, Framebuffer, Side};
use super::texture::{MipView, TexelDerivatives};
use super::types::{PolygonMode, RasterVertex, Rect};

#[inline]
fn next(i: usize, n: usize) -> usize {
    if i + 1 >= n {
        0
    } else {
        i + 1
    }
}

#[inline]
fn prev(i: usize, n: usize) -> usize {
    if i == 0 {
        n - 1
    } else {
        i - 1
    }
}

/// Rasterize a convex polygon in the given mode
pub fn polygon(
    fb: &mut Framebuffer,
    verts: &[RasterVertex],
    mode: PolygonMode,
    texture: &MipView,
    color_index: u8,
    perspective: bool,
) {
    match mode {
        PolygonMode::Fill => fill(fb, verts, texture, perspective),
        PolygonMode::Line => outline(fb, verts, texture, perspective),
        PolygonMode::Point => {
            for v in verts {
                fb.plot(v.x, v.y, color_index);
            }
        }
    }
}

/// Depth-tested, textured scanline fill.
///
/// Span ends are exclusive, so polygons sharing an edge never overlap.
pub fn fill(fb: &mut Framebuffer, verts: &[RasterVertex], texture: &MipView, perspective: bool) {
    let n = verts.len();
    if n < 3 {
        return;
    }

    let mut top = 0;
    let mut bottom = 0;
    for (i, v) in verts.iter().enumerate().skip(1) {
        if verts[top].y > v.y {
            top = i;
        }
        if verts[bottom].y < v.y {
            bottom = i;
        }
    }

    let y_start = verts[top].y;
    let y_end = verts[bottom].y;
    if y_start == y_end || y_start < 0 {
        return;
    }

    let mut x = top;
    while x != bottom {
        let y = prev(x, n);
        fb.setup_scanlines(Side::Start, &verts[x], &verts[y]);
        x = y;
    }

    let mut x = top;
    while x != bottom {
        let y = next(x, n);
        fb.setup_scanlines(Side::End, &verts[x], &verts[y]);
        x = y;
    }

    let (pixels, start, end) = fb.span_parts();

    let mid = ((y_start + y_end) / 2) as usize;
    let (left, right) = match (start.get(mid), end.get(mid)) {
        (Some(s), Some(e)) if s.offset > e.offset => (end, start),
        _ => (start, end),
    };

    for row in y_start as usize..=(y_end as usize).min(left.len() - 1) {
        let l = &left[row];
        let r = &right[row];

        let len = r.offset - l.offset;
        if len <= 0 || l.offset < 0 || r.offset as usize > pixels.len() {
            continue;
        }

        let inv_len = 1.0 / len as f32;
        let z_step = (r.z - l.z) * inv_len;
        let u_step = (r.u - l.u) * inv_len;
        let v_step = (r.v - l.v) * inv_len;

        let mut z = l.z;
        let mut u = l.u;
        let mut v = l.v;

        for pixel in &mut pixels[l.offset as usize..r.offset as usize] {
            let depth = encode_depth(z);
            if depth > pixel.depth {
                pixel.depth = depth;
                pixel.color_index = if perspective {
                    let w = 1.0 / z;
                    texture.sample(u * w, v * w)
                } else {
                    texture.sample(u, v)
                };
            }

            z += z_step;
            u += u_step;
            v += v_step;
        }
    }
}

/// Polygon outline, one textured line per edge
pub fn outline(fb: &mut Framebuffer, verts: &[RasterVertex], texture: &MipView, perspective: bool) {
    let n = verts.len();
    for i in 0..n {
        textured_line(fb, &verts[i], &verts[next(i, n)], texture, perspective);
    }
}

/// Bresenham walk from `a` towards `b`; the end point itself is not visited
fn bresenham(a: (i32, i32), b: (i32, i32), mut plot: impl FnMut(i32, i32, i32)) {
    let mut dx = b.0 - a.0;
    let mut dy = b.1 - a.1;

    let inc_x = dx.signum();
    let inc_y = dy.signum();
    dx = dx.abs();
    dy = dy.abs();

    let (pdx, pdy, es, el) = if dx > dy {
        (inc_x, 0, dy, dx)
    } else {
        (0, inc_y, dx, dy)
    };

    if el == 0 {
        return;
    }

    let (mut x, mut y) = a;
    let mut err = el / 2;

    for t in 0..el {
        plot(x, y, t);

        err -= es;
        if err < 0 {
            err += el;
            x += inc_x;
            y += inc_y;
        } else {
            x += pdx;
            y += pdy;
        }
    }
}

/// Line with per-pixel texture sampling and no depth test
pub fn textured_line(
    fb: &mut Framebuffer,
    a: &RasterVertex,
    b: &RasterVertex,
    texture: &MipView,
    perspective: bool,
) {
    let el = (b.x - a.x).abs().max((b.y - a.y).abs());
    let steps = if el > 1 { (el - 1) as f32 } else { 1.0 };

    let u_step = (b.u - a.u) / steps;
    let v_step = (b.v - a.v) / steps;
    let z_step = (b.z - a.z) / steps;

    bresenham((a.x, a.y), (b.x, b.y), |x, y, t| {
        let t = t as f32;
        let (mut u, mut v) = (a.u + u_step * t, a.v + v_step * t);
        if perspective {
            let w = 1.0 / (a.z + z_step * t);
            u *= w;
            v *= w;
        }
        fb.plot(x, y, texture.sample(u, v));
    });
}

/// Solid-color line
pub fn line(fb: &mut Framebuffer, a: (i32, i32), b: (i32, i32), color_index: u8) {
    bresenham(a, b, |x, y, _| fb.plot(x, y, color_index));
}

/// Fill an inclusive rectangle with a texture stretched over it, or with a color.
/// The texture's first row lands on `rect.bottom`, the top row on screen.
pub fn image(fb: &mut Framebuffer, rect: &Rect, texture: Option<&MipView>, color_index: u8) {
    let width = fb.width() as i32;
    let (pixels, _, _) = fb.span_parts();

    let cols = (rect.right - rect.left + 1).max(1) as f32;
    let rows = (rect.bottom - rect.top + 1).max(1) as f32;

    for y in rect.top..=rect.bottom {
        let row = (y * width) as usize;
        let Some(span) = pixels.get_mut(row + rect.left as usize..=row + rect.right as usize) else {
            break;
        };

        match texture {
            Some(tex) => {
                // Sample texel centers so neither edge wraps
                let v = ((rect.bottom - y) as f32 + 0.5) / rows;
                for (i, pixel) in span.iter_mut().enumerate() {
                    pixel.color_index = tex.sample((i as f32 + 0.5) / cols, v);
                }
            }
            None => span.iter_mut().for_each(|p| p.color_index = color_index),
        }
    }
}

/// Texture coordinate change per pixel along the first two edges of a polygon
pub fn texel_derivatives(verts: &[RasterVertex], perspective: bool) -> TexelDerivatives {
    if verts.len() < 3 {
        return TexelDerivatives::default();
    }

    let uv = |v: &RasterVertex| {
        if perspective && v.z != 0.0 {
            (v.u / v.z, v.v / v.z)
        } else {
            (v.u, v.v)
        }
    };
    let edge = |a: &RasterVertex, b: &RasterVertex| {
        let dx = (b.x - a.x) as f32;
        let dy = (b.y - a.y) as f32;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1.0 {
            return (0.0, 0.0);
        }
        let (ua, va) = uv(a);
        let (ub, vb) = uv(b);
        ((ub - ua) / len, (vb - va) / len)
    };

    let (dudx, dvdx) = edge(&verts[0], &verts[1]);
    let (dudy, dvdy) = edge(&verts[0], &verts[2]);
    TexelDerivatives { dudx, dvdx, dudy, dvdy }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::framebuffer::decode_depth;
    use crate::rasterizer::texture::Texture;
    use crate::rasterizer::types::ClearFlags;

    fn rv(x: i32, y: i32) -> RasterVertex {
        RasterVertex::new(x, y, 0.5, 0.0, 0.0)
    }

    fn painted(fb: &Framebuffer) -> usize {
        fb.pixels().iter().filter(|p| p.color_index != 0).count()
    }

    #[test]
    fn test_fill_rectangle_exclusive_right_edge() {
        let mut fb = Framebuffer::new(32, 32).unwrap();
        let tex = Texture::singular(9);
        let quad = [rv(4, 4), rv(12, 4), rv(12, 10), rv(4, 10)];
        fill(&mut fb, &quad, &tex.level(0).unwrap(), false);

        // 8 columns (4..12) by 7 rows (4..=10)
        assert_eq!(painted(&fb), 8 * 7);
        assert_eq!(fb.pixel(4, 4).unwrap().color_index, 9);
        assert_eq!(fb.pixel(11, 10).unwrap().color_index, 9);
        assert_eq!(fb.pixel(12, 7).unwrap().color_index, 0);
        assert!((decode_depth(fb.pixel(5, 5).unwrap().depth) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_fill_winding_independent() {
        let tex = Texture::singular(3);
        let mut cw = Framebuffer::new(32, 32).unwrap();
        let mut ccw = Framebuffer::new(32, 32).unwrap();
        fill(&mut cw, &[rv(2, 2), rv(20, 5), rv(8, 25)], &tex.level(0).unwrap(), false);
        fill(&mut ccw, &[rv(2, 2), rv(8, 25), rv(20, 5)], &tex.level(0).unwrap(), false);
        assert!(painted(&cw) > 0);
        assert_eq!(cw.pixels(), ccw.pixels());
    }

    #[test]
    fn test_quad_has_no_seam() {
        let mut fb = Framebuffer::new(64, 64).unwrap();
        let a = Texture::singular(1);
        let b = Texture::singular(2);

        let (p0, p1, p2, p3) = (rv(10, 10), rv(50, 10), rv(50, 50), rv(10, 50));
        fill(&mut fb, &[p0, p1, p2], &a.level(0).unwrap(), false);
        fill(&mut fb, &[p0, p2, p3], &b.level(0).unwrap(), false);

        for y in 10..=50 {
            for x in 10..50 {
                assert_ne!(fb.pixel(x, y).unwrap().color_index, 0, "gap at {},{}", x, y);
            }
        }
        assert_eq!(painted(&fb), 40 * 41);

        // Either triangle alone produces the same pixels on its side of the diagonal
        let mut alone = Framebuffer::new(64, 64).unwrap();
        fill(&mut alone, &[p0, p1, p2], &a.level(0).unwrap(), false);
        for (i, p) in alone.pixels().iter().enumerate() {
            if p.color_index != 0 {
                assert_eq!(fb.pixels()[i], *p);
            }
        }
    }

    #[test]
    fn test_depth_test_nearest_wins() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        fb.clear(0, 0.0, ClearFlags::ALL);
        let near = Texture::singular(5);
        let far = Texture::singular(6);

        let quad = |z: f32| {
            [(1, 1), (9, 1), (9, 9), (1, 9)].map(|(x, y)| RasterVertex::new(x, y, z, 0.0, 0.0))
        };
        fill(&mut fb, &quad(0.8), &near.level(0).unwrap(), false);
        fill(&mut fb, &quad(0.2), &far.level(0).unwrap(), false);
        assert_eq!(fb.pixel(4, 4).unwrap().color_index, 5);
    }

    #[test]
    fn test_perspective_divides_by_rhw() {
        let mut tex = Texture::new();
        let red = crate::rasterizer::color::Rgb::new(255, 0, 0);
        tex.upload(2, 1, &[crate::rasterizer::color::Rgb::BLACK, red], false, false).unwrap();

        // u stored premultiplied by rhw = 0.5; 0.375 / 0.5 = 0.75 lands in the red texel
        let v = |x, y| RasterVertex::new(x, y, 0.5, 0.375, 0.0);
        let mut fb = Framebuffer::new(8, 8).unwrap();
        fill(&mut fb, &[v(0, 0), v(6, 0), v(6, 6), v(0, 6)], &tex.level(0).unwrap(), true);
        assert_eq!(fb.pixel(2, 2).unwrap().color_index, red.index());

        let mut fb = Framebuffer::new(8, 8).unwrap();
        fill(&mut fb, &[v(0, 0), v(6, 0), v(6, 6), v(0, 6)], &tex.level(0).unwrap(), false);
        assert_eq!(fb.pixel(2, 2).unwrap().color_index, 0);
    }

    #[test]
    fn test_flat_polygon_is_skipped() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        let tex = Texture::singular(1);
        fill(&mut fb, &[rv(1, 3), rv(9, 3), rv(5, 3)], &tex.level(0).unwrap(), false);
        assert_eq!(painted(&fb), 0);
    }

    #[test]
    fn test_line_skips_end_point() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        line(&mut fb, (2, 2), (10, 6), 4);
        assert_eq!(painted(&fb), 8);
        assert_eq!(fb.pixel(2, 2).unwrap().color_index, 4);
        assert_eq!(fb.pixel(10, 6).unwrap().color_index, 0);

        line(&mut fb, (3, 3), (3, 3), 4);
        assert_eq!(painted(&fb), 8);
    }

    #[test]
    fn test_outline_and_points() {
        let tex = Texture::singular(7);
        let tri = [rv(2, 2), rv(12, 2), rv(2, 12)];

        let mut fb = Framebuffer::new(16, 16).unwrap();
        polygon(&mut fb, &tri, PolygonMode::Line, &tex.level(0).unwrap(), 0, false);
        assert_eq!(fb.pixel(5, 2).unwrap().color_index, 7);
        assert_eq!(fb.pixel(2, 5).unwrap().color_index, 7);
        assert_eq!(fb.pixel(5, 5).unwrap().color_index, 0);

        let mut fb = Framebuffer::new(16, 16).unwrap();
        polygon(&mut fb, &tri, PolygonMode::Point, &tex.level(0).unwrap(), 8, false);
        assert_eq!(painted(&fb), 3);
        assert_eq!(fb.pixel(12, 2).unwrap().color_index, 8);
    }

    #[test]
    fn test_image_colored_and_textured() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        image(&mut fb, &Rect::new(1, 1, 3, 2), None, 6);
        assert_eq!(painted(&fb), 3 * 2);

        let mut tex = Texture::new();
        let white = crate::rasterizer::color::Rgb::new(255, 255, 255);
        // Texture row 0 black, row 1 white
        tex.upload(1, 2, &[crate::rasterizer::color::Rgb::BLACK, white], false, false).unwrap();
        let mut fb = Framebuffer::new(8, 8).unwrap();
        image(&mut fb, &Rect::new(0, 0, 7, 7), tex.level(0).as_ref(), 0);
        assert_eq!(fb.pixel(0, 7).unwrap().color_index, 0);
        assert_eq!(fb.pixel(0, 4).unwrap().color_index, 0);
        assert_eq!(fb.pixel(0, 3).unwrap().color_index, 0xff);
        assert_eq!(fb.pixel(7, 0).unwrap().color_index, 0xff);
    }

    #[test]
    fn test_texel_derivatives() {
        let verts = [
            RasterVertex::new(0, 0, 1.0, 0.0, 0.0),
            RasterVertex::new(10, 0, 1.0, 1.0, 0.0),
            RasterVertex::new(0, 20, 1.0, 0.0, 1.0),
        ];
        let d = texel_derivatives(&verts, true);
        assert!((d.dudx - 0.1).abs() < 1e-6);
        assert!((d.dvdy - 0.05).abs() < 1e-6);
        assert_eq!(d.dvdx, 0.0);
    }
}

//! Vertex transform and polygon clipping
//!
//! Triangles are clipped in view space against the near and far planes,
//! projected, culled and then clipped once more in integer screen space
//! against the clip rect. All four clip passes are the same Sutherland-Hodgman
//! walk over the polygon edges:
//!
//! - both endpoints inside: emit the end point
//! - leaving: emit the intersection
//! - entering: emit the intersection, then the end point

use super::error::{Error, Result};
use super::math::{Mat4, Vec4};
use super::types::{ClipVertex, CullMode, RasterVertex, Rect, Vertex, Viewport};

/// Transform vertices in place into screen space.
///
/// `ndc` receives the screen x/y, the divided z and the clip-space w. With
/// `perspective` set the texture coordinates are pre-multiplied by 1/w.
pub fn transform_vertices(vertices: &mut [Vertex], wvp: &Mat4, viewport: &Viewport, perspective: bool) {
    for vertex in vertices {
        let clip = wvp.transform_vec4(Vec4::from_point(vertex.coord));
        let rhw = 1.0 / clip.w;

        let (x, y) = viewport.map(clip.x * rhw, clip.y * rhw);
        vertex.ndc = Vec4::new(x, y, clip.z * rhw, clip.w);

        vertex.proj_tex_coord = if perspective {
            vertex.tex_coord.scale(rhw)
        } else {
            vertex.tex_coord
        };
    }
}

/// True if the triangle's winding is rejected by `mode`
pub fn is_culled(mode: CullMode, a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let vis = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
    match mode {
        CullMode::None => false,
        CullMode::Front => vis > 0.0,
        CullMode::Back => vis < 0.0,
    }
}

/// Per-draw inputs of [`ClipScratch::clip_triangle`]
#[derive(Debug, Clone, Copy)]
pub struct ClipParams<'a> {
    pub world_view: &'a Mat4,
    pub projection: &'a Mat4,
    pub viewport: &'a Viewport,
    pub clip_rect: Rect,
    pub cull_mode: CullMode,
    pub z_near: f32,
    pub z_far: f32,
    pub perspective: bool,
}

/// Reusable, bounds-checked vertex lists for polygon clipping
#[derive(Debug, Clone)]
pub struct ClipScratch {
    max_vertices: usize,
    clip: Vec<ClipVertex>,
    clip_tmp: Vec<ClipVertex>,
    raster: Vec<RasterVertex>,
    raster_tmp: Vec<RasterVertex>,
}

impl ClipScratch {
    pub fn new(max_vertices: usize) -> Self {
        Self {
            max_vertices,
            clip: Vec::with_capacity(max_vertices),
            clip_tmp: Vec::with_capacity(max_vertices),
            raster: Vec::with_capacity(max_vertices),
            raster_tmp: Vec::with_capacity(max_vertices),
        }
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    pub fn clip_vertices(&self) -> &[ClipVertex] {
        &self.clip
    }

    pub fn raster_vertices(&self) -> &[RasterVertex] {
        &self.raster
    }

    /// Load a triangle as view-space clip vertices
    pub fn load_triangle(&mut self, tri: [&Vertex; 3], world_view: &Mat4) {
        self.clip.clear();
        for v in tri {
            let p = world_view.transform_point(v.coord);
            self.clip.push(ClipVertex {
                x: p.x,
                y: p.y,
                z: p.z,
                w: 1.0,
                u: v.tex_coord.x,
                v: v.tex_coord.y,
            });
        }
    }

    pub fn load_raster(&mut self, vertices: &[RasterVertex]) -> Result<()> {
        if vertices.len() > self.max_vertices {
            return Err(overflow(self.max_vertices));
        }
        self.raster.clear();
        self.raster.extend_from_slice(vertices);
        Ok(())
    }

    /// Clip against z >= near, then z <= far
    pub fn clip_z(&mut self, near: f32, far: f32) -> Result<()> {
        clip_pass(&self.clip, &mut self.clip_tmp, self.max_vertices, |v| v.z >= near, |a, b| {
            zplane_vertex(a, b, near)
        })?;
        clip_pass(&self.clip_tmp, &mut self.clip, self.max_vertices, |v| v.z <= far, |a, b| {
            zplane_vertex(a, b, far)
        })
    }

    /// Project the clip vertices to the screen (z becomes 1/w) and convert them to raster vertices
    pub fn project(&mut self, projection: &Mat4, viewport: &Viewport, perspective: bool) {
        for v in &mut self.clip {
            let p = projection.transform_vec4(Vec4::new(v.x, v.y, v.z, v.w));
            let rhw = 1.0 / p.w;

            let (x, y) = viewport.map(p.x * rhw, p.y * rhw);
            v.x = x;
            v.y = y;
            v.z = rhw;
            if perspective {
                v.u *= rhw;
                v.v *= rhw;
            }
        }

        self.raster.clear();
        self.raster.extend(
            self.clip
                .iter()
                .map(|v| RasterVertex::new(v.x as i32, v.y as i32, v.z, v.u, v.v)),
        );
    }

    /// Clip the raster polygon against the inclusive edges of `rect`
    pub fn clip_xy(&mut self, rect: &Rect) -> Result<()> {
        let max = self.max_vertices;
        clip_pass(&self.raster, &mut self.raster_tmp, max, |v| v.x >= rect.left, |a, b| {
            xplane_vertex(a, b, rect.left)
        })?;
        clip_pass(&self.raster_tmp, &mut self.raster, max, |v| v.x <= rect.right, |a, b| {
            xplane_vertex(a, b, rect.right)
        })?;
        clip_pass(&self.raster, &mut self.raster_tmp, max, |v| v.y >= rect.top, |a, b| {
            yplane_vertex(a, b, rect.top)
        })?;
        clip_pass(&self.raster_tmp, &mut self.raster, max, |v| v.y <= rect.bottom, |a, b| {
            yplane_vertex(a, b, rect.bottom)
        })
    }

    /// Run the whole clip chain for one triangle. `None` means nothing is left to rasterize.
    pub fn clip_triangle(&mut self, tri: [&Vertex; 3], params: &ClipParams) -> Result<Option<&[RasterVertex]>> {
        self.load_triangle(tri, params.world_view);

        self.clip_z(params.z_near, params.z_far)?;
        if self.clip.len() < 3 {
            return Ok(None);
        }

        self.project(params.projection, params.viewport, params.perspective);

        let corner = |v: &ClipVertex| (v.x, v.y);
        if is_culled(params.cull_mode, corner(&self.clip[0]), corner(&self.clip[1]), corner(&self.clip[2])) {
            return Ok(None);
        }

        self.clip_xy(&params.clip_rect)?;
        if self.raster.len() < 3 {
            return Ok(None);
        }

        Ok(Some(self.raster.as_slice()))
    }
}

fn overflow(max: usize) -> Error {
    Error::invalid_state(format!("clipped polygon exceeds {} vertices", max))
}

fn clip_pass<T: Copy>(
    src: &[T],
    dst: &mut Vec<T>,
    max: usize,
    inside: impl Fn(&T) -> bool,
    intersect: impl Fn(&T, &T) -> T,
) -> Result<()> {
    let push = |dst: &mut Vec<T>, v: T| {
        if dst.len() >= max {
            return Err(overflow(max));
        }
        dst.push(v);
        Ok(())
    };

    dst.clear();
    let Some(mut prev) = src.last() else {
        return Ok(());
    };

    for cur in src {
        match (inside(prev), inside(cur)) {
            (true, true) => push(dst, *cur)?,
            (true, false) => push(dst, intersect(prev, cur))?,
            (false, true) => {
                push(dst, intersect(prev, cur))?;
                push(dst, *cur)?;
            }
            (false, false) => {}
        }
        prev = cur;
    }
    Ok(())
}

fn zplane_vertex(a: &ClipVertex, b: &ClipVertex, z: f32) -> ClipVertex {
    let m = (z - b.z) / (a.z - b.z);
    ClipVertex {
        x: m * (a.x - b.x) + b.x,
        y: m * (a.y - b.y) + b.y,
        z,
        w: 1.0,
        u: m * (a.u - b.u) + b.u,
        v: m * (a.v - b.v) + b.v,
    }
}

fn xplane_vertex(a: &RasterVertex, b: &RasterVertex, x: i32) -> RasterVertex {
    let m = (x - b.x) as f32 / (a.x - b.x) as f32;
    RasterVertex {
        x,
        y: (m * (a.y - b.y) as f32 + b.y as f32) as i32,
        z: m * (a.z - b.z) + b.z,
        u: m * (a.u - b.u) + b.u,
        v: m * (a.v - b.v) + b.v,
    }
}

fn yplane_vertex(a: &RasterVertex, b: &RasterVertex, y: i32) -> RasterVertex {
    let m = (y - b.y) as f32 / (a.y - b.y) as f32;
    RasterVertex {
        x: (m * (a.x - b.x) as f32 + b.x as f32) as i32,
        y,
        z: m * (a.z - b.z) + b.z,
        u: m * (a.u - b.u) + b.u,
        v: m * (a.v - b.v) + b.v,
    }
}

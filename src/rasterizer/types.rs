//! Core types for the rasterizer

use std::ops::BitOr;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::math::{Vec2, Vec3, Vec4};

macro_rules! resource_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) usize);

            impl $name {
                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

resource_id!(
    /// Handle to a framebuffer owned by a [`Context`](super::Context)
    FramebufferId,
    VertexBufferId,
    IndexBufferId,
    TextureId,
    StateMachineId,
);

/// Vertex as supplied by the caller and stored on disk: position + texture coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub u: f32,
    pub v: f32,
}

impl VertexData {
    pub fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self { x, y, z, u, v }
    }
}

/// A vertex buffer entry: object-space input plus the transformed result
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub coord: Vec3,
    pub tex_coord: Vec2,
    /// Screen x/y, NDC z and the clip-space w after [`transform`](super::pipeline::transform_vertices)
    pub ndc: Vec4,
    /// Texture coordinate, divided by w in perspective-corrected mode
    pub proj_tex_coord: Vec2,
}

impl Vertex {
    pub fn from_data(data: &VertexData) -> Self {
        Self {
            coord: Vec3::new(data.x, data.y, data.z),
            tex_coord: Vec2::new(data.u, data.v),
            ..Default::default()
        }
    }

    pub fn to_data(&self) -> VertexData {
        VertexData::new(self.coord.x, self.coord.y, self.coord.z, self.tex_coord.x, self.tex_coord.y)
    }
}

/// Polygon vertex during near/far clipping (view space)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub u: f32,
    pub v: f32,
}

/// Polygon vertex after projection (screen space)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RasterVertex {
    pub x: i32,
    pub y: i32,
    /// Reciprocal w; larger is nearer
    pub z: f32,
    pub u: f32,
    pub v: f32,
}

impl RasterVertex {
    pub fn new(x: i32, y: i32, z: f32, u: f32, v: f32) -> Self {
        Self { x, y, z, u, v }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Toggleable render states, addressable by raw index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    Scissor = 0,
    MipMapping = 1,
}

impl Capability {
    pub const COUNT: usize = 2;

    pub fn from_index(index: u32) -> Result<Self> {
        match index {
            0 => Ok(Capability::Scissor),
            1 => Ok(Capability::MipMapping),
            _ => Err(Error::IndexOutOfBounds { index: index as usize, len: Self::COUNT }),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Which parts of a framebuffer a clear touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearFlags(u32);

impl ClearFlags {
    pub const COLOR: ClearFlags = ClearFlags(0x1);
    pub const DEPTH: ClearFlags = ClearFlags(0x2);
    pub const ALL: ClearFlags = ClearFlags(0x3);

    pub fn contains(self, other: ClearFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClearFlags {
    type Output = ClearFlags;
    fn bitor(self, rhs: ClearFlags) -> ClearFlags {
        ClearFlags(self.0 | rhs.0)
    }
}

/// Viewport transform; the extent is stored halved so NDC mapping is one multiply-add
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
            half_width: 0.5 * width as f32,
            half_height: 0.5 * height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// NDC [-1, 1] to screen pixels, +0.5 rounds to the nearest pixel on truncation
    pub fn map(&self, ndc_x: f32, ndc_y: f32) -> (f32, f32) {
        (
            self.x + (ndc_x + 1.0) * self.half_width + 0.5,
            self.y + (ndc_y + 1.0) * self.half_height + 0.5,
        )
    }
}

/// Integer rectangle with inclusive edges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Rectangle covering `width` x `height` pixels starting at (x, y)
    pub fn from_extent(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width as i32 - 1,
            bottom: y + height as i32 - 1,
        }
    }

    /// Overlap of both rectangles; a disjoint pair yields an empty rect
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right).max(left - 1);
        let bottom = self.bottom.min(other.bottom).max(top - 1);
        Rect { left, top, right, bottom }
    }

    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.left >= self.left
                && other.right <= self.right
                && other.top >= self.top
                && other.bottom <= self.bottom)
    }
}

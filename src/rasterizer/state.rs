//! Render state: matrices, viewport, clipping rectangles and resource bindings
//!
//! A state machine never renders. It only keeps everything a draw call reads,
//! with the derived matrix products and the clip rect kept consistent after
//! every setter.

use super::error::{Error, Result};
use super::math::Mat4;
use super::types::{
    Capability, CullMode, FramebufferId, IndexBufferId, PolygonMode, Rect, TextureId,
    VertexBufferId, Viewport,
};

#[derive(Debug, Clone)]
pub struct StateMachine {
    projection: Mat4,
    view: Mat4,
    world: Mat4,
    view_projection: Mat4,
    world_view: Mat4,
    world_view_projection: Mat4,

    viewport: Viewport,
    framebuffer_rect: Rect,
    viewport_rect: Rect,
    scissor_rect: Rect,
    clip_rect: Rect,

    framebuffer: Option<FramebufferId>,
    vertex_buffer: Option<VertexBufferId>,
    index_buffer: Option<IndexBufferId>,
    texture: Option<TextureId>,
    ref_count: usize,

    capabilities: [bool; Capability::COUNT],
    color_index: u8,
    cull_mode: CullMode,
    polygon_mode: PolygonMode,
    lod_bias: u8,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            world_view: Mat4::IDENTITY,
            world_view_projection: Mat4::IDENTITY,
            viewport: Viewport::new(0, 0, 0, 0),
            framebuffer_rect: Rect::new(0, 0, -1, -1),
            viewport_rect: Rect::new(0, 0, -1, -1),
            scissor_rect: Rect::new(0, 0, -1, -1),
            clip_rect: Rect::new(0, 0, -1, -1),
            framebuffer: None,
            vertex_buffer: None,
            index_buffer: None,
            texture: None,
            ref_count: 0,
            capabilities: [false; Capability::COUNT],
            color_index: 0,
            cull_mode: CullMode::None,
            polygon_mode: PolygonMode::Fill,
            lod_bias: 0,
        }
    }

    // --- Matrices ---

    pub fn set_projection(&mut self, m: Mat4) {
        self.projection = m;
        self.view_projection = self.projection.mul(&self.view);
        self.world_view_projection = self.view_projection.mul(&self.world);
    }

    pub fn set_view(&mut self, m: Mat4) {
        self.view = m;
        self.view_projection = self.projection.mul(&self.view);
        self.world_view = self.view.mul(&self.world);
        self.world_view_projection = self.view_projection.mul(&self.world);
    }

    pub fn set_world(&mut self, m: Mat4) {
        self.world = m;
        self.world_view = self.view.mul(&self.world);
        self.world_view_projection = self.view_projection.mul(&self.world);
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn world_view(&self) -> &Mat4 {
        &self.world_view
    }

    pub fn world_view_projection(&self) -> &Mat4 {
        &self.world_view_projection
    }

    // --- Bindings ---

    fn track<T>(ref_count: &mut usize, slot: &mut Option<T>, new: Option<T>) {
        match (slot.is_some(), new.is_some()) {
            (false, true) => *ref_count += 1,
            (true, false) => *ref_count -= 1,
            _ => {}
        }
        *slot = new;
    }

    /// Binds a framebuffer of the given extent, resetting viewport and clip rect to cover it
    pub fn bind_framebuffer(&mut self, framebuffer: Option<(FramebufferId, u32, u32)>) {
        Self::track(&mut self.ref_count, &mut self.framebuffer, framebuffer.map(|(id, _, _)| id));

        match framebuffer {
            Some((_, width, height)) => {
                self.framebuffer_rect = Rect::from_extent(0, 0, width, height);
                self.viewport = Viewport::new(0, 0, width, height);
            }
            None => {
                self.framebuffer_rect = Rect::new(0, 0, -1, -1);
                self.viewport = Viewport::new(0, 0, 0, 0);
            }
        }
        self.viewport_rect = self.framebuffer_rect;
        self.update_clip_rect();
    }

    pub fn bind_vertex_buffer(&mut self, id: Option<VertexBufferId>) {
        Self::track(&mut self.ref_count, &mut self.vertex_buffer, id);
    }

    pub fn bind_index_buffer(&mut self, id: Option<IndexBufferId>) {
        Self::track(&mut self.ref_count, &mut self.index_buffer, id);
    }

    pub fn bind_texture(&mut self, id: Option<TextureId>) {
        Self::track(&mut self.ref_count, &mut self.texture, id);
    }

    pub fn framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    pub fn vertex_buffer(&self) -> Option<VertexBufferId> {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<IndexBufferId> {
        self.index_buffer
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Number of currently bound resources
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// Drop every binding; used when a resource is deleted while bound
    pub(crate) fn unbind_all(&mut self) {
        self.bind_framebuffer(None);
        self.bind_vertex_buffer(None);
        self.bind_index_buffer(None);
        self.bind_texture(None);
    }

    // --- Viewport and clipping ---

    /// Viewport in framebuffer pixels (origin at the bottom row)
    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        if self.framebuffer.is_none() {
            return Err(Error::invalid_state("viewport set without a bound framebuffer"));
        }

        let Viewport { min_depth, max_depth, .. } = self.viewport;
        self.viewport = Viewport {
            min_depth,
            max_depth,
            ..Viewport::new(x, y, width, height)
        };
        self.viewport_rect = Rect::from_extent(x, y, width, height).intersect(&self.framebuffer_rect);
        self.update_clip_rect();
        Ok(())
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        if self.framebuffer.is_none() {
            return Err(Error::invalid_state("scissor set without a bound framebuffer"));
        }

        self.scissor_rect = Rect::from_extent(x, y, width, height);
        self.update_clip_rect();
        Ok(())
    }

    pub fn set_depth_range(&mut self, min_depth: f32, max_depth: f32) {
        self.viewport.min_depth = min_depth.clamp(0.0, 1.0);
        self.viewport.max_depth = max_depth.clamp(0.0, 1.0);
    }

    fn update_clip_rect(&mut self) {
        self.clip_rect = if self.is_enabled(Capability::Scissor) {
            self.viewport_rect.intersect(&self.scissor_rect)
        } else {
            self.viewport_rect
        };
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_rect(&self) -> Rect {
        self.viewport_rect
    }

    pub fn scissor_rect(&self) -> Rect {
        self.scissor_rect
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip_rect
    }

    // --- Scalar state ---

    pub fn set_capability(&mut self, cap: Capability, enabled: bool) {
        self.capabilities[cap.index()] = enabled;
        if cap == Capability::Scissor {
            self.update_clip_rect();
        }
    }

    /// Same as [`set_capability`](Self::set_capability) for a raw index; out of range leaves state unchanged
    pub fn set_capability_index(&mut self, index: u32, enabled: bool) -> Result<()> {
        let cap = Capability::from_index(index)?;
        self.set_capability(cap, enabled);
        Ok(())
    }

    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.capabilities[cap.index()]
    }

    pub fn set_color_index(&mut self, color_index: u8) {
        self.color_index = color_index;
    }

    pub fn color_index(&self) -> u8 {
        self.color_index
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    pub fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.polygon_mode = mode;
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.polygon_mode
    }

    pub fn set_lod_bias(&mut self, bias: u8) {
        self.lod_bias = bias;
    }

    pub fn lod_bias(&self) -> u8 {
        self.lod_bias
    }
}

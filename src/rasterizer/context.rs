//! Render context: resource registries, the current state machine and draw calls
//!
//! All public rendering goes through [`Context`]. Resources are created by the
//! context and referred to by typed ids; state machines only hold those ids.
//! Each operation validates its inputs before touching anything, returns the
//! failure and also records it in the context's [`ErrorState`].

use std::ops::Range;
use std::path::Path;

use crate::config::RenderConfig;

use super::buffer::{IndexBuffer, VertexBuffer};
use super::color::Rgb;
use super::error::{Error, ErrorHandler, ErrorKind, ErrorState, Result};
use super::framebuffer::Framebuffer;
use super::image::Image;
use super::math::Mat4;
use super::pipeline::{transform_vertices, ClipParams, ClipScratch};
use super::raster;
use super::state::StateMachine;
use super::texture::{TexelDerivatives, Texture, MAX_TEXTURE_SIZE};
use super::types::{
    Capability, ClearFlags, CullMode, FramebufferId, IndexBufferId, PolygonMode, Primitive, RasterVertex,
    Rect, StateMachineId, TextureId, VertexBufferId, VertexData,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const RENDERER: &str = "bonnie-raster software rasterizer (r3g3b2)";

/// Slot storage with id reuse after deletion
#[derive(Debug)]
struct Registry<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Registry<T> {
    fn insert(&mut self, item: T) -> usize {
        if let Some(i) = self.slots.iter().position(Option::is_none) {
            self.slots[i] = Some(item);
            i
        } else {
            self.slots.push(Some(item));
            self.slots.len() - 1
        }
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

fn invalid_id(kind: &str, index: usize) -> Error {
    Error::InvalidId(format!("{} {} does not exist", kind, index))
}

fn no_current_state() -> Error {
    Error::invalid_state("no state machine is current")
}

/// `first..first + count`, checked against a buffer of `len` elements
fn draw_range(first: usize, count: usize, len: usize) -> Result<Range<usize>> {
    match first.checked_add(count) {
        Some(end) if end <= len => Ok(first..end),
        end => Err(Error::IndexOutOfBounds { index: end.unwrap_or(usize::MAX), len }),
    }
}

/// Vertex positions (relative to the draw range) forming each triangle
fn triangle_list(primitive: Primitive, count: usize) -> Vec<[usize; 3]> {
    match primitive {
        Primitive::Triangles => (0..count / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
        Primitive::TriangleStrip => (0..count.saturating_sub(2))
            .map(|i| if i % 2 == 0 { [i, i + 1, i + 2] } else { [i + 1, i, i + 2] })
            .collect(),
        Primitive::TriangleFan => (1..count.saturating_sub(1)).map(|i| [0, i, i + 1]).collect(),
        _ => Vec::new(),
    }
}

/// Vertex positions (relative to the draw range) forming each line segment
fn line_list(primitive: Primitive, count: usize) -> Vec<[usize; 2]> {
    match primitive {
        Primitive::Lines => (0..count / 2).map(|l| [l * 2, l * 2 + 1]).collect(),
        Primitive::LineStrip => (1..count).map(|i| [i - 1, i]).collect(),
        Primitive::LineLoop => {
            let mut lines: Vec<[usize; 2]> = (1..count).map(|i| [i - 1, i]).collect();
            if count > 2 {
                lines.push([count - 1, 0]);
            }
            lines
        }
        _ => Vec::new(),
    }
}

/// Mip level for a polygon: derivative based level plus bias, clamped to the chain
fn select_mip(texture: &Texture, d: &TexelDerivatives, config: &RenderConfig, lod_bias: u8) -> usize {
    let last = texture.mips().saturating_sub(1);
    (texture.compute_mip_level(d, config.math_mode) + lod_bias as usize).min(last)
}

pub struct Context {
    config: RenderConfig,
    errors: ErrorState,
    scratch: ClipScratch,

    framebuffers: Registry<Framebuffer>,
    vertex_buffers: Registry<VertexBuffer>,
    index_buffers: Registry<IndexBuffer>,
    textures: Registry<Texture>,
    state_machines: Registry<StateMachine>,

    /// Active while no state machine is current; holds no bindings
    null_state: StateMachine,
    current: Option<StateMachineId>,
}

impl Context {
    /// New context with one default state machine made current
    pub fn new(config: RenderConfig) -> Self {
        let mut ctx = Self {
            scratch: ClipScratch::new(config.max_polygon_vertices),
            errors: ErrorState::new(),
            framebuffers: Registry::default(),
            vertex_buffers: Registry::default(),
            index_buffers: Registry::default(),
            textures: Registry::default(),
            state_machines: Registry::default(),
            null_state: StateMachine::new(),
            current: None,
            config,
        };
        let id = ctx.create_state_machine();
        ctx.current = Some(id);
        ctx
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Records a failed result in the error state and passes it through
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.errors.record(e);
        }
        result
    }

    // --- Errors ---

    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.errors.set_handler(handler);
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.errors.last()
    }

    /// Returns the last error and resets it
    pub fn take_error(&mut self) -> Option<ErrorKind> {
        self.errors.take()
    }

    // --- Queries ---

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn renderer(&self) -> &'static str {
        RENDERER
    }

    pub fn max_texture_size(&self) -> u32 {
        MAX_TEXTURE_SIZE
    }

    pub fn texture_level_width(&mut self, id: TextureId, mip: usize) -> Result<u32> {
        let r = self.texture_level(id, mip).map(|(w, _)| w);
        self.check(r)
    }

    pub fn texture_level_height(&mut self, id: TextureId, mip: usize) -> Result<u32> {
        let r = self.texture_level(id, mip).map(|(_, h)| h);
        self.check(r)
    }

    fn texture_level(&self, id: TextureId, mip: usize) -> Result<(u32, u32)> {
        let tex = self.textures.get(id.0).ok_or_else(|| invalid_id("texture", id.0))?;
        match (tex.level_width(mip), tex.level_height(mip)) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(Error::IndexOutOfBounds { index: mip, len: tex.mips() }),
        }
    }

    // --- State machines ---

    pub fn create_state_machine(&mut self) -> StateMachineId {
        let mut state = StateMachine::new();
        state.set_capability(Capability::MipMapping, self.config.mip_mapping);
        let id = StateMachineId(self.state_machines.insert(state));
        log::debug!("created state machine {}", id.0);
        id
    }

    /// Releases a state machine. It should have no bindings left.
    pub fn delete_state_machine(&mut self, id: StateMachineId) -> Result<()> {
        let r = match self.state_machines.remove(id.0) {
            Some(state) => {
                if state.ref_count() > 0 {
                    log::error!(
                        "state machine {} released with {} bound resources",
                        id.0,
                        state.ref_count()
                    );
                }
                if self.current == Some(id) {
                    self.current = None;
                }
                log::debug!("deleted state machine {}", id.0);
                Ok(())
            }
            None => Err(invalid_id("state machine", id.0)),
        };
        self.check(r)
    }

    /// Makes a state machine current; `None` activates the null state machine
    pub fn make_current(&mut self, id: Option<StateMachineId>) -> Result<()> {
        let r = match id {
            Some(id) if self.state_machines.get(id.0).is_none() => Err(invalid_id("state machine", id.0)),
            _ => {
                self.current = id;
                Ok(())
            }
        };
        self.check(r)
    }

    pub fn current(&self) -> Option<StateMachineId> {
        self.current
    }

    /// The current state machine, or the null one
    pub fn state(&self) -> &StateMachine {
        self.current
            .and_then(|id| self.state_machines.get(id.0))
            .unwrap_or(&self.null_state)
    }

    fn state_mut(&mut self) -> &mut StateMachine {
        match self.current.and_then(|id| self.state_machines.get_mut(id.0)) {
            Some(state) => state,
            None => &mut self.null_state,
        }
    }

    /// Binding requires a real state machine; the null one stays empty
    fn bindable_state(&mut self) -> Result<&mut StateMachine> {
        let id = self.current.ok_or_else(no_current_state)?;
        self.state_machines
            .get_mut(id.0)
            .ok_or_else(|| invalid_id("state machine", id.0))
    }

    fn for_each_state(&mut self, mut f: impl FnMut(&mut StateMachine)) {
        self.state_machines.iter_mut().for_each(&mut f);
        f(&mut self.null_state);
    }

    // --- Framebuffers ---

    pub fn create_framebuffer(&mut self, width: u32, height: u32) -> Result<FramebufferId> {
        let r = Framebuffer::new(width, height).map(|fb| {
            let id = FramebufferId(self.framebuffers.insert(fb));
            log::debug!("created framebuffer {} ({}x{})", id.0, width, height);
            id
        });
        self.check(r)
    }

    pub fn delete_framebuffer(&mut self, id: FramebufferId) -> Result<()> {
        let r = match self.framebuffers.remove(id.0) {
            Some(_) => {
                self.for_each_state(|s| {
                    if s.framebuffer() == Some(id) {
                        s.bind_framebuffer(None);
                    }
                });
                log::debug!("deleted framebuffer {}", id.0);
                Ok(())
            }
            None => Err(invalid_id("framebuffer", id.0)),
        };
        self.check(r)
    }

    pub fn framebuffer(&self, id: FramebufferId) -> Option<&Framebuffer> {
        self.framebuffers.get(id.0)
    }

    pub fn bind_framebuffer(&mut self, id: Option<FramebufferId>) -> Result<()> {
        let r = self.bind_framebuffer_inner(id);
        self.check(r)
    }

    fn bind_framebuffer_inner(&mut self, id: Option<FramebufferId>) -> Result<()> {
        let target = match id {
            Some(id) => {
                let fb = self.framebuffers.get(id.0).ok_or_else(|| invalid_id("framebuffer", id.0))?;
                Some((id, fb.width(), fb.height()))
            }
            None => None,
        };
        self.bindable_state()?.bind_framebuffer(target);
        Ok(())
    }

    /// Clears the bound framebuffer
    pub fn clear(&mut self, color_index: u8, depth: f32, flags: ClearFlags) -> Result<()> {
        let r = self.bound_framebuffer().map(|fb| fb.clear(color_index, depth, flags));
        self.check(r)
    }

    fn bound_framebuffer(&mut self) -> Result<&mut Framebuffer> {
        let id = self
            .state()
            .framebuffer()
            .ok_or_else(|| Error::invalid_state("no framebuffer bound"))?;
        self.framebuffers.get_mut(id.0).ok_or_else(|| invalid_id("framebuffer", id.0))
    }

    // --- Vertex and index buffers ---

    pub fn create_vertex_buffer(&mut self) -> VertexBufferId {
        let id = VertexBufferId(self.vertex_buffers.insert(VertexBuffer::new()));
        log::debug!("created vertex buffer {}", id.0);
        id
    }

    pub fn delete_vertex_buffer(&mut self, id: VertexBufferId) -> Result<()> {
        let r = match self.vertex_buffers.remove(id.0) {
            Some(_) => {
                self.for_each_state(|s| {
                    if s.vertex_buffer() == Some(id) {
                        s.bind_vertex_buffer(None);
                    }
                });
                log::debug!("deleted vertex buffer {}", id.0);
                Ok(())
            }
            None => Err(invalid_id("vertex buffer", id.0)),
        };
        self.check(r)
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Option<&VertexBuffer> {
        self.vertex_buffers.get(id.0)
    }

    pub fn bind_vertex_buffer(&mut self, id: Option<VertexBufferId>) -> Result<()> {
        let r = match id {
            Some(id) if self.vertex_buffers.get(id.0).is_none() => Err(invalid_id("vertex buffer", id.0)),
            _ => self.bindable_state().map(|s| s.bind_vertex_buffer(id)),
        };
        self.check(r)
    }

    pub fn vertex_buffer_data(&mut self, id: VertexBufferId, data: &[VertexData]) -> Result<()> {
        let r = self.vertex_buffer_mut(id).map(|vb| vb.data(data));
        self.check(r)
    }

    pub fn load_vertex_buffer<P: AsRef<Path>>(&mut self, id: VertexBufferId, path: P) -> Result<()> {
        let r = self.vertex_buffer_mut(id).and_then(|vb| vb.load_file(path));
        self.check(r)
    }

    pub fn save_vertex_buffer<P: AsRef<Path>>(&mut self, id: VertexBufferId, path: P) -> Result<()> {
        let r = self.vertex_buffer_mut(id).and_then(|vb| vb.save_file(path));
        self.check(r)
    }

    fn vertex_buffer_mut(&mut self, id: VertexBufferId) -> Result<&mut VertexBuffer> {
        self.vertex_buffers.get_mut(id.0).ok_or_else(|| invalid_id("vertex buffer", id.0))
    }

    pub fn create_index_buffer(&mut self) -> IndexBufferId {
        let id = IndexBufferId(self.index_buffers.insert(IndexBuffer::new()));
        log::debug!("created index buffer {}", id.0);
        id
    }

    pub fn delete_index_buffer(&mut self, id: IndexBufferId) -> Result<()> {
        let r = match self.index_buffers.remove(id.0) {
            Some(_) => {
                self.for_each_state(|s| {
                    if s.index_buffer() == Some(id) {
                        s.bind_index_buffer(None);
                    }
                });
                log::debug!("deleted index buffer {}", id.0);
                Ok(())
            }
            None => Err(invalid_id("index buffer", id.0)),
        };
        self.check(r)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Option<&IndexBuffer> {
        self.index_buffers.get(id.0)
    }

    pub fn bind_index_buffer(&mut self, id: Option<IndexBufferId>) -> Result<()> {
        let r = match id {
            Some(id) if self.index_buffers.get(id.0).is_none() => Err(invalid_id("index buffer", id.0)),
            _ => self.bindable_state().map(|s| s.bind_index_buffer(id)),
        };
        self.check(r)
    }

    pub fn index_buffer_data(&mut self, id: IndexBufferId, data: &[u16]) -> Result<()> {
        let r = self.index_buffer_mut(id).map(|ib| ib.data(data));
        self.check(r)
    }

    pub fn load_index_buffer<P: AsRef<Path>>(&mut self, id: IndexBufferId, path: P) -> Result<()> {
        let r = self.index_buffer_mut(id).and_then(|ib| ib.load_file(path));
        self.check(r)
    }

    pub fn save_index_buffer<P: AsRef<Path>>(&mut self, id: IndexBufferId, path: P) -> Result<()> {
        let r = self.index_buffer_mut(id).and_then(|ib| ib.save_file(path));
        self.check(r)
    }

    fn index_buffer_mut(&mut self, id: IndexBufferId) -> Result<&mut IndexBuffer> {
        self.index_buffers.get_mut(id.0).ok_or_else(|| invalid_id("index buffer", id.0))
    }

    // --- Textures ---

    pub fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.textures.insert(Texture::new()));
        log::debug!("created texture {}", id.0);
        id
    }

    pub fn delete_texture(&mut self, id: TextureId) -> Result<()> {
        let r = match self.textures.remove(id.0) {
            Some(_) => {
                self.for_each_state(|s| {
                    if s.texture() == Some(id) {
                        s.bind_texture(None);
                    }
                });
                log::debug!("deleted texture {}", id.0);
                Ok(())
            }
            None => Err(invalid_id("texture", id.0)),
        };
        self.check(r)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    pub fn bind_texture(&mut self, id: Option<TextureId>) -> Result<()> {
        let r = match id {
            Some(id) if self.textures.get(id.0).is_none() => Err(invalid_id("texture", id.0)),
            _ => self.bindable_state().map(|s| s.bind_texture(id)),
        };
        self.check(r)
    }

    pub fn texture_upload(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        pixels: &[Rgb],
        dither: bool,
        generate_mips: bool,
    ) -> Result<()> {
        let r = self
            .texture_mut(id)
            .and_then(|tex| tex.upload(width, height, pixels, dither, generate_mips));
        self.check(r)
    }

    pub fn texture_upload_image(&mut self, id: TextureId, image: &Image, dither: bool, generate_mips: bool) -> Result<()> {
        let r = self
            .texture_mut(id)
            .and_then(|tex| tex.upload_image(image, dither, generate_mips));
        self.check(r)
    }

    fn texture_mut(&mut self, id: TextureId) -> Result<&mut Texture> {
        self.textures.get_mut(id.0).ok_or_else(|| invalid_id("texture", id.0))
    }

    // --- Render state ---

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let r = self.state_mut().set_viewport(x, y, width, height);
        self.check(r)
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let r = self.state_mut().set_scissor(x, y, width, height);
        self.check(r)
    }

    pub fn set_depth_range(&mut self, min_depth: f32, max_depth: f32) {
        self.state_mut().set_depth_range(min_depth, max_depth);
    }

    pub fn enable(&mut self, cap: Capability) {
        self.state_mut().set_capability(cap, true);
    }

    pub fn disable(&mut self, cap: Capability) {
        self.state_mut().set_capability(cap, false);
    }

    /// Toggle a capability by raw index
    pub fn set_capability(&mut self, index: u32, enabled: bool) -> Result<()> {
        let r = self.state_mut().set_capability_index(index, enabled);
        self.check(r)
    }

    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.state().is_enabled(cap)
    }

    pub fn set_color_index(&mut self, color_index: u8) {
        self.state_mut().set_color_index(color_index);
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.state_mut().set_cull_mode(mode);
    }

    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.state_mut().set_polygon_mode(mode);
    }

    pub fn set_lod_bias(&mut self, bias: u8) {
        self.state_mut().set_lod_bias(bias);
    }

    pub fn set_projection(&mut self, m: Mat4) {
        self.state_mut().set_projection(m);
    }

    pub fn set_view(&mut self, m: Mat4) {
        self.state_mut().set_view(m);
    }

    pub fn set_world(&mut self, m: Mat4) {
        self.state_mut().set_world(m);
    }

    // --- Drawing ---

    /// Draw `count` vertices of the bound vertex buffer starting at `first`
    pub fn draw(&mut self, primitive: Primitive, count: usize, first: usize) -> Result<()> {
        let r = self.render(primitive, count, first, false);
        self.check(r)
    }

    /// Draw `count` indices of the bound index buffer starting at `first`
    pub fn draw_indexed(&mut self, primitive: Primitive, count: usize, first: usize) -> Result<()> {
        let r = self.render(primitive, count, first, true);
        self.check(r)
    }

    fn render(&mut self, primitive: Primitive, count: usize, first: usize, indexed: bool) -> Result<()> {
        let Context {
            config,
            scratch,
            framebuffers,
            vertex_buffers,
            index_buffers,
            textures,
            state_machines,
            current,
            ..
        } = self;

        let state = current
            .and_then(|id| state_machines.get(id.0))
            .ok_or_else(no_current_state)?;
        let fb_id = state
            .framebuffer()
            .ok_or_else(|| Error::invalid_state("no framebuffer bound"))?;
        let vb_id = state
            .vertex_buffer()
            .ok_or_else(|| Error::null_reference("no vertex buffer bound"))?;
        let fb = framebuffers.get_mut(fb_id.0).ok_or_else(|| invalid_id("framebuffer", fb_id.0))?;
        let vb = vertex_buffers.get_mut(vb_id.0).ok_or_else(|| invalid_id("vertex buffer", vb_id.0))?;

        // Resolve the draw range to vertex indices, all validated before any work
        let indices: Vec<usize> = if indexed {
            let ib_id = state
                .index_buffer()
                .ok_or_else(|| Error::null_reference("no index buffer bound"))?;
            let ib = index_buffers.get(ib_id.0).ok_or_else(|| invalid_id("index buffer", ib_id.0))?;
            let range = draw_range(first, count, ib.len())?;
            let range = &ib.indices()[range];
            if let Some(&bad) = range.iter().find(|&&i| i as usize >= vb.len()) {
                return Err(Error::Fatal(format!(
                    "index {} references vertex outside buffer of {}",
                    bad,
                    vb.len()
                )));
            }
            range.iter().map(|&i| i as usize).collect()
        } else {
            draw_range(first, count, vb.len())?.collect()
        };

        let (Some(&lo), Some(&hi)) = (indices.iter().min(), indices.iter().max()) else {
            return Ok(());
        };

        let perspective = config.perspective_corrected;
        transform_vertices(
            &mut vb.vertices_mut()[lo..=hi],
            state.world_view_projection(),
            state.viewport(),
            perspective,
        );
        let verts = vb.vertices();
        let color = state.color_index();

        match primitive {
            Primitive::Points => {
                for &i in &indices {
                    let v = &verts[i];
                    if v.ndc.w > 0.0 {
                        fb.plot(v.ndc.x as i32, v.ndc.y as i32, color);
                    }
                }
            }
            Primitive::Lines | Primitive::LineStrip | Primitive::LineLoop => {
                for [a, b] in line_list(primitive, indices.len()) {
                    let (a, b) = (&verts[indices[a]], &verts[indices[b]]);
                    if a.ndc.w > 0.0 && b.ndc.w > 0.0 {
                        raster::line(
                            fb,
                            (a.ndc.x as i32, a.ndc.y as i32),
                            (b.ndc.x as i32, b.ndc.y as i32),
                            color,
                        );
                    }
                }
            }
            Primitive::Triangles | Primitive::TriangleStrip | Primitive::TriangleFan => {
                let bound = match state.texture() {
                    Some(id) => Some(textures.get(id.0).ok_or_else(|| invalid_id("texture", id.0))?),
                    None => None,
                };
                let blank = Texture::singular(color);
                let texture = bound.filter(|t| t.has_image()).unwrap_or(&blank);

                let params = ClipParams {
                    world_view: state.world_view(),
                    projection: state.projection(),
                    viewport: state.viewport(),
                    clip_rect: state.clip_rect(),
                    cull_mode: state.cull_mode(),
                    z_near: config.z_clip_near,
                    z_far: config.z_clip_far,
                    perspective,
                };
                let mip_mapping = state.is_enabled(Capability::MipMapping);

                // Clip every triangle before writing any pixel
                let mut polygons: Vec<(Vec<RasterVertex>, usize)> = Vec::new();
                for [a, b, c] in triangle_list(primitive, indices.len()) {
                    let tri = [&verts[indices[a]], &verts[indices[b]], &verts[indices[c]]];
                    let Some(poly) = scratch.clip_triangle(tri, &params)? else {
                        continue;
                    };

                    let mip = if mip_mapping {
                        let d = raster::texel_derivatives(poly, perspective);
                        select_mip(texture, &d, config, state.lod_bias())
                    } else {
                        0
                    };
                    polygons.push((poly.to_vec(), mip));
                }

                let mut drawn = 0;
                for (poly, mip) in &polygons {
                    let Some(view) = texture.level(*mip) else {
                        continue;
                    };
                    raster::polygon(fb, poly, state.polygon_mode(), &view, color, perspective);
                    drawn += 1;
                }
                log::trace!("{:?}: {} of {} vertices, {} polygons rasterized", primitive, indices.len(), count, drawn);
            }
        }

        Ok(())
    }

    // --- Screen space ---
    //
    // Screen coordinates have their origin at the top-left corner; rows are
    // flipped into framebuffer storage order.

    pub fn draw_screen_point(&mut self, x: i32, y: i32) -> Result<()> {
        let r = self.screen_point(x, y);
        self.check(r)
    }

    fn screen_point(&mut self, x: i32, y: i32) -> Result<()> {
        let color = self.state().color_index();
        let fb = self.bound_framebuffer()?;
        let (w, h) = (fb.width() as i32, fb.height() as i32);
        if x < 0 || y < 0 || x >= w || y >= h {
            return Err(Error::invalid_argument(format!(
                "screen point ({}, {}) outside {}x{}",
                x, y, w, h
            )));
        }
        fb.plot(x, h - y - 1, color);
        Ok(())
    }

    pub fn draw_screen_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<()> {
        let color = self.state().color_index();
        let r = self.bound_framebuffer().map(|fb| {
            let h = fb.height() as i32;
            raster::line(fb, (x0, h - y0 - 1), (x1, h - y1 - 1), color);
        });
        self.check(r)
    }

    /// Fill the rectangle between two corners with the bound texture, or the
    /// active color if none is bound. The mip level follows the rectangle size.
    pub fn draw_screen_image(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> Result<()> {
        let r = self.screen_image(left, top, right, bottom);
        self.check(r)
    }

    fn screen_image(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> Result<()> {
        let state = self.state();
        let color = state.color_index();
        let lod_bias = if state.is_enabled(Capability::MipMapping) { state.lod_bias() } else { 0 };
        let tex_id = state.texture();
        let fb_id = state
            .framebuffer()
            .ok_or_else(|| Error::invalid_state("no framebuffer bound"))?;

        let Context { config, framebuffers, textures, .. } = self;
        let fb = framebuffers.get_mut(fb_id.0).ok_or_else(|| invalid_id("framebuffer", fb_id.0))?;
        let texture = match tex_id {
            Some(id) => Some(textures.get(id.0).ok_or_else(|| invalid_id("texture", id.0))?),
            None => None,
        };

        let (w, h) = (fb.width() as i32, fb.height() as i32);
        let (l, r) = (left.min(right).clamp(0, w - 1), left.max(right).clamp(0, w - 1));
        let (t, b) = (top.min(bottom).clamp(0, h - 1), top.max(bottom).clamp(0, h - 1));
        let rect = Rect::new(l, h - 1 - b, r, h - 1 - t);

        let view = texture.filter(|t| t.has_image()).and_then(|tex| {
            let d = TexelDerivatives {
                dudx: 1.0 / (rect.right - rect.left + 1) as f32,
                dvdy: 1.0 / (rect.bottom - rect.top + 1) as f32,
                ..Default::default()
            };
            tex.level(select_mip(tex, &d, config, lod_bias))
        });

        raster::image(fb, &rect, view.as_ref(), color);
        Ok(())
    }

    /// Number of live resources per registry, for diagnostics
    pub fn resource_counts(&self) -> [usize; 5] {
        [
            self.framebuffers.len(),
            self.vertex_buffers.len(),
            self.index_buffers.len(),
            self.textures.len(),
            self.state_machines.len(),
        ]
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("errors", &self.errors)
            .field("current", &self.current)
            .field("resources", &self.resource_counts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::framebuffer::encode_depth;

    fn context_with_framebuffer(w: u32, h: u32) -> (Context, FramebufferId) {
        let mut ctx = Context::default();
        let fb = ctx.create_framebuffer(w, h).unwrap();
        ctx.bind_framebuffer(Some(fb)).unwrap();
        (ctx, fb)
    }

    /// Orthographic setup where x/y map to pixels and z = 5 sits between the clip planes
    fn quad_vertices(w: f32, h: f32) -> Vec<VertexData> {
        vec![
            VertexData::new(-w, -h, 5.0, 0.0, 0.0),
            VertexData::new(w, -h, 5.0, 1.0, 0.0),
            VertexData::new(w, h, 5.0, 1.0, 1.0),
            VertexData::new(-w, h, 5.0, 0.0, 1.0),
        ]
    }

    fn bind_vertices(ctx: &mut Context, vertices: &[VertexData]) -> VertexBufferId {
        let vb = ctx.create_vertex_buffer();
        ctx.vertex_buffer_data(vb, vertices).unwrap();
        ctx.bind_vertex_buffer(Some(vb)).unwrap();
        vb
    }

    fn count_color(ctx: &Context, fb: FramebufferId, color: u8) -> usize {
        ctx.framebuffer(fb)
            .unwrap()
            .pixels()
            .iter()
            .filter(|p| p.color_index == color)
            .count()
    }

    #[test]
    fn test_clear_bound_framebuffer() {
        let (mut ctx, fb) = context_with_framebuffer(4, 4);
        ctx.clear(7, 0.5, ClearFlags::ALL).unwrap();

        for p in ctx.framebuffer(fb).unwrap().pixels() {
            assert_eq!(p.color_index, 7);
            assert_eq!(p.depth, encode_depth(0.5));
        }
    }

    #[test]
    fn test_clear_without_framebuffer_records_error() {
        let mut ctx = Context::default();
        assert!(ctx.clear(1, 0.0, ClearFlags::COLOR).is_err());
        assert_eq!(ctx.last_error(), Some(ErrorKind::InvalidState));
    }

    #[test]
    fn test_viewport_without_framebuffer() {
        let mut ctx = Context::default();
        let before = *ctx.state().viewport();
        assert!(matches!(ctx.set_viewport(0, 0, 10, 10), Err(Error::InvalidState(_))));
        assert_eq!(*ctx.state().viewport(), before);
        assert_eq!(ctx.take_error(), Some(ErrorKind::InvalidState));
        assert_eq!(ctx.last_error(), None);
    }

    #[test]
    fn test_capability_out_of_range() {
        let mut ctx = Context::default();
        assert!(ctx.set_capability(1, true).is_ok());
        assert!(ctx.is_enabled(Capability::MipMapping));

        assert!(ctx.set_capability(9, false).is_err());
        assert_eq!(ctx.last_error(), Some(ErrorKind::IndexOutOfBounds));
        assert!(ctx.is_enabled(Capability::MipMapping));
    }

    #[test]
    fn test_draw_untextured_quad() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();

        let vb = ctx.create_vertex_buffer();
        ctx.vertex_buffer_data(vb, &quad_vertices(16.0, 16.0)).unwrap();
        ctx.bind_vertex_buffer(Some(vb)).unwrap();
        ctx.set_color_index(200);

        ctx.draw(Primitive::TriangleFan, 4, 0).unwrap();

        // 32x32 quad centered in the framebuffer, edges rounded by the viewport mapping
        let filled = count_color(&ctx, fb, 200);
        assert!((31 * 31..=33 * 33).contains(&filled), "filled {}", filled);
        let center = ctx.framebuffer(fb).unwrap().pixel(32, 32).unwrap();
        assert_eq!(center.color_index, 200);
        assert!(center.depth > 0);
    }

    #[test]
    fn test_draw_indexed_matches_fan() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();

        let vb = ctx.create_vertex_buffer();
        ctx.vertex_buffer_data(vb, &quad_vertices(16.0, 16.0)).unwrap();
        ctx.bind_vertex_buffer(Some(vb)).unwrap();
        let ib = ctx.create_index_buffer();
        ctx.index_buffer_data(ib, &[0, 1, 2, 0, 2, 3]).unwrap();
        ctx.bind_index_buffer(Some(ib)).unwrap();
        ctx.set_color_index(9);

        ctx.draw_indexed(Primitive::Triangles, 6, 0).unwrap();
        let indexed = count_color(&ctx, fb, 9);

        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
        ctx.draw(Primitive::TriangleFan, 4, 0).unwrap();
        assert_eq!(count_color(&ctx, fb, 9), indexed);
    }

    #[test]
    fn test_draw_indexed_out_of_range_is_fatal() {
        let (mut ctx, fb) = context_with_framebuffer(32, 32);
        ctx.set_projection(Mat4::orthographic(32.0, 32.0, 1.0, 100.0));

        let vb = ctx.create_vertex_buffer();
        ctx.vertex_buffer_data(vb, &quad_vertices(8.0, 8.0)).unwrap();
        ctx.bind_vertex_buffer(Some(vb)).unwrap();
        let ib = ctx.create_index_buffer();
        ctx.index_buffer_data(ib, &[0, 1, 2, 0, 2, 40]).unwrap();
        ctx.bind_index_buffer(Some(ib)).unwrap();
        ctx.set_color_index(5);

        assert!(matches!(ctx.draw_indexed(Primitive::Triangles, 6, 0), Err(Error::Fatal(_))));
        assert_eq!(ctx.last_error(), Some(ErrorKind::Fatal));
        // Aborted before rasterizing the valid first triangle
        assert_eq!(count_color(&ctx, fb, 5), 0);
    }

    #[test]
    fn test_draw_range_out_of_bounds() {
        let (mut ctx, _) = context_with_framebuffer(8, 8);
        let vb = ctx.create_vertex_buffer();
        ctx.vertex_buffer_data(vb, &quad_vertices(1.0, 1.0)).unwrap();
        ctx.bind_vertex_buffer(Some(vb)).unwrap();

        assert!(matches!(
            ctx.draw(Primitive::Triangles, 6, 0),
            Err(Error::IndexOutOfBounds { index: 6, len: 4 })
        ));
    }

    #[test]
    fn test_draw_range_overflow_is_out_of_bounds() {
        let (mut ctx, _) = context_with_framebuffer(8, 8);
        bind_vertices(&mut ctx, &quad_vertices(1.0, 1.0));
        let ib = ctx.create_index_buffer();
        ctx.index_buffer_data(ib, &[0, 1, 2]).unwrap();
        ctx.bind_index_buffer(Some(ib)).unwrap();

        assert!(matches!(
            ctx.draw(Primitive::Triangles, usize::MAX, 1),
            Err(Error::IndexOutOfBounds { len: 4, .. })
        ));
        assert!(matches!(
            ctx.draw_indexed(Primitive::Triangles, usize::MAX, 1),
            Err(Error::IndexOutOfBounds { len: 3, .. })
        ));
        assert_eq!(ctx.last_error(), Some(ErrorKind::IndexOutOfBounds));
    }

    #[test]
    fn test_draw_without_buffers_is_null_reference() {
        let (mut ctx, _) = context_with_framebuffer(8, 8);
        assert!(matches!(ctx.draw(Primitive::Triangles, 3, 0), Err(Error::NullReference(_))));
        assert_eq!(ctx.last_error(), Some(ErrorKind::NullReference));

        bind_vertices(&mut ctx, &quad_vertices(1.0, 1.0));
        assert!(matches!(
            ctx.draw_indexed(Primitive::Triangles, 3, 0),
            Err(Error::NullReference(_))
        ));
    }

    #[test]
    fn test_clip_overflow_leaves_framebuffer_untouched() {
        let config = RenderConfig {
            max_polygon_vertices: 3,
            ..RenderConfig::default()
        };
        let mut ctx = Context::new(config);
        let fb = ctx.create_framebuffer(64, 64).unwrap();
        ctx.bind_framebuffer(Some(fb)).unwrap();
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();

        // First triangle fits on screen, the second crosses the right edge and clips to four vertices
        bind_vertices(
            &mut ctx,
            &[
                VertexData::new(-8.0, -8.0, 5.0, 0.0, 0.0),
                VertexData::new(8.0, -8.0, 5.0, 0.0, 0.0),
                VertexData::new(0.0, 8.0, 5.0, 0.0, 0.0),
                VertexData::new(20.0, -8.0, 5.0, 0.0, 0.0),
                VertexData::new(40.0, -8.0, 5.0, 0.0, 0.0),
                VertexData::new(30.0, 8.0, 5.0, 0.0, 0.0),
            ],
        );
        ctx.set_color_index(9);

        assert!(matches!(ctx.draw(Primitive::Triangles, 6, 0), Err(Error::InvalidState(_))));
        assert_eq!(count_color(&ctx, fb, 9), 0);

        // The first triangle alone still draws
        ctx.draw(Primitive::Triangles, 3, 0).unwrap();
        assert!(count_color(&ctx, fb, 9) > 0);
    }

    #[test]
    fn test_draw_culls_by_winding() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        bind_vertices(&mut ctx, &quad_vertices(16.0, 16.0));
        ctx.set_color_index(12);

        let filled = |ctx: &mut Context, mode: CullMode| {
            ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
            ctx.set_cull_mode(mode);
            ctx.draw(Primitive::TriangleFan, 4, 0).unwrap();
            count_color(ctx, fb, 12)
        };

        // Counter-clockwise on screen: front facing
        let none = filled(&mut ctx, CullMode::None);
        assert!(none > 0);
        assert_eq!(filled(&mut ctx, CullMode::Back), none);
        assert_eq!(filled(&mut ctx, CullMode::Front), 0);
    }

    #[test]
    fn test_draw_points() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
        bind_vertices(&mut ctx, &quad_vertices(16.0, 16.0));
        ctx.set_color_index(7);

        ctx.draw(Primitive::Points, 4, 0).unwrap();
        assert_eq!(count_color(&ctx, fb, 7), 4);
        let fb = ctx.framebuffer(fb).unwrap();
        assert_eq!(fb.pixel(16, 16).unwrap().color_index, 7);
        assert_eq!(fb.pixel(48, 48).unwrap().color_index, 7);
    }

    #[test]
    fn test_draw_lines_and_strips() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        bind_vertices(&mut ctx, &quad_vertices(16.0, 16.0));
        ctx.set_color_index(6);

        // Corners land on 16 and 48; every segment is 32 pixels with its end point excluded
        for (primitive, expected) in [
            (Primitive::Lines, 2 * 32),
            (Primitive::LineStrip, 3 * 32),
            (Primitive::LineLoop, 4 * 32),
        ] {
            ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
            ctx.draw(primitive, 4, 0).unwrap();
            assert_eq!(count_color(&ctx, fb, 6), expected, "{:?}", primitive);
        }
    }

    #[test]
    fn test_lod_bias_selects_smaller_mip() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        bind_vertices(&mut ctx, &quad_vertices(16.0, 16.0));

        // Left half red, right half blue; only the 1x1 level mixes them
        let (red, blue) = (Rgb::new(255, 0, 0), Rgb::new(0, 0, 255));
        let pixels: Vec<Rgb> = (0..64).map(|i| if i % 8 < 4 { red } else { blue }).collect();
        let tex = ctx.create_texture();
        ctx.texture_upload(tex, 8, 8, &pixels, false, true).unwrap();
        ctx.bind_texture(Some(tex)).unwrap();
        let texture = ctx.texture(tex).unwrap();
        assert_eq!(texture.mips(), 4);
        let mixed = texture.level(3).unwrap().texel(0, 0).unwrap();
        assert_ne!(mixed, red.index());
        assert_ne!(mixed, blue.index());

        let draw = |ctx: &mut Context, bias: u8| {
            ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
            ctx.set_lod_bias(bias);
            ctx.draw(Primitive::TriangleFan, 4, 0).unwrap();
            (
                count_color(ctx, fb, red.index()),
                count_color(ctx, fb, blue.index()),
                count_color(ctx, fb, mixed),
            )
        };

        ctx.enable(Capability::MipMapping);
        let (r, b, m) = draw(&mut ctx, 0);
        assert!(r > 0 && b > 0);
        assert_eq!(m, 0);

        // Bias far past the chain clamps to the last level
        assert_eq!(draw(&mut ctx, 10), (0, 0, r + b));

        ctx.disable(Capability::MipMapping);
        let (r2, b2, m2) = draw(&mut ctx, 10);
        assert_eq!((r2, b2, m2), (r, b, 0));
    }

    #[test]
    fn test_mip_mapped_draw_minifies() {
        let (mut ctx, fb) = context_with_framebuffer(64, 64);
        ctx.set_projection(Mat4::orthographic(64.0, 64.0, 1.0, 100.0));
        bind_vertices(&mut ctx, &quad_vertices(2.0, 2.0));

        // One-texel checkerboard: every level past the first is a uniform blend
        let (red, blue) = (Rgb::new(255, 0, 0), Rgb::new(0, 0, 255));
        let pixels: Vec<Rgb> = (0..64 * 64)
            .map(|i| if (i % 64 + i / 64) % 2 == 0 { red } else { blue })
            .collect();
        let tex = ctx.create_texture();
        ctx.texture_upload(tex, 64, 64, &pixels, false, true).unwrap();
        ctx.bind_texture(Some(tex)).unwrap();
        let mixed = ctx.texture(tex).unwrap().level(1).unwrap().texel(0, 0).unwrap();

        let drawn = |ctx: &Context| {
            ctx.framebuffer(fb)
                .unwrap()
                .pixels()
                .iter()
                .filter(|p| p.color_index != 0)
                .count()
        };

        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
        ctx.draw(Primitive::TriangleFan, 4, 0).unwrap();
        let full = drawn(&ctx);
        assert!(full > 0);
        assert_eq!(count_color(&ctx, fb, mixed), 0);

        // 64 texels over a 4 pixel quad picks a reduced level
        ctx.enable(Capability::MipMapping);
        ctx.clear(0, 0.0, ClearFlags::ALL).unwrap();
        ctx.draw(Primitive::TriangleFan, 4, 0).unwrap();
        assert_eq!(count_color(&ctx, fb, mixed), full);
    }

    #[test]
    fn test_null_state_machine_fails_safely() {
        let (mut ctx, _) = context_with_framebuffer(8, 8);
        ctx.make_current(None).unwrap();

        assert!(matches!(ctx.draw(Primitive::Triangles, 3, 0), Err(Error::InvalidState(_))));
        assert!(matches!(ctx.bind_texture(None), Err(Error::InvalidState(_))));
        assert_eq!(ctx.state().ref_count(), 0);
        assert_eq!(ctx.last_error(), Some(ErrorKind::InvalidState));
    }

    #[test]
    fn test_make_current_unknown_id() {
        let mut ctx = Context::default();
        let first = ctx.current().unwrap();
        assert!(matches!(ctx.make_current(Some(StateMachineId(42))), Err(Error::InvalidId(_))));
        assert_eq!(ctx.current(), Some(first));
    }

    #[test]
    fn test_delete_unbinds_from_state() {
        let (mut ctx, fb) = context_with_framebuffer(8, 8);
        let tex = ctx.create_texture();
        ctx.bind_texture(Some(tex)).unwrap();
        assert_eq!(ctx.state().ref_count(), 2);

        ctx.delete_texture(tex).unwrap();
        assert_eq!(ctx.state().texture(), None);
        ctx.delete_framebuffer(fb).unwrap();
        assert_eq!(ctx.state().framebuffer(), None);
        assert_eq!(ctx.state().ref_count(), 0);

        assert!(matches!(ctx.delete_texture(tex), Err(Error::InvalidId(_))));
    }

    #[test]
    fn test_ids_are_reused() {
        let mut ctx = Context::default();
        let a = ctx.create_texture();
        let b = ctx.create_texture();
        ctx.delete_texture(a).unwrap();
        let c = ctx.create_texture();
        assert_eq!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn test_screen_point_flips_rows() {
        let (mut ctx, fb) = context_with_framebuffer(8, 8);
        ctx.set_color_index(3);
        ctx.draw_screen_point(1, 0).unwrap();

        // Top-left origin on screen lands in the last storage row
        assert_eq!(ctx.framebuffer(fb).unwrap().pixel(1, 7).unwrap().color_index, 3);
        assert!(matches!(ctx.draw_screen_point(8, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_screen_line() {
        let (mut ctx, fb) = context_with_framebuffer(16, 16);
        ctx.set_color_index(4);
        ctx.draw_screen_line(0, 0, 8, 0).unwrap();

        // Endpoint excluded
        assert_eq!(count_color(&ctx, fb, 4), 8);
        assert_eq!(ctx.framebuffer(fb).unwrap().pixel(0, 15).unwrap().color_index, 4);
    }

    #[test]
    fn test_screen_image_clamps_and_orders() {
        let (mut ctx, fb) = context_with_framebuffer(16, 16);
        ctx.set_color_index(11);
        ctx.draw_screen_image(20, 4, 12, -3).unwrap();

        // Columns 12..=15 and screen rows 0..=4
        assert_eq!(count_color(&ctx, fb, 11), 4 * 5);
        let fb = ctx.framebuffer(fb).unwrap();
        assert_eq!(fb.pixel(12, 15).unwrap().color_index, 11);
        assert_eq!(fb.pixel(15, 11).unwrap().color_index, 11);
        assert_eq!(fb.pixel(11, 15).unwrap().color_index, 0);
    }

    #[test]
    fn test_screen_image_textured_uses_small_mip() {
        let (mut ctx, fb) = context_with_framebuffer(16, 16);
        let tex = ctx.create_texture();
        let red = Rgb::new(255, 0, 0);
        ctx.texture_upload(tex, 8, 8, &vec![red; 64], false, true).unwrap();
        ctx.bind_texture(Some(tex)).unwrap();

        assert_eq!(ctx.texture_level_width(tex, 2).unwrap(), 2);
        assert_eq!(ctx.texture_level_height(tex, 3).unwrap(), 1);
        assert!(matches!(
            ctx.texture_level_width(tex, 4),
            Err(Error::IndexOutOfBounds { index: 4, len: 4 })
        ));

        ctx.draw_screen_image(0, 0, 1, 1).unwrap();
        assert_eq!(count_color(&ctx, fb, red.index()), 4);
    }

    #[test]
    fn test_queries() {
        let ctx = Context::default();
        assert_eq!(ctx.max_texture_size(), 256);
        assert_eq!(ctx.version(), env!("CARGO_PKG_VERSION"));
        assert!(ctx.renderer().contains("software"));
    }

    #[test]
    fn test_primitive_lists() {
        assert_eq!(triangle_list(Primitive::Triangles, 7), vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(
            triangle_list(Primitive::TriangleStrip, 5),
            vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]]
        );
        assert_eq!(triangle_list(Primitive::TriangleFan, 5), vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
        assert!(triangle_list(Primitive::TriangleFan, 2).is_empty());

        assert_eq!(line_list(Primitive::Lines, 5), vec![[0, 1], [2, 3]]);
        assert_eq!(line_list(Primitive::LineStrip, 3), vec![[0, 1], [1, 2]]);
        assert_eq!(line_list(Primitive::LineLoop, 3), vec![[0, 1], [1, 2], [2, 0]]);
        assert!(triangle_list(Primitive::Points, 9).is_empty());
    }

    #[test]
    fn test_error_handler_is_called() {
        use std::cell::Cell;
        use std::rc::Rc;

        let calls = Rc::new(Cell::new(0));
        let sink = calls.clone();
        let mut ctx = Context::default();
        ctx.set_error_handler(Some(Box::new(move |kind, _| {
            assert_eq!(kind, ErrorKind::InvalidId);
            sink.set(sink.get() + 1);
        })));

        let _ = ctx.delete_vertex_buffer(VertexBufferId(3));
        assert_eq!(calls.get(), 1);
    }
}

//! bonnie-raster demo: a textured spinning cube rendered on the CPU
//!
//! Controls:
//! - P: cycle polygon mode (fill / line / point)
//! - C: cycle cull mode
//! - M: toggle mip-mapping
//! - Up/Down: LOD bias
//!
//! An optional first argument names a RON render config.

use bonnie_raster::present::framebuffer_to_rgba;
use bonnie_raster::rasterizer::{
    Capability, ClearFlags, ColorPalette, Context, CullMode, FramebufferId, Image, Mat4, PolygonMode,
    Primitive, Rgb, Vec3, VertexData, DEG2RAD,
};
use bonnie_raster::{load_config, RenderConfig};
use macroquad::prelude::*;

const TITLE: &str = "bonnie-raster";

fn window_conf() -> Conf {
    let config = RenderConfig::default();
    Conf {
        window_title: format!("{} v{}", TITLE, bonnie_raster::rasterizer::VERSION),
        window_width: config.default_viewport.width as i32,
        window_height: config.default_viewport.height as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Unit cube, four vertices per face so every face gets the full texture
fn cube() -> (Vec<VertexData>, Vec<u16>) {
    let faces: [[[f32; 3]; 4]; 6] = [
        [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]],
        [[1.0, -1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
        [[-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0]],
        [[1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0]],
        [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0]],
    ];
    let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (f, face) in faces.iter().enumerate() {
        for (p, (u, v)) in face.iter().zip(uvs) {
            vertices.push(VertexData::new(p[0], p[1], p[2], u, v));
        }
        let base = (f * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// Create the framebuffer, cube buffers and checkerboard texture, all bound
fn setup(ctx: &mut Context) -> bonnie_raster::Result<FramebufferId> {
    let size = ctx.config().default_viewport;
    let fb = ctx.create_framebuffer(size.width, size.height)?;
    ctx.bind_framebuffer(Some(fb))?;

    let (vertices, indices) = cube();
    let vb = ctx.create_vertex_buffer();
    ctx.vertex_buffer_data(vb, &vertices)?;
    ctx.bind_vertex_buffer(Some(vb))?;

    let ib = ctx.create_index_buffer();
    ctx.index_buffer_data(ib, &indices)?;
    ctx.bind_index_buffer(Some(ib))?;

    let image = Image::checkerboard(64, 64, Rgb::new(230, 200, 60), Rgb::new(40, 60, 150))?;
    let tex = ctx.create_texture();
    ctx.texture_upload_image(tex, &image, true, true)?;
    ctx.bind_texture(Some(tex))?;

    let aspect = size.width as f32 / size.height as f32;
    ctx.set_projection(Mat4::perspective(aspect, 1.0, 100.0, 74.0 * DEG2RAD));
    Ok(fb)
}

fn next_polygon_mode(mode: PolygonMode) -> PolygonMode {
    match mode {
        PolygonMode::Fill => PolygonMode::Line,
        PolygonMode::Line => PolygonMode::Point,
        PolygonMode::Point => PolygonMode::Fill,
    }
}

fn next_cull_mode(mode: CullMode) -> CullMode {
    match mode {
        CullMode::None => CullMode::Back,
        CullMode::Back => CullMode::Front,
        CullMode::Front => CullMode::None,
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                log::info!("loaded render config from {}", path);
                config
            }
            Err(e) => {
                log::warn!("failed to load {}: {}, using defaults", path, e);
                RenderConfig::default()
            }
        },
        None => RenderConfig::default(),
    };

    let mut ctx = Context::new(config);
    let fb = match setup(&mut ctx) {
        Ok(fb) => fb,
        Err(e) => {
            log::error!("setup failed: {}", e);
            return;
        }
    };
    log::info!("{} {}", ctx.renderer(), ctx.version());

    let palette = ColorPalette::r3g3b2();
    let background = Rgb::new(30, 30, 35).index();
    let border = Rgb::new(255, 255, 255).index();

    let mut polygon_mode = PolygonMode::Fill;
    let mut cull_mode = CullMode::None;
    let mut lod_bias: u8 = 0;
    let mut angle = 0.0f32;

    loop {
        if is_key_pressed(KeyCode::P) {
            polygon_mode = next_polygon_mode(polygon_mode);
            ctx.set_polygon_mode(polygon_mode);
        }
        if is_key_pressed(KeyCode::C) {
            cull_mode = next_cull_mode(cull_mode);
            ctx.set_cull_mode(cull_mode);
        }
        if is_key_pressed(KeyCode::M) {
            if ctx.is_enabled(Capability::MipMapping) {
                ctx.disable(Capability::MipMapping);
            } else {
                ctx.enable(Capability::MipMapping);
            }
        }
        if is_key_pressed(KeyCode::Up) {
            lod_bias = lod_bias.saturating_add(1);
            ctx.set_lod_bias(lod_bias);
        }
        if is_key_pressed(KeyCode::Down) {
            lod_bias = lod_bias.saturating_sub(1);
            ctx.set_lod_bias(lod_bias);
        }

        angle += get_frame_time() * 45.0 * DEG2RAD;
        let math = ctx.config().math_mode;
        let mut world = Mat4::identity();
        world.translate(0.0, 0.0, 5.0);
        world.rotate_with(math, Vec3::new(1.0, 1.0, 0.0), angle);
        world.rotate_with(math, Vec3::new(0.0, 1.0, 0.0), angle * 0.5);
        ctx.set_world(world);

        // Errors are recorded and logged by the context; keep presenting
        let _ = ctx.clear(background, 0.0, ClearFlags::ALL);
        ctx.set_color_index(border);
        let _ = ctx.draw_indexed(Primitive::Triangles, 36, 0);

        // Texture preview in the corner
        let _ = ctx.draw_screen_image(8, 8, 72, 72);
        let _ = ctx.draw_screen_line(6, 6, 74, 6);
        let _ = ctx.draw_screen_line(74, 6, 74, 74);
        let _ = ctx.draw_screen_line(74, 74, 6, 74);
        let _ = ctx.draw_screen_line(6, 74, 6, 6);

        clear_background(Color::from_rgba(30, 30, 35, 255));

        if let Some(framebuffer) = ctx.framebuffer(fb) {
            let rgba = framebuffer_to_rgba(framebuffer, &palette, true);
            let fb_texture =
                Texture2D::from_rgba8(framebuffer.width() as u16, framebuffer.height() as u16, &rgba);
            fb_texture.set_filter(FilterMode::Nearest);

            draw_texture_ex(
                &fb_texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(screen_width(), screen_height())),
                    ..Default::default()
                },
            );
        }

        let mip = if ctx.is_enabled(Capability::MipMapping) { "on" } else { "off" };
        draw_text(
            &format!("{:?} | cull {:?} | mips {} | bias {}", polygon_mode, cull_mode, mip, lod_bias),
            10.0,
            screen_height() - 10.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}

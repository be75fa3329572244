use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use image::RgbaImage;

use super::raster::{self, ClipVertex, Framebuffer, ScreenVertex, Varying};
use super::{
    BlendMode, Capabilities, CompareFunc, CubeFace, FaceOrder, Fog, GraphicsBackend, LightState,
    MaterialState, MatrixSlot, RenderTarget, StencilOp, MAX_LIGHTS,
};
use crate::color::Color;
use crate::geometry::{Index, LightSource, Vertex};
use crate::texture::Texture;

struct Offscreen {
    buffer: Framebuffer,
    texture: Texture,
    face: CubeFace,
}

/// Per-fragment state captured once per draw call.
struct PixelState {
    depth_test: bool,
    depth_write: bool,
    color_write: bool,
    blend: Option<BlendMode>,
    stencil_test: bool,
    stencil_func: CompareFunc,
    stencil_ref: u8,
    stencil_ops: [StencilOp; 3],
    texture: Option<Texture>,
    env_map: Option<Texture>,
    env_weight: Color,
    fog_color: Option<Color>,
}

/// Headless rasterizer implementing the fixed-function pipeline on the CPU.
pub struct SoftwareBackend {
    screen: Framebuffer,
    offscreen: Option<Offscreen>,
    matrices: [Mat4; 4],
    ambient: Color,
    lights: [Option<LightState>; MAX_LIGHTS],
    lighting: bool,
    material: MaterialState,
    depth_test: bool,
    depth_write: bool,
    color_write: bool,
    blend: Option<BlendMode>,
    cull: bool,
    front_face: FaceOrder,
    stencil_test: bool,
    stencil_func: (CompareFunc, u8),
    stencil_ops: [StencilOp; 3],
    fog: Option<Fog>,
    textures: [Option<Texture>; 2],
    capabilities: Capabilities,
    frames: u64,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: Framebuffer::new(width.max(1), height.max(1)),
            offscreen: None,
            matrices: [Mat4::IDENTITY; 4],
            ambient: Color::BLACK,
            lights: [None; MAX_LIGHTS],
            lighting: false,
            material: MaterialState::default(),
            depth_test: true,
            depth_write: true,
            color_write: true,
            blend: None,
            cull: true,
            front_face: FaceOrder::Ccw,
            stencil_test: false,
            stencil_func: (CompareFunc::Always, 0),
            stencil_ops: [StencilOp::Keep; 3],
            fog: None,
            textures: [None, None],
            capabilities: Capabilities {
                point_sprites: true,
                max_lights: MAX_LIGHTS,
            },
            frames: 0,
        }
    }

    /// Reports point sprites as unsupported so that particles fall back to
    /// billboard quads.
    pub fn without_point_sprites(mut self) -> Self {
        self.capabilities.point_sprites = false;
        self
    }

    pub fn stencil_at(&self, x: u32, y: u32) -> u8 {
        let target = self.target();
        target.offset(x, y).map_or(0, |i| target.stencil[i])
    }

    pub fn color_at(&self, x: u32, y: u32) -> Color {
        let target = self.target();
        target
            .offset(x, y)
            .map_or(Color::TRANSPARENT, |i| target.color[i])
    }

    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        let target = self.target();
        target.offset(x, y).map_or(1.0, |i| target.depth[i])
    }

    /// Number of pixels with a nonzero stencil value.
    pub fn stencil_coverage(&self) -> usize {
        self.target().stencil.iter().filter(|&&s| s != 0).count()
    }

    pub fn light_unit(&self, unit: usize) -> Option<LightState> {
        self.lights.get(unit).copied().flatten()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    fn target(&self) -> &Framebuffer {
        match &self.offscreen {
            Some(off) => &off.buffer,
            None => &self.screen,
        }
    }

    fn target_mut(&mut self) -> &mut Framebuffer {
        match &mut self.offscreen {
            Some(off) => &mut off.buffer,
            None => &mut self.screen,
        }
    }

    fn flush_offscreen(&mut self) {
        if let Some(off) = self.offscreen.take() {
            off.texture.store_face(off.face, to_image(&off.buffer));
        }
    }

    fn pixel_state(&self) -> PixelState {
        let env_map = self.textures[1].clone();
        PixelState {
            depth_test: self.depth_test,
            depth_write: self.depth_write,
            color_write: self.color_write,
            blend: self.blend,
            stencil_test: self.stencil_test,
            stencil_func: self.stencil_func.0,
            stencil_ref: self.stencil_func.1,
            stencil_ops: self.stencil_ops,
            texture: self.textures[0].clone(),
            env_weight: self.material.specular * self.material.env_intensity,
            env_map,
            fog_color: self.fog.map(|fog| fog.color),
        }
    }

    fn shade_vertex(&self, vertex: &Vertex, frame: &VertexFrame) -> ClipVertex {
        let world_pos = frame.world.transform_point3(vertex.position);
        let normal = (frame.normal * vertex.normal).normalize_or_zero();

        let color = if self.lighting {
            self.light_vertex(world_pos, normal, frame.eye)
        } else {
            vertex.color.to_vec4()
        };

        let tex = vertex.tex[0];
        let uv = frame.texture * Vec4::new(tex.u, tex.v, tex.w, 1.0);

        let incident = (world_pos - frame.eye).normalize_or_zero();
        let reflect = incident - 2.0 * incident.dot(normal) * normal;

        let fog = match self.fog {
            Some(fog) => {
                let distance = frame.view.transform_point3(world_pos).z.abs();
                let span = (fog.end - fog.start).max(f32::EPSILON);
                ((fog.end - distance) / span).clamp(0.0, 1.0)
            }
            None => 1.0,
        };

        ClipVertex {
            clip: frame.view_proj * world_pos.extend(1.0),
            varying: Varying {
                color,
                uv: Vec2::new(uv.x, uv.y),
                reflect,
                fog,
            },
        }
    }

    fn light_vertex(&self, pos: Vec3, normal: Vec3, eye: Vec3) -> Vec4 {
        let material = &self.material;
        let diffuse = material.diffuse.rgb_vec();
        let mut rgb = self.ambient.rgb_vec() * diffuse + material.emissive.rgb_vec();
        let to_eye = (eye - pos).normalize_or_zero();

        for light in self.lights.iter().flatten() {
            let to_light = match light.source {
                LightSource::Point(p) => (p - pos).normalize_or_zero(),
                LightSource::Directional(dir) => -dir.normalize_or_zero(),
            };
            let lambert = normal.dot(to_light).max(0.0);
            let light_rgb = light.color.rgb_vec();
            rgb += light_rgb * diffuse * lambert;

            if lambert > 0.0 && material.shininess > 0.0 {
                let half = (to_light + to_eye).normalize_or_zero();
                let spec = normal.dot(half).max(0.0).powf(material.shininess);
                rgb += light_rgb * material.specular.rgb_vec() * spec;
            }
        }

        rgb.extend(material.alpha)
    }

    fn vertex_frame(&self) -> VertexFrame {
        let world = self.matrices[slot_index(MatrixSlot::World)];
        let view = self.matrices[slot_index(MatrixSlot::View)];
        let proj = self.matrices[slot_index(MatrixSlot::Projection)];
        VertexFrame {
            world,
            view,
            view_proj: proj * view,
            normal: Mat3::from_mat4(world).inverse().transpose(),
            texture: self.matrices[slot_index(MatrixSlot::Texture)],
            eye: view.inverse().w_axis.truncate(),
        }
    }
}

struct VertexFrame {
    world: Mat4,
    view: Mat4,
    view_proj: Mat4,
    normal: Mat3,
    texture: Mat4,
    eye: Vec3,
}

fn slot_index(slot: MatrixSlot) -> usize {
    match slot {
        MatrixSlot::World => 0,
        MatrixSlot::View => 1,
        MatrixSlot::Projection => 2,
        MatrixSlot::Texture => 3,
    }
}

fn to_image(buffer: &Framebuffer) -> RgbaImage {
    let pixels: Vec<[u8; 4]> = buffer.color.iter().map(|c| c.to_rgba8()).collect();
    let bytes: &[u8] = bytemuck::cast_slice(&pixels);
    RgbaImage::from_raw(buffer.width, buffer.height, bytes.to_vec())
        .unwrap_or_else(|| RgbaImage::new(buffer.width, buffer.height))
}

fn fragment_color(state: &PixelState, varying: &Varying) -> Color {
    let mut color = Color::from(varying.color);
    if let Some(texture) = &state.texture {
        let texel = if texture.is_cube() {
            texture.sample_dir(varying.reflect)
        } else {
            texture.sample(varying.uv)
        };
        color = color * texel;
    }
    if let Some(env) = &state.env_map {
        let reflected = env.sample_dir(varying.reflect) * state.env_weight;
        color = Color::new(
            color.r + reflected.r,
            color.g + reflected.g,
            color.b + reflected.b,
            color.a,
        );
    }
    if let Some(fog_color) = state.fog_color {
        let rgb = fog_color.rgb_vec().lerp(color.rgb_vec(), varying.fog);
        color = Color::new(rgb.x, rgb.y, rgb.z, color.a);
    }
    color
}

/// Runs the stencil, depth and blend stages for one pixel. Fragments without
/// a depth skip the depth stage.
fn write_fragment(
    target: &mut Framebuffer,
    state: &PixelState,
    x: u32,
    y: u32,
    depth: Option<f32>,
    color: Color,
) {
    let Some(i) = target.offset(x, y) else {
        return;
    };
    let [fail_op, depth_fail_op, pass_op] = state.stencil_ops;

    if state.stencil_test {
        let value = target.stencil[i];
        if !state.stencil_func.passes(state.stencil_ref, value) {
            target.stencil[i] = fail_op.apply(value, state.stencil_ref);
            return;
        }
    }

    if let Some(depth) = depth {
        if state.depth_test && depth >= target.depth[i] {
            if state.stencil_test {
                target.stencil[i] = depth_fail_op.apply(target.stencil[i], state.stencil_ref);
            }
            return;
        }
    }

    if state.stencil_test {
        target.stencil[i] = pass_op.apply(target.stencil[i], state.stencil_ref);
    }
    if let (Some(depth), true) = (depth, state.depth_write) {
        target.depth[i] = depth;
    }
    if state.color_write {
        target.color[i] = match state.blend {
            Some(mode) => mode.blend(color, target.color[i]),
            None => color.clamped(),
        };
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn viewport_size(&self) -> (u32, u32) {
        let target = self.target();
        (target.width, target.height)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn clear(&mut self, color: Color) {
        self.target_mut().color.fill(color);
    }

    fn clear_depth_stencil(&mut self, depth: f32, stencil: u8) {
        let target = self.target_mut();
        target.depth.fill(depth);
        target.stencil.fill(stencil);
    }

    fn clear_stencil(&mut self, value: u8) {
        self.target_mut().stencil.fill(value);
    }

    fn set_matrix(&mut self, slot: MatrixSlot, matrix: Mat4) {
        self.matrices[slot_index(slot)] = matrix;
    }

    fn matrix(&self, slot: MatrixSlot) -> Mat4 {
        self.matrices[slot_index(slot)]
    }

    fn set_ambient_light(&mut self, color: Color) {
        self.ambient = color;
    }

    fn set_light(&mut self, unit: usize, light: Option<LightState>) {
        if let Some(slot) = self.lights.get_mut(unit) {
            *slot = light;
        }
    }

    fn set_lighting(&mut self, enabled: bool) {
        self.lighting = enabled;
    }

    fn set_material(&mut self, material: &MaterialState) {
        self.material = *material;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.color_write = enabled;
    }

    fn set_blending(&mut self, mode: Option<BlendMode>) {
        self.blend = mode;
    }

    fn set_backface_culling(&mut self, enabled: bool) {
        self.cull = enabled;
    }

    fn set_front_face(&mut self, order: FaceOrder) {
        self.front_face = order;
    }

    fn front_face(&self) -> FaceOrder {
        self.front_face
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.stencil_test = enabled;
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: u8) {
        self.stencil_func = (func, reference);
    }

    fn set_stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        self.stencil_ops = [fail, depth_fail, pass];
    }

    fn set_fog(&mut self, fog: Option<Fog>) {
        self.fog = fog;
    }

    fn bind_texture(&mut self, unit: usize, texture: Option<&Texture>) {
        if let Some(slot) = self.textures.get_mut(unit) {
            *slot = texture.cloned();
        }
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        self.flush_offscreen();
        if let RenderTarget::CubeFace { texture, face } = target {
            let (width, height) = texture.size();
            self.offscreen = Some(Offscreen {
                buffer: Framebuffer::new(width, height),
                texture,
                face,
            });
        }
    }

    fn render_target(&self) -> RenderTarget {
        match &self.offscreen {
            Some(off) => RenderTarget::CubeFace {
                texture: off.texture.clone(),
                face: off.face,
            },
            None => RenderTarget::Screen,
        }
    }

    fn draw_triangles(&mut self, vertices: &[Vertex], indices: &[Index]) {
        let frame = self.vertex_frame();
        let shaded: Vec<ClipVertex> = vertices
            .iter()
            .map(|v| self.shade_vertex(v, &frame))
            .collect();
        let state = self.pixel_state();
        let cull = self.cull;
        let front_face = self.front_face;
        let target = self.target_mut();
        let (width, height) = (target.width, target.height);

        for tri in indices.chunks_exact(3) {
            let corners = [tri[0], tri[1], tri[2]].map(|i| shaded.get(i as usize).copied());
            let [Some(a), Some(b), Some(c)] = corners else {
                continue;
            };
            let polygon = raster::clip_near([a, b, c]);
            if polygon.len() < 3 {
                continue;
            }
            let screen: Vec<ScreenVertex> = polygon
                .iter()
                .map(|v| ScreenVertex::from_clip(v, width, height))
                .collect();

            for i in 1..screen.len() - 1 {
                let fan = [screen[0], screen[i], screen[i + 1]];
                let area = raster::signed_area(&fan);
                if area == 0.0 {
                    continue;
                }
                let ccw = area < 0.0;
                let front = match front_face {
                    FaceOrder::Ccw => ccw,
                    FaceOrder::Cw => !ccw,
                };
                if cull && !front {
                    continue;
                }
                raster::rasterize(width, height, fan, |x, y, depth, varying| {
                    let color = fragment_color(&state, &varying);
                    write_fragment(target, &state, x, y, Some(depth), color);
                });
            }
        }
    }

    fn draw_point_sprite(&mut self, position: Vec3, size: f32, color: Color) {
        let frame = self.vertex_frame();
        let world_pos = frame.world.transform_point3(position);
        let clip = frame.view_proj * world_pos.extend(1.0);
        if clip.z < 0.0 || clip.w <= 0.0 {
            return;
        }

        let state = self.pixel_state();
        let target = self.target_mut();
        let ndc = clip.truncate() / clip.w;
        let center = Vec2::new(
            (ndc.x + 1.0) * 0.5 * target.width as f32,
            (1.0 - ndc.y) * 0.5 * target.height as f32,
        );
        let size = size.max(1.0);
        let origin = center - Vec2::splat(size * 0.5);
        let x0 = origin.x.max(0.0).floor() as u32;
        let y0 = origin.y.max(0.0).floor() as u32;
        let x1 = (origin.x + size).max(0.0).ceil() as u32;
        let y1 = (origin.y + size).max(0.0).ceil() as u32;

        for y in y0..y1.min(target.height) {
            for x in x0..x1.min(target.width) {
                let local = (Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - origin) / size;
                if local.min_element() < 0.0 || local.max_element() >= 1.0 {
                    continue;
                }
                let uv = frame.texture * Vec4::new(local.x, local.y, 0.0, 1.0);
                let varying = Varying {
                    color: color.to_vec4(),
                    uv: Vec2::new(uv.x, uv.y),
                    reflect: Vec3::Z,
                    fog: 1.0,
                };
                let shaded = fragment_color(&state, &varying);
                write_fragment(target, &state, x, y, Some(ndc.z), shaded);
            }
        }
    }

    fn draw_screen_quad(&mut self, min: Vec2, max: Vec2, color: Color) {
        let mut state = self.pixel_state();
        state.texture = None;
        state.env_map = None;
        state.fog_color = None;
        let target = self.target_mut();
        let (width, height) = (target.width as f32, target.height as f32);

        for y in 0..target.height {
            let cy = (y as f32 + 0.5) / height;
            if cy < min.y || cy >= max.y {
                continue;
            }
            for x in 0..target.width {
                let cx = (x as f32 + 0.5) / width;
                if cx < min.x || cx >= max.x {
                    continue;
                }
                write_fragment(target, &state, x, y, None, color);
            }
        }
    }

    fn flip(&mut self) {
        self.frames += 1;
    }

    fn screen_capture(&self) -> RgbaImage {
        to_image(self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::BlendFactor;

    const SIZE: u32 = 32;

    fn backend() -> SoftwareBackend {
        let mut gfx = SoftwareBackend::new(SIZE, SIZE);
        gfx.set_matrix(
            MatrixSlot::View,
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
        );
        gfx.set_matrix(
            MatrixSlot::Projection,
            Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.5, 100.0),
        );
        gfx.clear(Color::BLACK);
        gfx.clear_depth_stencil(1.0, 0);
        gfx
    }

    /// Square facing +Z in the z = `z` plane, wound counter-clockwise.
    fn square(z: f32, half: f32, color: Color) -> Vec<Vertex> {
        [(-half, -half), (half, -half), (half, half), (-half, half)]
            .iter()
            .map(|&(x, y)| Vertex::new(Vec3::new(x, y, z), 0.0, 0.0, color))
            .collect()
    }

    const CCW: [Index; 6] = [0, 1, 2, 0, 2, 3];
    const CW: [Index; 6] = [0, 2, 1, 0, 3, 2];

    #[test]
    fn back_faces_are_culled() {
        let mut gfx = backend();
        let red = Color::rgb(1.0, 0.0, 0.0);
        gfx.draw_triangles(&square(0.0, 1.0, red), &CW);
        assert_eq!(gfx.color_at(SIZE / 2, SIZE / 2), Color::BLACK);

        gfx.draw_triangles(&square(0.0, 1.0, red), &CCW);
        assert_eq!(gfx.color_at(SIZE / 2, SIZE / 2), red);
        assert!(gfx.depth_at(SIZE / 2, SIZE / 2) < 1.0);
        // outside the square
        assert_eq!(gfx.color_at(0, 0), Color::BLACK);

        gfx.set_front_face(FaceOrder::Cw);
        let green = Color::rgb(0.0, 1.0, 0.0);
        gfx.clear_depth_stencil(1.0, 0);
        gfx.draw_triangles(&square(0.0, 1.0, green), &CW);
        assert_eq!(gfx.color_at(SIZE / 2, SIZE / 2), green);
    }

    #[test]
    fn depth_test_keeps_nearest() {
        let mut gfx = backend();
        let near = Color::rgb(0.0, 0.0, 1.0);
        gfx.draw_triangles(&square(1.0, 1.0, near), &CCW);
        gfx.draw_triangles(&square(0.0, 2.0, Color::WHITE), &CCW);
        assert_eq!(gfx.color_at(SIZE / 2, SIZE / 2), near);
    }

    #[test]
    fn stencil_counts_front_and_back() {
        let mut gfx = backend();
        gfx.set_stencil_test(true);
        gfx.set_stencil_func(CompareFunc::Always, 0);
        gfx.set_color_write(false);
        gfx.set_depth_write(false);

        gfx.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Incr);
        gfx.draw_triangles(&square(0.0, 1.0, Color::WHITE), &CCW);
        gfx.draw_triangles(&square(-1.0, 1.0, Color::WHITE), &CCW);
        assert_eq!(gfx.stencil_at(SIZE / 2, SIZE / 2), 2);

        gfx.set_front_face(FaceOrder::Cw);
        gfx.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Decr);
        gfx.draw_triangles(&square(-1.0, 1.0, Color::WHITE), &CW);
        assert_eq!(gfx.stencil_at(SIZE / 2, SIZE / 2), 1);
        assert_eq!(gfx.color_at(SIZE / 2, SIZE / 2), Color::BLACK);

        // quad only where stencil is set
        gfx.set_color_write(true);
        gfx.set_stencil_func(CompareFunc::NotEqual, 0);
        gfx.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Keep);
        gfx.draw_screen_quad(Vec2::ZERO, Vec2::ONE, Color::WHITE);
        assert_eq!(gfx.color_at(SIZE / 2, SIZE / 2), Color::WHITE);
        assert_eq!(gfx.color_at(0, 0), Color::BLACK);
        assert!(gfx.stencil_coverage() > 0);
    }

    #[test]
    fn geometry_behind_the_eye_is_clipped() {
        let mut gfx = backend();
        // spans from in front of the camera to behind it
        let vertices = vec![
            Vertex::at(Vec3::new(-1.0, -0.5, 0.0)),
            Vertex::at(Vec3::new(1.0, -0.5, 0.0)),
            Vertex::at(Vec3::new(0.0, -0.5, 10.0)),
        ];
        gfx.set_backface_culling(false);
        gfx.draw_triangles(&vertices, &[0, 1, 2]);
        let lit = (0..SIZE)
            .flat_map(|y| (0..SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| gfx.color_at(x, y) != Color::BLACK)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn cube_face_target_lands_in_texture() {
        let mut gfx = backend();
        let cube = Texture::cube("env", 8);
        gfx.set_render_target(RenderTarget::CubeFace {
            texture: cube.clone(),
            face: CubeFace::PosZ,
        });
        assert_eq!(gfx.viewport_size(), (8, 8));
        gfx.clear(Color::rgb(0.0, 1.0, 0.0));
        gfx.set_render_target(RenderTarget::Screen);

        assert_eq!(gfx.viewport_size(), (SIZE, SIZE));
        assert_eq!(cube.sample_dir(Vec3::Z), Color::rgb(0.0, 1.0, 0.0));
        assert_eq!(cube.sample_dir(Vec3::X), Color::BLACK);
        assert_eq!(gfx.color_at(0, 0), Color::BLACK);
    }

    #[test]
    fn blended_screen_quad_inverts() {
        let mut gfx = backend();
        gfx.clear(Color::rgb(0.25, 0.5, 1.0));
        gfx.set_blending(Some(BlendMode::new(
            BlendFactor::OneMinusDstColor,
            BlendFactor::Zero,
        )));
        gfx.draw_screen_quad(Vec2::new(0.0, 0.45), Vec2::new(0.5, 0.55), Color::WHITE);
        let row = SIZE / 2;
        assert_eq!(gfx.color_at(2, row).rgb_vec(), Vec3::new(0.75, 0.5, 0.0));
        assert_eq!(gfx.color_at(SIZE - 2, row).rgb_vec(), Vec3::new(0.25, 0.5, 1.0));
    }

    #[test]
    fn lighting_darkens_surfaces_facing_away() {
        let mut gfx = backend();
        gfx.set_lighting(true);
        gfx.set_light(
            0,
            Some(LightState {
                source: LightSource::Directional(Vec3::NEG_Z),
                color: Color::WHITE,
            }),
        );
        let vertices: Vec<Vertex> = square(0.0, 1.0, Color::WHITE)
            .into_iter()
            .map(|v| v.with_normal(Vec3::Z))
            .collect();
        gfx.draw_triangles(&vertices, &CCW);
        let lit = gfx.color_at(SIZE / 2, SIZE / 2);
        assert!(lit.r > 0.99);

        gfx.clear_depth_stencil(1.0, 0);
        gfx.set_light(
            0,
            Some(LightState {
                source: LightSource::Directional(Vec3::Z),
                color: Color::WHITE,
            }),
        );
        gfx.draw_triangles(&vertices, &CCW);
        assert!(gfx.color_at(SIZE / 2, SIZE / 2).r < 0.01);
    }
}

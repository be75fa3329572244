//! Fixed-function graphics interface consumed by the scene, and a headless
//! software implementation of it.

mod raster;
mod software;

use glam::{Mat4, Vec2, Vec3};
use image::RgbaImage;

use crate::color::Color;
use crate::geometry::{Index, LightSource, TexCoord, Vertex};
use crate::texture::Texture;

pub use crate::texture::CubeFace;
pub use software::SoftwareBackend;

/// Number of hardware light units.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixSlot {
    World,
    View,
    Projection,
    Texture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    Never,
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
    Always,
}

impl CompareFunc {
    /// Evaluates `reference <op> value`.
    pub fn passes<T: PartialOrd>(self, reference: T, value: T) -> bool {
        match self {
            CompareFunc::Never => false,
            CompareFunc::Less => reference < value,
            CompareFunc::LessEqual => reference <= value,
            CompareFunc::Equal => reference == value,
            CompareFunc::GreaterEqual => reference >= value,
            CompareFunc::Greater => reference > value,
            CompareFunc::NotEqual => reference != value,
            CompareFunc::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Incr,
    Decr,
    Invert,
}

impl StencilOp {
    /// Applies the operation, saturating at the ends of the range.
    pub fn apply(self, value: u8, reference: u8) -> u8 {
        match self {
            StencilOp::Keep => value,
            StencilOp::Zero => 0,
            StencilOp::Replace => reference,
            StencilOp::Incr => value.saturating_add(1),
            StencilOp::Decr => value.saturating_sub(1),
            StencilOp::Invert => !value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
}

impl BlendFactor {
    fn weight(self, src: Color, dst: Color) -> [f32; 4] {
        match self {
            BlendFactor::Zero => [0.0; 4],
            BlendFactor::One => [1.0; 4],
            BlendFactor::SrcColor => [src.r, src.g, src.b, src.a],
            BlendFactor::OneMinusSrcColor => [1.0 - src.r, 1.0 - src.g, 1.0 - src.b, 1.0 - src.a],
            BlendFactor::DstColor => [dst.r, dst.g, dst.b, dst.a],
            BlendFactor::OneMinusDstColor => [1.0 - dst.r, 1.0 - dst.g, 1.0 - dst.b, 1.0 - dst.a],
            BlendFactor::SrcAlpha => [src.a; 4],
            BlendFactor::OneMinusSrcAlpha => [1.0 - src.a; 4],
        }
    }
}

/// Source and destination factors of `src * sf + dst * df`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendMode {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendMode {
    pub const ALPHA: Self = Self::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    pub const ADDITIVE: Self = Self::new(BlendFactor::SrcAlpha, BlendFactor::One);
    pub const MULTIPLY: Self = Self::new(BlendFactor::Zero, BlendFactor::SrcColor);

    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }

    pub fn blend(self, src: Color, dst: Color) -> Color {
        let sf = self.src.weight(src, dst);
        let df = self.dst.weight(src, dst);
        Color::new(
            src.r * sf[0] + dst.r * df[0],
            src.g * sf[1] + dst.g * df[1],
            src.b * sf[2] + dst.b * df[2],
            src.a * sf[3] + dst.a * df[3],
        )
        .clamped()
    }
}

/// Winding order considered front facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceOrder {
    Cw,
    #[default]
    Ccw,
}

impl FaceOrder {
    pub fn flipped(self) -> Self {
        match self {
            FaceOrder::Cw => FaceOrder::Ccw,
            FaceOrder::Ccw => FaceOrder::Cw,
        }
    }
}

/// Where draw calls land.
#[derive(Debug, Clone, Default)]
pub enum RenderTarget {
    #[default]
    Screen,
    CubeFace { texture: Texture, face: CubeFace },
}

impl RenderTarget {
    pub fn is_screen(&self) -> bool {
        matches!(self, RenderTarget::Screen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub point_sprites: bool,
    pub max_lights: usize,
}

/// Linear fog between `start` and `end` eye space distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub start: f32,
    pub end: f32,
}

/// Surface parameters used while lighting is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialState {
    pub diffuse: Color,
    pub specular: Color,
    pub emissive: Color,
    pub shininess: f32,
    pub alpha: f32,
    /// Weight of the environment map bound to texture unit 1.
    pub env_intensity: f32,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            diffuse: Color::WHITE,
            specular: Color::BLACK,
            emissive: Color::BLACK,
            shininess: 0.0,
            alpha: 1.0,
            env_intensity: 0.0,
        }
    }
}

/// One hardware light unit, in world space. `color` carries the intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub source: LightSource,
    pub color: Color,
}

/// Fixed-function rendering device.
///
/// State set through the setters persists until changed. Triangles are drawn
/// through the world, view and projection matrices; screen quads bypass them.
pub trait GraphicsBackend {
    fn viewport_size(&self) -> (u32, u32);
    fn capabilities(&self) -> Capabilities;

    fn clear(&mut self, color: Color);
    fn clear_depth_stencil(&mut self, depth: f32, stencil: u8);
    fn clear_stencil(&mut self, value: u8);

    fn set_matrix(&mut self, slot: MatrixSlot, matrix: Mat4);
    fn matrix(&self, slot: MatrixSlot) -> Mat4;

    fn set_ambient_light(&mut self, color: Color);
    /// Configures light unit `unit`; `None` disables it.
    fn set_light(&mut self, unit: usize, light: Option<LightState>);
    fn set_lighting(&mut self, enabled: bool);
    fn set_material(&mut self, material: &MaterialState);

    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_color_write(&mut self, enabled: bool);
    /// `None` disables blending.
    fn set_blending(&mut self, mode: Option<BlendMode>);
    fn set_backface_culling(&mut self, enabled: bool);
    fn set_front_face(&mut self, order: FaceOrder);
    fn front_face(&self) -> FaceOrder;

    fn set_stencil_test(&mut self, enabled: bool);
    fn set_stencil_func(&mut self, func: CompareFunc, reference: u8);
    fn set_stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);

    fn set_fog(&mut self, fog: Option<Fog>);
    /// Unit 0 modulates the surface color, unit 1 holds the environment map.
    fn bind_texture(&mut self, unit: usize, texture: Option<&Texture>);

    fn set_render_target(&mut self, target: RenderTarget);
    fn render_target(&self) -> RenderTarget;

    fn draw_triangles(&mut self, vertices: &[Vertex], indices: &[Index]);
    /// Screen aligned square of `size` pixels centered on `position`.
    fn draw_point_sprite(&mut self, position: Vec3, size: f32, color: Color);
    /// Rectangle in normalized screen coordinates with the origin at the top
    /// left. Ignores the depth buffer.
    fn draw_screen_quad(&mut self, min: Vec2, max: Vec2, color: Color);

    fn flip(&mut self);
    fn screen_capture(&self) -> RgbaImage;

    /// Camera facing quad of `size` world units centered on `position`.
    fn draw_billboard(&mut self, position: Vec3, size: f32, color: Color) {
        let view = self.matrix(MatrixSlot::View);
        let world = self.matrix(MatrixSlot::World);
        // camera axes expressed in the current model space
        let to_model = (view * world).inverse();
        let right = to_model.transform_vector3(Vec3::X).normalize_or_zero() * (size * 0.5);
        let up = to_model.transform_vector3(Vec3::Y).normalize_or_zero() * (size * 0.5);

        let corner = |offset: Vec3, u: f32, v: f32| {
            let tex = TexCoord::new(u, v);
            Vertex {
                position: position + offset,
                normal: Vec3::Z,
                tex: [tex, tex],
                color,
            }
        };
        let vertices = [
            corner(-right - up, 0.0, 1.0),
            corner(right - up, 1.0, 1.0),
            corner(right + up, 1.0, 0.0),
            corner(-right + up, 0.0, 0.0),
        ];
        self.draw_triangles(&vertices, &[0, 1, 2, 0, 2, 3]);
    }
}

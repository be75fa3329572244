use crate::color::Color;
use crate::gfx::MaterialState;
use crate::texture::Texture;

/// Alpha below `1 - TRANSPARENCY_EPSILON` counts as transparent.
pub const TRANSPARENCY_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct Material {
    pub diffuse: Color,
    pub specular: Color,
    pub emissive: Color,
    pub shininess: f32,
    pub alpha: f32,
    pub texture: Option<Texture>,
    /// Cube map reflected by the surface.
    pub env_map: Option<Texture>,
    pub env_intensity: f32,
    /// Re-render the environment map while the scene runs. When unset the
    /// map is rendered once, on the first frame.
    pub auto_refl: bool,
    /// Frames between environment map refreshes.
    pub auto_refl_upd: u32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Color::WHITE,
            specular: Color::BLACK,
            emissive: Color::BLACK,
            shininess: 0.0,
            alpha: 1.0,
            texture: None,
            env_map: None,
            env_intensity: 1.0,
            auto_refl: true,
            auto_refl_upd: 1,
        }
    }
}

impl Material {
    pub fn with_diffuse(diffuse: Color) -> Self {
        Self {
            diffuse,
            ..Self::default()
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha < 1.0 - TRANSPARENCY_EPSILON
    }

    /// Color the reflection is modulated with.
    pub fn reflectivity(&self) -> Color {
        (self.specular * self.env_intensity).with_alpha(1.0)
    }

    pub fn cube_env_map(&self) -> Option<&Texture> {
        self.env_map.as_ref().filter(|tex| tex.is_cube())
    }

    pub fn state(&self) -> MaterialState {
        MaterialState {
            diffuse: self.diffuse,
            specular: self.specular,
            emissive: self.emissive,
            shininess: self.shininess,
            alpha: self.alpha,
            env_intensity: self.env_intensity,
        }
    }
}

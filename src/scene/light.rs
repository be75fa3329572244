use glam::Vec3;

use crate::color::Color;
use crate::geometry::LightSource;
use crate::gfx::LightState;
use crate::xform::XForm;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Positioned by the light's transform.
    Point,
    /// Parallel rays travelling along the direction, rotated by the
    /// light's transform.
    Directional(Vec3),
}

#[derive(Debug, Clone)]
pub struct Light {
    name: String,
    kind: LightKind,
    pub xform: XForm,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadows: bool,
}

impl Light {
    pub fn point(name: impl Into<String>, position: Vec3) -> Self {
        let mut light = Self::with_kind(name, LightKind::Point);
        light.xform.set_position(position);
        light
    }

    pub fn directional(name: impl Into<String>, direction: Vec3) -> Self {
        Self::with_kind(name, LightKind::Directional(direction.normalize_or_zero()))
    }

    fn with_kind(name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            name: name.into(),
            kind,
            xform: XForm::new(),
            color: Color::WHITE,
            intensity: 1.0,
            cast_shadows: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// World space position or direction at `msec`.
    pub fn source_at(&self, msec: u64) -> LightSource {
        let prs = self.xform.prs_at(msec);
        match self.kind {
            LightKind::Point => LightSource::Point(prs.position),
            LightKind::Directional(dir) => LightSource::Directional(prs.rotation * dir),
        }
    }

    pub fn state_at(&self, msec: u64) -> LightState {
        LightState {
            source: self.source_at(msec),
            color: self.color * self.intensity,
        }
    }
}

use std::f32::consts::FRAC_PI_4;

use glam::{BVec3, Mat4, Vec3};

use crate::gfx::{FaceOrder, GraphicsBackend, MatrixSlot};
use crate::xform::XForm;

/// Camera looking from a position towards a target point. Both ends can be
/// keyframed.
#[derive(Debug, Clone)]
pub struct Camera {
    name: String,
    position: XForm,
    target: XForm,
    up: Vec3,
    fov: f32,
    aspect: Option<f32>,
    near: f32,
    far: f32,
    flip: BVec3,
}

impl Camera {
    pub fn new(name: impl Into<String>, position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            name: name.into(),
            position: XForm::new(),
            target: XForm::new(),
            up: Vec3::Y,
            fov: FRAC_PI_4,
            aspect: None,
            near: 1.0,
            far: 10000.0,
            flip: BVec3::FALSE,
        };
        camera.set_position(position);
        camera.set_target(target);
        camera
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position.set_position(position);
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target.set_position(target);
    }

    pub fn position_xform_mut(&mut self) -> &mut XForm {
        &mut self.position
    }

    pub fn target_xform_mut(&mut self) -> &mut XForm {
        &mut self.target
    }

    pub fn position_at(&self, msec: u64) -> Vec3 {
        self.position.prs_at(msec).position
    }

    pub fn target_at(&self, msec: u64) -> Vec3 {
        self.target.prs_at(msec).position
    }

    pub fn set_up_vector(&mut self, up: Vec3) {
        self.up = up;
    }

    /// Vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    /// Fixes the aspect ratio; unset cameras follow the viewport.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = Some(aspect);
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
    }

    /// Mirrors the image along the selected view axes.
    pub fn flip(&mut self, x: bool, y: bool, z: bool) {
        self.flip = BVec3::new(x, y, z);
    }

    pub fn view_matrix(&self, msec: u64) -> Mat4 {
        let eye = self.position_at(msec);
        let view = Mat4::look_at_rh(eye, self.target_at(msec), self.up);
        let mirror = Vec3::select(self.flip, Vec3::NEG_ONE, Vec3::ONE);
        Mat4::from_scale(mirror) * view
    }

    pub fn projection_matrix(&self, viewport_aspect: f32) -> Mat4 {
        let aspect = self.aspect.unwrap_or(viewport_aspect);
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Winding that faces the viewer once the flips are applied.
    pub fn front_face(&self) -> FaceOrder {
        let flips = [self.flip.x, self.flip.y, self.flip.z]
            .into_iter()
            .filter(|&f| f)
            .count();
        if flips % 2 == 1 {
            FaceOrder::default().flipped()
        } else {
            FaceOrder::default()
        }
    }

    /// Loads the view and projection for `msec` into the backend.
    pub fn activate(&self, gfx: &mut dyn GraphicsBackend, msec: u64) {
        let (width, height) = gfx.viewport_size();
        let aspect = width as f32 / height.max(1) as f32;
        gfx.set_matrix(MatrixSlot::View, self.view_matrix(msec));
        gfx.set_matrix(MatrixSlot::Projection, self.projection_matrix(aspect));
        gfx.set_front_face(self.front_face());
    }
}

//! Scene graph and the per-frame rendering pipeline.
//!
//! A [`Scene`] holds objects, up to [`MAX_LIGHTS`] lights, cameras, curves and
//! particle systems. [`Scene::render`] draws one frame: it refreshes cube map
//! reflections by rendering the scene again from each reflective object,
//! advances the particle systems, draws the objects with the active camera
//! and finally darkens shadowed pixels with stencil shadow volumes.

mod camera;
mod capture;
mod curve;
mod entity;
mod light;
pub mod loader;
mod material;
mod object;

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use log::{debug, warn};

use crate::color::Color;
use crate::error::SceneError;
use crate::gfx::{
    BlendMode, CompareFunc, CubeFace, Fog, GraphicsBackend, MatrixSlot, RenderTarget, StencilOp,
    MAX_LIGHTS,
};
use crate::particles::ParticleSystem;

pub use camera::Camera;
pub use curve::{Curve, CurveKind};
pub use entity::{Entity, EntityMut, EntityRef};
pub use light::{Light, LightKind};
pub use material::{Material, TRANSPARENCY_EPSILON};
pub use object::{Object, RenderParams};

/// State threaded through nested renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RenderContext {
    depth: u32,
    /// Cube face being rendered; its camera replaces the active one.
    face: Option<CubeFace>,
    /// Object left out of the pass, so that it does not reflect itself.
    exclude: Option<usize>,
}

impl RenderContext {
    fn is_outermost(&self) -> bool {
        self.depth == 0
    }

    fn reflection(self, face: CubeFace, object: usize) -> Self {
        Self {
            depth: self.depth + 1,
            face: Some(face),
            exclude: Some(object),
        }
    }
}

pub struct Scene {
    /// Opaque objects first, transparent ones after them.
    objects: VecDeque<Entity<Object>>,
    lights: [Option<Entity<Light>>; MAX_LIGHTS],
    cameras: Vec<Entity<Camera>>,
    active_camera: Option<usize>,
    curves: Vec<Entity<Curve>>,
    particle_systems: Vec<Entity<ParticleSystem>>,
    ambient: Color,
    fog: Option<Fog>,
    background: Color,
    auto_clear: bool,
    shadows: bool,
    external_force: Vec3,
    cube_cameras: [Camera; 6],
    frame_count: u64,
    first_render: bool,
    frame_poly_count: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: VecDeque::new(),
            lights: Default::default(),
            cameras: Vec::new(),
            active_camera: None,
            curves: Vec::new(),
            particle_systems: Vec::new(),
            ambient: Color::BLACK,
            fog: None,
            background: Color::BLACK,
            auto_clear: true,
            shadows: false,
            external_force: Vec3::ZERO,
            cube_cameras: CubeFace::ALL.map(cube_camera),
            frame_count: 0,
            first_render: true,
            frame_poly_count: 0,
        }
    }

    pub fn add_object(&mut self, object: impl Into<Entity<Object>>) {
        let object = object.into();
        if object.borrow().material.is_transparent() {
            self.objects.push_back(object);
        } else {
            self.objects.push_front(object);
        }
    }

    /// Puts the light in the first free slot and returns the slot index.
    pub fn add_light(&mut self, light: impl Into<Entity<Light>>) -> Result<usize, SceneError> {
        let slot = self
            .lights
            .iter()
            .position(Option::is_none)
            .ok_or(SceneError::LightCapacity {
                capacity: MAX_LIGHTS,
            })?;
        self.lights[slot] = Some(light.into());
        Ok(slot)
    }

    /// The first camera added becomes the active one.
    pub fn add_camera(&mut self, camera: impl Into<Entity<Camera>>) {
        self.cameras.push(camera.into());
        if self.active_camera.is_none() {
            self.active_camera = Some(self.cameras.len() - 1);
        }
    }

    pub fn add_curve(&mut self, curve: impl Into<Entity<Curve>>) {
        self.curves.push(curve.into());
    }

    pub fn add_particle_system(&mut self, system: impl Into<Entity<ParticleSystem>>) {
        self.particle_systems.push(system.into());
    }

    pub fn remove_object(&mut self, name: &str) -> Option<Entity<Object>> {
        let index = self.objects.iter().position(|o| o.borrow().name() == name)?;
        self.objects.remove(index)
    }

    pub fn remove_light(&mut self, name: &str) -> Option<Entity<Light>> {
        self.lights
            .iter_mut()
            .find(|slot| matches!(slot, Some(light) if light.borrow().name() == name))
            .and_then(Option::take)
    }

    pub fn remove_particle_system(&mut self, name: &str) -> Option<Entity<ParticleSystem>> {
        let index = self
            .particle_systems
            .iter()
            .position(|p| p.borrow().name() == name)?;
        Some(self.particle_systems.remove(index))
    }

    pub fn object(&self, name: &str) -> Option<EntityRef<'_, Object>> {
        self.objects
            .iter()
            .find(|o| o.borrow().name() == name)
            .map(Entity::borrow)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<EntityMut<'_, Object>> {
        self.objects
            .iter_mut()
            .find(|o| o.borrow().name() == name)
            .map(Entity::borrow_mut)
    }

    pub fn light(&self, name: &str) -> Option<EntityRef<'_, Light>> {
        self.lights
            .iter()
            .flatten()
            .find(|l| l.borrow().name() == name)
            .map(Entity::borrow)
    }

    pub fn camera(&self, name: &str) -> Option<EntityRef<'_, Camera>> {
        self.cameras
            .iter()
            .find(|c| c.borrow().name() == name)
            .map(Entity::borrow)
    }

    pub fn curve(&self, name: &str) -> Option<EntityRef<'_, Curve>> {
        self.curves
            .iter()
            .find(|c| c.borrow().name() == name)
            .map(Entity::borrow)
    }

    pub fn particle_system(&self, name: &str) -> Option<EntityRef<'_, ParticleSystem>> {
        self.particle_systems
            .iter()
            .find(|p| p.borrow().name() == name)
            .map(Entity::borrow)
    }

    pub fn particle_system_mut(&mut self, name: &str) -> Option<EntityMut<'_, ParticleSystem>> {
        self.particle_systems
            .iter_mut()
            .find(|p| p.borrow().name() == name)
            .map(Entity::borrow_mut)
    }

    /// Object names in drawing order.
    pub fn object_names(&self) -> Vec<String> {
        self.objects
            .iter()
            .map(|o| o.borrow().name().to_string())
            .collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.iter().flatten().count()
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    pub fn particle_system_count(&self) -> usize {
        self.particle_systems.len()
    }

    pub fn set_active_camera(&mut self, name: &str) -> bool {
        match self.cameras.iter().position(|c| c.borrow().name() == name) {
            Some(index) => {
                self.active_camera = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn active_camera(&self) -> Option<EntityRef<'_, Camera>> {
        self.active_camera
            .and_then(|index| self.cameras.get(index))
            .map(Entity::borrow)
    }

    pub fn ambient_light(&self) -> Color {
        self.ambient
    }

    pub fn set_ambient_light(&mut self, color: Color) {
        self.ambient = color;
    }

    pub fn fog(&self) -> Option<Fog> {
        self.fog
    }

    pub fn set_fog(&mut self, fog: Option<Fog>) {
        self.fog = fog;
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// Clearing the screen before each frame; on by default.
    pub fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadows
    }

    pub fn set_shadows(&mut self, enabled: bool) {
        self.shadows = enabled;
    }

    /// Force applied to every particle on top of its system's gravity.
    pub fn set_external_force(&mut self, force: Vec3) {
        self.external_force = force;
    }

    /// Frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Triangles in all objects of the scene.
    pub fn poly_count(&self) -> usize {
        self.objects
            .iter()
            .map(|o| o.borrow().mesh().triangle_count())
            .sum()
    }

    /// Triangles drawn during the last frame, reflection passes included.
    pub fn frame_poly_count(&self) -> usize {
        self.frame_poly_count
    }

    /// Renders one frame at `msec`.
    pub fn render(&mut self, gfx: &mut dyn GraphicsBackend, msec: u64) {
        self.render_with(gfx, msec, RenderContext::default());
    }

    fn render_with(&mut self, gfx: &mut dyn GraphicsBackend, msec: u64, ctx: RenderContext) {
        gfx.set_ambient_light(self.ambient);

        let mut rendered_cube_maps = false;
        if ctx.is_outermost() {
            self.frame_poly_count = 0;
            rendered_cube_maps = self.render_cube_maps_with(gfx, msec, ctx);
            self.first_render = false;
            self.frame_count += 1;

            let now = msec as f32 / 1000.0;
            for system in &mut self.particle_systems {
                system.borrow_mut().update(now, self.external_force);
            }
        }

        if self.auto_clear || rendered_cube_maps {
            gfx.clear(self.background);
            gfx.clear_depth_stencil(1.0, 0);
        }

        if !self.activate_camera(gfx, msec, ctx) {
            debug!("no active camera, skipping frame at {msec} ms");
            return;
        }
        self.setup_lights(gfx, msec);
        gfx.set_fog(self.fog);

        for (index, object) in self.objects.iter_mut().enumerate() {
            if ctx.exclude == Some(index) {
                continue;
            }
            let mut object = object.borrow_mut();
            if object.params.hidden {
                continue;
            }
            if object.render(gfx, msec) {
                self.frame_poly_count += object.mesh().triangle_count();
            }
        }

        for system in &mut self.particle_systems {
            system.borrow_mut().draw(gfx);
        }

        if self.shadows {
            self.draw_shadows(gfx, msec, ctx.exclude);
        }
        gfx.set_fog(None);
    }

    fn activate_camera(
        &self,
        gfx: &mut dyn GraphicsBackend,
        msec: u64,
        ctx: RenderContext,
    ) -> bool {
        match ctx.face {
            Some(face) => {
                self.cube_cameras[face.index()].activate(gfx, msec);
                true
            }
            None => match self.active_camera() {
                Some(camera) => {
                    camera.activate(gfx, msec);
                    true
                }
                None => false,
            },
        }
    }

    /// Loads the occupied light slots into consecutive light units and
    /// switches off the unit after the last one.
    pub fn setup_lights(&self, gfx: &mut dyn GraphicsBackend, msec: u64) {
        let mut unit = 0;
        for light in self.lights.iter().flatten() {
            gfx.set_light(unit, Some(light.borrow().state_at(msec)));
            unit += 1;
        }
        if unit < MAX_LIGHTS {
            gfx.set_light(unit, None);
        }
    }

    /// Renders the environment map of the named object. Returns false when
    /// the object is missing, hidden or has no cube environment map.
    pub fn render_cube_map(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        name: &str,
        msec: u64,
    ) -> bool {
        match self.objects.iter().position(|o| o.borrow().name() == name) {
            Some(index) => self.render_cube_map_at(gfx, index, msec, RenderContext::default()),
            None => false,
        }
    }

    /// Refreshes every environment map that is due this frame. Static
    /// reflections drawn here are not drawn again by the first frame.
    pub fn render_all_cube_maps(&mut self, gfx: &mut dyn GraphicsBackend, msec: u64) -> bool {
        let rendered = self.render_cube_maps_with(gfx, msec, RenderContext::default());
        self.first_render = false;
        rendered
    }

    fn render_cube_maps_with(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        msec: u64,
        ctx: RenderContext,
    ) -> bool {
        let mut rendered = false;
        for index in 0..self.objects.len() {
            let due = {
                let object = self.objects[index].borrow();
                let material = &object.material;
                let scheduled = if material.auto_refl {
                    material.auto_refl_upd <= 1
                        || self.frame_count % u64::from(material.auto_refl_upd) == 0
                } else {
                    self.first_render
                };
                !object.params.hidden && scheduled && material.cube_env_map().is_some()
            };
            if due {
                rendered |= self.render_cube_map_at(gfx, index, msec, ctx);
            }
        }
        rendered
    }

    fn render_cube_map_at(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        index: usize,
        msec: u64,
        ctx: RenderContext,
    ) -> bool {
        let (env, origin, reflectivity) = {
            let object = self.objects[index].borrow();
            let Some(env) = object.material.cube_env_map().cloned() else {
                warn!("{} has no cube environment map to render", object.name());
                return false;
            };
            if object.params.hidden {
                return false;
            }
            (env, object.reflection_origin(msec), object.material.reflectivity())
        };

        self.place_cube_cameras(origin);

        for face in CubeFace::ALL {
            gfx.set_render_target(RenderTarget::CubeFace {
                texture: env.clone(),
                face,
            });
            gfx.clear(self.background);
            gfx.clear_depth_stencil(1.0, 0);
            self.render_with(gfx, msec, ctx.reflection(face, index));

            gfx.set_blending(Some(BlendMode::MULTIPLY));
            gfx.draw_screen_quad(Vec2::ZERO, Vec2::ONE, reflectivity);
            gfx.set_blending(None);

            gfx.set_render_target(RenderTarget::Screen);
        }

        self.setup_lights(gfx, msec);
        true
    }

    fn place_cube_cameras(&mut self, position: Vec3) {
        for (camera, face) in self.cube_cameras.iter_mut().zip(CubeFace::ALL) {
            camera.set_position(position);
            camera.set_target(position + face.direction());
        }
    }

    /// Darkens every pixel hidden from at least one shadow casting light.
    pub fn render_shadows(&self, gfx: &mut dyn GraphicsBackend, msec: u64) {
        self.draw_shadows(gfx, msec, None);
    }

    fn draw_shadows(&self, gfx: &mut dyn GraphicsBackend, msec: u64, exclude: Option<usize>) {
        let front = gfx.front_face();

        gfx.set_stencil_test(true);
        gfx.set_stencil_func(CompareFunc::Always, 0);
        gfx.clear_stencil(0);
        gfx.set_color_write(false);
        gfx.set_depth_write(false);
        gfx.set_lighting(false);
        gfx.set_backface_culling(true);
        gfx.bind_texture(0, None);
        gfx.bind_texture(1, None);

        for light in self.lights.iter().flatten() {
            let light = light.borrow();
            if !light.cast_shadows {
                continue;
            }
            let source = light.source_at(msec);

            for (index, object) in self.objects.iter().enumerate() {
                let object = object.borrow();
                if exclude == Some(index) || object.params.hidden || !object.params.cast_shadows {
                    continue;
                }

                let world = object.world_matrix(msec);
                let volume = object
                    .mesh()
                    .shadow_volume(source.transformed(&world.inverse()));
                if volume.is_empty() {
                    continue;
                }
                gfx.set_matrix(MatrixSlot::World, world);

                gfx.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Incr);
                gfx.set_front_face(front);
                gfx.draw_triangles(volume.vertices(), volume.index_array());

                gfx.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Decr);
                gfx.set_front_face(front.flipped());
                gfx.draw_triangles(volume.vertices(), volume.index_array());
            }
        }

        gfx.set_front_face(front);
        gfx.set_color_write(true);
        gfx.set_depth_write(true);
        gfx.set_lighting(true);

        gfx.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Keep);
        gfx.set_stencil_func(CompareFunc::NotEqual, 0);
        gfx.draw_screen_quad(Vec2::ZERO, Vec2::ONE, self.ambient);
        gfx.set_stencil_test(false);
    }
}

fn cube_camera(face: CubeFace) -> Camera {
    let mut camera = Camera::new(format!("cube {face:?}"), Vec3::ZERO, face.direction());
    camera.set_fov(FRAC_PI_2);
    camera.set_aspect(1.0);
    camera.set_up_vector(face.up());
    // the render target stores rows top down, the cube map lookup expects
    // the horizontal axis mirrored
    camera.flip(true, false, false);
    camera
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{primitives, LightSource};
    use crate::gfx::SoftwareBackend;

    fn object(name: &str, alpha: f32) -> Object {
        let mut object = Object::new(name, primitives::cube(1.0));
        object.material.alpha = alpha;
        object
    }

    #[test]
    fn opaque_objects_draw_before_transparent_ones() {
        let mut scene = Scene::new();
        scene.add_object(object("glass", 0.5));
        scene.add_object(object("a", 1.0));
        scene.add_object(object("b", 1.0));
        scene.add_object(object("smoke", 0.2));
        let names = scene.object_names();
        let glass = names.iter().position(|n| n == "glass");
        for opaque in ["a", "b"] {
            assert!(names.iter().position(|n| n == opaque) < glass);
        }
        assert_eq!(names.last().map(String::as_str), Some("smoke"));
    }

    #[test]
    fn ninth_light_is_rejected() {
        let mut scene = Scene::new();
        for i in 0..MAX_LIGHTS {
            let slot = scene
                .add_light(Light::point(format!("l{i}"), Vec3::Y))
                .expect("free slot");
            assert_eq!(slot, i);
        }
        let err = scene.add_light(Light::point("extra", Vec3::Y)).unwrap_err();
        assert!(matches!(err, SceneError::LightCapacity { capacity: 8 }));

        assert!(scene.remove_light("l3").is_some());
        assert_eq!(scene.add_light(Light::point("extra", Vec3::Y)).ok(), Some(3));
        assert!(scene.light("extra").is_some());
    }

    #[test]
    fn first_camera_becomes_active() {
        let mut scene = Scene::new();
        scene.add_camera(Camera::new("one", Vec3::Z, Vec3::ZERO));
        scene.add_camera(Camera::new("two", Vec3::X, Vec3::ZERO));
        assert_eq!(scene.active_camera().map(|c| c.name().to_string()), Some("one".into()));
        assert!(scene.set_active_camera("two"));
        assert!(!scene.set_active_camera("three"));
        assert_eq!(scene.active_camera().map(|c| c.name().to_string()), Some("two".into()));
    }

    #[test]
    fn frame_without_camera_only_clears() {
        let mut scene = Scene::new();
        scene.set_background(Color::rgb(0.0, 0.0, 1.0));
        scene.add_object(object("box", 1.0));
        let mut gfx = SoftwareBackend::new(8, 8);
        scene.render(&mut gfx, 0);
        assert_eq!(scene.frame_count(), 1);
        assert_eq!(scene.frame_poly_count(), 0);
        assert_eq!(gfx.color_at(4, 4), Color::rgb(0.0, 0.0, 1.0));
    }

    #[test]
    fn hidden_objects_are_not_counted() {
        let mut scene = Scene::new();
        scene.add_camera(Camera::new("cam", Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO));
        scene.add_object(object("shown", 1.0));
        let mut hidden = object("hidden", 1.0);
        hidden.set_hidden(true);
        scene.add_object(hidden);
        assert_eq!(scene.poly_count(), 24);

        let mut gfx = SoftwareBackend::new(8, 8);
        scene.render(&mut gfx, 0);
        assert_eq!(scene.frame_poly_count(), 12);
    }

    #[test]
    fn lights_fill_consecutive_units() {
        let mut scene = Scene::new();
        scene.add_light(Light::point("a", Vec3::Y)).expect("slot");
        scene.add_light(Light::point("b", Vec3::X)).expect("slot");
        scene.add_light(Light::point("c", Vec3::Z)).expect("slot");
        scene.remove_light("a");

        let mut gfx = SoftwareBackend::new(1, 1);
        let stale = Light::point("stale", Vec3::ONE).state_at(0);
        gfx.set_light(2, Some(stale));
        gfx.set_light(3, Some(stale));
        scene.setup_lights(&mut gfx, 0);

        assert_eq!(gfx.light_unit(0).map(|l| l.source), Some(LightSource::Point(Vec3::X)));
        assert_eq!(gfx.light_unit(1).map(|l| l.source), Some(LightSource::Point(Vec3::Z)));
        assert_eq!(gfx.light_unit(2), None);
        // only the first unused unit is switched off
        assert_eq!(gfx.light_unit(3), Some(stale));
    }

    #[test]
    fn removal_by_name() {
        let mut scene = Scene::new();
        scene.add_object(object("box", 1.0));
        scene.add_particle_system(ParticleSystem::new("sparks"));
        assert!(scene.remove_object("missing").is_none());
        assert!(scene.remove_object("box").is_some());
        assert_eq!(scene.object_count(), 0);
        assert!(scene.particle_system("sparks").is_some());
        assert!(scene.remove_particle_system("sparks").is_some());
        assert_eq!(scene.particle_system_count(), 0);
    }

    #[test]
    fn static_reflections_render_once() {
        let mut scene = Scene::new();
        scene.add_camera(Camera::new("cam", Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO));
        let mut mirror = object("mirror", 1.0);
        mirror.material.env_map = Some(crate::texture::Texture::cube("env", 4));
        mirror.material.auto_refl = false;
        scene.add_object(mirror);

        let mut gfx = SoftwareBackend::new(8, 8);
        assert!(scene.render_all_cube_maps(&mut gfx, 0));
        scene.render(&mut gfx, 0);
        assert!(!scene.render_all_cube_maps(&mut gfx, 16));
    }

    #[test]
    fn explicit_static_reflection_is_not_repeated_by_first_frame() {
        let mut scene = Scene::new();
        scene.add_camera(Camera::new("cam", Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO));
        scene.add_object(object("box", 1.0));
        let mut mirror = object("mirror", 1.0);
        mirror.material.env_map = Some(crate::texture::Texture::cube("env", 4));
        mirror.material.auto_refl = false;
        scene.add_object(mirror);

        let mut gfx = SoftwareBackend::new(8, 8);
        assert!(scene.render_all_cube_maps(&mut gfx, 0));
        scene.render(&mut gfx, 0);
        // main pass only, no reflection passes
        assert_eq!(scene.frame_poly_count(), 24);
    }

    #[test]
    fn auto_reflection_throttle() {
        let mut scene = Scene::new();
        let mut mirror = object("mirror", 1.0);
        mirror.material.env_map = Some(crate::texture::Texture::cube("env", 4));
        mirror.material.auto_refl_upd = 3;
        scene.add_object(mirror);

        let mut gfx = SoftwareBackend::new(8, 8);
        let due: Vec<bool> = (0..6)
            .map(|frame| {
                let due = scene.render_all_cube_maps(&mut gfx, frame);
                scene.render(&mut gfx, frame);
                due
            })
            .collect();
        assert_eq!(due, vec![true, false, false, true, false, false]);
    }

    #[test]
    fn cube_map_on_plain_object_is_a_no_op() {
        let mut scene = Scene::new();
        scene.add_object(object("plain", 1.0));
        let mut gfx = SoftwareBackend::new(8, 8);
        assert!(!scene.render_cube_map(&mut gfx, "plain", 0));
        assert!(!scene.render_cube_map(&mut gfx, "missing", 0));
    }
}

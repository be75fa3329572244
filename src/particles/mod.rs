//! Particle systems: fuzzy emission parameters, fixed timestep simulation and
//! point sprite or billboard rendering.

mod fuzzy;
mod params;
mod particle;

use std::f32::consts::TAU;
use std::path::Path;

use glam::{Mat4, Vec3};
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::gfx::{BlendMode, GraphicsBackend, MatrixSlot};
use crate::texture::TextureManager;
use crate::xform::XForm;

pub use fuzzy::{Fuzzy, FuzzyVec3};
pub use params::ParticleSysParams;
pub use particle::{BillboardParticle, Particle, ParticleBody};

/// Simulation step in seconds.
pub const TIMESLICE: f32 = 1.0 / 30.0;

/// Slack when counting whole timeslices, absorbs float error in `now`.
const SLICE_EPSILON: f32 = 1e-3;

/// Point sprite pixels per billboard world unit.
pub const PSPRITE_BILLBOARD_RATIO: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleType {
    #[default]
    Billboard,
    /// Not implemented; spawning one aborts.
    Mesh,
}

/// Emitter owning a set of live particles.
pub struct ParticleSystem {
    name: String,
    xform: XForm,
    params: ParticleSysParams,
    ptype: ParticleType,
    particles: Vec<Particle>,
    prev_update: f32,
    fraction: f32,
    spawned: u64,
    current_pos: Vec3,
    current_halo_rot: f32,
    ready: bool,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xform: XForm::new(),
            params: ParticleSysParams::default(),
            ptype: ParticleType::Billboard,
            particles: Vec::new(),
            prev_update: 0.0,
            fraction: 0.0,
            spawned: 0,
            current_pos: Vec3::ZERO,
            current_halo_rot: 0.0,
            ready: true,
            rng: StdRng::from_entropy(),
        }
    }

    /// Builds a system from a descriptor file. A descriptor that cannot be
    /// read leaves the system not ready, so it never updates or draws.
    pub fn from_descriptor(
        name: impl Into<String>,
        path: &Path,
        textures: &TextureManager,
    ) -> Self {
        let mut system = Self::new(name);
        match ParticleSysParams::load(path, textures) {
            Ok(params) => system.params = params,
            Err(err) => {
                error!("error loading particle file {}: {err}", path.display());
                system.ready = false;
            }
        }
        system
    }

    /// Reseeds the random source, making emission reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn params(&self) -> &ParticleSysParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ParticleSysParams) {
        self.params = params;
    }

    pub fn particle_type(&self) -> ParticleType {
        self.ptype
    }

    pub fn set_particle_type(&mut self, ptype: ParticleType) {
        self.ptype = ptype;
    }

    pub fn xform(&self) -> &XForm {
        &self.xform
    }

    pub fn xform_mut(&mut self) -> &mut XForm {
        &mut self.xform
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Total particles emitted since creation.
    pub fn spawned_count(&self) -> u64 {
        self.spawned
    }

    /// Advances the simulation to `now` (seconds).
    ///
    /// Runs one physics step per whole timeslice elapsed since the previous
    /// update. Leftover time shorter than a timeslice carries over to the
    /// next call, so the simulation does not depend on the call rate.
    /// Gravity plus `external_force` act on every particle.
    pub fn update(&mut self, now: f32, external_force: Vec3) {
        if !self.ready {
            return;
        }

        let elapsed = now - self.prev_update;
        let updates_missed = (elapsed / TIMESLICE + SLICE_EPSILON).floor() as i64;
        if updates_missed == 0 {
            return;
        }
        if updates_missed < 0 {
            // clock went backwards, restart from here
            self.prev_update = now;
            return;
        }
        // whole timeslices only, the remainder waits for the next call
        let consumed = updates_missed as f32 * TIMESLICE;

        let prs = self.xform.prs_at((now * 1000.0) as u64);
        self.current_pos = prs.position;
        self.current_halo_rot = self.params.halo_rot * now;
        let angle = (self.params.glob_rot * now) % TAU;

        let spawn = self.params.birth_rate.sample(&mut self.rng) * consumed;
        let mut spawn_count = spawn.round() as i64;
        self.fraction += spawn - spawn.round();
        if self.fraction > 1.0 {
            self.fraction -= 1.0;
            spawn_count += 1;
        } else if self.fraction < -1.0 {
            self.fraction += 1.0;
            spawn_count -= 1;
        }

        for _ in 0..spawn_count.max(0) {
            let particle = self.spawn(prs.position, angle, now);
            self.particles.push(particle);
            self.spawned += 1;
        }

        let force = self.params.gravity + external_force;
        for particle in &mut self.particles {
            let mut steps = 0;
            while particle.is_alive(now) && steps < updates_missed {
                particle.step(now, force);
                steps += 1;
            }
        }
        self.particles.retain(|p| p.is_alive(now));

        self.prev_update += consumed;
    }

    fn spawn(&mut self, origin: Vec3, angle: f32, now: f32) -> Particle {
        let params = &self.params;
        let rng = &mut self.rng;
        let body = ParticleBody {
            position: origin + params.spawn_offset.sample(rng),
            velocity: params.shoot_dir.sample(rng),
            friction: params.friction,
            size: params.psize.sample(rng),
            lifespan: params.lifespan.sample(rng),
            birth_time: now,
        };

        match self.ptype {
            ParticleType::Billboard => Particle::Billboard(BillboardParticle {
                body,
                texture: params.billboard_tex.clone(),
                start_color: params.start_color,
                end_color: params.end_color,
                color: params.start_color,
                rot: params.rot,
                birth_angle: angle,
                angle,
            }),
            ParticleType::Mesh => {
                error!("only billboarded particles are implemented");
                panic!("particle system {}: mesh particles are not implemented", self.name);
            }
        }
    }

    /// Renders the live particles and the optional halo.
    pub fn draw(&mut self, gfx: &mut dyn GraphicsBackend) {
        if !self.ready {
            return;
        }
        let use_sprites = !self.params.big_particles && gfx.capabilities().point_sprites;

        gfx.set_matrix(MatrixSlot::World, Mat4::IDENTITY);

        if self.ptype == ParticleType::Billboard {
            gfx.set_lighting(false);
            gfx.set_depth_write(false);
            gfx.set_backface_culling(false);
            gfx.set_blending(Some(BlendMode::ADDITIVE));
            gfx.bind_texture(0, self.params.billboard_tex.as_ref());
            gfx.bind_texture(1, None);

            for particle in &self.particles {
                let Particle::Billboard(p) = particle;
                gfx.set_matrix(MatrixSlot::Texture, texture_spin(p.angle));
                if use_sprites {
                    gfx.draw_point_sprite(p.body.position, p.body.size, p.color);
                } else {
                    gfx.draw_billboard(
                        p.body.position,
                        p.body.size / PSPRITE_BILLBOARD_RATIO,
                        p.color,
                    );
                }
            }

            gfx.bind_texture(0, None);
            gfx.set_matrix(MatrixSlot::Texture, Mat4::IDENTITY);
            gfx.set_blending(None);
            gfx.set_backface_culling(true);
            gfx.set_depth_write(true);
            gfx.set_lighting(true);
        }

        if let Some(halo) = &self.params.halo {
            let size = self.params.halo_size.sample(&mut self.rng) / PSPRITE_BILLBOARD_RATIO;
            gfx.set_matrix(MatrixSlot::Texture, texture_spin(self.current_halo_rot));
            gfx.set_lighting(false);
            gfx.set_backface_culling(false);
            gfx.set_blending(Some(BlendMode::ADDITIVE));
            gfx.bind_texture(0, Some(halo));
            gfx.bind_texture(1, None);
            gfx.set_depth_write(false);

            gfx.draw_billboard(self.current_pos, size, self.params.halo_color);

            gfx.set_depth_write(true);
            gfx.bind_texture(0, None);
            gfx.set_blending(None);
            gfx.set_backface_culling(true);
            gfx.set_lighting(true);
            gfx.set_matrix(MatrixSlot::Texture, Mat4::IDENTITY);
        }
    }
}

/// Rotation of texture coordinates about the texture center.
fn texture_spin(angle: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.5, 0.5, 0.0))
        * Mat4::from_rotation_z(angle)
        * Mat4::from_translation(Vec3::new(-0.5, -0.5, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::gfx::SoftwareBackend;

    fn steady(rate: f32, life: f32) -> ParticleSystem {
        let mut system = ParticleSystem::new("test").with_seed(1);
        system.set_params(ParticleSysParams {
            birth_rate: Fuzzy::exact(rate),
            lifespan: Fuzzy::exact(life),
            friction: 1.0,
            ..ParticleSysParams::default()
        });
        system
    }

    fn run(system: &mut ParticleSystem, step: f32, until: f32) {
        let calls = (until / step).round() as u32;
        for i in 1..=calls {
            system.update(i as f32 * step, Vec3::ZERO);
        }
    }

    #[test]
    fn spawn_total_tracks_birth_rate_for_any_chunking() {
        for step in [0.011, 0.05, 0.2, 0.5] {
            let mut system = steady(10.0, 1000.0);
            run(&mut system, step, 10.0);
            let spawned = system.spawned_count() as f32;
            let expected = 10.0 * system.prev_update;
            assert!(
                (spawned - expected).abs() <= 1.0 + 1e-3,
                "step {step}: spawned {spawned}, expected {expected}"
            );
            assert_eq!(system.particle_count() as u64, system.spawned_count());
        }
    }

    #[test]
    fn sub_timeslice_calls_accumulate() {
        let mut system = steady(30.0, 1000.0);
        system.update(0.01, Vec3::ZERO);
        system.update(0.02, Vec3::ZERO);
        assert_eq!(system.particle_count(), 0);
        assert_eq!(system.prev_update, 0.0);

        system.update(0.04, Vec3::ZERO);
        assert_eq!(system.particle_count(), 1);
        assert!((system.prev_update - TIMESLICE).abs() < 1e-6);
    }

    fn drifting_particle() -> Particle {
        Particle::Billboard(BillboardParticle {
            body: ParticleBody {
                lifespan: 100.0,
                friction: 1.0,
                ..ParticleBody::default()
            },
            texture: None,
            start_color: Color::WHITE,
            end_color: Color::WHITE,
            color: Color::WHITE,
            rot: 0.0,
            birth_angle: 0.0,
            angle: 0.0,
        })
    }

    #[test]
    fn simulation_speed_ignores_frame_rate() {
        let force = Vec3::new(0.0, -0.01, 0.0);
        for fps in [20u32, 30, 50] {
            let mut system = steady(0.0, 100.0);
            system.particles.push(drifting_particle());
            for frame in 1..=fps {
                system.update(frame as f32 / fps as f32, force);
            }
            let velocity = system.particles()[0].body().velocity;
            assert!(
                (velocity.y + 0.3).abs() < 1e-4,
                "{fps} fps: velocity {velocity}"
            );
        }
    }

    #[test]
    fn clock_going_backwards_restarts_timing() {
        let mut system = steady(30.0, 1000.0);
        system.update(2.0, Vec3::ZERO);
        let spawned = system.spawned_count();
        assert!(spawned > 0);

        system.update(1.0, Vec3::ZERO);
        assert_eq!(system.spawned_count(), spawned);
        assert_eq!(system.prev_update, 1.0);

        system.update(1.0 + TIMESLICE, Vec3::ZERO);
        assert_eq!(system.spawned_count(), spawned + 1);
    }

    #[test]
    fn particles_expire_after_lifespan() {
        let mut system = steady(30.0, 0.5);
        system.update(0.1, Vec3::ZERO);
        let first_batch = system.particle_count();
        assert!(first_batch > 0);

        // stop emitting and let everything age out
        system.params.birth_rate = Fuzzy::exact(0.0);
        system.update(0.7, Vec3::ZERO);
        assert_eq!(system.particle_count(), 0);
    }

    #[test]
    fn physics_runs_once_per_missed_timeslice() {
        let mut system = steady(0.0, 100.0);
        system.particles.push(drifting_particle());
        system.update(3.0 * TIMESLICE, Vec3::new(0.0, -1.0, 0.0));
        let body = system.particles()[0].body();
        // velocity -1, -2, -3 summed over three steps
        assert!((body.position.y + 6.0).abs() < 1e-5);
    }

    #[test]
    fn spawned_particles_start_at_emitter() {
        let mut system = steady(30.0, 10.0);
        system.xform_mut().set_position(Vec3::new(5.0, 0.0, 0.0));
        system.update(TIMESLICE, Vec3::ZERO);
        assert_eq!(system.particle_count(), 1);
        assert_eq!(system.particles()[0].body().position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn broken_descriptor_disables_system() {
        let mut system = ParticleSystem::from_descriptor(
            "broken",
            Path::new("/nonexistent/smoke.psys"),
            &TextureManager::new(),
        );
        assert!(!system.is_ready());
        system.update(10.0, Vec3::ZERO);
        assert_eq!(system.particle_count(), 0);

        let mut gfx = SoftwareBackend::new(8, 8);
        system.draw(&mut gfx);
        assert_eq!(gfx.color_at(4, 4), Color::BLACK);
    }

    #[test]
    #[should_panic(expected = "mesh particles are not implemented")]
    fn mesh_particles_abort() {
        let mut system = steady(30.0, 1.0);
        system.set_particle_type(ParticleType::Mesh);
        system.update(1.0, Vec3::ZERO);
    }

    #[test]
    fn draws_sprites_and_billboards() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.5, 100.0);

        for gfx in [
            SoftwareBackend::new(32, 32),
            SoftwareBackend::new(32, 32).without_point_sprites(),
        ] {
            let mut gfx = gfx;
            gfx.set_matrix(MatrixSlot::View, view);
            gfx.set_matrix(MatrixSlot::Projection, proj);

            let mut system = steady(30.0, 10.0);
            system.params.psize = Fuzzy::exact(300.0);
            system.update(TIMESLICE, Vec3::ZERO);
            system.draw(&mut gfx);
            assert_ne!(gfx.color_at(16, 16), Color::BLACK);
        }
    }
}

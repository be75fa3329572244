use glam::Vec3;

use crate::color::Color;
use crate::texture::Texture;

/// Simulation state shared by every particle variant. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub friction: f32,
    pub size: f32,
    pub lifespan: f32,
    pub birth_time: f32,
}

impl Default for ParticleBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            friction: 1.0,
            size: 1.0,
            lifespan: 0.0,
            birth_time: 0.0,
        }
    }
}

impl ParticleBody {
    pub fn age(&self, now: f32) -> f32 {
        now - self.birth_time
    }

    /// Alive on `[birth_time, birth_time + lifespan)`.
    pub fn is_alive(&self, now: f32) -> bool {
        self.age(now) < self.lifespan
    }

    /// One fixed timestep: the force is added to the velocity, friction
    /// damps it and the position advances by it.
    fn step(&mut self, now: f32, force: Vec3) -> bool {
        if self.age(now) > self.lifespan {
            return false;
        }
        self.velocity = (self.velocity + force) * self.friction;
        self.position += self.velocity;
        true
    }
}

/// Textured camera facing particle with a color ramp and a spinning texture.
#[derive(Debug, Clone)]
pub struct BillboardParticle {
    pub body: ParticleBody,
    pub texture: Option<Texture>,
    pub start_color: Color,
    pub end_color: Color,
    pub color: Color,
    /// Radians per second.
    pub rot: f32,
    pub birth_angle: f32,
    pub angle: f32,
}

impl BillboardParticle {
    fn step(&mut self, now: f32, force: Vec3) {
        if !self.body.step(now, force) {
            return;
        }
        let age = self.body.age(now);
        let t = if self.body.lifespan > 0.0 {
            age / self.body.lifespan
        } else {
            1.0
        };
        self.color = self.start_color.lerp(self.end_color, t);
        self.angle = self.rot * age + self.birth_angle;
    }
}

#[derive(Debug, Clone)]
pub enum Particle {
    Billboard(BillboardParticle),
}

impl Particle {
    pub fn body(&self) -> &ParticleBody {
        match self {
            Particle::Billboard(p) => &p.body,
        }
    }

    pub fn is_alive(&self, now: f32) -> bool {
        self.body().is_alive(now)
    }

    pub fn step(&mut self, now: f32, force: Vec3) {
        match self {
            Particle::Billboard(p) => p.step(now, force),
        }
    }
}

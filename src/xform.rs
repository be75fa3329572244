//! Position/rotation/scale transforms with optional keyframe animation.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and scale of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prs {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Prs {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Prs {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn interpolate(&self, other: &Prs, t: f32) -> Prs {
        Prs {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Milliseconds.
    pub time: u64,
    pub prs: Prs,
}

/// Static transform, or a keyframe track when keys are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XForm {
    base: Prs,
    keys: Vec<Keyframe>,
}

impl XForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_prs(prs: Prs) -> Self {
        Self {
            base: prs,
            keys: Vec::new(),
        }
    }

    pub fn base(&self) -> &Prs {
        &self.base
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.base.position = position;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.base.position += offset;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.base.rotation = rotation;
    }

    pub fn rotate(&mut self, rotation: Quat) {
        self.base.rotation = (rotation * self.base.rotation).normalize();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.base.scale = scale;
    }

    /// Inserts a key, replacing any key at the same time.
    pub fn add_key(&mut self, time: u64, prs: Prs) {
        match self.keys.binary_search_by_key(&time, |k| k.time) {
            Ok(i) => self.keys[i].prs = prs,
            Err(i) => self.keys.insert(i, Keyframe { time, prs }),
        }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_animated(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Transform at `msec`, interpolating between the surrounding keys and
    /// holding the first or last key outside the track.
    pub fn prs_at(&self, msec: u64) -> Prs {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return self.base,
        };
        if msec <= first.time {
            return first.prs;
        }
        if msec >= last.time {
            return last.prs;
        }

        let next = self.keys.partition_point(|k| k.time <= msec);
        let a = &self.keys[next - 1];
        let b = &self.keys[next];
        let t = (msec - a.time) as f32 / (b.time - a.time) as f32;
        a.prs.interpolate(&b.prs, t)
    }

    pub fn matrix_at(&self, msec: u64) -> Mat4 {
        self.prs_at(msec).matrix()
    }
}

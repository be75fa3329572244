use std::fs;
use std::path::Path;

use glam::{Vec3, Vec4};
use log::debug;

use super::fuzzy::{Fuzzy, FuzzyVec3};
use crate::color::Color;
use crate::error::DescriptorError;
use crate::texture::{Texture, TextureManager};

/// Emission recipe of a particle system.
#[derive(Debug, Clone)]
pub struct ParticleSysParams {
    pub psize: Fuzzy,
    /// Seconds.
    pub lifespan: Fuzzy,
    /// Particles per second.
    pub birth_rate: Fuzzy,
    pub spawn_offset: FuzzyVec3,
    pub shoot_dir: FuzzyVec3,
    pub friction: f32,
    pub gravity: Vec3,
    pub start_color: Color,
    pub end_color: Color,
    /// Texture spin of each particle, radians per second.
    pub rot: f32,
    /// Spin of the whole emitter, sets each particle's starting angle.
    pub glob_rot: f32,
    pub billboard_tex: Option<Texture>,
    pub halo: Option<Texture>,
    pub halo_color: Color,
    pub halo_size: Fuzzy,
    pub halo_rot: f32,
    /// Forces billboard quads even where point sprites are available.
    pub big_particles: bool,
}

impl Default for ParticleSysParams {
    fn default() -> Self {
        Self {
            psize: Fuzzy::exact(1.0),
            lifespan: Fuzzy::exact(1.0),
            birth_rate: Fuzzy::default(),
            spawn_offset: FuzzyVec3::default(),
            shoot_dir: FuzzyVec3::default(),
            friction: 0.95,
            gravity: Vec3::ZERO,
            start_color: Color::WHITE,
            end_color: Color::WHITE,
            rot: 0.0,
            glob_rot: 0.0,
            billboard_tex: None,
            halo: None,
            halo_color: Color::WHITE,
            halo_size: Fuzzy::default(),
            halo_rot: 0.0,
            big_particles: false,
        }
    }
}

impl ParticleSysParams {
    /// Reads a descriptor file. See [`ParticleSysParams::parse`].
    pub fn load(path: &Path, textures: &TextureManager) -> Result<Self, DescriptorError> {
        let source = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, textures)
    }

    /// Parses `key: value` lines, `#` starts a comment. Vector values are
    /// comma separated; missing trailing components are zero. Textures that
    /// fail to load are logged and left unset.
    pub fn parse(source: &str, textures: &TextureManager) -> Result<Self, DescriptorError> {
        let mut params = Self::default();
        let mut shoot = Vec3::ZERO;
        let mut shoot_range = Vec3::ZERO;
        let mut spawn_off = Vec3::ZERO;
        let mut spawn_off_range = Vec3::ZERO;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let (key, value) = content
                .split_once(':')
                .ok_or(DescriptorError::Syntax { line })?;
            let key = key.trim();
            let value = value.trim();

            let scalar = || parse_scalar(key, value, line);
            let vector = || parse_components::<3>(key, value, line).map(Vec3::from_array);
            let color = || {
                parse_components::<4>(key, value, line).map(|c| Color::from(Vec4::from_array(c)))
            };

            match key {
                "psize" => params.psize.num = scalar()?,
                "psize-r" => params.psize.range = scalar()?,
                "life" => params.lifespan.num = scalar()?,
                "life-r" => params.lifespan.range = scalar()?,
                "birth-rate" => params.birth_rate.num = scalar()?,
                "birth-rate-r" => params.birth_rate.range = scalar()?,
                "grav" => params.gravity = vector()?,
                "shoot" => shoot = vector()?,
                "shoot-r" => shoot_range = vector()?,
                "friction" => params.friction = scalar()?,
                "spawn_off" => spawn_off = vector()?,
                "spawn_off-r" => spawn_off_range = vector()?,
                "tex" => params.billboard_tex = textures.get_or_log(value),
                "color" => {
                    let c = color()?;
                    params.start_color = c;
                    params.end_color = c;
                }
                "color_start" => params.start_color = color()?,
                "color_end" => params.end_color = color()?,
                "rot" => params.rot = scalar()?,
                "glob_rot" => params.glob_rot = scalar()?,
                "halo" => params.halo = textures.get_or_log(value),
                "halo_color" => params.halo_color = color()?,
                "halo_size" => params.halo_size.num = scalar()?,
                "halo_size-r" => params.halo_size.range = scalar()?,
                "halo_rot" => params.halo_rot = scalar()?,
                other => debug!("ignoring unknown particle option `{other}` on line {line}"),
            }
        }

        params.shoot_dir = FuzzyVec3::from_parts(shoot, shoot_range);
        params.spawn_offset = FuzzyVec3::from_parts(spawn_off, spawn_off_range);
        Ok(params)
    }
}

fn parse_scalar(key: &str, value: &str, line: usize) -> Result<f32, DescriptorError> {
    value.parse().map_err(|_| DescriptorError::InvalidNumber {
        key: key.to_string(),
        line,
    })
}

fn parse_components<const N: usize>(
    key: &str,
    value: &str,
    line: usize,
) -> Result<[f32; N], DescriptorError> {
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(value.split(',')) {
        *slot = parse_scalar(key, part.trim(), line)?;
    }
    Ok(out)
}

//! Textures and the name keyed texture cache.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use log::{debug, error};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::color::Color;
use crate::error::TextureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Flat,
    Cube,
}

/// Faces of a cube map in the conventional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction the face looks along.
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::X,
            CubeFace::NegX => Vec3::NEG_X,
            CubeFace::PosY => Vec3::Y,
            CubeFace::NegY => Vec3::NEG_Y,
            CubeFace::PosZ => Vec3::Z,
            CubeFace::NegZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the camera rendering this face.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PosY => Vec3::NEG_Z,
            CubeFace::NegY => Vec3::Z,
            _ => Vec3::Y,
        }
    }

    /// Picks the face hit by `dir` and the texture coordinate on it.
    fn locate(dir: Vec3) -> (CubeFace, Vec2) {
        let abs = dir.abs();
        let (face, sc, tc, major) = if abs.x >= abs.y && abs.x >= abs.z {
            if dir.x >= 0.0 {
                (CubeFace::PosX, -dir.z, -dir.y, abs.x)
            } else {
                (CubeFace::NegX, dir.z, -dir.y, abs.x)
            }
        } else if abs.y >= abs.z {
            if dir.y >= 0.0 {
                (CubeFace::PosY, dir.x, dir.z, abs.y)
            } else {
                (CubeFace::NegY, dir.x, -dir.z, abs.y)
            }
        } else if dir.z >= 0.0 {
            (CubeFace::PosZ, dir.x, -dir.y, abs.z)
        } else {
            (CubeFace::NegZ, -dir.x, -dir.y, abs.z)
        };
        let major = major.max(f32::EPSILON);
        let uv = Vec2::new(sc / major, tc / major) * 0.5 + Vec2::splat(0.5);
        (face, uv)
    }
}

struct TextureData {
    name: String,
    kind: TextureKind,
    faces: Vec<RwLock<RgbaImage>>,
}

/// Shared handle to a flat or cube texture. Clones refer to the same pixels.
#[derive(Clone)]
pub struct Texture(Arc<TextureData>);

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.size();
        f.debug_struct("Texture")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("size", &(width, height))
            .finish()
    }
}

impl Texture {
    pub fn flat(name: impl Into<String>, image: RgbaImage) -> Self {
        Self(Arc::new(TextureData {
            name: name.into(),
            kind: TextureKind::Flat,
            faces: vec![RwLock::new(image)],
        }))
    }

    /// Cube map with six black `size` x `size` faces.
    pub fn cube(name: impl Into<String>, size: u32) -> Self {
        let size = size.max(1);
        Self(Arc::new(TextureData {
            name: name.into(),
            kind: TextureKind::Cube,
            faces: (0..6)
                .map(|_| RwLock::new(RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255]))))
                .collect(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> TextureKind {
        self.0.kind
    }

    pub fn is_cube(&self) -> bool {
        self.0.kind == TextureKind::Cube
    }

    pub fn size(&self) -> (u32, u32) {
        self.0.faces[0].read().dimensions()
    }

    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Pixels of a face. Flat textures ignore `face`.
    pub fn face(&self, face: CubeFace) -> RwLockReadGuard<'_, RgbaImage> {
        self.0.faces[self.face_slot(face)].read()
    }

    /// Replaces a face. Flat textures ignore `face`.
    pub fn store_face(&self, face: CubeFace, image: RgbaImage) {
        *self.0.faces[self.face_slot(face)].write() = image;
    }

    fn face_slot(&self, face: CubeFace) -> usize {
        match self.0.kind {
            TextureKind::Flat => 0,
            TextureKind::Cube => face.index(),
        }
    }

    /// Nearest sample with repeat wrapping, `v = 0` at the top row.
    pub fn sample(&self, uv: Vec2) -> Color {
        sample_image(&self.0.faces[0].read(), uv)
    }

    /// Samples a cube map along `dir`. Flat textures fall back to a planar
    /// lookup of the direction.
    pub fn sample_dir(&self, dir: Vec3) -> Color {
        match self.0.kind {
            TextureKind::Flat => self.sample(Vec2::new(dir.x, dir.y) * 0.5 + Vec2::splat(0.5)),
            TextureKind::Cube => {
                let (face, uv) = CubeFace::locate(dir);
                sample_image(&self.face(face), uv)
            }
        }
    }
}

fn sample_image(image: &RgbaImage, uv: Vec2) -> Color {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Color::WHITE;
    }
    let x = ((uv.x.rem_euclid(1.0) * width as f32) as u32).min(width - 1);
    let y = ((uv.y.rem_euclid(1.0) * height as f32) as u32).min(height - 1);
    Color::from_rgba8(image.get_pixel(x, y).0)
}

/// Resolves texture names to textures, loading image files on first use.
#[derive(Default)]
pub struct TextureManager {
    cache: RwLock<HashMap<String, Texture>>,
    search_paths: Vec<PathBuf>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory that relative texture names are resolved against.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Returns the cached texture or loads it from disk.
    pub fn get(&self, name: &str) -> Result<Texture, TextureError> {
        if let Some(texture) = self.cache.read().get(name) {
            return Ok(texture.clone());
        }

        let path = self
            .resolve(name)
            .ok_or_else(|| TextureError::NotFound(name.to_string()))?;
        let image = image::open(&path)
            .map_err(|source| TextureError::Decode {
                name: name.to_string(),
                source,
            })?
            .to_rgba8();
        debug!("loaded texture {} ({}x{})", path.display(), image.width(), image.height());

        let texture = Texture::flat(name, image);
        self.cache
            .write()
            .entry(name.to_string())
            .or_insert(texture.clone());
        Ok(texture)
    }

    /// Like [`TextureManager::get`], logging failures instead of returning
    /// them.
    pub fn get_or_log(&self, name: &str) -> Option<Texture> {
        match self.get(name) {
            Ok(texture) => Some(texture),
            Err(err) => {
                error!("could not load texture {name}: {err}");
                None
            }
        }
    }

    pub fn insert(&self, texture: Texture) {
        self.cache.write().insert(texture.name().to_string(), texture);
    }

    /// Creates and caches an empty cube map.
    pub fn create_cube(&self, name: &str, size: u32) -> Texture {
        let texture = Texture::cube(name, size);
        self.insert(texture.clone());
        texture
    }

    pub fn kind(&self, name: &str) -> Option<TextureKind> {
        self.cache.read().get(name).map(Texture::kind)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn flat_sampling_wraps() {
        let texture = Texture::flat("checker", checker());
        assert_eq!(texture.sample(Vec2::new(0.25, 0.25)), Color::WHITE);
        assert_eq!(texture.sample(Vec2::new(0.75, 0.25)), Color::BLACK);
        assert_eq!(texture.sample(Vec2::new(1.25, -0.75)), Color::WHITE);
    }

    #[test]
    fn cube_faces_are_addressed_by_direction() {
        let texture = Texture::cube("env", 4);
        assert!(texture.is_cube());
        texture.store_face(
            CubeFace::NegY,
            RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])),
        );
        assert_eq!(texture.sample_dir(Vec3::NEG_Y), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(texture.sample_dir(Vec3::X), Color::BLACK);
    }

    #[test]
    fn manager_caches_and_reports_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        checker()
            .save(dir.path().join("checker.png"))
            .expect("write png");

        let mut manager = TextureManager::new();
        manager.add_search_path(dir.path());
        let first = manager.get("checker.png").expect("load");
        let second = manager.get("checker.png").expect("cached");
        assert!(first.ptr_eq(&second));
        assert_eq!(manager.kind("checker.png"), Some(TextureKind::Flat));

        manager.create_cube("sky", 8);
        assert_eq!(manager.kind("sky"), Some(TextureKind::Cube));
        assert!(matches!(
            manager.get("missing.png"),
            Err(TextureError::NotFound(_))
        ));
        assert!(manager.get_or_log("missing.png").is_none());
    }
}

//! Scene graph and rendering core built around a fixed-function pipeline.
//!
//! The crate keeps the rendering device behind the [`gfx::GraphicsBackend`]
//! trait and ships a headless [`gfx::SoftwareBackend`], so that scenes with
//! stencil shadows, cube map reflections and particle systems can be rendered
//! and inspected without a window or a GPU.

pub mod color;
pub mod error;
pub mod geometry;
pub mod gfx;
pub mod particles;
pub mod scene;
pub mod sort;
pub mod texture;
pub mod xform;

pub use color::Color;
pub use error::{DescriptorError, SceneError, TextureError};
pub use geometry::{
    join_tri_mesh, Edge, Index, LightSource, TexCoord, Triangle, TriMesh, Vertex, VertexStats,
};
pub use gfx::{GraphicsBackend, SoftwareBackend};
pub use particles::{Fuzzy, FuzzyVec3, ParticleSysParams, ParticleSystem, ParticleType};
pub use scene::loader::{load_scene, parse_scene};
pub use scene::{Camera, Curve, CurveKind, Entity, Light, LightKind, Material, Object, Scene};
pub use sort::{heap_sort, heap_sort_by_priority, SortOrder};
pub use texture::{Texture, TextureKind, TextureManager};
pub use xform::{Prs, XForm};

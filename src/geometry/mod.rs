//! Mesh data structures: vertices, triangles, edge adjacency and the
//! triangle mesh that derives indices, edges, normals and shadow volumes.

mod cache;
pub mod primitives;
mod shadow;
mod trimesh;

use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::Color;

pub use cache::Derived;
pub use shadow::{LightSource, SHADOW_EXTRUDE_DISTANCE};
pub use trimesh::{join_tri_mesh, TriMesh};

/// Offset into a mesh vertex buffer.
pub type Index = u32;

/// Texture coordinate with an optional third component for volume or cube
/// lookups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

impl TexCoord {
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v, w: 0.0 }
    }

    pub fn uv(self) -> Vec2 {
        Vec2::new(self.u, self.v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex: [TexCoord; 2],
    pub color: Color,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            tex: [TexCoord::default(); 2],
            color: Color::WHITE,
        }
    }
}

impl Vertex {
    /// Vertex at `position` with both texture sets at `(u, v)`.
    pub fn new(position: Vec3, u: f32, v: f32, color: Color) -> Self {
        let tex = TexCoord::new(u, v);
        Self {
            position,
            normal: Vec3::Y,
            tex: [tex, tex],
            color,
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Index; 3],
    /// Face normal, refreshed by [`TriMesh::calculate_normals`].
    pub normal: Vec3,
    /// Reserved for smoothing-group aware normal generation.
    pub smoothing_group: u32,
}

impl Triangle {
    pub const fn new(a: Index, b: Index, c: Index) -> Self {
        Self {
            vertices: [a, b, c],
            normal: Vec3::ZERO,
            smoothing_group: 0,
        }
    }

    /// Cross product of the two edges leaving the first vertex.
    pub fn face_normal(&self, vertices: &[Vertex]) -> Vec3 {
        let [a, b, c] = self.positions(vertices);
        (b - a).cross(c - a)
    }

    pub fn positions(&self, vertices: &[Vertex]) -> [Vec3; 3] {
        self.vertices.map(|i| vertices[i as usize].position)
    }
}

/// Mesh edge with its adjacent faces.
///
/// `vertices[0] < vertices[1]` always holds for edges produced by
/// [`TriMesh::edges`]. An edge with no second face lies on the mesh boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub vertices: [Index; 2],
    pub faces: [Option<u32>; 2],
}

impl Edge {
    pub fn new(a: Index, b: Index, face: u32) -> Self {
        Self {
            vertices: [a, b],
            faces: [Some(face), None],
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.faces[1].is_none()
    }

    pub fn face_count(&self) -> usize {
        self.faces.iter().flatten().count()
    }
}

/// Centroid and distance spread of a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexStats {
    pub centroid: Vec3,
    pub min_dist: f32,
    pub max_dist: f32,
    pub avg_dist: f32,
}

impl VertexStats {
    /// Computes the statistics; an empty buffer yields all zeroes.
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        if vertices.is_empty() {
            return Self::default();
        }
        let count = vertices.len() as f32;
        let centroid = vertices.iter().map(|v| v.position).sum::<Vec3>() / count;

        let mut min_sq = f32::MAX;
        let mut max_sq = 0.0_f32;
        let mut sum_sq = 0.0_f32;
        for vertex in vertices {
            let len_sq = (vertex.position - centroid).length_squared();
            min_sq = min_sq.min(len_sq);
            max_sq = max_sq.max(len_sq);
            sum_sq += len_sq;
        }

        Self {
            centroid,
            min_dist: min_sq.sqrt(),
            max_dist: max_sq.sqrt(),
            avg_dist: (sum_sq / count).sqrt(),
        }
    }
}

/// Transforms a vertex position by `xform` and its normal by the rotational
/// part of it.
pub(crate) fn transform_vertex(vertex: &mut Vertex, xform: &Mat4, normal_xform: &Mat3) {
    vertex.position = xform.transform_point3(vertex.position);
    vertex.normal = *normal_xform * vertex.normal;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_normal_follows_winding() {
        let vertices = [
            Vertex::at(Vec3::ZERO),
            Vertex::at(Vec3::X),
            Vertex::at(Vec3::Y),
        ];
        assert_eq!(Triangle::new(0, 1, 2).face_normal(&vertices), Vec3::Z);
        assert_eq!(Triangle::new(0, 2, 1).face_normal(&vertices), -Vec3::Z);
    }

    #[test]
    fn stats_of_symmetric_points() {
        let vertices = [
            Vertex::at(Vec3::new(-1.0, 0.0, 0.0)),
            Vertex::at(Vec3::new(1.0, 0.0, 0.0)),
            Vertex::at(Vec3::new(0.0, 3.0, 0.0)),
            Vertex::at(Vec3::new(0.0, -3.0, 0.0)),
        ];
        let stats = VertexStats::from_vertices(&vertices);
        assert_eq!(stats.centroid, Vec3::ZERO);
        assert_eq!(stats.min_dist, 1.0);
        assert_eq!(stats.max_dist, 3.0);
        assert!((stats.avg_dist - 5.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn empty_stats_are_zero() {
        assert_eq!(VertexStats::from_vertices(&[]), VertexStats::default());
    }
}

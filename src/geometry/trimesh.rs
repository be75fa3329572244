use std::ops::AddAssign;

use glam::{Mat3, Mat4, Vec3};

use super::{transform_vertex, Derived, Edge, Index, Triangle, Vertex, VertexStats};
use crate::sort::{heap_sort_by_priority, SortOrder};

/// Triangle mesh owning a vertex buffer and a triangle buffer.
///
/// The index buffer, the edge adjacency list and the vertex statistics are
/// derived on first access and cached. Every mutable access to the vertex or
/// triangle buffer goes through this type and drops the caches that depend on
/// it, so a derived buffer always matches the data it was computed from.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    indices: Derived<Vec<Index>>,
    edges: Derived<Vec<Edge>>,
    stats: Derived<VertexStats>,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Self {
        let mut mesh = Self::new();
        mesh.set_data(vertices, triangles);
        mesh
    }

    /// Replaces both buffers and invalidates every derived artifact.
    pub fn set_data(&mut self, vertices: Vec<Vertex>, triangles: Vec<Triangle>) {
        debug_assert!(
            triangles
                .iter()
                .flat_map(|t| t.vertices)
                .all(|i| (i as usize) < vertices.len()),
            "triangle index out of range"
        );
        self.vertices = vertices;
        self.triangles = triangles;
        self.indices.invalidate();
        self.edges.invalidate();
        self.stats.invalidate();
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Mutable vertex access; drops the cached vertex statistics.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        self.stats.invalidate();
        &mut self.vertices
    }

    /// Mutable triangle access; drops the cached index and edge buffers.
    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        self.indices.invalidate();
        self.edges.invalidate();
        &mut self.triangles
    }

    /// Triangle vertex indices flattened in triangle order.
    pub fn index_array(&self) -> &[Index] {
        self.indices
            .get_or_compute(|| self.triangles.iter().flat_map(|t| t.vertices).collect())
    }

    /// Edge adjacency list, ordered by the smaller vertex index.
    pub fn edges(&self) -> &[Edge] {
        self.edges.get_or_compute(|| self.calculate_edges())
    }

    pub fn vertex_stats(&self) -> VertexStats {
        *self
            .stats
            .get_or_compute(|| VertexStats::from_vertices(&self.vertices))
    }

    fn calculate_edges(&self) -> Vec<Edge> {
        // one bucket per vertex, holding the edges whose smaller endpoint it is
        let mut buckets: Vec<Vec<Edge>> = vec![Vec::new(); self.vertices.len()];

        for (face, triangle) in self.triangles.iter().enumerate() {
            let face = face as u32;
            for j in 0..3 {
                let a = triangle.vertices[j];
                let b = triangle.vertices[(j + 1) % 3];
                let (low, high) = if a < b { (a, b) } else { (b, a) };

                let bucket = &mut buckets[low as usize];
                match bucket.iter_mut().find(|edge| edge.vertices[1] == high) {
                    Some(edge) => edge.faces[1] = Some(face),
                    None => bucket.push(Edge::new(low, high, face)),
                }
            }
        }

        buckets.into_iter().flatten().collect()
    }

    /// Recomputes face normals (unnormalized) and vertex normals as the
    /// normalized, unweighted sum of the normals of every face using the
    /// vertex.
    pub fn calculate_normals(&mut self) {
        let mut faces_of_vertex: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for (face, triangle) in self.triangles.iter().enumerate() {
            for &index in &triangle.vertices {
                faces_of_vertex[index as usize].push(face);
            }
        }

        for triangle in &mut self.triangles {
            triangle.normal = triangle.face_normal(&self.vertices);
        }

        for (vertex, faces) in self.vertices.iter_mut().zip(&faces_of_vertex) {
            let sum: Vec3 = faces.iter().map(|&f| self.triangles[f].normal).sum();
            vertex.normal = sum.normalize_or_zero();
        }
    }

    pub fn normalize_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = vertex.normal.normalize_or_zero();
        }
    }

    /// Flips the winding of every triangle and negates all normals.
    pub fn invert_winding(&mut self) {
        for triangle in self.triangles_mut() {
            triangle.vertices.swap(1, 2);
            triangle.normal = -triangle.normal;
        }
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
    }

    /// Transforms every vertex position by `xform` and every normal by its
    /// upper 3x3 part.
    pub fn apply_xform(&mut self, xform: &Mat4) {
        let normal_xform = Mat3::from_mat4(*xform);
        for vertex in self.vertices_mut() {
            transform_vertex(vertex, xform, &normal_xform);
        }
    }

    /// Sorts the triangles by the sum of the squared distances of their
    /// vertices from `point` (model space).
    pub fn sort_triangles(&mut self, point: Vec3, order: SortOrder) {
        let sq_distances: Vec<f32> = self
            .vertices
            .iter()
            .map(|v| (v.position - point).length_squared())
            .collect();
        let mut tri_distances: Vec<f32> = self
            .triangles
            .iter()
            .map(|t| t.vertices.iter().map(|&i| sq_distances[i as usize]).sum())
            .collect();

        heap_sort_by_priority(self.triangles_mut(), &mut tri_distances, order);
    }
}

/// Builds a mesh holding the geometry of both inputs. Triangle indices of
/// `second` are rebased past the vertices of `first`.
pub fn join_tri_mesh(first: &TriMesh, second: &TriMesh) -> TriMesh {
    let offset = first.vertices.len() as Index;

    let mut vertices = Vec::with_capacity(first.vertices.len() + second.vertices.len());
    vertices.extend_from_slice(&first.vertices);
    vertices.extend_from_slice(&second.vertices);

    let mut triangles = Vec::with_capacity(first.triangles.len() + second.triangles.len());
    triangles.extend_from_slice(&first.triangles);
    triangles.extend(second.triangles.iter().map(|t| Triangle {
        vertices: t.vertices.map(|i| i + offset),
        ..*t
    }));

    TriMesh::from_data(vertices, triangles)
}

impl AddAssign<&TriMesh> for TriMesh {
    fn add_assign(&mut self, rhs: &TriMesh) {
        *self = join_tri_mesh(self, rhs);
    }
}

use glam::{Mat4, Vec3};

use super::{Index, TriMesh, Triangle, Vertex};

/// How far silhouette edges are pushed away from the light.
pub const SHADOW_EXTRUDE_DISTANCE: f32 = 1000.0;

/// Light as seen by the shadow volume builder, in the mesh's model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    Point(Vec3),
    /// Direction the light travels in.
    Directional(Vec3),
}

impl LightSource {
    /// Moves the light into the space described by `xform` (usually the
    /// inverse of an object's world matrix).
    pub fn transformed(self, xform: &Mat4) -> Self {
        match self {
            Self::Point(pos) => Self::Point(xform.transform_point3(pos)),
            Self::Directional(dir) => Self::Directional(xform.transform_vector3(dir)),
        }
    }

    /// Vector from `point` towards the light.
    fn towards(self, point: Vec3) -> Vec3 {
        match self {
            Self::Point(pos) => pos - point,
            Self::Directional(dir) => -dir,
        }
    }

    fn extrude(self, point: Vec3) -> Vec3 {
        let away = match self {
            Self::Point(pos) => (point - pos).normalize_or_zero(),
            Self::Directional(dir) => dir.normalize_or_zero(),
        };
        point + away * SHADOW_EXTRUDE_DISTANCE
    }
}

impl TriMesh {
    /// Builds the closed shadow volume cast by this mesh.
    ///
    /// The front cap is the set of light-facing triangles, the back cap the
    /// same triangles pushed away from the light with reversed winding, and
    /// every edge with exactly one light-facing neighbour is swept into a side
    /// quad. All faces point out of the volume. A mesh with no light-facing
    /// triangle yields an empty mesh.
    pub fn shadow_volume(&self, light: LightSource) -> TriMesh {
        let vertices = self.vertices();
        let triangles = self.triangles();

        let lit: Vec<bool> = triangles
            .iter()
            .map(|t| {
                let origin = vertices[t.vertices[0] as usize].position;
                t.face_normal(vertices).dot(light.towards(origin)) > 0.0
            })
            .collect();
        if !lit.iter().any(|&l| l) {
            return TriMesh::new();
        }

        let base = vertices.len() as Index;
        let mut volume_vertices: Vec<Vertex> = Vec::with_capacity(vertices.len() * 2);
        volume_vertices.extend(vertices.iter().map(|v| Vertex::at(v.position)));
        volume_vertices.extend(
            vertices
                .iter()
                .map(|v| Vertex::at(light.extrude(v.position))),
        );

        let mut volume_triangles = Vec::new();
        for (triangle, _) in triangles.iter().zip(&lit).filter(|(_, lit)| **lit) {
            let [a, b, c] = triangle.vertices;
            volume_triangles.push(Triangle::new(a, b, c));
            volume_triangles.push(Triangle::new(a + base, c + base, b + base));
        }

        for edge in self.edges() {
            let mut lit_faces = edge.faces.iter().flatten().filter(|f| lit[**f as usize]);
            let (Some(&face), None) = (lit_faces.next(), lit_faces.next()) else {
                continue;
            };

            // orient the edge the way the lit face winds it
            let face = &triangles[face as usize];
            let Some((a, b)) = directed_edge(face, edge.vertices) else {
                continue;
            };
            volume_triangles.push(Triangle::new(b, a, a + base));
            volume_triangles.push(Triangle::new(b, a + base, b + base));
        }

        TriMesh::from_data(volume_vertices, volume_triangles)
    }
}

fn directed_edge(triangle: &Triangle, [low, high]: [Index; 2]) -> Option<(Index, Index)> {
    (0..3)
        .map(|j| (triangle.vertices[j], triangle.vertices[(j + 1) % 3]))
        .find(|&(a, b)| (a == low && b == high) || (a == high && b == low))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives;

    #[test]
    fn volume_of_closed_mesh_is_closed() {
        let cube = primitives::cube(2.0);
        let volume = cube.shadow_volume(LightSource::Point(Vec3::new(0.0, 100.0, 0.0)));
        assert!(volume.triangle_count() > 0);
        assert!(volume.edges().iter().all(|e| e.face_count() == 2));
    }

    #[test]
    fn single_triangle_volume_is_a_prism() {
        let tri = TriMesh::from_data(
            vec![
                Vertex::at(Vec3::ZERO),
                Vertex::at(Vec3::X),
                Vertex::at(Vec3::NEG_Z),
            ],
            vec![Triangle::new(0, 1, 2)],
        );
        let volume = tri.shadow_volume(LightSource::Directional(Vec3::NEG_Y));
        // two caps plus three side quads
        assert_eq!(volume.triangle_count(), 2 + 3 * 2);
        assert!(volume.edges().iter().all(|e| e.face_count() == 2));

        // every face points away from the prism's interior
        let centroid = Vec3::new(1.0 / 3.0, -SHADOW_EXTRUDE_DISTANCE / 2.0, -1.0 / 3.0);
        for t in volume.triangles() {
            let [a, _, _] = t.positions(volume.vertices());
            assert!(t.face_normal(volume.vertices()).dot(a - centroid) > 0.0);
        }
    }

    #[test]
    fn unlit_geometry_casts_nothing() {
        let tri = TriMesh::from_data(
            vec![
                Vertex::at(Vec3::ZERO),
                Vertex::at(Vec3::X),
                Vertex::at(Vec3::NEG_Z),
            ],
            vec![Triangle::new(0, 1, 2)],
        );
        // light from below the upward facing triangle
        let volume = tri.shadow_volume(LightSource::Point(Vec3::new(0.2, -5.0, -0.2)));
        assert!(volume.is_empty());
    }

    #[test]
    fn light_moves_into_model_space() {
        let world = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let inverse = world.inverse();
        let light = LightSource::Point(Vec3::new(10.0, 5.0, 0.0)).transformed(&inverse);
        assert_eq!(light, LightSource::Point(Vec3::new(0.0, 5.0, 0.0)));
        let dir = LightSource::Directional(Vec3::NEG_Y).transformed(&inverse);
        assert_eq!(dir, LightSource::Directional(Vec3::NEG_Y));
    }
}

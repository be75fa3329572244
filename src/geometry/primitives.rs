//! Procedural meshes.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::{Index, TriMesh, Triangle, Vertex};
use crate::color::Color;

/// Axis aligned cube centered at the origin with welded corners, so that every
/// edge is shared by exactly two triangles.
pub fn cube(size: f32) -> TriMesh {
    let half = size * 0.5;
    let corner = |x: usize, y: usize, z: usize| (x | (y << 1) | (z << 2)) as Index;

    let vertices: Vec<Vertex> = (0..8)
        .map(|i| {
            let pick = |bit: usize| if i & bit != 0 { half } else { -half };
            let position = Vec3::new(pick(1), pick(2), pick(4));
            let u = if i & 1 != 0 { 1.0 } else { 0.0 };
            let v = if i & 2 != 0 { 0.0 } else { 1.0 };
            Vertex::new(position, u, v, Color::WHITE)
        })
        .collect();

    let mut triangles = Vec::with_capacity(12);
    for axis in 0..3 {
        for side in 0..2 {
            let outward = Vec3::AXES[axis] * if side == 1 { 1.0 } else { -1.0 };
            // quad corners walk the two remaining axes
            let quad: Vec<Index> = [(0, 0), (1, 0), (1, 1), (0, 1)]
                .iter()
                .map(|&(s, t)| {
                    let mut c = [0; 3];
                    c[axis] = side;
                    c[(axis + 1) % 3] = s;
                    c[(axis + 2) % 3] = t;
                    corner(c[0], c[1], c[2])
                })
                .collect();
            push_outward(&mut triangles, &vertices, [quad[0], quad[1], quad[2]], outward);
            push_outward(&mut triangles, &vertices, [quad[0], quad[2], quad[3]], outward);
        }
    }

    let mut mesh = TriMesh::from_data(vertices, triangles);
    mesh.calculate_normals();
    mesh
}

/// Flat square on the XZ plane facing +Y, split into `subdivisions` cells per
/// side.
pub fn plane(size: f32, subdivisions: u32) -> TriMesh {
    let cells = subdivisions.max(1);
    let row = cells + 1;
    let step = size / cells as f32;
    let half = size * 0.5;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for i in 0..row {
        for j in 0..row {
            let position = Vec3::new(-half + j as f32 * step, 0.0, -half + i as f32 * step);
            let u = j as f32 / cells as f32;
            let v = i as f32 / cells as f32;
            vertices.push(Vertex::new(position, u, v, Color::WHITE));
        }
    }

    let mut triangles = Vec::with_capacity((cells * cells * 2) as usize);
    for i in 0..cells {
        for j in 0..cells {
            let v00 = i * row + j;
            let v01 = v00 + 1;
            let v10 = v00 + row;
            let v11 = v10 + 1;
            triangles.push(Triangle::new(v00, v10, v01));
            triangles.push(Triangle::new(v01, v10, v11));
        }
    }

    let mut mesh = TriMesh::from_data(vertices, triangles);
    mesh.calculate_normals();
    mesh
}

/// UV sphere centered at the origin. Degenerate pole triangles are dropped.
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> TriMesh {
    let slices = slices.max(3);
    let stacks = stacks.max(2);
    let row = slices + 1;

    let mut vertices = Vec::with_capacity((row * (stacks + 1)) as usize);
    for s in 0..=stacks {
        let v = s as f32 / stacks as f32;
        let phi = v * PI;
        // poles collapse onto a single point
        let ring = if s == 0 || s == stacks { 0.0 } else { phi.sin() };
        for t in 0..=slices {
            let u = t as f32 / slices as f32;
            let theta = u * TAU;
            let dir = Vec3::new(ring * theta.cos(), phi.cos(), ring * theta.sin());
            vertices.push(Vertex::new(dir * radius, u, v, Color::WHITE).with_normal(dir));
        }
    }

    let mut triangles = Vec::with_capacity((slices * stacks * 2) as usize);
    for s in 0..stacks {
        for t in 0..slices {
            let a = s * row + t;
            let b = a + row;
            for tri in [[a, b, a + 1], [a + 1, b, b + 1]] {
                let center: Vec3 = tri
                    .iter()
                    .map(|&i| vertices[i as usize].position)
                    .sum::<Vec3>()
                    / 3.0;
                push_outward(&mut triangles, &vertices, tri, center);
            }
        }
    }

    TriMesh::from_data(vertices, triangles)
}

/// Appends the triangle wound so that its face normal agrees with `outward`.
/// Zero area triangles are skipped.
fn push_outward(
    triangles: &mut Vec<Triangle>,
    vertices: &[Vertex],
    [a, b, c]: [Index; 3],
    outward: Vec3,
) {
    let triangle = Triangle::new(a, b, c);
    let normal = triangle.face_normal(vertices);
    if normal.length_squared() <= f32::EPSILON * f32::EPSILON {
        return;
    }
    if normal.dot(outward) >= 0.0 {
        triangles.push(triangle);
    } else {
        triangles.push(Triangle::new(a, c, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces_point_outward(mesh: &TriMesh) -> bool {
        let center = mesh.vertex_stats().centroid;
        mesh.triangles().iter().all(|t| {
            let [a, b, c] = t.positions(mesh.vertices());
            let mid = (a + b + c) / 3.0;
            t.face_normal(mesh.vertices()).dot(mid - center) > 0.0
        })
    }

    #[test]
    fn cube_is_welded_and_outward() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(faces_point_outward(&mesh));
        let stats = mesh.vertex_stats();
        assert!((stats.max_dist - 3.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(4.0, 3);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.triangle_count(), 18);
        for t in mesh.triangles() {
            assert!(t.face_normal(mesh.vertices()).y > 0.0);
        }
        let boundary = mesh.edges().iter().filter(|e| e.is_boundary()).count();
        assert_eq!(boundary, 12);
    }

    #[test]
    fn sphere_is_outward() {
        let mesh = sphere(2.0, 12, 8);
        assert!(mesh.triangle_count() > 0);
        assert!(faces_point_outward(&mesh));
        assert!(mesh
            .vertices()
            .iter()
            .all(|v| (v.position.length() - 2.0).abs() < 1e-4));
    }
}

use glam::{Vec2, Vec3, Vec4};

use crate::color::Color;

/// Color, depth and stencil planes of one render target.
#[derive(Debug, Clone)]
pub(super) struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub color: Vec<Color>,
    pub depth: Vec<f32>,
    pub stencil: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![Color::BLACK; len],
            depth: vec![1.0; len],
            stencil: vec![0; len],
        }
    }

    pub fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }
}

/// Attributes interpolated across a primitive.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Varying {
    pub color: Vec4,
    pub uv: Vec2,
    pub reflect: Vec3,
    pub fog: f32,
}

impl Varying {
    fn scaled(self, k: f32) -> Self {
        Self {
            color: self.color * k,
            uv: self.uv * k,
            reflect: self.reflect * k,
            fog: self.fog * k,
        }
    }

    fn sum(self, other: Self) -> Self {
        Self {
            color: self.color + other.color,
            uv: self.uv + other.uv,
            reflect: self.reflect + other.reflect,
            fog: self.fog + other.fog,
        }
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        self.scaled(1.0 - t).sum(other.scaled(t))
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct ClipVertex {
    pub clip: Vec4,
    pub varying: Varying,
}

/// Clips a triangle against the near plane (`z >= 0` in clip space). The
/// result is a convex polygon of zero, three or four vertices.
pub(super) fn clip_near(triangle: [ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];
        let d0 = current.clip.z;
        let d1 = next.clip.z;

        if d0 >= 0.0 {
            out.push(current);
        }
        if (d0 >= 0.0) != (d1 >= 0.0) {
            let t = d0 / (d0 - d1);
            out.push(ClipVertex {
                clip: current.clip.lerp(next.clip, t),
                varying: current.varying.lerp(next.varying, t),
            });
        }
    }
    out
}

/// Vertex after the perspective divide and viewport mapping.
#[derive(Debug, Clone, Copy)]
pub(super) struct ScreenVertex {
    pub pos: Vec3,
    inv_w: f32,
    varying: Varying,
}

impl ScreenVertex {
    /// Maps to pixel space with the origin at the top left.
    pub fn from_clip(vertex: &ClipVertex, width: u32, height: u32) -> Self {
        let inv_w = 1.0 / vertex.clip.w.max(f32::EPSILON);
        let ndc = vertex.clip.truncate() * inv_w;
        Self {
            pos: Vec3::new(
                (ndc.x + 1.0) * 0.5 * width as f32,
                (1.0 - ndc.y) * 0.5 * height as f32,
                ndc.z,
            ),
            inv_w,
            varying: vertex.varying.scaled(inv_w),
        }
    }
}

fn edge(a: Vec3, b: Vec3, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Twice the signed pixel area. Negative for triangles that wind
/// counter-clockwise in normalized device space, since pixel rows grow
/// downwards.
pub(super) fn signed_area(v: &[ScreenVertex; 3]) -> f32 {
    edge(v[0].pos, v[1].pos, v[2].pos.truncate())
}

/// Pixels exactly on an edge belong to one of the two triangles sharing it.
fn owns_edge(a: Vec3, b: Vec3) -> bool {
    let d = b - a;
    d.y > 0.0 || (d.y == 0.0 && d.x < 0.0)
}

/// Walks the pixels covered by the triangle and hands each one, with its
/// depth and perspective correct attributes, to `emit`.
pub(super) fn rasterize(
    width: u32,
    height: u32,
    triangle: [ScreenVertex; 3],
    mut emit: impl FnMut(u32, u32, f32, Varying),
) {
    let mut v = triangle;
    let mut area = signed_area(&v);
    if area.abs() <= f32::EPSILON {
        return;
    }
    if area < 0.0 {
        v.swap(1, 2);
        area = -area;
    }

    let min = v[0].pos.min(v[1].pos).min(v[2].pos);
    let max = v[0].pos.max(v[1].pos).max(v[2].pos);
    if max.x < 0.0 || max.y < 0.0 || min.x >= width as f32 || min.y >= height as f32 {
        return;
    }
    let x0 = min.x.max(0.0).floor() as u32;
    let y0 = min.y.max(0.0).floor() as u32;
    let x1 = (max.x.ceil() as u32).min(width.saturating_sub(1));
    let y1 = (max.y.ceil() as u32).min(height.saturating_sub(1));

    let edges = [(1, 2), (2, 0), (0, 1)];
    let owned = edges.map(|(a, b)| owns_edge(v[a].pos, v[b].pos));

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let mut weights = [0.0; 3];
            let mut inside = true;
            for (k, &(a, b)) in edges.iter().enumerate() {
                let e = edge(v[a].pos, v[b].pos, p);
                if e < 0.0 || (e == 0.0 && !owned[k]) {
                    inside = false;
                    break;
                }
                weights[k] = e / area;
            }
            if !inside {
                continue;
            }

            let depth = weights[0] * v[0].pos.z + weights[1] * v[1].pos.z + weights[2] * v[2].pos.z;
            let inv_w = weights[0] * v[0].inv_w + weights[1] * v[1].inv_w + weights[2] * v[2].inv_w;
            let varying = v[0]
                .varying
                .scaled(weights[0])
                .sum(v[1].varying.scaled(weights[1]))
                .sum(v[2].varying.scaled(weights[2]))
                .scaled(1.0 / inv_w);
            emit(x, y, depth, varying);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(x: f32, y: f32, z: f32, w: f32) -> ClipVertex {
        ClipVertex {
            clip: Vec4::new(x, y, z, w),
            varying: Varying::default(),
        }
    }

    #[test]
    fn near_clipping_keeps_front_part() {
        let triangle = |z: [f32; 3]| {
            [
                clip(0.0, 0.0, z[0], 1.0),
                clip(1.0, 0.0, z[1], 1.0),
                clip(0.0, 1.0, z[2], 1.0),
            ]
        };

        let inside = clip_near(triangle([0.5, 0.5, 0.5]));
        assert_eq!(inside.len(), 3);

        let straddling = clip_near(triangle([0.5, -0.5, 0.5]));
        assert_eq!(straddling.len(), 4);
        assert!(straddling.iter().all(|v| v.clip.z >= 0.0));

        let behind = clip_near(triangle([-0.5, -0.5, -0.5]));
        assert!(behind.is_empty());
    }

    #[test]
    fn adjacent_triangles_cover_each_pixel_once() {
        let quad = [
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(8.0, 0.0, 0.5),
            Vec3::new(8.0, 8.0, 0.5),
            Vec3::new(0.0, 8.0, 0.5),
        ];
        let to_screen = |p: Vec3| ScreenVertex {
            pos: p,
            inv_w: 1.0,
            varying: Varying::default(),
        };
        let mut hits = vec![0u32; 64];
        for tri in [[0, 1, 2], [0, 2, 3]] {
            let v = tri.map(|i| to_screen(quad[i]));
            rasterize(8, 8, v, |x, y, depth, _| {
                assert!((depth - 0.5).abs() < 1e-6);
                hits[(y * 8 + x) as usize] += 1;
            });
        }
        assert!(hits.iter().all(|&h| h == 1));
    }
}

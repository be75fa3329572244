use glam::{Mat4, Vec3};

use crate::geometry::TriMesh;
use crate::gfx::{BlendMode, GraphicsBackend, MatrixSlot};
use crate::sort::SortOrder;
use crate::xform::XForm;

use super::material::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    pub hidden: bool,
    pub cast_shadows: bool,
    pub backface_culling: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            hidden: false,
            cast_shadows: false,
            backface_culling: true,
        }
    }
}

/// Renderable mesh instance.
#[derive(Debug, Clone)]
pub struct Object {
    name: String,
    mesh: TriMesh,
    pub xform: XForm,
    /// Offset from the object origin used as the reflection viewpoint.
    pub pivot: Vec3,
    pub material: Material,
    pub params: RenderParams,
}

impl Object {
    pub fn new(name: impl Into<String>, mesh: TriMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            xform: XForm::new(),
            pivot: Vec3::ZERO,
            material: Material::default(),
            params: RenderParams::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut TriMesh {
        &mut self.mesh
    }

    pub fn set_mesh(&mut self, mesh: TriMesh) {
        self.mesh = mesh;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.params.hidden = hidden;
    }

    pub fn set_shadow_casting(&mut self, enabled: bool) {
        self.params.cast_shadows = enabled;
    }

    pub fn world_matrix(&self, msec: u64) -> Mat4 {
        self.xform.matrix_at(msec)
    }

    /// Point the environment map is rendered from.
    pub fn reflection_origin(&self, msec: u64) -> Vec3 {
        self.xform.prs_at(msec).position + self.pivot
    }

    /// Draws the mesh with the current camera. Returns false when there was
    /// nothing to draw.
    pub fn render(&mut self, gfx: &mut dyn GraphicsBackend, msec: u64) -> bool {
        if self.mesh.is_empty() {
            return false;
        }
        let world = self.world_matrix(msec);
        let transparent = self.material.is_transparent();

        if transparent {
            // back to front as seen from the eye, in model space
            let eye = gfx.matrix(MatrixSlot::View).inverse().w_axis.truncate();
            let eye = world.inverse().transform_point3(eye);
            self.mesh.sort_triangles(eye, SortOrder::Descending);
        }

        gfx.set_matrix(MatrixSlot::World, world);
        gfx.set_lighting(true);
        gfx.set_material(&self.material.state());
        gfx.bind_texture(0, self.material.texture.as_ref());
        gfx.bind_texture(1, self.material.cube_env_map());
        gfx.set_backface_culling(self.params.backface_culling);
        if transparent {
            gfx.set_blending(Some(BlendMode::ALPHA));
            gfx.set_depth_write(false);
        }

        gfx.draw_triangles(self.mesh.vertices(), self.mesh.index_array());

        if transparent {
            gfx.set_depth_write(true);
            gfx.set_blending(None);
        }
        gfx.set_backface_culling(true);
        gfx.bind_texture(0, None);
        gfx.bind_texture(1, None);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::primitives;
    use crate::gfx::SoftwareBackend;

    fn looking_down_z(gfx: &mut SoftwareBackend) {
        gfx.set_matrix(
            MatrixSlot::View,
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y),
        );
        gfx.set_matrix(
            MatrixSlot::Projection,
            Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 1.0, 100.0),
        );
    }

    #[test]
    fn empty_mesh_draws_nothing() {
        let mut gfx = SoftwareBackend::new(16, 16);
        let mut object = Object::new("empty", TriMesh::new());
        assert!(!object.render(&mut gfx, 0));
    }

    #[test]
    fn renders_with_material_color() {
        let mut gfx = SoftwareBackend::new(16, 16);
        looking_down_z(&mut gfx);
        gfx.set_ambient_light(Color::WHITE);

        let mut object = Object::new("box", primitives::cube(4.0));
        object.material = Material::with_diffuse(Color::rgb(1.0, 0.0, 0.0));
        assert!(object.render(&mut gfx, 0));
        let center = gfx.color_at(8, 8);
        assert!(center.r > 0.99 && center.g < 0.01);
    }

    #[test]
    fn transparent_objects_sort_far_triangles_first() {
        let mut gfx = SoftwareBackend::new(16, 16);
        looking_down_z(&mut gfx);

        let mut object = Object::new("glass", primitives::cube(2.0));
        object.material.alpha = 0.5;
        object.render(&mut gfx, 0);

        let mesh = object.mesh();
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let depth = |i: usize| -> f32 {
            mesh.triangles()[i]
                .positions(mesh.vertices())
                .iter()
                .map(|p| p.distance_squared(eye))
                .sum()
        };
        for i in 1..mesh.triangle_count() {
            assert!(depth(i - 1) >= depth(i));
        }
    }
}

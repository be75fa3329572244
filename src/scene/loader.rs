//! XML scene descriptions.
//!
//! ```xml
//! <scene>
//!     <ambient>40 40 40</ambient>
//!     <shadows>true</shadows>
//!     <camera><name>main</name><position>0 5 15</position><target>0 0 0</target></camera>
//!     <light><name>sun</name><type>point</type><position>0 100 0</position></light>
//!     <object><name>floor</name><mesh>plane</mesh><size>40</size></object>
//!     <particles><name>fire</name><descriptor>fire.psys</descriptor></particles>
//! </scene>
//! ```
//!
//! Colors are `r g b` triplets in the 0-255 range, vectors are whitespace
//! separated floats and angles are in degrees.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use glam::{EulerRot, Quat, Vec3};
use roxmltree::{Document, Node};

use super::{Camera, Curve, CurveKind, Light, Object, Scene};
use crate::color::Color;
use crate::geometry::{primitives, TriMesh};
use crate::gfx::Fog;
use crate::particles::ParticleSystem;
use crate::texture::TextureManager;
use crate::xform::{Prs, XForm};

/// Reads a scene file. Textures and particle descriptors are resolved
/// relative to the file's directory.
pub fn load_scene(path: &Path, textures: &mut TextureManager) -> Result<Scene> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    textures.add_search_path(base_dir);
    parse_scene(&xml, base_dir, textures)
        .with_context(|| format!("failed to load scene {}", path.display()))
}

pub fn parse_scene(xml: &str, base_dir: &Path, textures: &TextureManager) -> Result<Scene> {
    let document = Document::parse(xml).context("invalid scene XML")?;
    let root = document.root_element();
    if !root.has_tag_name("scene") {
        bail!("expected a <scene> root element, found <{}>", root.tag_name().name());
    }

    let mut scene = Scene::new();
    scene.set_ambient_light(parse_color(optional_text(&root, "ambient"), Color::BLACK)?);
    scene.set_background(parse_color(optional_text(&root, "background"), Color::BLACK)?);
    scene.set_shadows(parse_bool(optional_text(&root, "shadows"), false)?);
    scene.set_auto_clear(parse_bool(optional_text(&root, "auto_clear"), true)?);
    if let Some(fog) = child(&root, "fog") {
        scene.set_fog(Some(Fog {
            color: parse_color(optional_text(&fog, "color"), Color::BLACK)?,
            start: parse_f32(optional_text(&fog, "start"), 0.0)?,
            end: parse_f32(optional_text(&fog, "end"), 1000.0)?,
        }));
    }

    for node in root.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "camera" => scene.add_camera(parse_camera(&node)?),
            "light" => {
                let light = parse_light(&node)?;
                let name = light.name().to_string();
                scene
                    .add_light(light)
                    .with_context(|| format!("cannot add light {name}"))?;
            }
            "object" => scene.add_object(parse_object(&node, textures)?),
            "particles" => scene.add_particle_system(parse_particles(&node, base_dir, textures)?),
            "curve" => scene.add_curve(parse_curve(&node)?),
            _ => {}
        }
    }

    Ok(scene)
}

fn parse_camera(node: &Node<'_, '_>) -> Result<Camera> {
    let name = required_text(node, "name")?;
    let position = parse_vec3(optional_text(node, "position"), Vec3::new(0.0, 0.0, 10.0))?;
    let target = parse_vec3(optional_text(node, "target"), Vec3::ZERO)?;

    let mut camera = Camera::new(&name, position, target);
    camera.set_up_vector(parse_vec3(optional_text(node, "up"), Vec3::Y)?);
    camera.set_fov(parse_f32(optional_text(node, "fov"), 45.0)?.to_radians());
    camera.set_clip_planes(
        parse_f32(optional_text(node, "near"), 1.0)?,
        parse_f32(optional_text(node, "far"), 10000.0)?,
    );
    if let Some(aspect) = optional_text(node, "aspect") {
        camera.set_aspect(parse_f32(Some(aspect), 1.0)?);
    }
    Ok(camera)
}

fn parse_light(node: &Node<'_, '_>) -> Result<Light> {
    let name = required_text(node, "name")?;
    let kind = optional_text(node, "type").unwrap_or_else(|| "point".to_string());
    let mut light = match kind.as_str() {
        "point" => Light::point(&name, parse_vec3(optional_text(node, "position"), Vec3::ZERO)?),
        "directional" => Light::directional(
            &name,
            parse_vec3(optional_text(node, "direction"), Vec3::NEG_Y)?,
        ),
        other => bail!("light {name} has unknown type `{other}`"),
    };
    light.color = parse_color(optional_text(node, "color"), Color::WHITE)?;
    light.intensity = parse_f32(optional_text(node, "intensity"), 1.0)?;
    light.cast_shadows = parse_bool(optional_text(node, "shadows"), true)?;
    Ok(light)
}

fn parse_object(node: &Node<'_, '_>, textures: &TextureManager) -> Result<Object> {
    let name = required_text(node, "name")?;
    let mesh = parse_mesh(node).with_context(|| format!("invalid mesh for object {name}"))?;

    let mut object = Object::new(&name, mesh);
    object.xform = XForm::from_prs(parse_prs(node)?);
    object.pivot = parse_vec3(optional_text(node, "pivot"), Vec3::ZERO)?;
    object.params.hidden = parse_bool(optional_text(node, "hidden"), false)?;
    object.params.cast_shadows = parse_bool(optional_text(node, "shadows"), false)?;

    let material = &mut object.material;
    material.diffuse = parse_color(optional_text(node, "color"), Color::WHITE)?;
    material.specular = parse_color(optional_text(node, "specular"), Color::BLACK)?;
    material.shininess = parse_f32(optional_text(node, "shininess"), 0.0)?;
    material.alpha = parse_f32(optional_text(node, "alpha"), 1.0)?;
    material.texture = optional_text(node, "texture").and_then(|tex| textures.get_or_log(&tex));
    if let Some(size) = optional_text(node, "envmap") {
        let size = size
            .parse::<u32>()
            .map_err(|err| anyhow!("invalid environment map size `{size}`: {err}"))?;
        material.env_map = Some(textures.create_cube(&format!("{name}.env"), size));
    }
    material.env_intensity = parse_f32(optional_text(node, "env_intensity"), 1.0)?;
    material.auto_refl = parse_bool(optional_text(node, "auto_refl"), true)?;
    material.auto_refl_upd = parse_f32(optional_text(node, "auto_refl_upd"), 1.0)? as u32;
    Ok(object)
}

fn parse_mesh(node: &Node<'_, '_>) -> Result<TriMesh> {
    let kind = required_text(node, "mesh")?;
    let size = parse_f32(optional_text(node, "size"), 1.0)?;
    let mesh = match kind.as_str() {
        "cube" => primitives::cube(size),
        "plane" => {
            let subdivisions = parse_f32(optional_text(node, "subdivisions"), 1.0)? as u32;
            primitives::plane(size, subdivisions)
        }
        "sphere" => {
            let segments = parse_f32(optional_text(node, "segments"), 16.0)? as u32;
            primitives::sphere(size * 0.5, segments, segments / 2)
        }
        other => bail!("unknown mesh `{other}`"),
    };
    Ok(mesh)
}

fn parse_prs(node: &Node<'_, '_>) -> Result<Prs> {
    let rotation = parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?;
    Ok(Prs {
        position: parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        rotation: Quat::from_euler(
            EulerRot::XYZ,
            rotation.x.to_radians(),
            rotation.y.to_radians(),
            rotation.z.to_radians(),
        ),
        scale: parse_vec3(optional_text(node, "scale"), Vec3::ONE)?,
    })
}

fn parse_particles(
    node: &Node<'_, '_>,
    base_dir: &Path,
    textures: &TextureManager,
) -> Result<ParticleSystem> {
    let name = required_text(node, "name")?;
    let descriptor = required_text(node, "descriptor")?;
    let mut system = ParticleSystem::from_descriptor(&name, &base_dir.join(descriptor), textures);
    if let Some(seed) = optional_text(node, "seed") {
        let seed = seed
            .parse::<u64>()
            .map_err(|err| anyhow!("invalid seed `{seed}` for {name}: {err}"))?;
        system = system.with_seed(seed);
    }
    system
        .xform_mut()
        .set_position(parse_vec3(optional_text(node, "position"), Vec3::ZERO)?);
    Ok(system)
}

fn parse_curve(node: &Node<'_, '_>) -> Result<Curve> {
    let name = required_text(node, "name")?;
    let kind = match optional_text(node, "type").as_deref() {
        None | Some("linear") => CurveKind::Linear,
        Some("catmull-rom") => CurveKind::CatmullRom,
        Some(other) => bail!("curve {name} has unknown type `{other}`"),
    };
    let mut curve = Curve::new(&name, kind);
    for point in node.children().filter(|c| c.has_tag_name("point")) {
        curve.add_point(parse_vec3(point.text().map(str::to_string), Vec3::ZERO)?);
    }
    Ok(curve)
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn parse_components<const N: usize>(value: &str, what: &str) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = value.split_whitespace();
    for slot in &mut out {
        let part = parts
            .next()
            .ok_or_else(|| anyhow!("{what} `{value}` is missing components"))?;
        *slot = part
            .parse()
            .map_err(|err| anyhow!("invalid {what} component `{part}`: {err}"))?;
    }
    Ok(out)
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_components::<3>(&value, "vector").map(Vec3::from_array),
        None => Ok(default),
    }
}

fn parse_color(value: Option<String>, default: Color) -> Result<Color> {
    match value {
        Some(value) => {
            let [r, g, b] = parse_components::<3>(&value, "color")?;
            Ok(Color::rgb(r / 255.0, g / 255.0, b / 255.0))
        }
        None => Ok(default),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float `{value}`: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(anyhow!("expected a boolean, found `{other}`")),
        None => Ok(default),
    }
}

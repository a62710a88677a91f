//! glTF 2.0 (`.gltf` / `.glb`) via the `gltf` crate.
//!
//! Images are not decoded here; only their URIs are kept as diffuse texture
//! paths, so a model with missing texture files still imports.

use std::path::Path;

use anyhow::{Context, Result, bail};
use corelib::{Quat, Transform, Vec3};

use crate::scene::{Material, Node, PrimitiveKind, Scene, SceneMesh};

pub fn import_gltf(path: &Path) -> Result<Scene> {
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::open(path)
        .with_context(|| format!("Failed to open glTF file: {}", path.display()))?;
    let buffers = ::gltf::import_buffers(&document, path.parent(), blob)
        .with_context(|| format!("Failed to load glTF buffers: {}", path.display()))?;
    scene_from_document(&document, &buffers)
}

/// Build a scene from a parsed document and its loaded buffers.
pub fn scene_from_document(
    document: &::gltf::Document,
    buffers: &[::gltf::buffer::Data],
) -> Result<Scene> {
    let materials = document.materials().map(convert_material).collect();

    // glTF meshes may be shared between nodes; each primitive is converted once.
    let mut meshes = Vec::new();
    let mut mesh_lookup: Vec<Vec<usize>> = Vec::new();
    for mesh in document.meshes() {
        let mesh_name = mesh.name().unwrap_or("unnamed");
        let mut converted = Vec::new();
        for (prim_index, primitive) in mesh.primitives().enumerate() {
            let name = format!("{mesh_name}#{prim_index}");
            if let Some(scene_mesh) = convert_primitive(&primitive, buffers, name) {
                converted.push(meshes.len());
                meshes.push(scene_mesh);
            }
        }
        mesh_lookup.push(converted);
    }

    let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        bail!("glTF document contains no scenes");
    };

    let mut roots: Vec<Node> = gltf_scene
        .nodes()
        .map(|n| convert_node(n, &mesh_lookup))
        .collect();
    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        let mut root = Node::new(gltf_scene.name().unwrap_or("root"));
        root.children = roots;
        root
    };

    Ok(Scene {
        meshes,
        materials,
        root,
    })
}

fn convert_material(material: ::gltf::Material<'_>) -> Material {
    let name = material.name().unwrap_or("unnamed").to_owned();
    let diffuse_texture = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .and_then(|info| match info.texture().source().source() {
            ::gltf::image::Source::Uri { uri, .. } => texture_path_from_uri(uri, &name),
            ::gltf::image::Source::View { .. } => {
                log::warn!(
                    "Material '{}' uses an embedded base color image; no texture path is exported",
                    name
                );
                None
            }
        });
    Material {
        name,
        diffuse_texture,
    }
}

/// Image URIs are percent-encoded relative references; data URIs carry no path.
fn texture_path_from_uri(uri: &str, material: &str) -> Option<String> {
    if uri.is_empty() {
        log::warn!("Material '{}' has an empty base color image URI", material);
        return None;
    }
    if uri.starts_with("data:") {
        log::warn!(
            "Material '{}' uses an embedded base color image; no texture path is exported",
            material
        );
        return None;
    }
    match urlencoding::decode(uri) {
        Ok(path) => Some(path.into_owned()),
        Err(e) => {
            log::warn!("Material '{}' has an undecodable image URI '{}': {}", material, uri, e);
            None
        }
    }
}

fn convert_primitive(
    primitive: &::gltf::Primitive<'_>,
    buffers: &[::gltf::buffer::Data],
    name: String,
) -> Option<SceneMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let Some(positions) = reader.read_positions() else {
        log::warn!("Primitive '{}' has no positions; skipping", name);
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|tc| tc.into_f32().collect());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    use ::gltf::mesh::Mode;
    let (primitive_kind, indices) = match primitive.mode() {
        Mode::Points => (PrimitiveKind::Points, indices),
        Mode::Lines => (PrimitiveKind::Lines, indices),
        Mode::LineStrip => (PrimitiveKind::Lines, line_strip_to_list(&indices, false)),
        Mode::LineLoop => (PrimitiveKind::Lines, line_strip_to_list(&indices, true)),
        Mode::Triangles => (PrimitiveKind::Triangles, indices),
        Mode::TriangleStrip => (PrimitiveKind::Triangles, triangle_strip_to_list(&indices)),
        Mode::TriangleFan => (PrimitiveKind::Triangles, triangle_fan_to_list(&indices)),
    };

    Some(SceneMesh {
        name,
        primitive: primitive_kind,
        positions,
        uvs,
        indices,
        material: primitive.material().index(),
    })
}

fn convert_node(node: ::gltf::Node<'_>, mesh_lookup: &[Vec<usize>]) -> Node {
    let (translation, rotation, scale) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node{}", node.index()));

    Node {
        name,
        transform: Transform::from_trs(
            Vec3::from_array(translation),
            Quat::from_array(rotation),
            Vec3::from_array(scale),
        ),
        meshes: node
            .mesh()
            .and_then(|m| mesh_lookup.get(m.index()))
            .cloned()
            .unwrap_or_default(),
        children: node
            .children()
            .map(|c| convert_node(c, mesh_lookup))
            .collect(),
    }
}

/// Alternating winding keeps every triangle facing the same way.
fn triangle_strip_to_list(strip: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
    for (i, w) in strip.windows(3).enumerate() {
        if i % 2 == 0 {
            out.extend_from_slice(&[w[0], w[1], w[2]]);
        } else {
            out.extend_from_slice(&[w[1], w[0], w[2]]);
        }
    }
    out
}

fn triangle_fan_to_list(fan: &[u32]) -> Vec<u32> {
    let Some((&hub, rest)) = fan.split_first() else {
        return Vec::new();
    };
    rest.windows(2).flat_map(|w| [hub, w[0], w[1]]).collect()
}

fn line_strip_to_list(strip: &[u32], closed: bool) -> Vec<u32> {
    let mut out: Vec<u32> = strip.windows(2).flat_map(|w| [w[0], w[1]]).collect();
    if closed && strip.len() > 2 {
        out.extend_from_slice(&[strip[strip.len() - 1], strip[0]]);
    }
    out
}

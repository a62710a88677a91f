//! Wavefront OBJ via `tobj`. Every model becomes one mesh under a single
//! root node; OBJ has no hierarchy. Point (`p`) and line (`l`) elements are
//! dropped on import.

use std::{io::BufRead, path::Path};

use anyhow::{Context, Result};

use super::flip_v;
use crate::scene::{Material, Node, Scene, SceneMesh};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load an OBJ file. MTL libraries are resolved relative to the OBJ.
pub fn import_obj(path: &Path) -> Result<Scene> {
    let (models, materials) = tobj::load_obj(path, &load_options())
        .with_context(|| format!("Failed to load OBJ file: {}", path.display()))?;
    Ok(scene_from_obj(models, materials))
}

/// Load OBJ data from a reader; `material_loader` is called for every
/// `mtllib` statement.
pub fn import_obj_from_reader<R, F>(reader: &mut R, material_loader: F) -> Result<Scene>
where
    R: BufRead,
    F: Fn(&Path) -> tobj::MTLLoadResult,
{
    let (models, materials) = tobj::load_obj_buf(reader, &load_options(), material_loader)
        .context("Failed to parse OBJ data")?;
    Ok(scene_from_obj(models, materials))
}

fn scene_from_obj(
    models: Vec<tobj::Model>,
    materials: Result<Vec<tobj::Material>, tobj::LoadError>,
) -> Scene {
    let materials: Vec<Material> = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|m| Material {
                name: m.name,
                diffuse_texture: m.diffuse_texture.filter(|t| !t.is_empty()),
            })
            .collect(),
        Err(e) => {
            log::warn!("Ignoring OBJ materials: {}", e);
            Vec::new()
        }
    };

    let meshes: Vec<SceneMesh> = models
        .into_iter()
        .map(|model| convert_model(model, materials.len()))
        .collect();

    Scene {
        root: Node::new("root").with_meshes(0..meshes.len()),
        meshes,
        materials,
    }
}

fn convert_model(model: tobj::Model, material_count: usize) -> SceneMesh {
    let tobj::Model { mesh, name, .. } = model;

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let uvs: Option<Vec<[f32; 2]>> = if mesh.texcoords.is_empty() {
        None
    } else if mesh.texcoords.len() / 2 != positions.len() {
        log::warn!(
            "OBJ model '{}' has {} texture coordinates for {} positions; dropping them",
            name,
            mesh.texcoords.len() / 2,
            positions.len()
        );
        None
    } else {
        Some(
            mesh.texcoords
                .chunks_exact(2)
                .map(|t| flip_v([t[0], t[1]]))
                .collect(),
        )
    };

    let material = mesh.material_id.filter(|&id| {
        let known = id < material_count;
        if !known {
            log::warn!("OBJ model '{}' uses unknown material {}", name, id);
        }
        known
    });

    let mut out = SceneMesh::triangles(name, positions, mesh.indices);
    out.uvs = uvs;
    out.material = material;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PrimitiveKind;

    const QUAD: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl brick
f 1/1 2/2 3/3 4/4
";

    const QUAD_MTL: &str = "\
newmtl brick
Kd 1 1 1
map_Kd textures/brick.png
";

    #[test]
    fn quad_is_triangulated_with_flipped_uvs_and_texture() {
        let scene = import_obj_from_reader(&mut QUAD.as_bytes(), |_| {
            tobj::load_mtl_buf(&mut QUAD_MTL.as_bytes())
        })
        .expect("import");

        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.root.meshes, vec![0]);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "quad");
        assert_eq!(mesh.primitive, PrimitiveKind::Triangles);
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.primitive_count(), 2);

        let uvs = mesh.uvs.as_ref().expect("uvs");
        assert_eq!(uvs[0], [0.0, 1.0]);
        assert_eq!(uvs[2], [1.0, 0.0]);

        assert_eq!(scene.diffuse_texture(mesh), Some("textures/brick.png"));
        scene.validate().unwrap();
    }

    #[test]
    fn broken_material_library_is_not_fatal() {
        let scene = import_obj_from_reader(&mut QUAD.as_bytes(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .expect("import");
        assert!(scene.materials.is_empty());
        assert_eq!(scene.meshes[0].material, None);
        scene.validate().unwrap();
    }

    #[test]
    fn mesh_without_texcoords_has_no_uvs() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let scene = import_obj_from_reader(&mut src.as_bytes(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .unwrap();
        assert_eq!(scene.meshes[0].uvs, None);
        assert_eq!(scene.meshes[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn point_and_line_elements_are_dropped() {
        let src = format!("{QUAD}l 1 2\np 3\n");
        let scene = import_obj_from_reader(&mut src.as_bytes(), |_| {
            tobj::load_mtl_buf(&mut QUAD_MTL.as_bytes())
        })
        .expect("import");
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].primitive, PrimitiveKind::Triangles);
        assert_eq!(scene.meshes[0].indices.len(), 6);
    }
}

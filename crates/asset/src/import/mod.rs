//! Source model importers producing a [`Scene`].
//!
//! Output is normalised the same way for every format: polygons are
//! triangulated, each mesh carries a single primitive kind, and texture
//! coordinates use a top-left origin.

use std::path::Path;

use anyhow::{Result, bail};

use crate::scene::Scene;

pub mod gltf;
pub mod obj;

/// Import a model, picking the importer from the file extension.
pub fn import_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let scene = match ext.as_str() {
        "obj" => obj::import_obj(path)?,
        "gltf" | "glb" => gltf::import_gltf(path)?,
        "" => bail!("Cannot pick an importer for {}: no file extension", path.display()),
        other => bail!("Unsupported model format '.{}': {}", other, path.display()),
    };

    scene.validate()?;
    log::info!(
        "Imported {}: {} node(s), {} mesh(es), {} material(s)",
        path.display(),
        scene.node_count(),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}

/// Bottom-left to top-left texture origin.
#[inline]
pub(crate) fn flip_v([u, v]: [f32; 2]) -> [f32; 2] {
    [u, 1.0 - v]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extensions_are_rejected() {
        let err = import_scene("model.fbx").unwrap_err();
        assert!(err.to_string().contains("Unsupported model format '.fbx'"));

        let err = import_scene("model").unwrap_err();
        assert!(err.to_string().contains("no file extension"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        // Dispatches to the OBJ importer, which then fails to open the file.
        let err = import_scene("missing.OBJ").unwrap_err();
        assert!(err.to_string().contains("Failed to load OBJ"));
    }

    #[test]
    fn flip_v_mirrors_vertically() {
        assert_eq!(flip_v([0.25, 0.0]), [0.25, 1.0]);
        assert_eq!(flip_v([1.0, 0.75]), [1.0, 0.25]);
    }
}

//! Scene graph to beagleasset records.
//!
//! Nodes are visited depth-first, pre-order: a node's own meshes are written
//! before any of its children. Face indices are rebased by the number of
//! vertices already written, so they stay unique across the whole file.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use corelib::{Mat4, Vec3};
use thiserror::Error;

use crate::{
    format::RecordWriter,
    scene::{Node, PrimitiveKind, Scene, SceneMesh},
};

#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    /// Transform positions into world space using the accumulated node transforms.
    pub bake_transforms: bool,
    /// Replace each texture's directory with this prefix, keeping the file name.
    pub texture_prefix: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub meshes_written: usize,
    pub meshes_skipped: usize,
    pub vertices: usize,
    pub faces: usize,
    pub textures: usize,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid scene: {0}")]
    InvalidScene(String),
    #[error("mesh '{mesh}' pushes the vertex count past {}", u32::MAX)]
    TooManyVertices { mesh: String },
    #[error("mesh '{mesh}' has a texture path that cannot be written as a record: {path:?}")]
    InvalidTexturePath { mesh: String, path: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write every triangle mesh reachable from the scene root.
pub fn export_scene<W: Write>(
    scene: &Scene,
    writer: W,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    scene
        .validate()
        .map_err(|e| ExportError::InvalidScene(format!("{e:#}")))?;

    let mut exporter = Exporter {
        scene,
        options,
        out: RecordWriter::new(writer),
        vertex_base: 0,
        stats: ExportStats::default(),
    };
    exporter.export_node(&scene.root, Mat4::IDENTITY)?;
    exporter.out.finish()?;

    log::debug!("Export finished: {:?}", exporter.stats);
    Ok(exporter.stats)
}

/// Export into a newly created (or truncated) file.
pub fn export_to_path(
    scene: &Scene,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> anyhow::Result<ExportStats> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create asset file: {}", path.display()))?;
    let stats = export_scene(scene, BufWriter::new(file), options)
        .with_context(|| format!("Failed to export asset: {}", path.display()))?;
    log::info!(
        "Wrote {} ({} vertices, {} faces, {} meshes)",
        path.display(),
        stats.vertices,
        stats.faces,
        stats.meshes_written
    );
    Ok(stats)
}

struct Exporter<'s, W: Write> {
    scene: &'s Scene,
    options: &'s ExportOptions,
    out: RecordWriter<W>,
    vertex_base: u32,
    stats: ExportStats,
}

impl<'s, W: Write> Exporter<'s, W> {
    fn export_node(&mut self, node: &'s Node, parent: Mat4) -> Result<(), ExportError> {
        let world = parent * node.transform.matrix();
        let scene = self.scene;

        for &mesh in &node.meshes {
            self.export_mesh(&scene.meshes[mesh], world)?;
        }
        for child in &node.children {
            self.export_node(child, world)?;
        }
        Ok(())
    }

    fn export_mesh(&mut self, mesh: &'s SceneMesh, world: Mat4) -> Result<(), ExportError> {
        if mesh.primitive != PrimitiveKind::Triangles {
            log::debug!(
                "Skipping mesh '{}': {:?} primitives are not exported",
                mesh.name,
                mesh.primitive
            );
            self.stats.meshes_skipped += 1;
            return Ok(());
        }

        let scene = self.scene;
        let texture = scene.diffuse_texture(mesh).map(|t| self.rewrite_texture(t));
        if let Some(path) = texture.as_ref().filter(|t| !is_writable_texture_path(t)) {
            return Err(ExportError::InvalidTexturePath {
                mesh: mesh.name.clone(),
                path: path.clone(),
            });
        }

        let base = self.vertex_base;
        let next_base = u32::try_from(mesh.positions.len())
            .ok()
            .and_then(|n| base.checked_add(n))
            .ok_or_else(|| ExportError::TooManyVertices {
                mesh: mesh.name.clone(),
            })?;

        for (i, &position) in mesh.positions.iter().enumerate() {
            let position = if self.options.bake_transforms {
                world.transform_point3(Vec3::from(position)).to_array()
            } else {
                position
            };
            let uv = mesh.uvs.as_ref().map_or([0.0, 0.0], |uvs| uvs[i]);
            self.out.write_vertex(position, uv)?;
        }

        for face in mesh.indices.chunks_exact(3) {
            self.out
                .write_face([face[0] + base, face[1] + base, face[2] + base])?;
        }

        if let Some(texture) = texture {
            self.out.write_texture(&texture)?;
            self.stats.textures += 1;
        }

        self.vertex_base = next_base;
        self.stats.meshes_written += 1;
        self.stats.vertices += mesh.positions.len();
        self.stats.faces += mesh.indices.len() / 3;
        Ok(())
    }

    fn rewrite_texture(&self, texture: &str) -> String {
        let Some(prefix) = self.options.texture_prefix.as_deref() else {
            return texture.to_owned();
        };
        // Source paths may use either separator regardless of host.
        let file_name = texture.rsplit(['/', '\\']).next().unwrap_or(texture);
        let prefix = prefix.trim_end_matches(['/', '\\']);
        if prefix.is_empty() {
            file_name.to_owned()
        } else {
            format!("{prefix}/{file_name}")
        }
    }
}

/// A `t:` record ends at the line break and loses trailing whitespace when
/// read back, so such paths would not survive a round trip.
fn is_writable_texture_path(path: &str) -> bool {
    !path.is_empty()
        && !path.contains(['\n', '\r'])
        && !path.ends_with(char::is_whitespace)
}

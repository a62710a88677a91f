//! beagleasset loader: records into a single vertex/index buffer pair plus
//! per-texture draw ranges.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::{
    format::{ParseError, Record, parse_line},
    mesh::{MeshData, MeshVertex},
};

/// Directory textures are resolved against when none is configured.
pub const DEFAULT_TEXTURE_ROOT: &str = "shaders";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("line {line}: face index {index} out of bounds (vertex count {vertex_count})")]
    IndexOutOfBounds {
        line: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("line {line}: not valid UTF-8")]
    InvalidUtf8 { line: usize },
    #[error("failed to read line {line}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// A run of records closed by a `t:` line, or the trailing records after
/// the last one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshBlock {
    pub first_vertex: usize,
    pub vertex_count: usize,
    pub first_index: usize,
    pub index_count: usize,
    pub texture: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeagleAsset {
    pub mesh: MeshData,
    pub blocks: Vec<MeshBlock>,
}

impl BeagleAsset {
    /// The last texture named in the file.
    pub fn texture_path(&self) -> Option<&str> {
        self.blocks.iter().rev().find_map(|b| b.texture.as_deref())
    }

    pub fn textures(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| b.texture.as_deref())
    }

    /// [`Self::texture_path`] resolved against `root`.
    pub fn resolve_texture(&self, root: impl AsRef<Path>) -> Option<PathBuf> {
        self.texture_path().map(|t| resolve_texture_path(root, t))
    }
}

/// Relative paths are joined onto `root`; absolute ones are returned as is.
pub fn resolve_texture_path(root: impl AsRef<Path>, texture: &str) -> PathBuf {
    let texture = Path::new(texture);
    if texture.is_absolute() {
        texture.to_path_buf()
    } else {
        root.as_ref().join(texture)
    }
}

/// Load a beagleasset from a file path.
pub fn load_asset_from_path(path: impl AsRef<Path>) -> Result<BeagleAsset> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open asset file: {}", path.display()))?;
    let asset = load_asset_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load asset file: {}", path.display()))?;
    log::info!(
        "Loaded {}: {} vertices, {} triangles, {} block(s)",
        path.display(),
        asset.mesh.vertices.len(),
        asset.mesh.triangle_count(),
        asset.blocks.len()
    );
    Ok(asset)
}

/// Load a beagleasset from a [`BufRead`] implementation.
pub fn load_asset_from_reader<R: BufRead>(reader: R) -> Result<BeagleAsset, LoadError> {
    let mut builder = AssetBuilder::default();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|source| match source.kind() {
            io::ErrorKind::InvalidData => LoadError::InvalidUtf8 { line: line_no },
            _ => LoadError::Io {
                line: line_no,
                source,
            },
        })?;
        if let Some(record) = parse_line(&line, line_no)? {
            builder.push(record, line_no);
        }
    }
    builder.finish()
}

/// Convenience helper to parse an in-memory asset.
pub fn load_asset_from_str(contents: &str) -> Result<BeagleAsset, LoadError> {
    load_asset_from_reader(io::Cursor::new(contents))
}

#[derive(Default)]
struct AssetBuilder {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    blocks: Vec<MeshBlock>,
    block: MeshBlock,
    // First line each face appeared on, for bounds errors.
    face_lines: Vec<usize>,
}

impl AssetBuilder {
    fn push(&mut self, record: Record, line_no: usize) {
        match record {
            Record::Vertex { position, uv } => {
                self.vertices.push(MeshVertex::new(position, uv));
                self.block.vertex_count += 1;
            }
            Record::Face(face) => {
                self.indices.extend_from_slice(&face);
                self.face_lines.push(line_no);
                self.block.index_count += 3;
            }
            Record::Texture(path) => {
                self.block.texture = Some(path);
                self.close_block();
            }
        }
    }

    fn close_block(&mut self) {
        let next = MeshBlock {
            first_vertex: self.vertices.len(),
            first_index: self.indices.len(),
            ..Default::default()
        };
        let done = std::mem::replace(&mut self.block, next);
        self.blocks.push(done);
    }

    fn finish(mut self) -> Result<BeagleAsset, LoadError> {
        if self.block.vertex_count > 0 || self.block.index_count > 0 {
            self.close_block();
        }

        let vertex_count = self.vertices.len();
        for (face, &line) in self.indices.chunks_exact(3).zip(&self.face_lines) {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(LoadError::IndexOutOfBounds {
                    line,
                    index,
                    vertex_count,
                });
            }
        }

        let mesh = MeshData::new(self.vertices, self.indices);
        if !mesh.is_valid() {
            log::warn!("Asset contains no triangles");
        }
        Ok(BeagleAsset {
            mesh,
            blocks: self.blocks,
        })
    }
}

//! beagleasset: a minimal vertex/face text format for meshes.
//! Import source models into a scene graph, export the graph as records,
//! and load records back into GPU-ready buffers.

pub mod export;
pub mod format;
pub mod import;
pub mod loader;
pub mod mesh;
pub mod scene;
pub mod texture;

pub use export::{ExportError, ExportOptions, ExportStats, export_scene, export_to_path};
pub use import::import_scene;
pub use loader::{
    BeagleAsset, DEFAULT_TEXTURE_ROOT, LoadError, MeshBlock, load_asset_from_path,
    load_asset_from_reader, load_asset_from_str,
};
pub use mesh::{GpuVertex, MeshData, MeshVertex, vertex_bytes};

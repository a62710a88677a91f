//! CPU-side mesh buffers produced by the loader, ready for GPU upload.

use bytemuck::{Pod, Zeroable};
use corelib::{Aabb, Vec3};

/// Vertex with position/uv. Values are in the space they were exported in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// Interleaved GPU vertex: 5 floats, position at offset 0, uv at offset 12.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl GpuVertex {
    pub const STRIDE: usize = std::mem::size_of::<GpuVertex>();
    pub const POSITION_OFFSET: usize = 0;
    pub const UV_OFFSET: usize = std::mem::size_of::<[f32; 3]>();
}

impl From<MeshVertex> for GpuVertex {
    fn from(v: MeshVertex) -> Self {
        Self {
            position: v.position,
            uv: v.uv,
        }
    }
}

/// Vertex buffer contents, e.g. of [`MeshData::gpu_vertices`].
pub fn vertex_bytes(vertices: &[GpuVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        self.vertices.iter().copied().map(GpuVertex::from).collect()
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn gpu_layout_is_five_packed_floats() {
        assert_eq!(GpuVertex::STRIDE, 20);
        assert_eq!(GpuVertex::UV_OFFSET, 12);
    }

    #[test]
    fn buffers_cast_to_bytes() {
        let data = MeshData::new(
            vec![
                MeshVertex::new([1.0, 2.0, 3.0], [0.5, 0.25]),
                MeshVertex::new([4.0, 5.0, 6.0], [1.0, 0.0]),
            ],
            vec![0, 1, 1],
        );
        let gpu = data.gpu_vertices();
        let bytes = vertex_bytes(&gpu);
        assert_eq!(bytes.len(), 2 * GpuVertex::STRIDE);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(&floats[..5], &[1.0, 2.0, 3.0, 0.5, 0.25]);
        assert_eq!(data.index_bytes().len(), 12);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let data = MeshData::new(
            vec![
                MeshVertex::new([-1.0, 0.0, 2.0], [0.0; 2]),
                MeshVertex::new([3.0, -5.0, 0.0], [0.0; 2]),
            ],
            vec![],
        );
        let b = data.bounds().expect("bounds");
        assert_eq!(b.min, Vec3::new(-1.0, -5.0, 0.0));
        assert_eq!(b.max, Vec3::new(3.0, 0.0, 2.0));
        assert!(MeshData::default().bounds().is_none());
    }
}

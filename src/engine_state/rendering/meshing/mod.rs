//! Mesh generation and the hand-off of finished meshes.
//!
//! # Architecture
//! - `mesh/`: marching-cubes extraction and the [`Mesh`] it produces
//! - [`MeshSink`]: where the chunk store sends every finished mesh
//! - [`InMemoryMeshSink`]: a sink that keeps raw vertex and index buffers in
//!   memory, for headless runs and tests
//!
//! A renderer plugs in by implementing [`MeshSink`]. Uploads arrive exactly
//! once per generated chunk; removals arrive when the store is cleared.

use std::collections::HashMap;

use log::trace;

use crate::{
    core::MtResource,
    engine_state::{rendering::Vertex, voxels::chunk::ChunkCoord},
};

mod mesh;

// Re-export the mesh module's public interface for external use
pub use mesh::*;

/// Receiver of generated chunk meshes.
pub trait MeshSink {
    /// Called once when the mesh of chunk `coord` is ready.
    fn upload(&mut self, coord: ChunkCoord, mesh: &Mesh);

    /// Called when chunk `coord` is dropped from the store.
    fn remove(&mut self, coord: ChunkCoord);
}

/// Lets a sink be shared: the store owns one handle, the host keeps another.
impl<T: MeshSink + Send + Sync> MeshSink for MtResource<T> {
    fn upload(&mut self, coord: ChunkCoord, mesh: &Mesh) {
        self.get_mut().upload(coord, mesh);
    }

    fn remove(&mut self, coord: ChunkCoord) {
        self.get_mut().remove(coord);
    }
}

/// Buffers of one uploaded chunk, as they would be written to the GPU.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadedMesh {
    /// Interleaved position and normal per vertex
    pub vertices: Vec<Vertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl UploadedMesh {
    /// Vertex buffer contents as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer contents as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Keeps every uploaded mesh in a map keyed by chunk coordinate.
#[derive(Debug, Default)]
pub struct InMemoryMeshSink {
    meshes: HashMap<ChunkCoord, UploadedMesh>,
    uploads: usize,
}

impl InMemoryMeshSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes currently held.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether no mesh is held.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Whether a mesh for `coord` is held.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.meshes.contains_key(&coord)
    }

    /// The buffers uploaded for `coord`, if any.
    pub fn get(&self, coord: ChunkCoord) -> Option<&UploadedMesh> {
        self.meshes.get(&coord)
    }

    /// Total number of uploads received, including ones removed since.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Sum of vertex and index buffer sizes over all held meshes.
    pub fn total_bytes(&self) -> usize {
        self.meshes
            .values()
            .map(|mesh| mesh.vertex_bytes().len() + mesh.index_bytes().len())
            .sum()
    }
}

impl MeshSink for InMemoryMeshSink {
    fn upload(&mut self, coord: ChunkCoord, mesh: &Mesh) {
        trace!(
            "Uploading mesh for chunk {:?}: {} vertices, {} indices",
            coord,
            mesh.vertex_count(),
            mesh.indices().len()
        );
        self.uploads += 1;
        self.meshes.insert(
            coord,
            UploadedMesh {
                vertices: mesh.vertices(),
                indices: mesh.indices().to_vec(),
            },
        );
    }

    fn remove(&mut self, coord: ChunkCoord) {
        self.meshes.remove(&coord);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    fn triangle() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.push_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.push_vertex(Point3::new(0.0, 0.0, 1.0));
        let c = mesh.push_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.push_triangle(a, b, c);
        mesh.recalculate_normals();
        mesh
    }

    #[test]
    fn test_upload_and_remove() {
        let mut sink = InMemoryMeshSink::new();
        let coord = Point3::new(1, 0, -1);

        sink.upload(coord, &triangle());
        assert_eq!(sink.len(), 1);
        assert!(sink.contains(coord));

        let uploaded = sink.get(coord).unwrap();
        assert_eq!(uploaded.indices, vec![0, 1, 2]);
        assert_eq!(uploaded.vertex_bytes().len(), 3 * Vertex::STRIDE);
        assert_eq!(uploaded.index_bytes().len(), 3 * 4);
        assert_eq!(sink.total_bytes(), 3 * Vertex::STRIDE + 12);

        sink.remove(coord);
        assert!(sink.is_empty());
        assert_eq!(sink.upload_count(), 1);
    }

    #[test]
    fn test_uploaded_vertices_carry_normals() {
        let mut sink = InMemoryMeshSink::new();
        sink.upload(Point3::new(0, 0, 0), &triangle());

        let uploaded = sink.get(Point3::new(0, 0, 0)).unwrap();
        for vertex in &uploaded.vertices {
            assert!((vertex.normal[1] - 1.0).abs() < 1e-6, "{vertex:?}");
        }
    }

    #[test]
    fn test_shared_sink_sees_uploads() {
        let host = MtResource::new(InMemoryMeshSink::new());
        let mut store_side: Box<dyn MeshSink> = Box::new(host.clone());

        store_side.upload(Point3::new(0, 0, 0), &triangle());
        assert!(host.get().contains(Point3::new(0, 0, 0)));

        store_side.remove(Point3::new(0, 0, 0));
        assert!(host.get().is_empty());
    }
}

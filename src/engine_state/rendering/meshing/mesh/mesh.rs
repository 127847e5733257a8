//! Triangle mesh produced by surface extraction.
//!
//! The mesh is a plain vertex list plus a triangle index list (stride 3).
//! Vertices are never shared between triangles built from different cells;
//! normals are recomputed once the whole mesh is assembled.

use cgmath::{InnerSpace, Point3, Vector3, Zero};

use crate::engine_state::rendering::Vertex;

/// An indexed triangle mesh in chunk-local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Point3<f32>>,
    indices: Vec<u32>,
    normals: Vec<Vector3<f32>>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, position: Point3<f32>) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    /// Appends one triangle referencing existing vertices.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    /// Triangle indices, three per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Per-vertex normals; empty until [`Mesh::recalculate_normals`] runs.
    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|triangle| [triangle[0], triangle[1], triangle[2]])
    }

    /// Unit normal of a triangle, counter-clockwise front face.
    ///
    /// Returns the zero vector for degenerate triangles.
    pub fn face_normal(&self, [a, b, c]: [u32; 3]) -> Vector3<f32> {
        let p0 = self.positions[a as usize];
        let p1 = self.positions[b as usize];
        let p2 = self.positions[c as usize];

        let normal = (p1 - p0).cross(p2 - p0);
        if normal.magnitude2() > f32::EPSILON * f32::EPSILON {
            normal.normalize()
        } else {
            Vector3::zero()
        }
    }

    /// Recomputes every vertex normal as the normalised average of the unit
    /// normals of all triangles that reference it.
    ///
    /// Vertices touched only by degenerate triangles, or by none, get a zero
    /// normal.
    pub fn recalculate_normals(&mut self) {
        let mut accumulated = vec![Vector3::zero(); self.positions.len()];

        for triangle in self.triangles() {
            let normal = self.face_normal(triangle);
            for index in triangle {
                accumulated[index as usize] += normal;
            }
        }

        self.normals = accumulated
            .into_iter()
            .map(|sum| {
                if sum.magnitude2() > 0.0 {
                    sum.normalize()
                } else {
                    sum
                }
            })
            .collect();
    }

    /// Interleaved position + normal stream, ready for a vertex buffer.
    ///
    /// Vertices without a computed normal get a zero normal.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                let normal = self.normals.get(i).copied().unwrap_or_else(Vector3::zero);
                Vertex::new(*position, normal)
            })
            .collect()
    }
}

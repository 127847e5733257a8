//! Vertex layout for uploading extracted meshes.

use cgmath::{Point3, Vector3};

/// A mesh vertex as it is laid out in a vertex buffer.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Normal: 3x f32 (12 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Chunk-local position
    pub position: [f32; 3],
    /// Unit normal, or zero for degenerate geometry
    pub normal: [f32; 3],
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    /// Creates a vertex from a position and a normal.
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Vertex {
            position: position.into(),
            normal: normal.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 24);

        let vertex = Vertex::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 1.0, 0.0));
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 1.0, 0.0]);
    }
}

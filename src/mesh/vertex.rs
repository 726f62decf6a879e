//! GPU-ready chunk mesh vertex

use bytemuck::{Pod, Zeroable};

/// Flat-shaded vertex: world position, face normal, material color
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    /// Byte stride of one vertex
    pub const STRIDE: usize = std::mem::size_of::<MeshVertex>();

    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}

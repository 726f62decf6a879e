//! Axis-aligned bounding box

use crate::core::types::{IVec3, Vec3};

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box covering `size` whole cells starting at integer corner `origin`
    pub fn from_cells(origin: IVec3, size: u32) -> Self {
        let min = origin.as_vec3();
        Self {
            min,
            max: min + Vec3::splat(size as f32),
        }
    }
}

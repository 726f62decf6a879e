//! World-scale picking against the sparse store

use crate::core::types::{IVec3, Vec3};
use crate::voxel::{BlockId, Face, VoxelStore};
use super::dda::{traverse, TraversalLimits};

/// Reach of break/place interactions in world units
pub const INTERACTION_MAX_DISTANCE: f32 = 8.0;

/// First solid block along an interaction ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub id: BlockId,
    /// Entry face; `None` when the ray started inside the block
    pub face: Option<Face>,
    pub distance: f32,
}

impl RaycastHit {
    pub fn cell(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Cell a new block would occupy: the neighbor across the entry face
    pub fn place_position(&self) -> Option<IVec3> {
        self.face.map(|face| self.cell() + face.offset())
    }
}

/// Cast a ray through the store, returning the first non-air block
///
/// An empty store, or one with nothing within `max_distance`, yields `None`.
pub fn raycast(store: &VoxelStore, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
    traverse(store, origin, direction, TraversalLimits::distance(max_distance))
        .hit()
        .map(|hit| RaycastHit {
            x: hit.cell.x,
            y: hit.cell.y,
            z: hit.cell.z,
            id: hit.material,
            face: hit.face,
            distance: hit.distance,
        })
}

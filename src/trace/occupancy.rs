//! Grid occupancy abstraction shared by every traversal instantiation

use crate::core::types::IVec3;
use crate::voxel::{BlockId, VoxelStore};

/// Anything that can answer "is this cell filled, and with what"
pub trait OccupancySource {
    /// Payload reported for a filled cell (block id, quantized color, ...)
    type Material: Copy;

    /// Whether `cell` is inside the traversable domain. Leaving it ends the
    /// ray as a miss.
    fn in_domain(&self, _cell: IVec3) -> bool {
        true
    }

    /// Material of a filled cell, `None` for empty space
    fn occupancy(&self, cell: IVec3) -> Option<Self::Material>;
}

/// The sparse store is unbounded; anything outside its height range is air
impl OccupancySource for VoxelStore {
    type Material = BlockId;

    fn occupancy(&self, cell: IVec3) -> Option<BlockId> {
        let id = self.get_at(cell);
        (!id.is_air()).then_some(id)
    }
}

//! Chunk columns: the unit of meshing and lazy generation

use crate::core::types::{IVec3, Vec3};

/// Horizontal size of a chunk in cells
pub const CHUNK_SIZE: i32 = 16;

/// Vertical extent of the world; valid y is `[0, WORLD_HEIGHT)`
pub const WORLD_HEIGHT: i32 = 64;

/// Integer coordinate identifying a chunk column
///
/// A chunk is a `CHUNK_SIZE x WORLD_HEIGHT x CHUNK_SIZE` view over the
/// voxel store; it owns no block data itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the world cell column (x, z)
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            z: z.div_euclid(CHUNK_SIZE),
        }
    }

    /// Chunk containing a world position
    pub fn from_world_pos(pos: Vec3) -> Self {
        Self::from_block(pos.x.floor() as i32, pos.z.floor() as i32)
    }

    /// Minimum world cell of this chunk (y = 0)
    pub fn block_origin(&self) -> IVec3 {
        IVec3::new(self.x * CHUNK_SIZE, 0, self.z * CHUNK_SIZE)
    }

    /// This chunk and its four planar neighbors, self first
    pub fn with_planar_neighbors(&self) -> [ChunkCoord; 5] {
        [
            *self,
            ChunkCoord::new(self.x - 1, self.z),
            ChunkCoord::new(self.x + 1, self.z),
            ChunkCoord::new(self.x, self.z - 1),
            ChunkCoord::new(self.x, self.z + 1),
        ]
    }

    /// This chunk and all eight neighbors (planar and diagonal), self first
    pub fn with_all_neighbors(&self) -> [ChunkCoord; 9] {
        let mut out = [*self; 9];
        let mut i = 1;
        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx != 0 || dz != 0 {
                    out[i] = ChunkCoord::new(self.x + dx, self.z + dz);
                    i += 1;
                }
            }
        }
        out
    }

    /// All chunks within a square radius, nearest rings first
    pub fn square_around(center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
        let mut coords = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)).max(0) as usize);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                coords.push(ChunkCoord::new(center.x + dx, center.z + dz));
            }
        }
        coords.sort_by_key(|c| (c.x - center.x).abs().max((c.z - center.z).abs()));
        coords
    }
}

//! Voxel data: block ids, faces, chunk coordinates and the sparse store

pub mod block;
pub mod face;
pub mod chunk;
pub mod store;

pub use block::BlockId;
pub use face::Face;
pub use chunk::{ChunkCoord, CHUNK_SIZE, WORLD_HEIGHT};
pub use store::{BlockKey, VoxelStore};

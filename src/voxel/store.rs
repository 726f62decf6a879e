//! Sparse block storage keyed by packed integer coordinates

use std::collections::HashMap;

use crate::core::types::IVec3;
use crate::math::morton;
use super::block::BlockId;
use super::chunk::WORLD_HEIGHT;

/// Packed coordinate key (Morton-interleaved over the full `i32` range)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockKey(u128);

impl BlockKey {
    /// Pack a coordinate, or `None` when it lies outside the world height
    pub fn pack(x: i32, y: i32, z: i32) -> Option<Self> {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return None;
        }
        Some(BlockKey(morton::encode_signed(x, y, z)))
    }

    pub fn unpack(self) -> IVec3 {
        let (x, y, z) = morton::decode_signed(self.0);
        IVec3::new(x, y, z)
    }
}

/// Ground-truth world content: only non-air cells are stored
///
/// Reads never fail. Unset coordinates and coordinates outside
/// `[0, WORLD_HEIGHT)` vertically read as air, and writes there are
/// ignored. Horizontally the store is unbounded.
#[derive(Debug, Default)]
pub struct VoxelStore {
    blocks: HashMap<BlockKey, BlockId>,
}

impl VoxelStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
        }
    }

    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        match BlockKey::pack(x, y, z) {
            Some(key) => self.blocks.get(&key).copied().unwrap_or(BlockId::Air),
            None => BlockId::Air,
        }
    }

    pub fn get_at(&self, cell: IVec3) -> BlockId {
        self.get(cell.x, cell.y, cell.z)
    }

    /// Write a cell. Air removes the entry; anything else inserts or overwrites.
    pub fn set(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        let Some(key) = BlockKey::pack(x, y, z) else {
            return;
        };
        if id.is_air() {
            self.blocks.remove(&key);
        } else {
            self.blocks.insert(key, id);
        }
    }

    pub fn set_at(&mut self, cell: IVec3, id: BlockId) {
        self.set(cell.x, cell.y, cell.z, id);
    }

    /// Number of stored (non-air) cells
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over all stored cells in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, BlockId)> + '_ {
        self.blocks.iter().map(|(key, id)| (key.unpack(), *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reads_air() {
        let store = VoxelStore::new();
        assert_eq!(store.get(0, 0, 0), BlockId::Air);
        assert_eq!(store.get(-123, 40, 9876), BlockId::Air);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_get() {
        let mut store = VoxelStore::new();
        store.set(3, 10, -7, BlockId::Stone);
        assert_eq!(store.get(3, 10, -7), BlockId::Stone);
        store.set(3, 10, -7, BlockId::Planks);
        assert_eq!(store.get(3, 10, -7), BlockId::Planks);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_air_removes_entry() {
        let mut store = VoxelStore::new();
        store.set(1, 1, 1, BlockId::Dirt);
        store.set(1, 1, 1, BlockId::Air);
        assert_eq!(store.get(1, 1, 1), BlockId::Air);
        assert_eq!(store.len(), 0);

        // Clearing an unset cell doesn't grow the map either
        store.set(5, 5, 5, BlockId::Air);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_out_of_height_ignored() {
        let mut store = VoxelStore::new();
        store.set(0, -1, 0, BlockId::Stone);
        store.set(0, WORLD_HEIGHT, 0, BlockId::Stone);
        assert_eq!(store.get(0, -1, 0), BlockId::Air);
        assert_eq!(store.get(0, WORLD_HEIGHT, 0), BlockId::Air);
        assert!(store.is_empty());
    }

    #[test]
    fn test_far_horizontal_cells_round_trip() {
        let mut store = VoxelStore::new();
        store.set(1_100_000, 10, 0, BlockId::Stone);
        store.set(i32::MIN, 0, i32::MAX, BlockId::Wood);
        assert_eq!(store.get(1_100_000, 10, 0), BlockId::Stone);
        assert_eq!(store.get(i32::MIN, 0, i32::MAX), BlockId::Wood);
        assert_eq!(store.get(1_100_000 - (1 << 21), 10, 0), BlockId::Air);
        assert_eq!(store.len(), 2);

        let mut cells: Vec<_> = store.iter().map(|(cell, _)| cell).collect();
        cells.sort_by_key(|c| c.x);
        assert_eq!(cells, vec![IVec3::new(i32::MIN, 0, i32::MAX), IVec3::new(1_100_000, 10, 0)]);
    }

    #[test]
    fn test_iter_yields_coordinates() {
        let mut store = VoxelStore::new();
        store.set(-2, 5, 9, BlockId::Wood);
        let cells: Vec<_> = store.iter().collect();
        assert_eq!(cells, vec![(IVec3::new(-2, 5, 9), BlockId::Wood)]);
    }

    #[test]
    fn test_adjacent_cells_independent() {
        let mut store = VoxelStore::new();
        for x in -2..=2 {
            for z in -2..=2 {
                store.set(x, 0, z, BlockId::Grass);
            }
        }
        assert_eq!(store.len(), 25);
        store.set(0, 0, 0, BlockId::Air);
        assert_eq!(store.get(-1, 0, 0), BlockId::Grass);
        assert_eq!(store.get(0, 0, 0), BlockId::Air);
        assert_eq!(store.len(), 24);
    }
}

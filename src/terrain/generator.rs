//! Heightmap terrain with seeded tree placement

use serde::{Deserialize, Serialize};

use super::noise::{fbm, hash_coords, FractalParams, ValueNoise2D, Xorshift32};
use crate::voxel::{BlockId, ChunkCoord, VoxelStore, CHUNK_SIZE, WORLD_HEIGHT};

const BASE_HEIGHT: f64 = 12.0;
const DETAIL_AMPLITUDE: f64 = 10.0;
const DETAIL_FREQUENCY: f64 = 0.03;
const MACRO_AMPLITUDE: f64 = 3.0;
const MACRO_FREQUENCY: f64 = 0.01;
const MACRO_OFFSET: f64 = 1000.0;

/// Trees only grow on columns taller than this
const MIN_TREE_HEIGHT: i32 = 8;
const MIN_TRUNK: i32 = 4;
const TRUNK_VARIATION: f64 = 3.0;
const LEAF_RADIUS: i32 = 2;
/// Manhattan bound that rounds the leaf cube into a diamond
const LEAF_MANHATTAN: i32 = 4;

/// Parameters controlling terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Fine-grained rolling hills
    pub detail: FractalParams,
    /// Low-frequency elevation offset
    pub macro_shape: FractalParams,
    /// Per-column probability of a tree on eligible columns
    pub tree_chance: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            detail: FractalParams {
                octaves: 4,
                lacunarity: 2.0,
                gain: 0.5,
            },
            macro_shape: FractalParams {
                octaves: 2,
                lacunarity: 2.0,
                gain: 0.5,
            },
            tree_chance: 0.02,
        }
    }
}

impl TerrainParams {
    /// Clamped copy
    pub fn validated(&self) -> Self {
        Self {
            detail: self.detail.validated(),
            macro_shape: self.macro_shape.validated(),
            tree_chance: if self.tree_chance.is_finite() {
                self.tree_chance.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

/// Deterministic chunk populator
///
/// Heights depend only on (seed, x, z). Tree placement and trunk length come
/// from a per-column generator seeded from the same triple, so a chunk
/// regenerates identically.
pub struct TerrainGenerator {
    seed: u32,
    params: TerrainParams,
    noise: ValueNoise2D,
}

impl TerrainGenerator {
    pub fn new(seed: u32, params: TerrainParams) -> Self {
        Self {
            seed,
            params: params.validated(),
            noise: ValueNoise2D::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Surface height of a column; cells `[0, height)` are solid
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let (fx, fz) = (x as f64, z as f64);
        let detail = fbm(
            &self.noise,
            fx * DETAIL_FREQUENCY,
            fz * DETAIL_FREQUENCY,
            &self.params.detail,
        );
        let macro_shape = fbm(
            &self.noise,
            (fx + MACRO_OFFSET) * MACRO_FREQUENCY,
            (fz + MACRO_OFFSET) * MACRO_FREQUENCY,
            &self.params.macro_shape,
        ) * MACRO_AMPLITUDE;
        let h = (BASE_HEIGHT + detail * DETAIL_AMPLITUDE + macro_shape).floor() as i32;
        h.clamp(1, WORLD_HEIGHT - 1)
    }

    /// Layer material for cell `y` in a column of height `h`
    pub fn layer_at(y: i32, h: i32) -> BlockId {
        if y < h - 4 {
            BlockId::Stone
        } else if y < h - 1 {
            BlockId::Dirt
        } else if y < h {
            BlockId::Grass
        } else {
            BlockId::Air
        }
    }

    /// Populate one chunk column range of the store
    ///
    /// Leaves may spill into neighboring chunks; they only ever fill air.
    pub fn generate_chunk(&self, store: &mut VoxelStore, coord: ChunkCoord) {
        let origin = coord.block_origin();
        let mut trees = 0usize;

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let wx = origin.x + lx;
                let wz = origin.z + lz;
                let h = self.height_at(wx, wz);
                for y in 0..h {
                    store.set(wx, y, wz, Self::layer_at(y, h));
                }

                let mut rng = Xorshift32::new(hash_coords(self.seed, wx, wz));
                if rng.next_f64() < self.params.tree_chance && h > MIN_TREE_HEIGHT {
                    let trunk = MIN_TRUNK + (rng.next_f64() * TRUNK_VARIATION).floor() as i32;
                    place_tree(store, wx, h, wz, trunk);
                    trees += 1;
                }
            }
        }

        log::trace!("Generated chunk ({}, {}) with {} trees", coord.x, coord.z, trees);
    }
}

/// Trunk from `base` upward, then a diamond of leaves around its top cell
pub fn place_tree(store: &mut VoxelStore, x: i32, base: i32, z: i32, trunk: i32) {
    for i in 0..trunk {
        store.set(x, base + i, z, BlockId::Wood);
    }

    let top = base + trunk - 1;
    for dx in -LEAF_RADIUS..=LEAF_RADIUS {
        for dy in -LEAF_RADIUS..=LEAF_RADIUS {
            for dz in -LEAF_RADIUS..=LEAF_RADIUS {
                if dx.abs() + dy.abs() + dz.abs() > LEAF_MANHATTAN {
                    continue;
                }
                let (lx, ly, lz) = (x + dx, top + dy, z + dz);
                if store.get(lx, ly, lz).is_air() {
                    store.set(lx, ly, lz, BlockId::Leaves);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heights(generator: &TerrainGenerator) -> Vec<i32> {
        let mut out = Vec::new();
        for x in -40..40 {
            for z in -40..40 {
                out.push(generator.height_at(x * 3, z * 7));
            }
        }
        out
    }

    #[test]
    fn test_height_deterministic_per_seed() {
        let a = TerrainGenerator::new(1337, TerrainParams::default());
        let b = TerrainGenerator::new(1337, TerrainParams::default());
        assert_eq!(heights(&a), heights(&b));
    }

    #[test]
    fn test_height_in_bounds() {
        let generator = TerrainGenerator::new(42, TerrainParams::default());
        for h in heights(&generator) {
            assert!((1..WORLD_HEIGHT).contains(&h));
        }
    }

    #[test]
    fn test_layering() {
        assert_eq!(TerrainGenerator::layer_at(0, 12), BlockId::Stone);
        assert_eq!(TerrainGenerator::layer_at(7, 12), BlockId::Stone);
        assert_eq!(TerrainGenerator::layer_at(8, 12), BlockId::Dirt);
        assert_eq!(TerrainGenerator::layer_at(10, 12), BlockId::Dirt);
        assert_eq!(TerrainGenerator::layer_at(11, 12), BlockId::Grass);
        assert_eq!(TerrainGenerator::layer_at(12, 12), BlockId::Air);
    }

    #[test]
    fn test_generate_chunk_surface_matches_height() {
        let params = TerrainParams {
            tree_chance: 0.0,
            ..Default::default()
        };
        let generator = TerrainGenerator::new(7, params);
        let mut store = VoxelStore::new();
        let coord = ChunkCoord::new(-1, 2);
        generator.generate_chunk(&mut store, coord);

        let origin = coord.block_origin();
        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let (x, z) = (origin.x + lx, origin.z + lz);
                let h = generator.height_at(x, z);
                assert_eq!(store.get(x, h - 1, z), BlockId::Grass);
                assert_eq!(store.get(x, h, z), BlockId::Air);
                assert!(!store.get(x, 0, z).is_air());
            }
        }
    }

    #[test]
    fn test_generate_chunk_reproducible_with_trees() {
        let params = TerrainParams {
            tree_chance: 0.3,
            ..Default::default()
        };
        let coord = ChunkCoord::new(3, -4);
        let mut a = VoxelStore::new();
        let mut b = VoxelStore::new();
        TerrainGenerator::new(99, params.clone()).generate_chunk(&mut a, coord);
        TerrainGenerator::new(99, params).generate_chunk(&mut b, coord);

        let mut cells_a: Vec<_> = a.iter().map(|(c, id)| (c.to_array(), id as u8)).collect();
        let mut cells_b: Vec<_> = b.iter().map(|(c, id)| (c.to_array(), id as u8)).collect();
        cells_a.sort();
        cells_b.sort();
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn test_tree_shape() {
        let mut store = VoxelStore::new();
        store.set(0, 9, 0, BlockId::Grass);
        // Something solid inside the leaf blob that leaves must not replace
        store.set(1, 14, 0, BlockId::Stone);
        place_tree(&mut store, 0, 10, 0, 5);

        for y in 10..15 {
            assert_eq!(store.get(0, y, 0), BlockId::Wood);
        }
        assert_eq!(store.get(0, 9, 0), BlockId::Grass);
        assert_eq!(store.get(1, 14, 0), BlockId::Stone);
        assert_eq!(store.get(0, 16, 0), BlockId::Leaves);
        assert_eq!(store.get(2, 14, 2), BlockId::Leaves);
        // Corner of the cube is outside the diamond
        assert_eq!(store.get(2, 16, 2), BlockId::Air);
    }

    #[test]
    fn test_validated_clamps() {
        let params = TerrainParams {
            tree_chance: 3.0,
            detail: FractalParams {
                octaves: 0,
                lacunarity: 0.5,
                gain: 2.0,
            },
            ..Default::default()
        };
        let v = params.validated();
        assert_eq!(v.tree_chance, 1.0);
        assert_eq!(v.detail.octaves, 1);
        assert_eq!(v.detail.lacunarity, 1.0);
        assert_eq!(v.detail.gain, 1.0);
    }
}

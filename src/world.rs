//! World facade: voxel store, terrain generation and chunk meshes

use std::collections::HashSet;

use crate::core::config::EngineConfig;
use crate::core::types::{IVec3, Vec3};
use crate::mesh::{build_chunk_mesh, ChunkMeshRegistry};
use crate::terrain::{TerrainGenerator, TerrainParams};
use crate::trace::{raycast, RaycastHit, INTERACTION_MAX_DISTANCE};
use crate::voxel::{BlockId, ChunkCoord, VoxelStore};

/// Sparse world with lazily generated, individually meshed chunks
///
/// Only generated chunks are ever meshed; a rebuild that touches a chunk
/// the generator has not visited yet is skipped, so generation can still
/// fill it in later.
pub struct World {
    store: VoxelStore,
    generator: TerrainGenerator,
    meshes: ChunkMeshRegistry,
    generated: HashSet<ChunkCoord>,
    render_distance: i32,
}

impl World {
    pub fn new(seed: u32, params: TerrainParams, render_distance: i32) -> Self {
        Self {
            store: VoxelStore::new(),
            generator: TerrainGenerator::new(seed, params),
            meshes: ChunkMeshRegistry::new(),
            generated: HashSet::new(),
            render_distance: render_distance.max(0),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let config = config.validated();
        Self::new(config.seed, config.terrain, config.render_distance)
    }

    pub fn store(&self) -> &VoxelStore {
        &self.store
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn meshes(&self) -> &ChunkMeshRegistry {
        &self.meshes
    }

    /// Mutable registry, for draining the change log
    pub fn meshes_mut(&mut self) -> &mut ChunkMeshRegistry {
        &mut self.meshes
    }

    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    pub fn is_generated(&self, coord: ChunkCoord) -> bool {
        self.generated.contains(&coord)
    }

    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.store.get(x, y, z)
    }

    /// Raw store write; meshes are not touched
    pub fn set(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        self.store.set(x, y, z, id);
    }

    /// Run terrain generation for a chunk once; returns false if it already ran
    pub fn generate_chunk(&mut self, coord: ChunkCoord) -> bool {
        if !self.generated.insert(coord) {
            return false;
        }
        self.generator.generate_chunk(&mut self.store, coord);
        true
    }

    /// Generate and mesh every chunk within the render distance of (px, pz)
    ///
    /// All missing chunks are generated before any meshing, then the new
    /// chunks are meshed and every already-meshed neighbour (diagonals
    /// included, since tree crowns reach across chunk corners) is rebuilt
    /// so boundary faces and overhanging leaves are current. Returns the
    /// number of newly generated chunks.
    pub fn ensure_chunks_around(&mut self, px: f32, pz: f32) -> usize {
        let center = ChunkCoord::from_world_pos(Vec3::new(px, 0.0, pz));
        let fresh: Vec<ChunkCoord> = ChunkCoord::square_around(center, self.render_distance)
            .into_iter()
            .filter(|&coord| self.generate_chunk(coord))
            .collect();
        if fresh.is_empty() {
            return 0;
        }

        let mut to_mesh: Vec<ChunkCoord> = fresh.clone();
        for coord in &fresh {
            for neighbor in coord.with_all_neighbors().into_iter().skip(1) {
                if self.meshes.contains(neighbor) && !to_mesh.contains(&neighbor) {
                    to_mesh.push(neighbor);
                }
            }
        }
        for &coord in &to_mesh {
            self.rebuild_chunk(coord);
        }

        log::debug!(
            "Generated {} chunks around ({}, {}), meshed {} (total {})",
            fresh.len(),
            center.x,
            center.z,
            to_mesh.len(),
            self.generated.len()
        );
        fresh.len()
    }

    /// Replace a generated chunk's mesh; returns false for ungenerated chunks
    pub fn rebuild_chunk(&mut self, coord: ChunkCoord) -> bool {
        if !self.generated.contains(&coord) {
            return false;
        }
        let mesh = build_chunk_mesh(&self.store, coord);
        log::trace!("Rebuilt chunk ({}, {}): {} faces", coord.x, coord.z, mesh.face_count());
        self.meshes.replace(mesh);
        true
    }

    /// Remesh the chunk holding a cell plus its 4 planar neighbours
    ///
    /// Returns how many meshes were replaced.
    pub fn rebuild_chunks_around(&mut self, x: i32, _y: i32, z: i32) -> usize {
        let coord = ChunkCoord::from_block(x, z);
        let rebuilt = coord
            .with_planar_neighbors()
            .into_iter()
            .filter(|&c| self.rebuild_chunk(c))
            .count();
        log::debug!("Rebuilt {} chunk meshes around ({}, {})", rebuilt, x, z);
        rebuilt
    }

    /// Interaction raycast against the store, bounded by the reach distance
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RaycastHit> {
        raycast(&self.store, origin, direction, INTERACTION_MAX_DISTANCE)
    }

    /// Generated terrain height of a column; the grass cell is `height - 1`
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.generator.height_at(x, z)
    }

    /// A point `eye_height` above the terrain surface of a column
    pub fn spawn_point(&self, x: i32, z: i32, eye_height: f32) -> Vec3 {
        let feet = IVec3::new(x, self.surface_height(x, z), z).as_vec3();
        feet + Vec3::new(0.5, eye_height, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::CHUNK_SIZE;

    fn world(render_distance: i32) -> World {
        World::new(7, TerrainParams::default(), render_distance)
    }

    fn bare_world() -> World {
        let params = TerrainParams {
            tree_chance: 0.0,
            ..Default::default()
        };
        World::new(7, params, 0)
    }

    #[test]
    fn test_generate_chunk_once() {
        let mut world = world(0);
        let coord = ChunkCoord::new(2, -1);
        assert!(world.generate_chunk(coord));
        let filled = world.store().len();
        assert!(filled > 0);
        assert!(!world.generate_chunk(coord));
        assert_eq!(world.store().len(), filled);
        // Generation alone does not mesh
        assert!(!world.meshes().contains(coord));
    }

    #[test]
    fn test_ensure_chunks_around_generates_square() {
        let mut world = world(1);
        assert_eq!(world.ensure_chunks_around(8.0, 8.0), 9);
        assert_eq!(world.generated_count(), 9);
        assert_eq!(world.meshes().len(), 9);
        // Same position again is a no-op
        assert_eq!(world.ensure_chunks_around(8.0, 8.0), 0);
    }

    #[test]
    fn test_ensure_remeshes_existing_neighbors() {
        let mut world = world(0);
        world.ensure_chunks_around(8.0, 8.0);
        let origin = ChunkCoord::new(0, 0);
        assert_eq!(world.meshes().generation(origin), 1);

        // Stepping into the +x chunk generates it and refreshes its neighbour
        world.ensure_chunks_around(8.0 + CHUNK_SIZE as f32, 8.0);
        assert_eq!(world.meshes().generation(ChunkCoord::new(1, 0)), 1);
        assert_eq!(world.meshes().generation(origin), 2);
    }

    #[test]
    fn test_diagonal_stream_in_keeps_meshes_current() {
        let params = TerrainParams {
            tree_chance: 1.0,
            ..Default::default()
        };
        for seed in 1..40 {
            let mut world = World::new(seed, params.clone(), 0);
            world.ensure_chunks_around(8.0, 8.0);
            world.ensure_chunks_around(8.0 + CHUNK_SIZE as f32, 8.0 + CHUNK_SIZE as f32);

            let origin = ChunkCoord::new(0, 0);
            assert_eq!(world.meshes().generation(origin), 2, "seed {}", seed);
            let expected = build_chunk_mesh(world.store(), origin);
            let registered = world.meshes().get(origin).unwrap();
            assert_eq!(registered.face_count(), expected.face_count(), "seed {}", seed);
            assert_eq!(registered.vertices, expected.vertices, "seed {}", seed);
        }
    }

    #[test]
    fn test_rebuild_around_touches_five_chunks() {
        let mut world = world(1);
        world.ensure_chunks_around(8.0, 8.0);
        world.meshes_mut().take_changes();

        assert_eq!(world.rebuild_chunks_around(3, 20, 3), 5);
        let changes = world.meshes_mut().take_changes();
        assert_eq!(changes.len(), 10);
        assert_eq!(world.meshes().generation(ChunkCoord::new(0, 0)), 2);
        assert_eq!(world.meshes().generation(ChunkCoord::new(1, 1)), 1);
    }

    #[test]
    fn test_rebuild_skips_ungenerated_chunks() {
        let mut world = world(0);
        world.ensure_chunks_around(8.0, 8.0);
        // Only (0, 0) exists; its four neighbours are skipped
        assert_eq!(world.rebuild_chunks_around(0, 10, 0), 1);
        assert!(!world.meshes().contains(ChunkCoord::new(-1, 0)));

        // Later generation still fills the neighbour in
        assert!(world.generate_chunk(ChunkCoord::new(-1, 0)));
    }

    #[test]
    fn test_raycast_down_hits_surface() {
        let mut world = bare_world();
        world.ensure_chunks_around(8.0, 8.0);
        let h = world.surface_height(5, 5);
        let origin = world.spawn_point(5, 5, 3.5);
        let hit = world.raycast(origin, Vec3::NEG_Y).unwrap();
        assert_eq!(hit.cell(), IVec3::new(5, h - 1, 5));
        assert_eq!(hit.id, BlockId::Grass);
        assert_eq!(hit.place_position(), Some(IVec3::new(5, h, 5)));
    }

    #[test]
    fn test_raycast_respects_reach() {
        let world = world(0);
        assert!(world.raycast(Vec3::new(0.5, 40.0, 0.5), Vec3::NEG_Y).is_none());
    }
}

//! Per-chunk mesh ownership with an ordered attach/detach log

use std::collections::HashMap;

use crate::voxel::ChunkCoord;
use super::mesher::ChunkMesh;

/// Scene-graph style notification for the renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshChange {
    /// Stop drawing the chunk's previous mesh
    Detached(ChunkCoord),
    /// Start drawing the chunk's current mesh
    Attached(ChunkCoord),
}

/// Exactly one mesh per meshed chunk, replaced wholesale on rebuild
///
/// Every replacement logs `Detached` before `Attached`, so a consumer that
/// applies the log in order never draws stale and fresh geometry together.
#[derive(Debug, Default)]
pub struct ChunkMeshRegistry {
    meshes: HashMap<ChunkCoord, ChunkMesh>,
    /// Generation counters, bumped on every install
    generations: HashMap<ChunkCoord, u32>,
    changes: Vec<MeshChange>,
}

impl ChunkMeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a mesh, detaching any previous one first
    ///
    /// Returns the replaced mesh.
    pub fn replace(&mut self, mesh: ChunkMesh) -> Option<ChunkMesh> {
        let coord = mesh.coord;
        let old = self.meshes.remove(&coord);
        if old.is_some() {
            self.changes.push(MeshChange::Detached(coord));
        }
        self.meshes.insert(coord, mesh);
        self.changes.push(MeshChange::Attached(coord));

        let generation = self.generations.entry(coord).or_insert(0);
        *generation = generation.wrapping_add(1);
        old
    }

    pub fn remove(&mut self, coord: ChunkCoord) -> Option<ChunkMesh> {
        let old = self.meshes.remove(&coord);
        if old.is_some() {
            self.changes.push(MeshChange::Detached(coord));
        }
        old
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkMesh> {
        self.meshes.get(&coord)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.meshes.contains_key(&coord)
    }

    /// Number of installs so far for a chunk (0 if never meshed)
    pub fn generation(&self, coord: ChunkCoord) -> u32 {
        self.generations.get(&coord).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkMesh> + '_ {
        self.meshes.values()
    }

    /// Drain the change log in the order changes happened
    pub fn take_changes(&mut self) -> Vec<MeshChange> {
        std::mem::take(&mut self.changes)
    }

    /// Total triangles across all registered meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.values().map(ChunkMesh::triangle_count).sum()
    }
}

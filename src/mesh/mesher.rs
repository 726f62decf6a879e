//! Exposed-face extraction for one chunk column

use crate::core::types::IVec3;
use crate::voxel::{ChunkCoord, Face, VoxelStore, CHUNK_SIZE, WORLD_HEIGHT};
use super::vertex::MeshVertex;

/// Two triangles per quad, matching [`Face::corners`] winding
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Renderable geometry for a single chunk
///
/// An empty mesh is a valid placeholder; the registry keeps one for every
/// meshed chunk regardless of content.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMesh {
    pub coord: ChunkCoord,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn empty(coord: ChunkCoord) -> Self {
        Self {
            coord,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [&MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    fn push_face(&mut self, cell: IVec3, face: Face, color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        let normal = face.normal().to_array();
        let origin = cell.as_vec3();
        for corner in face.corners() {
            let position = [origin.x + corner[0], origin.y + corner[1], origin.z + corner[2]];
            self.vertices.push(MeshVertex::new(position, normal, color));
        }
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
}

/// Build the mesh of one chunk from the store
///
/// Neighbor lookups go through the store, so faces on chunk borders see the
/// adjacent chunk's cells. Cells outside the height range count as air.
pub fn build_chunk_mesh(store: &VoxelStore, coord: ChunkCoord) -> ChunkMesh {
    let mut mesh = ChunkMesh::empty(coord);
    let origin = coord.block_origin();

    for lx in 0..CHUNK_SIZE {
        for lz in 0..CHUNK_SIZE {
            for y in 0..WORLD_HEIGHT {
                let cell = IVec3::new(origin.x + lx, y, origin.z + lz);
                let id = store.get_at(cell);
                if id.is_air() {
                    continue;
                }
                let color = id.color().to_array();
                for face in Face::ALL {
                    if store.get_at(cell + face.offset()).is_air() {
                        mesh.push_face(cell, face, color);
                    }
                }
            }
        }
    }

    mesh
}

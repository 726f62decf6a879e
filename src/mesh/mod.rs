//! Chunk mesh extraction and ownership

pub mod vertex;
pub mod mesher;
pub mod registry;

pub use vertex::MeshVertex;
pub use mesher::{build_chunk_mesh, ChunkMesh};
pub use registry::{ChunkMeshRegistry, MeshChange};

//! Voxray - sparse voxel world with a hybrid raster + voxel-traced renderer

pub mod core;
pub mod math;
pub mod voxel;
pub mod terrain;
pub mod mesh;
pub mod trace;
pub mod volume;
pub mod render;
pub mod world;
pub mod engine;

pub use engine::VoxelEngine;
pub use world::World;

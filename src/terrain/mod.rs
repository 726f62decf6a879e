//! Procedural terrain generation

pub mod noise;
pub mod generator;

pub use generator::{TerrainGenerator, TerrainParams};
pub use noise::{fbm, FractalParams, ValueNoise2D, Xorshift32};

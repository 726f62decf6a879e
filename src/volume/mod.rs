//! Windowed dense cache of the voxel store and its traversal adapter

pub mod window;
pub mod trace;

pub use window::{VolumeWindow, EMPTY_TEXEL};
pub use trace::{trace_volume, VolumeHit};

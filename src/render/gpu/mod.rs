//! wgpu backend for the composite stage

pub mod context;
pub mod volume_texture;
pub mod kernel;

pub use context::GpuContext;
pub use volume_texture::VolumeTexture;
pub use kernel::{CompositeUniforms, GpuKernel};

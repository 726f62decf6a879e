//! Hybrid rendering: raster passes, traced composite and the frame driver

pub mod targets;
pub mod raster;
pub mod composite;
pub mod compositor;
pub mod debug_view;
pub mod gpu;

pub use targets::{RenderTargets, FAR_DEPTH};
pub use raster::{RasterBackend, SoftwareRaster};
pub use composite::{CompositeKernel, CompositeParams, SoftwareKernel};
pub use compositor::{CompositorMode, FrameLighting, FrameReport, HybridCompositor};
pub use debug_view::render_debug_view;
pub use gpu::{GpuContext, GpuKernel};

//! Headless GPU context for the composite kernel

use crate::core::error::Error;

/// Device and queue without a presentation surface
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire an adapter able to hold a `grid_size`³ volume texture
    ///
    /// A missing adapter or a too-small 3-D texture limit is reported as
    /// [`Error::Unsupported`] so callers fall back to raster-only.
    pub async fn new(grid_size: u32) -> Result<Self, Error> {
        let instance_desc = wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        };
        let instance = wgpu::Instance::new(&instance_desc);

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Unsupported(format!("No suitable adapter found: {:?}", e)))?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let adapter_limits = adapter.limits();
        if adapter_limits.max_texture_dimension_3d < grid_size {
            return Err(Error::Unsupported(format!(
                "3D textures limited to {} cells per axis, volume window needs {}",
                adapter_limits.max_texture_dimension_3d, grid_size
            )));
        }

        let device_desc = wgpu::DeviceDescriptor {
            label: Some("voxray_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits {
                max_texture_dimension_3d: grid_size,
                max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
                max_buffer_size: adapter_limits.max_buffer_size,
                ..wgpu::Limits::downlevel_defaults()
            },
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: Default::default(),
        };

        let (device, queue) = adapter
            .request_device(&device_desc)
            .await
            .map_err(|e| Error::Gpu(e.to_string()))?;

        log::info!("GPU buffer limits: max_buffer_size={}MB, max_storage_binding={}MB, max_texture_3d={}",
            adapter_limits.max_buffer_size / 1024 / 1024,
            adapter_limits.max_storage_buffer_binding_size / 1024 / 1024,
            adapter_limits.max_texture_dimension_3d);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Blocking variant of [`GpuContext::new`]
    pub fn new_blocking(grid_size: u32) -> Result<Self, Error> {
        pollster::block_on(Self::new(grid_size))
    }

    pub fn adapter_name(&self) -> String {
        self.adapter.get_info().name
    }
}

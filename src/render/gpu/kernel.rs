//! Composite stage as a wgpu compute pass

use bytemuck::{Pod, Zeroable};

use crate::core::config::RenderConfig;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::render::composite::{CompositeKernel, CompositeParams, HASH_FRAME_PERIOD, RIPPLE_TIME_STEP};
use crate::render::targets::RenderTargets;
use crate::trace::ITERATION_CAP;
use crate::volume::VolumeWindow;
use super::context::GpuContext;
use super::volume_texture::VolumeTexture;

pub const WORKGROUP_SIZE: u32 = 8;

/// Uniform block read by `composite.wgsl`
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CompositeUniforms {
    pub inverse_projection: [[f32; 4]; 4],
    pub inverse_view: [[f32; 4]; 4],
    /// xyz = camera position, w = fog density
    pub camera_fog: [f32; 4],
    /// rgb = sky color, w = rain intensity
    pub sky_rain: [f32; 4],
    /// xyz = window origin (world cell), w = cells per axis
    pub volume: [f32; 4],
    /// xyz = sun direction, w = ripple time
    pub sun_ripple: [f32; 4],
    /// width, height, folded frame index, AO samples
    pub frame: [u32; 4],
    /// step bound, reflections flag, padding
    pub trace: [u32; 4],
}

impl CompositeUniforms {
    pub fn new(params: &CompositeParams, window: &VolumeWindow, size: (u32, u32)) -> Self {
        let origin = window.origin().as_vec3();
        Self {
            inverse_projection: params.inverse_projection.to_cols_array_2d(),
            inverse_view: params.inverse_view.to_cols_array_2d(),
            camera_fog: params.camera_position.extend(params.fog_density).to_array(),
            sky_rain: params.sky_color.extend(params.rain_intensity).to_array(),
            volume: origin.extend(window.size() as f32).to_array(),
            sun_ripple: params
                .sun_direction
                .extend(params.frame_index as f32 * RIPPLE_TIME_STEP)
                .to_array(),
            frame: [
                size.0,
                size.1,
                (params.frame_index % HASH_FRAME_PERIOD) as u32,
                params.ao_samples.max(1),
            ],
            trace: [params.max_steps.min(ITERATION_CAP), params.reflections as u32, 0, 0],
        }
    }
}

/// Widen RGB to the vec4 stride storage arrays use
pub fn pack_rgb(values: &[Vec3]) -> Vec<[f32; 4]> {
    values.iter().map(|v| v.extend(1.0).to_array()).collect()
}

/// Workgroups needed to cover a viewport
pub fn workgroup_count(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE))
}

/// Per-viewport storage buffers, rebuilt on resize
struct FrameBuffers {
    pixel_count: usize,
    color: wgpu::Buffer,
    normal: wgpu::Buffer,
    depth: wgpu::Buffer,
    output: wgpu::Buffer,
    readback: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// GPU composite backend
///
/// Uploads the raster buffers, runs one compute dispatch over the
/// viewport and reads the blended frame back into the display buffer.
pub struct GpuKernel {
    context: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    volume: VolumeTexture,
    frame: Option<FrameBuffers>,
}

impl GpuKernel {
    pub fn new(context: GpuContext, grid_size: u32) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/composite.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("composite_uniforms"),
            size: std::mem::size_of::<CompositeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D3,
                        multisampled: false,
                    },
                    count: None,
                },
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, true),
                storage_entry(5, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("composite_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("composite_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let volume = VolumeTexture::new(device, grid_size);

        Self {
            context,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            volume,
            frame: None,
        }
    }

    /// Acquire a device and build the kernel for a render configuration
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        let grid_size = config.validated().grid_size;
        let context = GpuContext::new_blocking(grid_size)?;
        log::info!("GPU composite kernel on {}", context.adapter_name());
        Ok(Self::new(context, grid_size))
    }

    fn ensure_frame_buffers(&mut self, pixel_count: usize) {
        if self.frame.as_ref().is_some_and(|f| f.pixel_count == pixel_count) {
            return;
        }
        let device = &self.context.device;
        let vec4_bytes = (pixel_count * std::mem::size_of::<[f32; 4]>()) as u64;
        let f32_bytes = (pixel_count * std::mem::size_of::<f32>()) as u64;

        let storage = |label: &str, size: u64, usage: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        };
        let input_usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        let color = storage("composite_color", vec4_bytes, input_usage);
        let normal = storage("composite_normal", vec4_bytes, input_usage);
        let depth = storage("composite_depth", f32_bytes, input_usage);
        let output = storage(
            "composite_output",
            vec4_bytes,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        );
        let readback = storage(
            "composite_readback",
            vec4_bytes,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.volume.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: color.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: normal.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: depth.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: output.as_entire_binding(),
                },
            ],
        });

        log::debug!("Composite buffers allocated for {} pixels", pixel_count);
        self.frame = Some(FrameBuffers {
            pixel_count,
            color,
            normal,
            depth,
            output,
            readback,
            bind_group,
        });
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl CompositeKernel for GpuKernel {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn composite(&mut self, window: &VolumeWindow, params: &CompositeParams, targets: &mut RenderTargets) -> Result<()> {
        if window.size() != self.volume.size() {
            return Err(Error::Gpu(format!(
                "volume window is {}³ but the kernel was built for {}³",
                window.size(),
                self.volume.size()
            )));
        }

        let (width, height) = targets.size();
        self.ensure_frame_buffers(targets.pixel_count());
        let Some(frame) = self.frame.as_ref() else {
            return Err(Error::Gpu("composite buffers missing".into()));
        };
        let device = &self.context.device;
        let queue = &self.context.queue;

        self.volume.sync(queue, window);
        let uniforms = CompositeUniforms::new(params, window, (width, height));
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        queue.write_buffer(&frame.color, 0, bytemuck::cast_slice(&pack_rgb(targets.color())));
        queue.write_buffer(&frame.normal, 0, bytemuck::cast_slice(&pack_rgb(targets.normal())));
        queue.write_buffer(&frame.depth, 0, bytemuck::cast_slice(targets.depth()));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("composite_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("composite_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &frame.bind_group, &[]);
            let (groups_x, groups_y) = workgroup_count(width, height);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(&frame.output, 0, &frame.readback, 0, frame.readback.size());
        queue.submit(std::iter::once(encoder.finish()));

        let slice = frame.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait { submission_index: None, timeout: None })
            .map_err(|e| Error::Gpu(e.to_string()))?;

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Gpu(format!("composite readback failed: {}", e))),
            Err(_) => return Err(Error::Gpu("composite readback was never signalled".into())),
        }

        {
            let data = slice.get_mapped_range();
            let pixels: &[[f32; 4]] = bytemuck::cast_slice(&data);
            for (out, px) in targets.display_mut().iter_mut().zip(pixels) {
                *out = Vec3::new(px[0], px[1], px[2]);
            }
        }
        frame.readback.unmap();
        Ok(())
    }
}

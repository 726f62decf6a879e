//! Raster-only / hybrid frame orchestration

use crate::core::camera::Camera;
use crate::core::config::RenderConfig;
use crate::core::types::Vec3;
use crate::mesh::ChunkMeshRegistry;
use crate::volume::VolumeWindow;
use super::composite::{CompositeKernel, CompositeParams};
use super::raster::RasterBackend;
use super::targets::RenderTargets;

/// Which pipeline produced a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositorMode {
    /// Lit raster straight to the display buffer
    RasterOnly,
    /// Lit color, normals + depth, then the traced composite
    Hybrid,
}

/// Per-frame lighting inputs supplied by the driver
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameLighting {
    pub sun_direction: Vec3,
    pub sky_color: Vec3,
    pub fog_density: f32,
    pub rain_intensity: f32,
}

impl Default for FrameLighting {
    fn default() -> Self {
        let config = RenderConfig::default();
        Self {
            sun_direction: Vec3::new(0.5, 1.0, 0.8).normalize(),
            sky_color: Vec3::from(config.sky_color),
            fog_density: config.fog_density,
            rain_intensity: config.rain_intensity,
        }
    }
}

impl FrameLighting {
    /// Lighting taken from the render configuration
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            sky_color: Vec3::from(config.sky_color),
            fog_density: config.fog_density,
            rain_intensity: config.rain_intensity,
            ..Default::default()
        }
    }
}

/// What happened while rendering a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub mode: CompositorMode,
    pub frame_index: u64,
    /// The composite kernel failed this frame and hybrid is now disabled
    pub fell_back: bool,
}

/// Two-mode renderer owning the frame buffers
///
/// Hybrid frames run lit color, then normals + depth, then the composite,
/// each stage finishing before the next reads its output. Once the hybrid
/// path is disabled (no kernel, or a kernel error) it stays disabled.
pub struct HybridCompositor {
    targets: RenderTargets,
    raster: Box<dyn RasterBackend>,
    kernel: Option<Box<dyn CompositeKernel>>,
    config: RenderConfig,
    effects_enabled: bool,
    hybrid_available: bool,
    frame_index: u64,
}

impl HybridCompositor {
    /// `kernel` is `None` when no composite backend could be acquired
    pub fn new(
        size: (u32, u32),
        config: &RenderConfig,
        raster: Box<dyn RasterBackend>,
        kernel: Option<Box<dyn CompositeKernel>>,
    ) -> Self {
        let config = config.validated();
        let hybrid_available = kernel.is_some();
        if !hybrid_available {
            log::warn!("No composite kernel available, hybrid rendering disabled");
        }
        Self {
            targets: RenderTargets::new(size.0, size.1),
            raster,
            kernel,
            effects_enabled: config.enabled_on_start,
            config,
            hybrid_available,
            frame_index: 0,
        }
    }

    pub fn mode(&self) -> CompositorMode {
        if self.effects_enabled && self.hybrid_available {
            CompositorMode::Hybrid
        } else {
            CompositorMode::RasterOnly
        }
    }

    pub fn effects_enabled(&self) -> bool {
        self.effects_enabled
    }

    pub fn hybrid_available(&self) -> bool {
        self.hybrid_available
    }

    pub fn set_effects_enabled(&mut self, enabled: bool) {
        if enabled == self.effects_enabled {
            return;
        }
        self.effects_enabled = enabled;
        log::info!("Hybrid effects {} (mode: {:?})", if enabled { "enabled" } else { "disabled" }, self.mode());
    }

    /// Flip the effects toggle, returning the new state
    pub fn toggle_effects(&mut self) -> bool {
        self.set_effects_enabled(!self.effects_enabled);
        self.effects_enabled
    }

    /// Permanently drop to raster-only for this session
    pub fn disable_hybrid(&mut self, reason: &str) {
        if self.hybrid_available {
            log::error!("Hybrid rendering disabled: {}", reason);
        }
        self.hybrid_available = false;
        self.kernel = None;
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    /// Final frame, top row first
    pub fn display(&self) -> &[Vec3] {
        self.targets.display()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.targets.resize(width, height)
    }

    /// Composite inputs for a camera and lighting
    pub fn composite_params(&self, camera: &Camera, lighting: &FrameLighting) -> CompositeParams {
        CompositeParams {
            inverse_projection: camera.inverse_projection(),
            inverse_view: camera.inverse_view(),
            camera_position: camera.position,
            sun_direction: lighting.sun_direction,
            sky_color: lighting.sky_color,
            fog_density: lighting.fog_density,
            rain_intensity: lighting.rain_intensity.clamp(0.0, 1.0),
            frame_index: self.frame_index,
            ao_samples: self.config.ao_samples,
            max_steps: self.config.max_steps,
            reflections: self.config.water_reflections,
        }
    }

    /// Render one frame in the current mode
    ///
    /// The caller refreshes `window` beforehand (see
    /// [`VolumeWindow::update_if_needed`]); the composite reads it as-is.
    pub fn render_frame(
        &mut self,
        meshes: &ChunkMeshRegistry,
        camera: &Camera,
        window: &VolumeWindow,
        lighting: &FrameLighting,
    ) -> FrameReport {
        let size = self.targets.size();
        let mode = self.mode();
        let mut fell_back = false;

        match mode {
            CompositorMode::RasterOnly => {
                self.raster.render_lit(meshes, camera, lighting, size, self.targets.display_mut());
            }
            CompositorMode::Hybrid => {
                self.raster.render_lit(meshes, camera, lighting, size, self.targets.color_mut());
                let (normal, depth) = self.targets.geometry_mut();
                self.raster.render_normals(meshes, camera, size, normal, depth);

                let params = self.composite_params(camera, lighting);
                let result = match self.kernel.as_mut() {
                    Some(kernel) => kernel.composite(window, &params, &mut self.targets),
                    None => Ok(()),
                };
                if let Err(e) = result {
                    self.disable_hybrid(&e.to_string());
                    self.targets.copy_color_to_display();
                    fell_back = true;
                }
            }
        }

        let report = FrameReport {
            mode,
            frame_index: self.frame_index,
            fell_back,
        };
        self.frame_index += 1;
        report
    }
}

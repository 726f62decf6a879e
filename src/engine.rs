//! Explicitly owned engine context: world, volume window and compositor

use crate::core::camera::Camera;
use crate::core::config::EngineConfig;
use crate::core::types::{IVec3, Vec3};
use crate::render::{
    CompositeKernel, CompositorMode, FrameLighting, FrameReport, GpuKernel, HybridCompositor, SoftwareKernel,
    SoftwareRaster,
};
use crate::trace::RaycastHit;
use crate::volume::VolumeWindow;
use crate::voxel::BlockId;
use crate::world::World;

/// Everything a frame loop needs, passed around by reference
pub struct VoxelEngine {
    config: EngineConfig,
    world: World,
    volume: VolumeWindow,
    compositor: HybridCompositor,
}

impl VoxelEngine {
    /// Engine running both raster and composite stages on the CPU
    pub fn new(config: &EngineConfig, viewport: (u32, u32)) -> Self {
        Self::with_kernel(config, viewport, Some(Box::new(SoftwareKernel::new())))
    }

    /// Engine with the composite stage on the GPU
    ///
    /// Without a usable adapter the engine still runs, raster-only.
    pub fn with_gpu(config: &EngineConfig, viewport: (u32, u32)) -> Self {
        let kernel: Option<Box<dyn CompositeKernel>> = match GpuKernel::from_config(&config.render) {
            Ok(kernel) => Some(Box::new(kernel)),
            Err(e) => {
                log::warn!("GPU composite unavailable: {}", e);
                None
            }
        };
        Self::with_kernel(config, viewport, kernel)
    }

    pub fn with_kernel(
        config: &EngineConfig,
        viewport: (u32, u32),
        kernel: Option<Box<dyn CompositeKernel>>,
    ) -> Self {
        let config = config.validated();
        if let Some(kernel) = &kernel {
            log::info!("Composite kernel: {}", kernel.name());
        }
        Self {
            world: World::from_config(&config),
            volume: VolumeWindow::new(&config.render),
            compositor: HybridCompositor::new(viewport, &config.render, Box::new(SoftwareRaster::new()), kernel),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn volume(&self) -> &VolumeWindow {
        &self.volume
    }

    pub fn compositor(&self) -> &HybridCompositor {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut HybridCompositor {
        &mut self.compositor
    }

    pub fn ensure_chunks_around(&mut self, px: f32, pz: f32) -> usize {
        self.world.ensure_chunks_around(px, pz)
    }

    /// Write a block, remesh the affected chunks and notify the volume window
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        self.world.set(x, y, z, id);
        self.world.rebuild_chunks_around(x, y, z);
        self.volume.on_world_changed_around(x, y, z);
    }

    /// Remove the block under the interaction ray
    pub fn break_block(&mut self, origin: Vec3, direction: Vec3) -> Option<RaycastHit> {
        let hit = self.world.raycast(origin, direction)?;
        self.set_block(hit.x, hit.y, hit.z, BlockId::Air);
        log::debug!("Broke {} at ({}, {}, {})", hit.id.name(), hit.x, hit.y, hit.z);
        Some(hit)
    }

    /// Place `id` against the face the interaction ray enters
    ///
    /// Returns the written cell, or `None` when nothing is in reach, the
    /// ray starts inside a block, or `id` is air.
    pub fn place_block(&mut self, origin: Vec3, direction: Vec3, id: BlockId) -> Option<IVec3> {
        if id.is_air() {
            return None;
        }
        let target = self.world.raycast(origin, direction)?.place_position()?;
        if !self.world.get(target.x, target.y, target.z).is_air() {
            return None;
        }
        self.set_block(target.x, target.y, target.z, id);
        Some(target)
    }

    pub fn update_volume_if_needed(&mut self, center: Vec3) -> bool {
        self.volume.update_if_needed(center, self.world.store())
    }

    pub fn on_world_changed_around(&mut self, x: i32, y: i32, z: i32) -> bool {
        self.volume.on_world_changed_around(x, y, z)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.compositor.resize(width, height)
    }

    /// Render one frame from `camera`
    ///
    /// In hybrid mode the volume window is refreshed around the camera
    /// first, so the composite never reads a stale snapshot.
    pub fn render_frame(&mut self, camera: &Camera, lighting: &FrameLighting) -> FrameReport {
        if self.compositor.mode() == CompositorMode::Hybrid {
            self.volume.update_if_needed(camera.position, self.world.store());
        }
        self.compositor.render_frame(self.world.meshes(), camera, &self.volume, lighting)
    }
}

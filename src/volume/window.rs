//! Dense RGBA8 snapshot of the store around the viewer

use glam::I64Vec3;

use crate::core::config::RenderConfig;
use crate::core::types::{IVec3, Vec3};
use crate::math::Aabb;
use crate::trace::OccupancySource;
use crate::voxel::VoxelStore;

/// Texel written for air
pub const EMPTY_TEXEL: [u8; 4] = [0, 0, 0, 0];

/// Fixed-size cube of quantized block colors
///
/// Cell `(i, j, k)` mirrors `store.get(origin + (i, j, k))` as of the last
/// resample; it is never updated in place. Texels are laid out x-fastest,
/// matching a 3-D texture upload.
pub struct VolumeWindow {
    size: u32,
    rebuild_threshold: f32,
    origin: IVec3,
    texels: Vec<[u8; 4]>,
    last_center: Option<Vec3>,
    dirty: bool,
    /// Bumped on every resample so GPU mirrors know when to re-upload
    revision: u64,
}

impl VolumeWindow {
    pub fn new(config: &RenderConfig) -> Self {
        let config = config.validated();
        let size = config.grid_size;
        let count = (size as usize).pow(3);
        Self {
            size,
            rebuild_threshold: config.rebuild_threshold,
            origin: IVec3::ZERO,
            texels: vec![EMPTY_TEXEL; count],
            last_center: None,
            dirty: false,
            revision: 0,
        }
    }

    /// Edge length in cells
    pub fn size(&self) -> u32 {
        self.size
    }

    /// World cell at local (0, 0, 0)
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether any resample has happened yet
    pub fn has_sampled(&self) -> bool {
        self.last_center.is_some()
    }

    pub fn last_center(&self) -> Option<Vec3> {
        self.last_center
    }

    pub fn rebuild_threshold(&self) -> f32 {
        self.rebuild_threshold
    }

    /// Window origin for a viewer at `center`; never below y = 0
    pub fn origin_for(center: Vec3, size: u32) -> IVec3 {
        let half = (size / 2) as i32;
        let base = center.floor().as_ivec3() - IVec3::splat(half);
        IVec3::new(base.x, base.y.max(0), base.z)
    }

    /// World-space bounds of the current window
    pub fn aabb(&self) -> Aabb {
        Aabb::from_cells(self.origin, self.size)
    }

    /// Whether a world cell lies inside the current window
    pub fn contains(&self, cell: IVec3) -> bool {
        // Widened so edits at the far ends of the i32 range cannot overflow
        let local = cell.as_i64vec3() - self.origin.as_i64vec3();
        local.cmpge(I64Vec3::ZERO).all() && local.cmplt(I64Vec3::splat(self.size as i64)).all()
    }

    fn in_local_bounds(&self, local: IVec3) -> bool {
        let s = self.size as i32;
        local.cmpge(IVec3::ZERO).all() && local.cmplt(IVec3::splat(s)).all()
    }

    /// Linear texel index of an in-bounds local cell
    pub fn local_index(&self, local: IVec3) -> usize {
        let s = self.size as usize;
        local.x as usize + local.y as usize * s + local.z as usize * s * s
    }

    /// Resample if never sampled, marked dirty, or the viewer moved farther
    /// than the rebuild threshold since the last resample
    ///
    /// Returns whether a resample happened.
    pub fn update_if_needed(&mut self, center: Vec3, store: &VoxelStore) -> bool {
        let moved = match self.last_center {
            None => true,
            Some(last) => center.distance_squared(last) > self.rebuild_threshold * self.rebuild_threshold,
        };
        if !(self.dirty || moved) {
            return false;
        }
        self.last_center = Some(center);
        self.resample(center, store);
        self.dirty = false;
        true
    }

    /// Full pass over the cube, re-reading every cell from the store
    pub fn resample(&mut self, center: Vec3, store: &VoxelStore) {
        self.origin = Self::origin_for(center, self.size);
        let s = self.size as i32;
        let mut filled = 0usize;
        let mut index = 0usize;

        for z in 0..s {
            for y in 0..s {
                for x in 0..s {
                    let id = store.get(self.origin.x + x, self.origin.y + y, self.origin.z + z);
                    self.texels[index] = if id.is_air() {
                        EMPTY_TEXEL
                    } else {
                        filled += 1;
                        let [r, g, b] = id.color_rgb8();
                        [r, g, b, 255]
                    };
                    index += 1;
                }
            }
        }

        self.revision += 1;
        log::debug!(
            "Volume resampled at origin {:?} ({}^3, {} filled, revision {})",
            self.origin,
            self.size,
            filled,
            self.revision
        );
    }

    /// Mark dirty when an edited cell falls inside the window
    ///
    /// Returns whether the window was marked. Edits outside are picked up by
    /// whichever later resample brings them into range.
    pub fn on_world_changed_around(&mut self, x: i32, y: i32, z: i32) -> bool {
        if self.contains(IVec3::new(x, y, z)) {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Force a resample on the next update
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Texel at a local cell, reading the nearest edge cell when out of range
    pub fn fetch_clamped(&self, local: IVec3) -> [u8; 4] {
        let max = IVec3::splat(self.size as i32 - 1);
        let clamped = local.clamp(IVec3::ZERO, max);
        self.texels[self.local_index(clamped)]
    }

    /// Texel for a world cell, `None` outside the window
    pub fn texel_at_world(&self, cell: IVec3) -> Option<[u8; 4]> {
        self.contains(cell)
            .then(|| self.texels[self.local_index(cell - self.origin)])
    }

    pub fn is_filled_local(&self, local: IVec3) -> bool {
        self.fetch_clamped(local)[3] > 0
    }

    /// Raw texel bytes, x-fastest, ready for a 3-D texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Number of filled texels
    pub fn filled_count(&self) -> usize {
        self.texels.iter().filter(|t| t[3] > 0).count()
    }
}

/// Local-space occupancy: the domain is `[0, size)^3`, reads clamp to the edge
impl OccupancySource for VolumeWindow {
    type Material = Vec3;

    fn in_domain(&self, cell: IVec3) -> bool {
        self.in_local_bounds(cell)
    }

    fn occupancy(&self, cell: IVec3) -> Option<Vec3> {
        let [r, g, b, a] = self.fetch_clamped(cell);
        (a > 0).then(|| Vec3::new(r as f32, g as f32, b as f32) / 255.0)
    }
}

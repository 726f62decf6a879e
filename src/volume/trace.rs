//! Dense-scale traversal: world-space rays against the volume window

use crate::core::types::{IVec3, Vec3};
use crate::math::Ray;
use crate::trace::{traverse, TraversalLimits};
use super::window::VolumeWindow;

/// Keeps the clipped entry point strictly inside the last cell layer
const EDGE_NUDGE: f32 = 1.0e-4;

/// Filled window cell reached by a shading ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeHit {
    /// World cell
    pub cell: IVec3,
    /// Material color in `[0, 1]`
    pub color: Vec3,
    /// Outward normal of the entry face
    pub normal: Vec3,
    /// World-space distance from the ray origin to the entry point
    pub distance: f32,
    /// Entry point in world space
    pub position: Vec3,
}

/// Trace a world-space ray through the window
///
/// The ray is clipped to the window bounds first, so rays starting outside
/// still find geometry inside. `max_steps` bounds visited cells and is
/// itself capped by the traversal's hard limit.
pub fn trace_volume(window: &VolumeWindow, origin: Vec3, direction: Vec3, max_steps: u32) -> Option<VolumeHit> {
    let ray = Ray::new(origin, direction);
    if ray.is_degenerate() {
        return None;
    }
    let dir = direction.normalize();
    let ray = Ray::new(origin, dir);
    let (t_enter, _t_exit) = ray.clip_to_aabb(&window.aabb())?;

    let window_min = window.origin().as_vec3();
    let local = (ray.at(t_enter) - window_min).clamp(Vec3::ZERO, Vec3::splat(window.size() as f32 - EDGE_NUDGE));

    let hit = traverse(window, local, dir, TraversalLimits::new(f32::INFINITY, max_steps)).hit()?;
    let distance = t_enter + hit.distance;
    Some(VolumeHit {
        cell: window.origin() + hit.cell,
        color: hit.material,
        // A filled start cell has no entry face; face back along the ray
        normal: hit.face.map_or(-dir, |face| face.normal()),
        distance,
        position: ray.at(distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RenderConfig;
    use crate::voxel::{BlockId, VoxelStore};

    fn window_with(cells: &[(i32, i32, i32)], center: Vec3) -> VolumeWindow {
        let mut store = VoxelStore::new();
        for &(x, y, z) in cells {
            store.set(x, y, z, BlockId::Stone);
        }
        let mut window = VolumeWindow::new(&RenderConfig {
            grid_size: 16,
            ..Default::default()
        });
        window.update_if_needed(center, &store);
        window
    }

    #[test]
    fn test_hit_inside_window() {
        let window = window_with(&[(4, 4, 4)], Vec3::splat(8.0));
        let hit = trace_volume(&window, Vec3::new(4.5, 4.5, 10.5), Vec3::NEG_Z, 128).unwrap();
        assert_eq!(hit.cell, IVec3::new(4, 4, 4));
        assert_eq!(hit.normal, Vec3::Z);
        assert!((hit.distance - 5.5).abs() < 1e-4);
        assert!((hit.position - Vec3::new(4.5, 4.5, 5.0)).length() < 1e-4);
        assert_eq!(hit.color, BlockId::Stone.color());
    }

    #[test]
    fn test_ray_from_outside_is_clipped() {
        let window = window_with(&[(0, 4, 4)], Vec3::splat(8.0));
        // Window spans [0, 16); start well outside on -x
        let hit = trace_volume(&window, Vec3::new(-20.5, 4.5, 4.5), Vec3::X, 128).unwrap();
        assert_eq!(hit.cell, IVec3::new(0, 4, 4));
        assert!((hit.distance - 20.5).abs() < 1e-3);
        assert_eq!(hit.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_miss_when_window_missed() {
        let window = window_with(&[(4, 4, 4)], Vec3::splat(8.0));
        assert!(trace_volume(&window, Vec3::new(4.5, 40.0, 4.5), Vec3::Y, 128).is_none());
    }

    #[test]
    fn test_leaves_window_as_miss() {
        let window = window_with(&[], Vec3::splat(8.0));
        assert!(trace_volume(&window, Vec3::splat(8.5), Vec3::new(0.3, 0.4, 0.5), 2048).is_none());
    }

    #[test]
    fn test_step_bound() {
        let window = window_with(&[(15, 4, 4)], Vec3::splat(8.0));
        assert!(trace_volume(&window, Vec3::new(0.5, 4.5, 4.5), Vec3::X, 5).is_none());
        assert!(trace_volume(&window, Vec3::new(0.5, 4.5, 4.5), Vec3::X, 32).is_some());
    }

    #[test]
    fn test_matches_sparse_traversal() {
        let cells = [(3, 2, 9), (6, 7, 1), (12, 3, 3)];
        let mut store = VoxelStore::new();
        for &(x, y, z) in &cells {
            store.set(x, y, z, BlockId::Stone);
        }
        let window = window_with(&cells, Vec3::splat(8.0));
        let origin = Vec3::new(7.3, 5.1, 6.2);
        for target in cells {
            let t = IVec3::new(target.0, target.1, target.2).as_vec3() + Vec3::splat(0.5);
            let dir = t - origin;
            let dense = trace_volume(&window, origin, dir, 1024).map(|h| h.cell);
            let sparse = crate::trace::raycast(&store, origin, dir, 64.0).map(|h| h.cell());
            assert_eq!(dense, sparse);
        }
    }
}

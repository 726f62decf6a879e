//! Pure traced view of the volume window, for inspecting its contents

use rayon::prelude::*;

use crate::core::camera::Camera;
use crate::core::types::{Mat4, Vec2, Vec3, Vec4};
use crate::volume::{trace_volume, VolumeWindow};
use super::composite::{fog_factor, pixel_uv, RAY_OFFSET};
use super::compositor::FrameLighting;

pub const DEBUG_AMBIENT: f32 = 0.35;
pub const DEBUG_FOG_STRENGTH: f32 = 0.6;
pub const SKY_HORIZON: Vec3 = Vec3::new(0.65, 0.85, 0.98);
pub const SKY_ZENITH: Vec3 = Vec3::new(0.45, 0.75, 0.95);

/// World-space direction of the camera ray through a texture coordinate
pub fn primary_ray_direction(uv: Vec2, inverse_projection: &Mat4, inverse_view: &Mat4) -> Vec3 {
    let ndc = uv * 2.0 - Vec2::ONE;
    let near = *inverse_projection * Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
    let far = *inverse_projection * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
    let dir_view = ((far / far.w) - (near / near.w)).truncate().normalize_or_zero();
    inverse_view.transform_vector3(dir_view).normalize_or_zero()
}

pub fn sky_gradient(direction: Vec3) -> Vec3 {
    let t = (0.5 + 0.5 * direction.y).clamp(0.0, 1.0);
    SKY_HORIZON.lerp(SKY_ZENITH, t)
}

/// Shade one primary ray: sun-lit hit with a hard shadow, or the sky
pub fn trace_pixel(window: &VolumeWindow, origin: Vec3, direction: Vec3, lighting: &FrameLighting, max_steps: u32) -> Vec3 {
    let Some(hit) = trace_volume(window, origin, direction, max_steps) else {
        return sky_gradient(direction);
    };

    let sun = lighting.sun_direction.normalize_or_zero();
    let n_dot_l = hit.normal.dot(sun).max(0.0);
    let shadowed = trace_volume(window, hit.position + hit.normal * RAY_OFFSET, sun, max_steps).is_some();
    let lit = if shadowed { 0.0 } else { 1.0 };
    let shade = DEBUG_AMBIENT + lit * n_dot_l * (1.0 - DEBUG_AMBIENT);

    let fog = fog_factor(lighting.fog_density, (hit.position - origin).length());
    (hit.color * shade).lerp(lighting.sky_color, fog * DEBUG_FOG_STRENGTH)
}

/// Render the whole view, rows top first
pub fn render_debug_view(
    window: &VolumeWindow,
    camera: &Camera,
    lighting: &FrameLighting,
    max_steps: u32,
    size: (u32, u32),
) -> Vec<Vec3> {
    let (width, height) = (size.0.max(1), size.1.max(1));
    let inverse_projection = camera.inverse_projection();
    let inverse_view = camera.inverse_view();
    let mut out = vec![Vec3::ZERO; (width * height) as usize];

    out.par_chunks_mut(width as usize).enumerate().for_each(|(y, row)| {
        for (x, pixel) in row.iter_mut().enumerate() {
            let uv = pixel_uv(x as u32, y as u32, width, height);
            let dir = primary_ray_direction(uv, &inverse_projection, &inverse_view);
            *pixel = trace_pixel(window, camera.position, dir, lighting, max_steps);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RenderConfig;
    use crate::voxel::{BlockId, VoxelStore};

    #[test]
    fn test_primary_ray_center_matches_forward() {
        let camera = Camera::look_at(Vec3::new(1.0, 5.0, 2.0), Vec3::new(4.0, 3.0, -6.0), Vec3::Y);
        let dir = primary_ray_direction(Vec2::splat(0.5), &camera.inverse_projection(), &camera.inverse_view());
        assert!((dir - camera.forward()).length() < 1e-4);
    }

    #[test]
    fn test_sky_gradient_ends() {
        assert!((sky_gradient(Vec3::Y) - SKY_ZENITH).length() < 1e-6);
        assert!((sky_gradient(Vec3::NEG_Y) - SKY_HORIZON).length() < 1e-6);
    }

    #[test]
    fn test_shadowed_hit_is_ambient_only() {
        let mut store = VoxelStore::new();
        store.set(4, 4, 4, BlockId::Stone);
        // Roof directly above blocks the sun
        store.set(4, 8, 4, BlockId::Stone);
        let mut window = VolumeWindow::new(&RenderConfig {
            grid_size: 16,
            ..Default::default()
        });
        window.update_if_needed(Vec3::splat(8.0), &store);

        let lighting = FrameLighting {
            sun_direction: Vec3::Y,
            fog_density: 0.0,
            ..Default::default()
        };
        let origin = Vec3::new(4.5, 6.5, 4.5);
        let shaded = trace_pixel(&window, origin, Vec3::NEG_Y, &lighting, 128);
        assert!((shaded - BlockId::Stone.color() * DEBUG_AMBIENT).length() < 1e-5);

        store.set(4, 8, 4, BlockId::Air);
        window.mark_dirty();
        window.update_if_needed(Vec3::splat(8.0), &store);
        let lit = trace_pixel(&window, origin, Vec3::NEG_Y, &lighting, 128);
        assert!((lit - BlockId::Stone.color()).length() < 1e-5);
    }

    #[test]
    fn test_render_size() {
        let window = VolumeWindow::new(&RenderConfig::default());
        let camera = Camera::default();
        let image = render_debug_view(&window, &camera, &FrameLighting::default(), 64, (8, 4));
        assert_eq!(image.len(), 32);
    }
}

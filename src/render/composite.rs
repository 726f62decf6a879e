//! Composite stage: traced AO and reflections over the raster buffers
//!
//! Every helper here is the host-side reference for `shaders/composite.wgsl`.

use rayon::prelude::*;

use crate::core::types::{Mat4, Result, Vec2, Vec3, Vec4};
use crate::math::{reflect, smoothstep};
use crate::volume::{trace_volume, VolumeWindow};
use super::targets::{CompositeViews, RenderTargets, FAR_DEPTH};

/// Start offset along the normal so shading rays leave the surface cell
pub const RAY_OFFSET: f32 = 0.02;
/// Occlusion falloff per unit of hit distance
pub const AO_FALLOFF: f32 = 0.7;
/// AO multiplier never drops below this
pub const AO_FLOOR: f32 = 0.2;
pub const BASE_REFLECTIVITY: f32 = 0.06;
pub const WET_REFLECTIVITY: f32 = 0.25;
pub const PUDDLE_REFLECTIVITY: f32 = 0.5;
pub const RIPPLE_AMPLITUDE: f32 = 0.03;
pub const RIPPLE_FREQUENCY: f32 = 20.0;
/// Seconds of ripple animation per frame
pub const RIPPLE_TIME_STEP: f32 = 0.016;
/// Fog never fully replaces the surface color
pub const FOG_STRENGTH: f32 = 0.5;

/// Frame index is folded before hashing to keep float precision
pub const HASH_FRAME_PERIOD: u64 = 4096;

/// Everything the composite stage reads besides the buffers and the volume
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    pub inverse_projection: Mat4,
    pub inverse_view: Mat4,
    pub camera_position: Vec3,
    pub sun_direction: Vec3,
    pub sky_color: Vec3,
    pub fog_density: f32,
    pub rain_intensity: f32,
    pub frame_index: u64,
    pub ao_samples: u32,
    pub max_steps: u32,
    pub reflections: bool,
}

/// Backend that evaluates the composite for every pixel
///
/// Implementations read color, normal and depth from `targets` and write
/// the blended frame into its display buffer. An error disables the hybrid
/// path for the rest of the session.
pub trait CompositeKernel: Send {
    fn name(&self) -> &'static str;

    fn composite(&mut self, window: &VolumeWindow, params: &CompositeParams, targets: &mut RenderTargets) -> Result<()>;
}

/// Rayon-parallel CPU composite
#[derive(Debug, Default)]
pub struct SoftwareKernel;

impl SoftwareKernel {
    pub fn new() -> Self {
        Self
    }
}

impl CompositeKernel for SoftwareKernel {
    fn name(&self) -> &'static str {
        "software"
    }

    fn composite(&mut self, window: &VolumeWindow, params: &CompositeParams, targets: &mut RenderTargets) -> Result<()> {
        let CompositeViews {
            width,
            height,
            color,
            normal,
            depth,
            display,
        } = targets.composite_views();

        display
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let index = y * width as usize + x;
                    let pixel = PixelInput {
                        x: x as u32,
                        y: y as u32,
                        uv: pixel_uv(x as u32, y as u32, width, height),
                        color: color[index],
                        encoded_normal: normal[index],
                        depth: depth[index],
                    };
                    *out = composite_pixel(window, params, &pixel);
                }
            });
        Ok(())
    }
}

/// One pixel's raster inputs
#[derive(Clone, Copy, Debug)]
pub struct PixelInput {
    pub x: u32,
    pub y: u32,
    /// Texture coordinate, v = 0 at the bottom row
    pub uv: Vec2,
    pub color: Vec3,
    pub encoded_normal: Vec3,
    pub depth: f32,
}

/// Texture coordinate of a pixel center; rows are stored top first
pub fn pixel_uv(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / width as f32,
        1.0 - (y as f32 + 0.5) / height as f32,
    )
}

pub fn encode_normal(n: Vec3) -> Vec3 {
    n * 0.5 + Vec3::splat(0.5)
}

pub fn decode_normal(encoded: Vec3) -> Vec3 {
    (encoded * 2.0 - Vec3::ONE).normalize_or_zero()
}

/// World position from a texture coordinate and window-space depth
pub fn reconstruct_world_position(uv: Vec2, depth: f32, inverse_projection: &Mat4, inverse_view: &Mat4) -> Vec3 {
    let ndc = Vec4::new(uv.x * 2.0 - 1.0, uv.y * 2.0 - 1.0, depth * 2.0 - 1.0, 1.0);
    let view = *inverse_projection * ndc;
    let view = view / view.w;
    let world = *inverse_view * view;
    (world / world.w).truncate()
}

/// Cheap 3-D to 1-D hash in [0, 1)
pub fn hash13(p: Vec3) -> f32 {
    let p = p * 0.1031;
    let mut p = p - p.floor();
    p += Vec3::splat(p.dot(Vec3::new(p.y, p.z, p.x) + Vec3::splat(33.33)));
    let h = (p.x + p.y) * p.z;
    h - h.floor()
}

/// Cosine-weighted direction in the hemisphere around `n`
pub fn hemisphere_sample(n: Vec3, xi: Vec2) -> Vec3 {
    let phi = std::f32::consts::TAU * xi.x;
    let cos_theta = (1.0 - xi.y).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let t1 = if n.z.abs() < 0.999 { n.cross(Vec3::Z) } else { n.cross(Vec3::Y) }.normalize();
    let t2 = n.cross(t1);
    (t1 * (phi.cos() * sin_theta) + t2 * (phi.sin() * sin_theta) + n * cos_theta).normalize()
}

/// Jittered sample coordinates for AO ray `sample` of a pixel
pub fn sample_xi(x: u32, y: u32, sample: u32, frame_index: u64) -> Vec2 {
    let frame = (frame_index % HASH_FRAME_PERIOD) as f32;
    let (fx, fy) = (x as f32, y as f32);
    Vec2::new(
        hash13(Vec3::new(fx, fy, sample as f32 + frame)),
        hash13(Vec3::new(fy, fx, (sample * 7) as f32 + frame)),
    )
}

/// AO multiplier in `[AO_FLOOR, 1]`; 1 means unoccluded
pub fn ambient_occlusion(
    window: &VolumeWindow,
    position: Vec3,
    normal: Vec3,
    pixel: (u32, u32),
    frame_index: u64,
    samples: u32,
    max_steps: u32,
) -> f32 {
    let samples = samples.max(1);
    let origin = position + normal * RAY_OFFSET;
    let occlusion: f32 = (0..samples)
        .filter_map(|i| {
            let dir = hemisphere_sample(normal, sample_xi(pixel.0, pixel.1, i, frame_index));
            trace_volume(window, origin, dir, max_steps)
        })
        .map(|hit| (-(hit.position - position).length() * AO_FALLOFF).exp())
        .sum();
    (1.0 - occlusion / samples as f32).clamp(AO_FLOOR, 1.0)
}

/// Puddle factor: upward-facing surfaces under rain
pub fn puddle_factor(normal: Vec3, rain_intensity: f32) -> f32 {
    smoothstep(0.7, 1.0, normal.y) * rain_intensity
}

/// Mirror direction with rain ripples folded into its horizontal part
pub fn rippled_reflection(view: Vec3, normal: Vec3, position: Vec3, puddle: f32, frame_index: u64) -> Vec3 {
    let mut r = reflect(-view, normal);
    let t = frame_index as f32 * RIPPLE_TIME_STEP;
    let amp = puddle * RIPPLE_AMPLITUDE;
    r.x += amp * (RIPPLE_FREQUENCY * (position.x + position.z + t)).sin();
    r.z += amp * (RIPPLE_FREQUENCY * (position.x - position.z + t)).cos();
    r
}

/// Fresnel-weighted reflectivity between dry and wet
pub fn reflection_strength(normal: Vec3, view: Vec3, puddle: f32) -> f32 {
    let fresnel = (1.0 - normal.dot(view).max(0.0)).powi(5);
    let wet = WET_REFLECTIVITY + puddle * PUDDLE_REFLECTIVITY;
    BASE_REFLECTIVITY + (wet - BASE_REFLECTIVITY) * fresnel
}

pub fn fog_factor(density: f32, distance: f32) -> f32 {
    1.0 - (-density * distance).exp()
}

/// Final color of one pixel
///
/// Background pixels (depth at the far plane) pass the lit color through.
pub fn composite_pixel(window: &VolumeWindow, params: &CompositeParams, pixel: &PixelInput) -> Vec3 {
    if pixel.depth >= FAR_DEPTH {
        return pixel.color;
    }

    let n = decode_normal(pixel.encoded_normal);
    let p = reconstruct_world_position(pixel.uv, pixel.depth, &params.inverse_projection, &params.inverse_view);
    let v = (params.camera_position - p).normalize_or_zero();

    let ao = ambient_occlusion(
        window,
        p,
        n,
        (pixel.x, pixel.y),
        params.frame_index,
        params.ao_samples,
        params.max_steps,
    );

    let mut out = pixel.color * ao;
    if params.reflections {
        let puddle = puddle_factor(n, params.rain_intensity);
        let r = rippled_reflection(v, n, p, puddle, params.frame_index);
        let reflection = trace_volume(window, p + n * RAY_OFFSET, r, params.max_steps)
            .map_or(params.sky_color, |hit| hit.color);
        out += reflection * reflection_strength(n, v, puddle);
    }

    let fog = fog_factor(params.fog_density, (p - params.camera_position).length());
    out.lerp(params.sky_color, fog * FOG_STRENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::Camera;
    use crate::core::config::RenderConfig;
    use crate::voxel::{BlockId, VoxelStore};

    fn window_over(store: &VoxelStore, center: Vec3) -> VolumeWindow {
        let mut window = VolumeWindow::new(&RenderConfig {
            grid_size: 32,
            ..Default::default()
        });
        window.update_if_needed(center, store);
        window
    }

    fn flat_ground() -> VoxelStore {
        let mut store = VoxelStore::new();
        for x in -16..16 {
            for z in -16..16 {
                store.set(x, 9, z, BlockId::Grass);
            }
        }
        store
    }

    #[test]
    fn test_hash13_range() {
        for i in 0..200 {
            let h = hash13(Vec3::new(i as f32 * 1.7, i as f32 * 0.3, 5.0 + i as f32));
            assert!((0.0..1.0).contains(&h));
        }
    }

    #[test]
    fn test_hemisphere_sample_above_surface() {
        for n in [Vec3::Y, Vec3::NEG_Z, Vec3::new(1.0, 1.0, 0.0).normalize()] {
            for i in 0..32 {
                let dir = hemisphere_sample(n, sample_xi(i, i * 3, i % 4, 17));
                assert!((dir.length() - 1.0).abs() < 1e-4);
                assert!(dir.dot(n) > 0.0);
            }
        }
    }

    #[test]
    fn test_sample_xi_changes_with_frame() {
        assert_ne!(sample_xi(10, 20, 0, 1), sample_xi(10, 20, 0, 2));
        assert_eq!(sample_xi(10, 20, 0, 1), sample_xi(10, 20, 0, 1));
    }

    #[test]
    fn test_normal_encoding() {
        let n = Vec3::new(0.0, -1.0, 0.0);
        assert!((decode_normal(encode_normal(n)) - n).length() < 1e-6);
        assert_eq!(decode_normal(Vec3::splat(0.5)), Vec3::ZERO);
    }

    #[test]
    fn test_reconstruct_world_position() {
        let mut camera = Camera::look_at(Vec3::new(3.0, 4.0, 10.0), Vec3::new(3.0, 4.0, 0.0), Vec3::Y);
        camera.set_aspect(1.0, 1.0);
        let point = Vec3::new(3.5, 3.2, 2.0);
        let clip = camera.view_projection() * point.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let uv = Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5);
        let depth = ndc.z * 0.5 + 0.5;
        let p = reconstruct_world_position(uv, depth, &camera.inverse_projection(), &camera.inverse_view());
        assert!((p - point).length() < 1e-3);
    }

    #[test]
    fn test_unoccluded_flat_surface_has_full_ao() {
        let store = flat_ground();
        let window = window_over(&store, Vec3::new(0.0, 10.0, 0.0));
        let ao = ambient_occlusion(&window, Vec3::new(0.5, 10.0, 0.5), Vec3::Y, (3, 4), 0, 8, 128);
        assert_eq!(ao, 1.0);
    }

    #[test]
    fn test_adjacent_occluder_drives_ao_to_floor() {
        let mut store = flat_ground();
        store.set(0, 10, 0, BlockId::Stone);
        let window = window_over(&store, Vec3::new(0.0, 10.0, 0.0));
        let ao = ambient_occlusion(&window, Vec3::new(0.5, 10.0, 0.5), Vec3::Y, (3, 4), 0, 8, 128);
        assert_eq!(ao, AO_FLOOR);
    }

    #[test]
    fn test_reflection_strength_bounds() {
        // Looking straight down at a dry surface
        let head_on = reflection_strength(Vec3::Y, Vec3::Y, 0.0);
        assert!((head_on - BASE_REFLECTIVITY).abs() < 1e-6);
        // Grazing angle on a puddle
        let grazing = reflection_strength(Vec3::Y, Vec3::X, 1.0);
        assert!((grazing - (WET_REFLECTIVITY + PUDDLE_REFLECTIVITY)).abs() < 1e-6);
    }

    #[test]
    fn test_puddles_only_on_upward_faces() {
        assert_eq!(puddle_factor(Vec3::X, 1.0), 0.0);
        assert_eq!(puddle_factor(Vec3::Y, 0.5), 0.5);
        assert_eq!(puddle_factor(Vec3::Y, 0.0), 0.0);
    }

    #[test]
    fn test_no_rain_no_ripple() {
        let v = Vec3::new(0.3, 0.8, 0.1).normalize();
        let r = rippled_reflection(v, Vec3::Y, Vec3::new(1.3, 10.0, 2.7), 0.0, 99);
        assert!((r - reflect(-v, Vec3::Y)).length() < 1e-6);
    }

    #[test]
    fn test_background_passes_through() {
        let window = window_over(&VoxelStore::new(), Vec3::ZERO);
        let params = CompositeParams {
            inverse_projection: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            sun_direction: Vec3::Y,
            sky_color: Vec3::ONE,
            fog_density: 0.02,
            rain_intensity: 0.5,
            frame_index: 0,
            ao_samples: 4,
            max_steps: 128,
            reflections: true,
        };
        let pixel = PixelInput {
            x: 0,
            y: 0,
            uv: Vec2::splat(0.5),
            color: Vec3::new(0.1, 0.2, 0.3),
            encoded_normal: Vec3::ZERO,
            depth: FAR_DEPTH,
        };
        assert_eq!(composite_pixel(&window, &params, &pixel), pixel.color);
    }

    #[test]
    fn test_fog_factor() {
        assert_eq!(fog_factor(0.02, 0.0), 0.0);
        assert!(fog_factor(0.02, 1000.0) > 0.99);
    }
}

//! Raster stages: lit color and encoded normals with depth

use crate::core::camera::Camera;
use crate::core::types::{Mat4, Vec3, Vec4};
use crate::mesh::{ChunkMeshRegistry, MeshVertex};
use super::compositor::FrameLighting;
use super::targets::FAR_DEPTH;

/// Constant term of the lit pass
pub const LIT_AMBIENT: f32 = 0.35;

/// Triangles with a vertex this close to (or behind) the eye are dropped
const MIN_CLIP_W: f32 = 1.0e-4;

/// Producer of the two raster buffers the composite stage reads
///
/// Both passes draw the same registered meshes with the same camera; they
/// are independent and may run in either order.
pub trait RasterBackend: Send {
    fn name(&self) -> &'static str;

    /// Lit scene into `color`; uncovered pixels get the sky color
    fn render_lit(
        &mut self,
        meshes: &ChunkMeshRegistry,
        camera: &Camera,
        lighting: &FrameLighting,
        size: (u32, u32),
        color: &mut [Vec3],
    );

    /// World normals encoded as `n * 0.5 + 0.5`, plus window-space depth
    fn render_normals(
        &mut self,
        meshes: &ChunkMeshRegistry,
        camera: &Camera,
        size: (u32, u32),
        normal: &mut [Vec3],
        depth: &mut [f32],
    );
}

/// CPU scanline-free rasterizer using edge functions and a depth buffer
#[derive(Debug, Default)]
pub struct SoftwareRaster {
    scratch_depth: Vec<f32>,
}

impl SoftwareRaster {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RasterBackend for SoftwareRaster {
    fn name(&self) -> &'static str {
        "software"
    }

    fn render_lit(
        &mut self,
        meshes: &ChunkMeshRegistry,
        camera: &Camera,
        lighting: &FrameLighting,
        size: (u32, u32),
        color: &mut [Vec3],
    ) {
        color.fill(lighting.sky_color);
        self.scratch_depth.clear();
        self.scratch_depth.resize(color.len(), FAR_DEPTH);

        let sun = lighting.sun_direction.normalize_or_zero();
        rasterize(meshes, &camera.view_projection(), size, &mut self.scratch_depth, |index, vertex| {
            let n = Vec3::from(vertex.normal);
            let diffuse = n.dot(sun).max(0.0);
            color[index] = Vec3::from(vertex.color) * (LIT_AMBIENT + (1.0 - LIT_AMBIENT) * diffuse);
        });
    }

    fn render_normals(
        &mut self,
        meshes: &ChunkMeshRegistry,
        camera: &Camera,
        size: (u32, u32),
        normal: &mut [Vec3],
        depth: &mut [f32],
    ) {
        normal.fill(Vec3::ZERO);
        depth.fill(FAR_DEPTH);
        rasterize(meshes, &camera.view_projection(), size, depth, |index, vertex| {
            normal[index] = Vec3::from(vertex.normal) * 0.5 + Vec3::splat(0.5);
        });
    }
}

/// Screen-space vertex: pixel coordinates plus window depth
#[derive(Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

fn to_screen(view_proj: &Mat4, position: [f32; 3], width: f32, height: f32) -> Option<ScreenVertex> {
    let clip = *view_proj * Vec4::new(position[0], position[1], position[2], 1.0);
    if clip.w <= MIN_CLIP_W {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * width,
        y: (0.5 - ndc.y * 0.5) * height,
        z: ndc.z * 0.5 + 0.5,
    })
}

fn edge(a: ScreenVertex, b: ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Depth-tested coverage of every registered triangle
///
/// `shade` runs for each pixel that passes the depth test, with the
/// triangle's first vertex (faces are flat, so any vertex will do).
fn rasterize<F>(meshes: &ChunkMeshRegistry, view_proj: &Mat4, size: (u32, u32), depth: &mut [f32], mut shade: F)
where
    F: FnMut(usize, &MeshVertex),
{
    let (width, height) = size;
    let (fw, fh) = (width as f32, height as f32);

    for mesh in meshes.iter() {
        for [v0, v1, v2] in mesh.triangles() {
            let (Some(a), Some(b), Some(c)) = (
                to_screen(view_proj, v0.position, fw, fh),
                to_screen(view_proj, v1.position, fw, fh),
                to_screen(view_proj, v2.position, fw, fh),
            ) else {
                continue;
            };

            let area = edge(a, b, c.x, c.y);
            if area.abs() < f32::EPSILON {
                continue;
            }

            let min_x = a.x.min(b.x).min(c.x).floor().max(0.0);
            let min_y = a.y.min(b.y).min(c.y).floor().max(0.0);
            let max_x = a.x.max(b.x).max(c.x).ceil().min(fw - 1.0);
            let max_y = a.y.max(b.y).max(c.y).ceil().min(fh - 1.0);
            if min_x > max_x || min_y > max_y {
                continue;
            }

            for py in min_y as u32..=max_y as u32 {
                let sy = py as f32 + 0.5;
                for px in min_x as u32..=max_x as u32 {
                    let sx = px as f32 + 0.5;
                    let w0 = edge(b, c, sx, sy) / area;
                    let w1 = edge(c, a, sx, sy) / area;
                    let w2 = edge(a, b, sx, sy) / area;
                    if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                        continue;
                    }
                    let z = w0 * a.z + w1 * b.z + w2 * c.z;
                    if !(0.0..1.0).contains(&z) {
                        continue;
                    }
                    let index = (py * width + px) as usize;
                    if z < depth[index] {
                        depth[index] = z;
                        shade(index, v0);
                    }
                }
            }
        }
    }
}

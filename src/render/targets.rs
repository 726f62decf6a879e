//! Frame buffers owned by the compositor

use crate::core::types::Vec3;

/// Depth written where no geometry was rasterized
pub const FAR_DEPTH: f32 = 1.0;

/// Viewport-sized color, normal, depth and display buffers
///
/// Rows are stored top to bottom. Normals are encoded as `n * 0.5 + 0.5`
/// and depth is window-space `[0, 1]` with 1 at the far plane.
#[derive(Clone, Debug)]
pub struct RenderTargets {
    width: u32,
    height: u32,
    color: Vec<Vec3>,
    normal: Vec<Vec3>,
    depth: Vec<f32>,
    display: Vec<Vec3>,
}

impl RenderTargets {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let count = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![Vec3::ZERO; count],
            normal: vec![Vec3::ZERO; count],
            depth: vec![FAR_DEPTH; count],
            display: vec![Vec3::ZERO; count],
        }
    }

    /// Reallocate for a new viewport; zero-sized requests are ignored
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return false;
        }
        *self = Self::new(width, height);
        log::debug!("Render targets resized to {}x{}", width, height);
        true
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn color(&self) -> &[Vec3] {
        &self.color
    }

    pub fn color_mut(&mut self) -> &mut [Vec3] {
        &mut self.color
    }

    pub fn normal(&self) -> &[Vec3] {
        &self.normal
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    pub fn display(&self) -> &[Vec3] {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut [Vec3] {
        &mut self.display
    }

    /// Normal and depth buffers for the geometry pass
    pub fn geometry_mut(&mut self) -> (&mut [Vec3], &mut [f32]) {
        (&mut self.normal, &mut self.depth)
    }

    /// Read-only inputs plus the display output for the composite pass
    pub fn composite_views(&mut self) -> CompositeViews<'_> {
        CompositeViews {
            width: self.width,
            height: self.height,
            color: &self.color,
            normal: &self.normal,
            depth: &self.depth,
            display: &mut self.display,
        }
    }

    /// Present the lit color buffer unchanged
    pub fn copy_color_to_display(&mut self) {
        self.display.copy_from_slice(&self.color);
    }

    /// Display buffer as tightly packed RGBA8, top row first
    pub fn display_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.display.len() * 4);
        for c in &self.display {
            let c = c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
            out.extend_from_slice(&[c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]);
        }
        out
    }
}

/// Split borrow of [`RenderTargets`] for the composite stage
pub struct CompositeViews<'a> {
    pub width: u32,
    pub height: u32,
    pub color: &'a [Vec3],
    pub normal: &'a [Vec3],
    pub depth: &'a [f32],
    pub display: &'a mut [Vec3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clears_depth_to_far() {
        let targets = RenderTargets::new(4, 3);
        assert_eq!(targets.pixel_count(), 12);
        assert!(targets.depth().iter().all(|&d| d == FAR_DEPTH));
    }

    #[test]
    fn test_resize() {
        let mut targets = RenderTargets::new(4, 4);
        assert!(!targets.resize(4, 4));
        assert!(!targets.resize(0, 10));
        assert!(targets.resize(8, 2));
        assert_eq!(targets.size(), (8, 2));
        assert_eq!(targets.display().len(), 16);
        assert_eq!(targets.index(3, 1), 11);
    }

    #[test]
    fn test_display_rgba8() {
        let mut targets = RenderTargets::new(2, 1);
        targets.display_mut()[0] = Vec3::new(1.0, 0.0, 2.0);
        targets.display_mut()[1] = Vec3::splat(0.5);
        assert_eq!(targets.display_rgba8(), vec![255, 0, 255, 255, 128, 128, 128, 255]);
    }
}

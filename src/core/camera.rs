//! Camera matrices consumed by the raster passes and the composite stage
//!
//! Movement and input handling live outside this crate; the camera here is
//! just a transform plus projection that the driver keeps up to date.

use crate::core::types::{Vec3, Mat4, Quat};

/// Camera with position, rotation, and projection parameters
///
/// Projection follows the GL depth convention: NDC depth spans [-1, 1] and
/// the stored depth buffer value is `ndc_z * 0.5 + 0.5`, so the far plane
/// reads back as exactly 1.0.
#[derive(Clone, Debug)]
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: Vec3, fov_y_degrees: f32, aspect: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 0.1,
            far: 500.0,
        }
    }

    /// Create camera looking at a target
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        let rotation = Quat::from_mat3(&glam::Mat3::from_cols(right, up, -forward));

        Self {
            rotation,
            ..Self::new(position, 70.0, 16.0 / 9.0)
        }
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-self.position);
        rotation_matrix * translation_matrix
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Camera-to-world transform
    pub fn inverse_view(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    /// Clip-to-camera transform
    pub fn inverse_projection(&self) -> Mat4 {
        self.projection_matrix().inverse()
    }

    /// Get forward direction (negative Z in camera space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Update aspect ratio (call on viewport resize)
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), 70.0, 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_default() {
        let camera = Camera::default();
        let forward = camera.forward();
        assert!((forward.z - (-1.0)).abs() < 0.001);
    }

    #[test]
    fn test_view_matrix_translation() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(10.0, 0.0, 0.0);

        let view = camera.view_matrix();
        let origin_in_camera = view.transform_point3(Vec3::ZERO);
        assert!((origin_in_camera.x - (-10.0)).abs() < 0.001);
    }

    #[test]
    fn test_look_at_forward() {
        let camera = Camera::look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 10.0, -5.0), Vec3::Y);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 0.001);
    }

    #[test]
    fn test_far_plane_depth_is_one() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();
        let clip = proj * glam::Vec4::new(0.0, 0.0, -camera.far, 1.0);
        let depth = (clip.z / clip.w) * 0.5 + 0.5;
        assert!((depth - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_inverse_round_trip() {
        let camera = Camera::look_at(Vec3::new(3.0, 20.0, 7.0), Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
        let p = Vec3::new(1.0, 2.0, 3.0);
        let back = camera.inverse_view().transform_point3(camera.view_matrix().transform_point3(p));
        assert!((back - p).length() < 1e-3);
    }
}

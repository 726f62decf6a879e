//! Ray type and operations

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// Directions shorter than this are treated as degenerate
pub const DEGENERATE_LENGTH: f32 = 1e-8;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for slab tests
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True when the direction cannot advance the ray
    pub fn is_degenerate(&self) -> bool {
        !self.direction.is_finite() || self.direction.length_squared() < DEGENERATE_LENGTH
    }

    /// Clip the ray against a box with the slab method
    ///
    /// Returns `(t_enter, t_exit)` with `t_enter` clamped to 0 when the
    /// origin is already inside, or `None` when the box is missed or lies
    /// entirely behind the origin.
    pub fn clip_to_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let t1 = (aabb.min - self.origin) * self.inv_direction;
        let t2 = (aabb.max - self.origin) * self.inv_direction;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_enter = t_min.max_element();
        let t_exit = t_max.min_element();

        if t_exit >= t_enter.max(0.0) {
            Some((t_enter.max(0.0), t_exit))
        } else {
            None
        }
    }
}

/// Mirror `incident` about `normal` (GLSL `reflect`)
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_clip_hit() {
        let ray = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_enter, t_exit) = ray.clip_to_aabb(&aabb).unwrap();
        assert!((t_enter - 2.0).abs() < 0.001);
        assert!((t_exit - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_clip_miss_and_behind() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let miss = Ray::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::X);
        assert!(miss.clip_to_aabb(&aabb).is_none());

        let behind = Ray::new(Vec3::new(3.0, 0.5, 0.5), Vec3::X);
        assert!(behind.clip_to_aabb(&aabb).is_none());
    }

    #[test]
    fn test_clip_inside() {
        let ray = Ray::new(Vec3::splat(0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_enter, t_exit) = ray.clip_to_aabb(&aabb).unwrap();
        assert_eq!(t_enter, 0.0);
        assert!((t_exit - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_degenerate() {
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_degenerate());
        assert!(!Ray::new(Vec3::ZERO, Vec3::Y).is_degenerate());
    }

    #[test]
    fn test_reflect() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }
}

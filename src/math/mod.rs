//! Mathematical utilities

pub mod aabb;
pub mod ray;
pub mod morton;

pub use aabb::Aabb;
pub use ray::{Ray, reflect};

/// Hermite smoothstep (GLSL semantics)
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.7, 1.0, 0.5), 0.0);
        assert_eq!(smoothstep(0.7, 1.0, 1.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }
}

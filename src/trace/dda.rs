//! Amanatides & Woo voxel traversal over any [`OccupancySource`]
//!
//! One stepping routine serves both the sparse world (interaction picks)
//! and the dense volume window (shading rays). The WGSL composite kernel
//! mirrors this loop line for line.

use crate::core::types::{IVec3, Vec3};
use crate::math::Ray;
use crate::voxel::Face;
use super::occupancy::OccupancySource;

/// Hard bound on cells visited by a single ray, whatever the caller asks for
pub const ITERATION_CAP: u32 = 1024;

/// Origins must lie within this distance of zero on every axis so that
/// the start cell and every capped step stay inside `i32`
pub const MAX_ORIGIN_COORD: f32 = (1u32 << 30) as f32;

/// Caller-supplied bounds on a traversal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraversalLimits {
    /// Stop once the traveled distance exceeds this
    pub max_distance: f32,
    /// Stop after this many visited cells (capped at [`ITERATION_CAP`])
    pub max_iterations: u32,
}

impl TraversalLimits {
    pub fn new(max_distance: f32, max_iterations: u32) -> Self {
        Self {
            max_distance,
            max_iterations,
        }
    }

    /// Distance-bounded only; iterations fall back to the hard cap
    pub fn distance(max_distance: f32) -> Self {
        Self::new(max_distance, ITERATION_CAP)
    }

    fn effective_iterations(&self) -> u32 {
        self.max_iterations.min(ITERATION_CAP)
    }
}

/// A filled cell reached by a traversal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraversalHit<M> {
    pub cell: IVec3,
    pub material: M,
    /// Ray parameter at which the cell was entered (0 for the start cell)
    pub distance: f32,
    /// Face the ray entered through; `None` when the start cell is filled
    pub face: Option<Face>,
}

/// Why a traversal ended without a hit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// Traveled past `max_distance`
    MaxDistance,
    /// Stepped outside the source's domain
    LeftDomain,
    /// Visited the maximum number of cells
    IterationCap,
    /// Zero-length or non-finite direction, or an origin outside the cell range
    Degenerate,
}

/// Outcome of [`traverse`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Traversal<M> {
    Hit(TraversalHit<M>),
    Miss(MissReason),
}

impl<M> Traversal<M> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Traversal::Hit(_))
    }

    pub fn hit(self) -> Option<TraversalHit<M>> {
        match self {
            Traversal::Hit(hit) => Some(hit),
            Traversal::Miss(_) => None,
        }
    }
}

/// Walk the cells pierced by a ray, in order, until a filled one is found
///
/// The direction is normalized internally so distances are in world units.
/// Ties between axes resolve x, then y, then z only when strictly smaller,
/// otherwise toward z.
pub fn traverse<S>(source: &S, origin: Vec3, direction: Vec3, limits: TraversalLimits) -> Traversal<S::Material>
where
    S: OccupancySource + ?Sized,
{
    let ray = Ray::new(origin, direction);
    if ray.is_degenerate() || !origin.is_finite() || origin.abs().max_element() >= MAX_ORIGIN_COORD {
        return Traversal::Miss(MissReason::Degenerate);
    }
    let dir = direction.normalize();

    let mut cell = origin.floor().as_ivec3();
    let step = IVec3::new(step_sign(dir.x), step_sign(dir.y), step_sign(dir.z));
    let t_delta = Vec3::new(delta(dir.x), delta(dir.y), delta(dir.z));
    let mut t_max = Vec3::new(
        boundary(origin.x, dir.x),
        boundary(origin.y, dir.y),
        boundary(origin.z, dir.z),
    );

    let mut face = None;
    let mut distance = 0.0_f32;

    for _ in 0..limits.effective_iterations() {
        if !source.in_domain(cell) {
            return Traversal::Miss(MissReason::LeftDomain);
        }
        if let Some(material) = source.occupancy(cell) {
            return Traversal::Hit(TraversalHit {
                cell,
                material,
                distance,
                face,
            });
        }

        let axis = if t_max.x < t_max.y {
            if t_max.x < t_max.z { 0 } else { 2 }
        } else if t_max.y < t_max.z {
            1
        } else {
            2
        };
        distance = t_max[axis];
        t_max[axis] += t_delta[axis];
        cell[axis] += step[axis];
        face = Some(Face::entered_by_step(axis, step[axis]));

        if distance > limits.max_distance {
            return Traversal::Miss(MissReason::MaxDistance);
        }
    }

    Traversal::Miss(MissReason::IterationCap)
}

fn step_sign(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// Ray distance to cross one whole cell along an axis
fn delta(d: f32) -> f32 {
    if d == 0.0 { f32::INFINITY } else { (1.0 / d).abs() }
}

/// Ray distance from `o` to the first cell boundary along an axis
fn boundary(o: f32, d: f32) -> f32 {
    if d > 0.0 {
        (o.floor() + 1.0 - o) / d
    } else if d < 0.0 {
        (o - o.floor()) / -d
    } else {
        f32::INFINITY
    }
}
